#![deny(warnings)]

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use svg_shapes::*;

const PATH_DATA: &str = "
    M12 2C6.48 2 2 6.48 2 12s4.48 10 10 10 10-4.48 10-10S17.52 2 12 2zm0 18c-4.41
    0-8-3.59-8-8s3.59-8 8-8 8 3.59 8 8-3.59 8-8 8zm-1-13h2v6h-2zm0 8h2v2h-2z
    M3 3h18v18H3z m2 2v14h14V5z M7 7a5 3 30 1 0 10 10 5 3 30 0 1-10-10z
    q4 -4 8 0t8 0 8 0l-2.5.5-.5-2.5Z";

const TRANSFORM: &str =
    "translate(1 2) skewX(30deg) matrix(1 2 3 4 -3 -7) scale(2,1) rotate(10 1 2) rotate(1rad)";

fn path_benchmark(c: &mut Criterion) {
    let geometry: Geometry = PATH_DATA.parse().expect("invalid path data");
    let mut group = c.benchmark_group("path");
    group
        .throughput(Throughput::Bytes(PATH_DATA.len() as u64))
        .bench_function("parse", |b| {
            b.iter(|| black_box(PATH_DATA).parse::<Geometry>())
        })
        .bench_function("bbox", |b| b.iter(|| black_box(&geometry).bbox()))
        .bench_function("length", |b| b.iter(|| black_box(&geometry).length()));
    group.finish();

    let mut group = c.benchmark_group("transform");
    group
        .throughput(Throughput::Bytes(TRANSFORM.len() as u64))
        .bench_function("parse", |b| b.iter(|| parse_transform(black_box(TRANSFORM))));
    group.finish();
}

criterion_group!(benches, path_benchmark);
criterion_main!(benches);
