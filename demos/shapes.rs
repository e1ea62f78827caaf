//! Walk SVG document and print collected shapes as JSON
#![deny(warnings)]

use std::{env, fs::File, io::Read};
use svg_shapes::*;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

type Error = Box<dyn std::error::Error>;

#[derive(Debug)]
struct Args {
    input_file: String,
    options: ParseOptions,
}

impl Args {
    fn parse() -> Result<Args, Error> {
        let mut input_file = None;
        let mut options = ParseOptions::default();
        let mut args = env::args();
        let cmd = args.next().unwrap_or_else(|| "shapes".to_owned());
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "-h" => {
                    input_file = None;
                    break;
                }
                "-w" => options = options.with_white_mode(true),
                "-s" => {
                    let search: Color = args.next().ok_or("-s requires color argument")?.parse()?;
                    let replace: Color = args.next().ok_or("-s requires color argument")?.parse()?;
                    options = options.with_color_swap(search, replace, false);
                }
                _ if input_file.is_none() => input_file = Some(arg),
                _ => return Err("unexpected positional argument".into()),
            }
        }
        let Some(input_file) = input_file else {
            eprintln!("Walk SVG document and print collected shapes as JSON");
            eprintln!("\nUSAGE:");
            eprintln!("    {} [-w] [-s <search> <replace>] <file.svg>", cmd);
            eprintln!("\nARGS:");
            eprintln!("    -w                    white mode, fill everything with white");
            eprintln!("    -s <search> <replace> replace color");
            eprintln!("    <file.svg>            SVG document ('-' means stdin)");
            std::process::exit(1);
        };
        Ok(Args {
            input_file,
            options,
        })
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;
    let mut contents = String::new();
    if args.input_file != "-" {
        File::open(&args.input_file)?.read_to_string(&mut contents)?;
    } else {
        std::io::stdin().read_to_string(&mut contents)?;
    }

    let (list, document) = ShapeList::parse(&contents, &args.options)?;
    tracing::debug!(
        shapes = list.shapes.len(),
        labels = list.labels.len(),
        "[document] {}x{}",
        document.width,
        document.height
    );
    match document.bounds {
        Some(bounds) => eprintln!("bounds: {:?}", bounds),
        None => eprintln!("bounds: none"),
    }
    println!("{}", list.to_json()?);
    Ok(())
}
