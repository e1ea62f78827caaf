//! SVG subset parser producing backend agnostic shapes.
//!
//! Main features:
//!  - SVG path data and transform list compilation
//!  - Presentation attributes, inline style and paint inheritance
//!  - Linear and radial gradients with `href` inheritance
//!  - Shapes with resolved paint emitted to a [`DrawingSink`] together with document bounds
//!
#![deny(warnings)]

mod color;
mod curve;
mod ellipse;
mod error;
mod geometry;
mod grad;
mod paint;
mod path;
mod scan;
mod sink;
mod style;
mod svg;
mod transform;
mod utils;
mod walker;
mod xml;

pub use color::{Color, ColorError};
pub use curve::{Cubic, DEFAULT_LENGTH_TOLERANCE, Quad};
pub use ellipse::EllipArc;
pub use error::SvgError;
pub use geometry::{BBox, EPSILON, PI, Point, Scalar, Transform, scalar_fmt};
pub use grad::{GradSpread, GradStop, Gradient, GradientKind, Units};
pub use paint::{
    ColorSwap, Dash, GradientPaint, LineCap, LineJoin, Paint, PaintSpec, ParseOptions,
};
pub use path::{Geometry, GeometryBuilder, PathSegment};
pub use scan::{NumberScan, Scanner, scan_numbers};
pub use sink::{DrawingSink, Label, Shape, ShapeList, TextRun};
pub use style::{Properties, parse_length, parse_style};
pub use svg::{SvgPathCmd, SvgPathParser};
pub use transform::parse_transform;
pub use utils::clamp;
pub use walker::{Document, Walker};
pub use xml::{Element, Event, Events};

use grad::GradientRegistry;
use paint::{PaintResolver, PaintState};
use std::io::Read;

/// Parse SVG document feeding its shapes to the `sink`
///
/// Only malformed XML (or a DOCTYPE declaration) fails the whole parse, other
/// problems are logged and the offending elements are skipped.
pub fn parse<S>(text: &str, sink: &mut S, options: &ParseOptions) -> Result<Document, SvgError>
where
    S: DrawingSink + ?Sized,
{
    let _span = tracing::debug_span!("[svg]").entered();
    let document = roxmltree::Document::parse(text)?;
    Ok(Walker::new(sink, options).walk(Events::new(&document)))
}

/// Same as [`parse`] but reads the document from the `reader` first
pub fn parse_reader<S>(
    mut reader: impl Read,
    sink: &mut S,
    options: &ParseOptions,
) -> Result<Document, SvgError>
where
    S: DrawingSink + ?Sized,
{
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse(&text, sink, options)
}
