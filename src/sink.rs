//! Drawing sink interface and a sink collecting shapes into a list
use crate::{Document, Geometry, PaintSpec, ParseOptions, Point, Scalar, SvgError, Transform};

/// Consumer of the shapes produced by the document walker
///
/// Transforms and layers are always balanced. Transforms pushed by the walker are
/// local, the sink is responsible for composing them: the effective transformation
/// of a shape is the product of all transforms pushed so far, outermost first.
pub trait DrawingSink {
    /// Called once the canvas size is known (root `svg` element)
    fn begin_document(&mut self, _width: u32, _height: u32) {}

    fn push_transform(&mut self, _transform: Transform) {}

    fn pop_transform(&mut self) {}

    /// Group with cumulative `opacity` of all enclosing groups
    fn begin_layer(&mut self, _opacity: Scalar) {}

    fn end_layer(&mut self) {}

    /// Single fill or stroke pass of a shape
    fn draw_shape(&mut self, geometry: Geometry, paint: PaintSpec);

    /// Positioned text run, glyph layout is up to the sink
    fn draw_text(&mut self, _text: TextRun) {}

    fn end_document(&mut self) {}
}

/// Chunk of text content of a `text` element
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextRun {
    pub text: String,
    /// Baseline position, already moved down by `line * font_size`
    pub position: Point,
    pub font_size: Scalar,
    /// Number of line breaks preceding this run
    pub line: usize,
    pub paint: PaintSpec,
}

/// Shape recorded by [`ShapeList`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Shape {
    pub geometry: Geometry,
    pub paint: PaintSpec,
    /// Transformation from shape coordinates to the canvas
    pub transform: Transform,
    /// Total length of the geometry contours
    pub length: Scalar,
}

/// Text run recorded by [`ShapeList`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Label {
    pub run: TextRun,
    pub transform: Transform,
}

/// Sink that records everything it is given
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShapeList {
    pub width: u32,
    pub height: u32,
    pub shapes: Vec<Shape>,
    pub labels: Vec<Label>,
    #[cfg_attr(feature = "serde", serde(skip))]
    transforms: Vec<Transform>,
}

impl ShapeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse SVG document collecting all its shapes
    pub fn parse(text: &str, options: &ParseOptions) -> Result<(Self, Document), SvgError> {
        let mut list = Self::new();
        let document = crate::parse(text, &mut list, options)?;
        Ok((list, document))
    }

    /// Current transformation, product of all pushed transforms
    pub fn transform(&self) -> Transform {
        self.transforms.last().copied().unwrap_or_default()
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, SvgError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl DrawingSink for ShapeList {
    fn begin_document(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn push_transform(&mut self, transform: Transform) {
        self.transforms.push(self.transform().pre_concat(transform));
    }

    fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    fn draw_shape(&mut self, geometry: Geometry, paint: PaintSpec) {
        let length = geometry.length();
        self.shapes.push(Shape {
            geometry,
            paint,
            transform: self.transform(),
            length,
        });
    }

    fn draw_text(&mut self, run: TextRun) {
        self.labels.push(Label {
            run,
            transform: self.transform(),
        });
    }
}
