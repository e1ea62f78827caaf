//! Document walker
//!
//! Consumes a stream of element open/close and character data events, keeps
//! per-element frames with cumulative transform, layer opacity and inherited
//! paint properties, and drives a [`DrawingSink`].
use crate::{
    BBox, DrawingSink, Event, Geometry, GradStop, Gradient, GradientRegistry, PaintResolver,
    PaintSpec, PaintState, ParseOptions, Point, Properties, Scalar, SvgError, TextRun, Transform,
    clamp, parse_length, parse_transform, scan_numbers,
};

const DEFAULT_FONT_SIZE: Scalar = 16.0;

/// Result of walking a document
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    /// Canvas width
    pub width: u32,
    /// Canvas height
    pub height: u32,
    pub view_box: Option<BBox>,
    /// Bounds of everything drawn relative to the view box origin, `None` if nothing was drawn
    pub bounds: Option<BBox>,
    /// Bounds provided by `rect` inside of a group with `id="bounds"`
    pub explicit_bounds: Option<BBox>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Inside of `display: none` element, depth is relative to that element
    Hidden { depth: usize },
    /// Inside of the bounds group, depth is relative to that group
    Bounds { depth: usize },
}

/// State of an open element
#[derive(Debug, Clone, Copy)]
struct Frame<'a> {
    /// Cumulative transform (view box translation is not included)
    matrix: Transform,
    /// Cumulative opacity of enclosing groups
    opacity: Scalar,
    paint: PaintState<'a>,
    /// Number of transforms pushed to the sink
    transforms: usize,
    /// Whether layer was started in the sink
    layer: bool,
}

impl Frame<'_> {
    fn root() -> Self {
        Self {
            matrix: Transform::identity(),
            opacity: 1.0,
            paint: PaintState::default(),
            transforms: 0,
            layer: false,
        }
    }

    fn child(&self) -> Self {
        Self {
            transforms: 0,
            layer: false,
            ..*self
        }
    }
}

#[derive(Debug, Clone)]
struct TextState {
    position: Point,
    font_size: Scalar,
    lines: usize,
    paint: Option<PaintSpec>,
}

/// Element state machine driving the sink
///
/// A walker is good for a single document, [`Walker::walk`] consumes it.
pub struct Walker<'a, 's, S: ?Sized> {
    sink: &'s mut S,
    options: &'s ParseOptions,
    gradients: GradientRegistry,
    frames: Vec<Frame<'a>>,
    mode: Mode,
    text: Option<TextState>,
    root_open: bool,
    document: Document,
}

impl<'a, 's, S: DrawingSink + ?Sized> Walker<'a, 's, S> {
    pub fn new(sink: &'s mut S, options: &'s ParseOptions) -> Self {
        Self {
            sink,
            options,
            gradients: GradientRegistry::default(),
            frames: vec![Frame::root()],
            mode: Mode::Normal,
            text: None,
            root_open: false,
            document: Document::default(),
        }
    }

    /// Process all events and return the document summary
    pub fn walk(mut self, events: impl IntoIterator<Item = Event<'a>>) -> Document {
        for event in events {
            match event {
                Event::Open(element) => self.open(&Properties::new(&element)),
                Event::Close(name) => self.close(name),
                Event::Text(text) => self.characters(text),
            }
        }
        if self.frames.len() > 1 {
            tracing::warn!(depth = self.frames.len() - 1, "unclosed elements");
        }
        self.document
    }

    fn frame(&self) -> Frame<'a> {
        self.frames.last().copied().unwrap_or_else(Frame::root)
    }

    fn open(&mut self, props: &Properties<'_, 'a>) {
        let name = props.element().name();
        let parent = self.frame();
        match &mut self.mode {
            Mode::Bounds { depth } => {
                *depth += 1;
                if *depth == 2 && name == "rect" {
                    match explicit_bounds(props) {
                        Ok(bounds) => self.document.explicit_bounds = Some(bounds),
                        Err(error) => tracing::warn!(element = name, %error, "invalid bounds"),
                    }
                }
                self.frames.push(parent.child());
                return;
            }
            Mode::Hidden { depth } => *depth += 1,
            Mode::Normal => {
                if props.is_hidden() {
                    tracing::debug!(element = name, "hidden subtree");
                    self.mode = Mode::Hidden { depth: 1 };
                }
            }
        }
        let hidden = self.mode != Mode::Normal;

        let mut frame = parent.child();
        frame.paint = parent.paint.inherit(props);
        let local = props.attribute("transform").map(parse_transform);
        if let Some(local) = local {
            frame.matrix = parent.matrix.pre_concat(local);
        }

        match name {
            "svg" if self.frames.len() == 1 && !self.root_open => {
                self.open_root(props, local, &mut frame)
            }
            "g" if !hidden && is_bounds_group(props) => {
                tracing::debug!("bounds group");
                self.mode = Mode::Bounds { depth: 1 };
            }
            "g" | "svg" | "a" | "switch" => self.open_group(props, local, hidden, &mut frame),
            "defs" => self.gradients.enter_defs(),
            "linearGradient" | "radialGradient" => match Gradient::from_props(props) {
                Ok(gradient) => self.gradients.begin_gradient(gradient),
                Err(error) => tracing::warn!(element = name, %error, "skipping gradient"),
            },
            "stop" => match GradStop::from_props(props, parent.opacity) {
                Ok(stop) => self.gradients.add_stop(stop),
                Err(error) => tracing::warn!(element = name, %error, "skipping gradient stop"),
            },
            "rect" | "line" | "circle" | "ellipse" | "polygon" | "polyline" | "path" => {
                if !hidden {
                    self.draw(props, local, &frame)
                }
            }
            "text" => {
                if !hidden {
                    self.open_text(props, local, &mut frame)
                }
            }
            "tspan" | "title" | "desc" | "metadata" => {}
            _ => tracing::warn!(element = name, "unsupported element"),
        }
        self.frames.push(frame);
    }

    fn close(&mut self, name: &str) {
        if self.frames.len() <= 1 {
            tracing::warn!(element = name, "unbalanced close");
            return;
        }
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let bounds_mode = matches!(self.mode, Mode::Bounds { .. });
        match &mut self.mode {
            Mode::Bounds { depth } | Mode::Hidden { depth } => {
                *depth -= 1;
                if *depth == 0 {
                    self.mode = Mode::Normal;
                }
            }
            Mode::Normal => {}
        }
        if !bounds_mode {
            match name {
                "defs" => self.gradients.leave_defs(),
                "linearGradient" | "radialGradient" => self.gradients.end_gradient(),
                "text" => self.text = None,
                _ => {}
            }
        }
        if frame.layer {
            self.sink.end_layer();
        }
        for _ in 0..frame.transforms {
            self.sink.pop_transform();
        }
        if self.frames.len() == 1 && self.root_open {
            self.root_open = false;
            if let (Some(bounds), Some(view_box)) = (self.document.bounds, self.document.view_box) {
                self.document.bounds = Some(bounds.translate(-view_box.x(), -view_box.y()));
            }
            self.sink.end_document();
        }
    }

    fn characters(&mut self, chunk: &str) {
        if self.mode != Mode::Normal {
            return;
        }
        let Some(state) = &mut self.text else {
            return;
        };
        if !chunk.is_empty() && chunk.chars().all(|c| c == '\n' || c == '\r') {
            state.lines += chunk.matches('\n').count();
            return;
        }
        let text = chunk.trim();
        let Some(paint) = state.paint.clone().filter(|_| !text.is_empty()) else {
            return;
        };
        let offset = Point::new(0.0, state.lines as Scalar * state.font_size);
        self.sink.draw_text(TextRun {
            text: text.to_owned(),
            position: state.position + offset,
            font_size: state.font_size,
            line: state.lines,
            paint,
        });
    }

    fn open_root(
        &mut self,
        props: &Properties<'_, 'a>,
        local: Option<Transform>,
        frame: &mut Frame<'a>,
    ) {
        self.root_open = true;
        let view_box = props
            .attribute("viewBox")
            .and_then(|view_box| match parse_view_box(view_box) {
                Ok(view_box) => Some(view_box),
                Err(error) => {
                    tracing::warn!(%error, "ignoring viewBox");
                    None
                }
            });
        let (width, height) = match view_box {
            Some(view_box) => (view_box.width(), view_box.height()),
            None => (root_length(props, "width"), root_length(props, "height")),
        };
        self.document.width = canvas_size(width);
        self.document.height = canvas_size(height);
        self.document.view_box = view_box;
        if let Some(opacity) = props.number("opacity") {
            frame.opacity *= clamp(opacity, 0.0, 1.0);
        }

        self.sink
            .begin_document(self.document.width, self.document.height);
        if let Some(view_box) = view_box {
            self.sink
                .push_transform(Transform::new_translate(-view_box.x(), -view_box.y()));
            frame.transforms += 1;
        }
        if let Some(local) = local {
            self.sink.push_transform(local);
            frame.transforms += 1;
        }
    }

    fn open_group(
        &mut self,
        props: &Properties<'_, 'a>,
        local: Option<Transform>,
        hidden: bool,
        frame: &mut Frame<'a>,
    ) {
        if let Some(opacity) = props.number("opacity") {
            frame.opacity *= clamp(opacity, 0.0, 1.0);
        }
        if hidden {
            return;
        }
        if let Some(local) = local {
            self.sink.push_transform(local);
            frame.transforms += 1;
        }
        self.sink.begin_layer(frame.opacity);
        frame.layer = true;
    }

    fn open_text(
        &mut self,
        props: &Properties<'_, 'a>,
        local: Option<Transform>,
        frame: &mut Frame<'a>,
    ) {
        let resolver = PaintResolver {
            options: self.options,
            gradients: &self.gradients,
            layer_opacity: frame.opacity,
        };
        let paint = resolver.fill(&frame.paint, props.number("opacity"), None);
        let font_size = props
            .number("font-size")
            .filter(|size| *size > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE);
        self.text = Some(TextState {
            position: Point::new(text_coordinate(props, "x"), text_coordinate(props, "y")),
            font_size,
            lines: 0,
            paint,
        });
        if let Some(local) = local {
            self.sink.push_transform(local);
            frame.transforms += 1;
        }
    }

    /// Emit fill and stroke passes of the shape element
    fn draw(&mut self, props: &Properties<'_, 'a>, local: Option<Transform>, frame: &Frame<'a>) {
        let name = props.element().name();
        let geometry = match shape_geometry(props) {
            Ok(Some(geometry)) => geometry,
            Ok(None) => {
                tracing::debug!(element = name, "empty shape");
                return;
            }
            Err(error) => {
                tracing::warn!(element = name, %error, "skipping shape");
                return;
            }
        };
        let bbox = geometry.bbox();
        let opacity = props.number("opacity");
        let resolver = PaintResolver {
            options: self.options,
            gradients: &self.gradients,
            layer_opacity: frame.opacity,
        };
        let fill = if name == "line" {
            None
        } else {
            resolver.fill(&frame.paint, opacity, bbox)
        };
        let stroke = resolver.stroke(&frame.paint, opacity, bbox);
        if fill.is_none() && stroke.is_none() {
            return;
        }

        if let Some(local) = local {
            self.sink.push_transform(local);
        }
        for paint in [fill, stroke].into_iter().flatten() {
            if let Some(bbox) = bbox {
                let margin = if paint.fill {
                    0.0
                } else {
                    paint.stroke_width / 2.0
                };
                let bbox = frame.matrix.map_bbox(bbox).expand(margin);
                self.document.bounds = Some(bbox.union_opt(self.document.bounds));
            }
            self.sink.draw_shape(geometry.clone(), paint);
        }
        if local.is_some() {
            self.sink.pop_transform();
        }
    }
}

fn is_bounds_group(props: &Properties<'_, '_>) -> bool {
    props
        .attribute("id")
        .is_some_and(|id| id.eq_ignore_ascii_case("bounds"))
}

fn parse_view_box(view_box: &str) -> Result<BBox, SvgError> {
    match scan_numbers(view_box, 0)?.numbers.as_slice() {
        &[x, y, width, height] if width > 0.0 && height > 0.0 => {
            Ok(BBox::from_rect(x, y, width, height))
        }
        _ => Err(SvgError::InvalidAttribute {
            name: "viewBox",
            value: view_box.to_owned(),
        }),
    }
}

fn root_length(props: &Properties<'_, '_>, name: &'static str) -> Scalar {
    match props.length(name) {
        Ok(length) => length.unwrap_or(0.0),
        Err(error) => {
            tracing::warn!(%error, "invalid canvas size");
            0.0
        }
    }
}

fn canvas_size(size: Scalar) -> u32 {
    if size.is_finite() && size > 0.0 {
        size.ceil() as u32
    } else {
        0
    }
}

// first coordinate of the possibly space separated list
fn text_coordinate(props: &Properties<'_, '_>, name: &'static str) -> Scalar {
    let Some(value) = props.attribute(name) else {
        return 0.0;
    };
    let first = value
        .split(|c: char| c == ',' || c.is_ascii_whitespace())
        .find(|value| !value.is_empty())
        .unwrap_or("");
    parse_length(name, first).unwrap_or_else(|error| {
        tracing::warn!(%error, "invalid text position");
        0.0
    })
}

fn explicit_bounds(props: &Properties<'_, '_>) -> Result<BBox, SvgError> {
    let x = props.length("x")?.unwrap_or(0.0);
    let y = props.length("y")?.unwrap_or(0.0);
    let width = props.required_length("width")?;
    let height = props.required_length("height")?;
    Ok(BBox::from_rect(x, y, width, height))
}

fn non_negative(name: &'static str, value: Scalar) -> Result<Scalar, SvgError> {
    if value < 0.0 {
        return Err(SvgError::InvalidAttribute {
            name,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Geometry of a shape element in its local coordinates
///
/// `None` is returned for shapes which render nothing (zero size, no points or path data).
fn shape_geometry(props: &Properties<'_, '_>) -> Result<Option<Geometry>, SvgError> {
    let coord = |name| Ok::<_, SvgError>(props.length(name)?.unwrap_or(0.0));
    let name = props.element().name();
    let geometry = match name {
        "rect" => {
            let width = non_negative("width", props.required_length("width")?)?;
            let height = non_negative("height", props.required_length("height")?)?;
            if width == 0.0 || height == 0.0 {
                return Ok(None);
            }
            let radius = |name: &'static str| -> Result<Option<Scalar>, SvgError> {
                props
                    .length(name)?
                    .map(|value| non_negative(name, value))
                    .transpose()
            };
            let (rx, ry) = match (radius("rx")?, radius("ry")?) {
                (None, None) => (0.0, 0.0),
                (Some(rx), None) => (rx, rx),
                (None, Some(ry)) => (ry, ry),
                (Some(rx), Some(ry)) => (rx, ry),
            };
            Geometry::round_rect(coord("x")?, coord("y")?, width, height, rx, ry)
        }
        "line" => Geometry::line(
            (coord("x1")?, coord("y1")?),
            (coord("x2")?, coord("y2")?),
        ),
        "circle" => {
            let r = non_negative("r", props.required_length("r")?)?;
            if r == 0.0 {
                return Ok(None);
            }
            Geometry::ellipse((coord("cx")?, coord("cy")?), r, r)
        }
        "ellipse" => {
            let rx = non_negative("rx", props.required_length("rx")?)?;
            let ry = non_negative("ry", props.required_length("ry")?)?;
            if rx == 0.0 || ry == 0.0 {
                return Ok(None);
            }
            Geometry::ellipse((coord("cx")?, coord("cy")?), rx, ry)
        }
        "polygon" | "polyline" => {
            let Some(points) = props.attribute("points") else {
                return Ok(None);
            };
            let mut numbers = scan_numbers(points, 0)?.numbers;
            if numbers.len() % 2 == 1 {
                tracing::warn!(element = name, "odd number of coordinates");
                numbers.pop();
            }
            let points = numbers
                .chunks_exact(2)
                .map(|point| Point::new(point[0], point[1]));
            Geometry::polyline(points, name == "polygon")
        }
        "path" => match props.attribute("d") {
            Some(data) => data.parse::<Geometry>()?,
            None => return Ok(None),
        },
        _ => return Ok(None),
    };
    Ok((!geometry.is_empty()).then_some(geometry))
}
