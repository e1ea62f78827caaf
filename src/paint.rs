//! Fill and stroke paint resolution
use crate::{
    BBox, Color, Gradient, GradientRegistry, Properties, Scalar, SvgError, Transform, Units, clamp,
    parse_length,
};
use std::{fmt, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineJoin {
    Miter(Scalar),
    Bevel,
    Round,
}

impl Default for LineJoin {
    fn default() -> Self {
        Self::Miter(4.0)
    }
}

impl LineJoin {
    /// Find line join by its SVG name, `miter_limit` is only used by `miter`
    pub fn from_name(name: &str, miter_limit: Scalar) -> Option<Self> {
        match name {
            "miter" | "miter-clip" | "arcs" => Some(Self::Miter(miter_limit)),
            "bevel" => Some(Self::Bevel),
            "round" => Some(Self::Round),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineCap {
    #[default]
    Butt,
    Square,
    Round,
}

impl LineCap {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "butt" => Some(Self::Butt),
            "square" => Some(Self::Square),
            "round" => Some(Self::Round),
            _ => None,
        }
    }
}

/// Stroke dash pattern
///
/// Always contains an even number of non-negative intervals with a positive total,
/// and the offset is reduced into `[0, total)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Dash {
    intervals: Vec<Scalar>,
    offset: Scalar,
}

impl Dash {
    /// Create dash pattern, odd number of intervals is repeated twice
    pub fn new(mut intervals: Vec<Scalar>, offset: Scalar) -> Option<Self> {
        if intervals.len() % 2 == 1 {
            intervals.extend_from_within(..);
        }
        let total: Scalar = intervals.iter().sum();
        if !total.is_finite() || total <= 0.0 || intervals.iter().any(|interval| *interval < 0.0) {
            return None;
        }
        Some(Self {
            intervals,
            offset: offset.rem_euclid(total),
        })
    }

    /// Parse `stroke-dasharray` value
    ///
    /// Entry that fails to parse repeats the previous one (`1` for the first entry).
    pub fn parse(array: &str, offset: Scalar) -> Option<Self> {
        let array = array.trim();
        if array == "none" {
            return None;
        }
        let mut interval = 1.0;
        let intervals = array
            .split(|c: char| c == ',' || c.is_ascii_whitespace())
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                match parse_length("stroke-dasharray", entry) {
                    Ok(value) => interval = value,
                    Err(error) => tracing::warn!(%error, "repeating previous dash interval"),
                }
                interval
            })
            .collect();
        Self::new(intervals, offset)
    }

    pub fn intervals(&self) -> &[Scalar] {
        &self.intervals
    }

    pub fn offset(&self) -> Scalar {
        self.offset
    }

    /// Length of the whole pattern
    pub fn total(&self) -> Scalar {
        self.intervals.iter().sum()
    }
}

/// Gradient together with a transformation from gradient space to the user space
/// of the painted shape
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GradientPaint {
    pub gradient: Arc<Gradient>,
    pub transform: Transform,
}

#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Paint {
    Color(Color),
    Gradient(GradientPaint),
}

impl fmt::Debug for Paint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(color) => write!(f, "{color:?}"),
            Self::Gradient(paint) => write!(f, "url(#{}) {:?}", paint.gradient.id(), paint.transform),
        }
    }
}

/// Resolved paint of a single fill or stroke pass
///
/// Color alpha already includes every opacity that applies to the shape, `opacity`
/// holds the same value for gradient paints. Stroke fields are meaningless when
/// `fill` is set.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PaintSpec {
    pub fill: bool,
    pub paint: Paint,
    pub opacity: Scalar,
    pub stroke_width: Scalar,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub dash: Option<Dash>,
}

impl PaintSpec {
    /// Solid fill
    pub fn fill(paint: Paint, opacity: Scalar) -> Self {
        Self {
            fill: true,
            paint,
            opacity,
            stroke_width: 0.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            dash: None,
        }
    }

    /// Color of the paint, `None` for gradients
    pub fn color(&self) -> Option<Color> {
        match self.paint {
            Paint::Color(color) => Some(color),
            Paint::Gradient(_) => None,
        }
    }
}

/// Global color replacement rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSwap {
    pub search: Color,
    pub replace: Color,
    /// Multiply computed opacity by the alpha of `replace`
    pub override_opacity: bool,
}

/// Parser configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOptions {
    pub color_swap: Option<ColorSwap>,
    /// Every fill is opaque white and strokes are dropped
    pub white_mode: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color_swap(self, search: Color, replace: Color, override_opacity: bool) -> Self {
        Self {
            color_swap: Some(ColorSwap {
                search,
                replace,
                override_opacity,
            }),
            ..self
        }
    }

    pub fn with_white_mode(self, white_mode: bool) -> Self {
        Self { white_mode, ..self }
    }
}

const FILL: usize = 0;
const STROKE: usize = 1;
const FILL_OPACITY: usize = 2;
const STROKE_OPACITY: usize = 3;
const STROKE_WIDTH: usize = 4;
const STROKE_LINECAP: usize = 5;
const STROKE_LINEJOIN: usize = 6;
const STROKE_MITERLIMIT: usize = 7;
const STROKE_DASHARRAY: usize = 8;
const STROKE_DASHOFFSET: usize = 9;

const PAINT_PROPERTIES: [&str; 10] = [
    "fill",
    "stroke",
    "fill-opacity",
    "stroke-opacity",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-dasharray",
    "stroke-dashoffset",
];

/// Inheritable paint properties, innermost defined value wins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PaintState<'a> {
    values: [Option<&'a str>; 10],
}

impl<'a> PaintState<'a> {
    /// State of the child element with properties `props`
    pub(crate) fn inherit(&self, props: &Properties<'_, 'a>) -> Self {
        let mut values = self.values;
        for (value, name) in values.iter_mut().zip(PAINT_PROPERTIES) {
            match props.get(name) {
                None | Some("inherit") => {}
                Some(own) => *value = Some(own),
            }
        }
        Self { values }
    }

    fn get(&self, index: usize) -> Option<&'a str> {
        self.values[index]
    }

    fn number(&self, index: usize) -> Option<Scalar> {
        let name = PAINT_PROPERTIES[index];
        match parse_length(name, self.values[index]?) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(%error, "ignoring paint property");
                None
            }
        }
    }
}

/// Parsed value of `fill` or `stroke`
#[derive(Debug, Clone, Copy, PartialEq)]
enum PaintValue<'a> {
    None,
    Color(Color),
    Url(&'a str),
}

impl<'a> PaintValue<'a> {
    fn parse(value: &'a str) -> Result<Self, SvgError> {
        let value = value.trim();
        if value == "none" {
            return Ok(Self::None);
        }
        if let Some(url) = value.strip_prefix("url(") {
            let id = url
                .split_once(')')
                .map(|(id, _)| id)
                .ok_or_else(|| SvgError::InvalidAttribute {
                    name: "paint",
                    value: value.to_owned(),
                })?
                .trim()
                .trim_matches(|c| c == '\'' || c == '"');
            return Ok(Self::Url(id.strip_prefix('#').unwrap_or(id)));
        }
        Ok(Self::Color(value.parse()?))
    }
}

/// Resolves paint of a shape from its inherited paint state
pub(crate) struct PaintResolver<'r> {
    pub(crate) options: &'r ParseOptions,
    pub(crate) gradients: &'r GradientRegistry,
    /// Cumulative opacity of enclosing groups
    pub(crate) layer_opacity: Scalar,
}

impl PaintResolver<'_> {
    /// Fill paint, `None` if the shape is not filled
    ///
    /// `opacity` is the shape's own `opacity` which takes precedence over `fill-opacity`,
    /// `bbox` is the local bounding box of the shape used by bounding box gradients.
    pub(crate) fn fill(
        &self,
        state: &PaintState<'_>,
        opacity: Option<Scalar>,
        bbox: Option<BBox>,
    ) -> Option<PaintSpec> {
        let paint = match state.get(FILL) {
            None => Paint::Color(Color::BLACK),
            Some(value) => match PaintValue::parse(value) {
                Ok(PaintValue::None) => return None,
                Ok(PaintValue::Color(color)) => Paint::Color(color),
                Ok(PaintValue::Url(id)) => self.gradient(id, bbox),
                Err(error) => {
                    tracing::warn!(%error, "unknown fill, using black");
                    Paint::Color(Color::BLACK)
                }
            },
        };
        if self.options.white_mode {
            return Some(PaintSpec::fill(Paint::Color(Color::WHITE), 1.0));
        }
        let opacity = opacity
            .or_else(|| state.number(FILL_OPACITY))
            .unwrap_or(1.0);
        let (paint, opacity) = self.apply_opacity(paint, opacity);
        Some(PaintSpec::fill(paint, opacity))
    }

    /// Stroke paint, `None` if the shape is not stroked
    pub(crate) fn stroke(
        &self,
        state: &PaintState<'_>,
        opacity: Option<Scalar>,
        bbox: Option<BBox>,
    ) -> Option<PaintSpec> {
        if self.options.white_mode {
            return None;
        }
        let paint = match PaintValue::parse(state.get(STROKE)?) {
            Ok(PaintValue::None) => return None,
            Ok(PaintValue::Color(color)) => Paint::Color(color),
            Ok(PaintValue::Url(id)) => self.gradient(id, bbox),
            Err(error) => {
                tracing::warn!(%error, "unknown stroke, not stroking");
                return None;
            }
        };
        let stroke_width = state.number(STROKE_WIDTH).unwrap_or(1.0);
        if stroke_width <= 0.0 {
            return None;
        }
        let line_cap = match state.get(STROKE_LINECAP) {
            None => LineCap::default(),
            Some(name) => LineCap::from_name(name).unwrap_or_else(|| {
                tracing::warn!(value = name, "unknown stroke-linecap");
                LineCap::default()
            }),
        };
        let miter_limit = state.number(STROKE_MITERLIMIT).unwrap_or(4.0);
        let line_join = match state.get(STROKE_LINEJOIN) {
            None => LineJoin::Miter(miter_limit),
            Some(name) => LineJoin::from_name(name, miter_limit).unwrap_or_else(|| {
                tracing::warn!(value = name, "unknown stroke-linejoin");
                LineJoin::Miter(miter_limit)
            }),
        };
        let dash = state.get(STROKE_DASHARRAY).and_then(|array| {
            Dash::parse(array, state.number(STROKE_DASHOFFSET).unwrap_or(0.0))
        });
        let opacity = opacity
            .or_else(|| state.number(STROKE_OPACITY))
            .unwrap_or(1.0);
        let (paint, opacity) = self.apply_opacity(paint, opacity);
        Some(PaintSpec {
            fill: false,
            paint,
            opacity,
            stroke_width,
            line_cap,
            line_join,
            dash,
        })
    }

    // combine own opacity with layer opacity and color swap, bake it into color alpha
    fn apply_opacity(&self, paint: Paint, opacity: Scalar) -> (Paint, Scalar) {
        let mut opacity = clamp(opacity, 0.0, 1.0) * self.layer_opacity;
        let mut paint = paint;
        if let Some(swap) = self.options.color_swap {
            if let Paint::Color(color) = paint {
                if color.same_rgb(swap.search) {
                    paint = Paint::Color(swap.replace.with_alpha(color.alpha()));
                }
            }
            if swap.override_opacity {
                opacity *= swap.replace.alpha() as Scalar / 255.0;
            }
        }
        match paint {
            Paint::Color(color) => (Paint::Color(color.with_opacity(opacity)), opacity),
            paint => (paint, opacity),
        }
    }

    // gradient paint, missing or invalid gradient falls back to black
    fn gradient(&self, id: &str, bbox: Option<BBox>) -> Paint {
        let Some(gradient) = self.gradients.get(id) else {
            tracing::warn!(id, "missing or invalid gradient, using black");
            return Paint::Color(Color::BLACK);
        };
        let mut transform = gradient.transform().unwrap_or_default();
        if gradient.units() == Units::BoundingBox {
            let Some(bbox) = bbox else {
                tracing::warn!(id, "bounding box gradient on empty shape, using black");
                return Paint::Color(Color::BLACK);
            };
            transform = transform
                .pre_translate(bbox.x(), bbox.y())
                .pre_scale(bbox.width(), bbox.height());
        }
        Paint::Gradient(GradientPaint {
            gradient,
            transform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, Point, assert_approx_eq};

    fn paint_state<'a>(elements: &[Element<'a>]) -> PaintState<'a> {
        elements.iter().fold(PaintState::default(), |state, element| {
            state.inherit(&Properties::new(element))
        })
    }

    #[test]
    fn test_dash() {
        let dash = Dash::parse("5, 3 2", 22.0).unwrap();
        assert_eq!(dash.intervals(), &[5.0, 3.0, 2.0, 5.0, 3.0, 2.0]);
        assert_approx_eq!(dash.offset(), 2.0);
        assert_approx_eq!(dash.total(), 20.0);

        let dash = Dash::parse("x 4 y", -1.0).unwrap();
        assert_eq!(dash.intervals(), &[1.0, 4.0, 4.0, 1.0, 4.0, 4.0]);
        assert_approx_eq!(dash.offset(), 17.0);

        assert!(Dash::parse("none", 0.0).is_none());
        assert!(Dash::parse("", 0.0).is_none());
        assert!(Dash::parse("0 0", 0.0).is_none());
        assert!(Dash::parse("5 -1", 0.0).is_none());
    }

    #[test]
    fn test_inheritance() {
        let elements = [
            Element::new("g", [("fill", "red"), ("stroke-width", "3")]),
            Element::new("g", [("style", "fill:inherit;stroke:blue")]),
            Element::new("rect", [("stroke-width", "bad")]),
        ];
        let state = paint_state(&elements);
        assert_eq!(state.get(FILL), Some("red"));
        assert_eq!(state.get(STROKE), Some("blue"));
        assert_eq!(state.get(STROKE_WIDTH), Some("bad"));
        assert_eq!(state.number(STROKE_WIDTH), None);
    }

    #[test]
    fn test_resolve() {
        let options = ParseOptions::default();
        let gradients = GradientRegistry::default();
        let resolver = PaintResolver {
            options: &options,
            gradients: &gradients,
            layer_opacity: 0.5,
        };

        // default fill is black, stroke is absent
        let state = PaintState::default();
        let fill = resolver.fill(&state, None, None).unwrap();
        assert_eq!(fill.color(), Some(Color::new(0, 0, 0, 128)));
        assert!(resolver.stroke(&state, None, None).is_none());

        let elements = [Element::new(
            "rect",
            [
                ("fill", "none"),
                ("stroke", "#ff0000"),
                ("stroke-opacity", "0.5"),
                ("stroke-width", "4"),
                ("stroke-linecap", "round"),
                ("stroke-linejoin", "zigzag"),
                ("stroke-miterlimit", "10"),
                ("stroke-dasharray", "1 2"),
            ],
        )];
        let state = paint_state(&elements);
        assert!(resolver.fill(&state, None, None).is_none());
        let stroke = resolver.stroke(&state, None, None).unwrap();
        assert!(!stroke.fill);
        assert_approx_eq!(stroke.opacity, 0.25);
        assert_eq!(stroke.color(), Some(Color::new(255, 0, 0, 64)));
        assert_approx_eq!(stroke.stroke_width, 4.0);
        assert_eq!(stroke.line_cap, LineCap::Round);
        assert_eq!(stroke.line_join, LineJoin::Miter(10.0));
        assert_eq!(stroke.dash.as_ref().map(Dash::intervals), Some(&[1.0, 2.0][..]));

        // own opacity wins over stroke-opacity
        let stroke = resolver.stroke(&state, Some(1.0), None).unwrap();
        assert_approx_eq!(stroke.opacity, 0.5);

        // unknown stroke is not drawn, unknown fill is black, zero width is not drawn
        let elements = [Element::new(
            "rect",
            [("fill", "nocolor"), ("stroke", "nocolor")],
        )];
        let state = paint_state(&elements);
        assert!(resolver.stroke(&state, None, None).is_none());
        assert_eq!(
            resolver.fill(&state, Some(1.0), None).unwrap().color(),
            Some(Color::new(0, 0, 0, 128))
        );
        let elements = [Element::new("rect", [("stroke", "red"), ("stroke-width", "0")])];
        assert!(resolver.stroke(&paint_state(&elements), None, None).is_none());
    }

    #[test]
    fn test_color_swap_and_white_mode() {
        let gradients = GradientRegistry::default();
        let elements = [Element::new("rect", [("fill", "#00ff00"), ("stroke", "blue")])];
        let state = paint_state(&elements);

        let options = ParseOptions::new().with_color_swap(
            Color::new(0, 255, 0, 255),
            Color::new(1, 2, 3, 51),
            true,
        );
        let resolver = PaintResolver {
            options: &options,
            gradients: &gradients,
            layer_opacity: 1.0,
        };
        let fill = resolver.fill(&state, None, None).unwrap();
        assert_eq!(fill.color(), Some(Color::new(1, 2, 3, 51)));
        let stroke = resolver.stroke(&state, None, None).unwrap();
        assert_eq!(stroke.color(), Some(Color::new(0, 0, 255, 51)));

        let options = ParseOptions::new().with_white_mode(true);
        let resolver = PaintResolver {
            options: &options,
            gradients: &gradients,
            layer_opacity: 0.5,
        };
        let fill = resolver.fill(&state, Some(0.1), None).unwrap();
        assert_eq!(fill.color(), Some(Color::WHITE));
        assert!(resolver.stroke(&state, None, None).is_none());
    }

    #[test]
    fn test_paint_value() -> Result<(), SvgError> {
        assert_eq!(PaintValue::parse(" none ")?, PaintValue::None);
        assert_eq!(PaintValue::parse("url(#grad)")?, PaintValue::Url("grad"));
        assert_eq!(PaintValue::parse("url('#grad') red")?, PaintValue::Url("grad"));
        assert_eq!(
            PaintValue::parse("#abc")?,
            PaintValue::Color(Color::new(0xaa, 0xbb, 0xcc, 255))
        );
        assert!(PaintValue::parse("url(#grad").is_err());
        assert!(PaintValue::parse("nocolor").is_err());
        Ok(())
    }

    #[test]
    fn test_missing_gradient_fallback() {
        let options = ParseOptions::default();
        let gradients = GradientRegistry::default();
        let resolver = PaintResolver {
            options: &options,
            gradients: &gradients,
            layer_opacity: 1.0,
        };
        let elements = [Element::new("rect", [("fill", "url(#missing)")])];
        let bbox = BBox::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let fill = resolver.fill(&paint_state(&elements), None, Some(bbox)).unwrap();
        assert_eq!(fill.color(), Some(Color::BLACK));
    }
}
