use crate::{BBox, Cubic, DEFAULT_LENGTH_TOLERANCE, EllipArc, Point, Quad, Scalar};
use std::fmt;

/// Single drawing command of a [`Geometry`]
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PathSegment {
    /// Start new subpath at the point
    MoveTo(Point),
    /// Line from the current position to the point
    LineTo(Point),
    /// Cubic bezier curve `(control1, control2, end)`
    CubicTo(Point, Point, Point),
    /// Elliptic arc in the center parametrization, angles are in degrees. If the
    /// start of the arc does not coincide with the current position a line
    /// connecting them is implied.
    ArcTo {
        center: Point,
        radii: Point,
        x_axis_rotation: Scalar,
        start_angle: Scalar,
        sweep_angle: Scalar,
    },
    /// Close current subpath with a line to its start
    Close,
}

impl PathSegment {
    /// Arc described by `ArcTo` segment
    pub fn arc(&self) -> Option<EllipArc> {
        match *self {
            PathSegment::ArcTo {
                center,
                radii,
                x_axis_rotation,
                start_angle,
                sweep_angle,
            } => Some(EllipArc::new(
                center,
                radii,
                x_axis_rotation,
                start_angle,
                sweep_angle,
            )),
            _ => None,
        }
    }
}

impl From<EllipArc> for PathSegment {
    fn from(arc: EllipArc) -> Self {
        PathSegment::ArcTo {
            center: arc.center(),
            radii: arc.radii(),
            x_axis_rotation: arc.x_axis_rotation(),
            start_angle: arc.start_angle(),
            sweep_angle: arc.sweep_angle(),
        }
    }
}

impl fmt::Debug for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::MoveTo(p) => write!(f, "MoveTo {:?}", p),
            PathSegment::LineTo(p) => write!(f, "LineTo {:?}", p),
            PathSegment::CubicTo(p1, p2, p3) => write!(f, "CubicTo {:?} {:?} {:?}", p1, p2, p3),
            PathSegment::ArcTo { .. } => match self.arc() {
                Some(arc) => write!(f, "ArcTo {:?}", arc),
                None => Ok(()),
            },
            PathSegment::Close => write!(f, "Close"),
        }
    }
}

/// Ordered list of path segments, possibly containing multiple subpaths each
/// starting with `MoveTo`.
#[derive(Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Geometry {
    segments: Vec<PathSegment>,
}

impl fmt::Debug for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.segments.iter()).finish()
    }
}

impl Geometry {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn builder() -> GeometryBuilder {
        GeometryBuilder::new()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<PathSegment> {
        self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Axis aligned rectangle
    pub fn rect(x: Scalar, y: Scalar, width: Scalar, height: Scalar) -> Self {
        let mut builder = Self::builder();
        builder
            .move_to((x, y))
            .line_to((x + width, y))
            .line_to((x + width, y + height))
            .line_to((x, y + height))
            .close();
        builder.build()
    }

    /// Rectangle with corners rounded by quarter ellipses with radii `rx` and `ry`
    pub fn round_rect(
        x: Scalar,
        y: Scalar,
        width: Scalar,
        height: Scalar,
        rx: Scalar,
        ry: Scalar,
    ) -> Self {
        let rx = rx.min(width / 2.0);
        let ry = ry.min(height / 2.0);
        if rx <= 0.0 || ry <= 0.0 {
            return Self::rect(x, y, width, height);
        }
        let radii = Point::new(rx, ry);
        let (x0, y0, x1, y1) = (x + rx, y + ry, x + width - rx, y + height - ry);
        let mut builder = Self::builder();
        builder
            .move_to((x0, y))
            .line_to((x1, y))
            .arc_to(EllipArc::new(Point::new(x1, y0), radii, 0.0, -90.0, 90.0))
            .line_to((x + width, y1))
            .arc_to(EllipArc::new(Point::new(x1, y1), radii, 0.0, 0.0, 90.0))
            .line_to((x0, y + height))
            .arc_to(EllipArc::new(Point::new(x0, y1), radii, 0.0, 90.0, 90.0))
            .line_to((x, y0))
            .arc_to(EllipArc::new(Point::new(x0, y0), radii, 0.0, 180.0, 90.0))
            .close();
        builder.build()
    }

    /// Full ellipse split into two halves
    pub fn ellipse(center: impl Into<Point>, rx: Scalar, ry: Scalar) -> Self {
        let center = center.into();
        let radii = Point::new(rx, ry);
        let mut builder = Self::builder();
        builder
            .move_to(center + Point::new(rx, 0.0))
            .arc_to(EllipArc::new(center, radii, 0.0, 0.0, 180.0))
            .arc_to(EllipArc::new(center, radii, 0.0, 180.0, 180.0))
            .close();
        builder.build()
    }

    /// Line segment
    pub fn line(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        let mut builder = Self::builder();
        builder.move_to(p0).line_to(p1);
        builder.build()
    }

    /// Connected sequence of points, closed for polygons
    pub fn polyline(points: impl IntoIterator<Item = Point>, close: bool) -> Self {
        let mut builder = Self::builder();
        for (index, point) in points.into_iter().enumerate() {
            if index == 0 {
                builder.move_to(point);
            } else {
                builder.line_to(point);
            }
        }
        if close && !builder.segments.is_empty() {
            builder.close();
        }
        builder.build()
    }

    /// Bounding box of the geometry in its own coordinate space
    pub fn bbox(&self) -> Option<BBox> {
        let mut bbox: Option<BBox> = None;
        let mut position = Point::new(0.0, 0.0);
        let mut start = position;
        let extend = |bbox: Option<BBox>, point: Point| match bbox {
            None => BBox::new(point, point),
            Some(bbox) => bbox.extend(point),
        };
        for segment in self.segments.iter() {
            match *segment {
                PathSegment::MoveTo(p) => {
                    bbox = Some(extend(bbox, p));
                    position = p;
                    start = p;
                }
                PathSegment::LineTo(p) => {
                    bbox = Some(extend(bbox, p));
                    position = p;
                }
                PathSegment::CubicTo(p1, p2, p3) => {
                    bbox = Some(Cubic::new(position, p1, p2, p3).bbox(bbox));
                    position = p3;
                }
                PathSegment::ArcTo { .. } => {
                    if let Some(arc) = segment.arc() {
                        bbox = Some(arc.bbox(bbox));
                        position = arc.end();
                    }
                }
                PathSegment::Close => position = start,
            }
        }
        bbox
    }

    /// Total length of all contours, closing segments of closed contours included
    pub fn length(&self) -> Scalar {
        let mut length = 0.0;
        let mut position = Point::new(0.0, 0.0);
        let mut start = position;
        for segment in self.segments.iter() {
            match *segment {
                PathSegment::MoveTo(p) => {
                    position = p;
                    start = p;
                }
                PathSegment::LineTo(p) => {
                    length += position.dist(p);
                    position = p;
                }
                PathSegment::CubicTo(p1, p2, p3) => {
                    let cubic = Cubic::new(position, p1, p2, p3);
                    length += cubic.length(DEFAULT_LENGTH_TOLERANCE);
                    position = p3;
                }
                PathSegment::ArcTo { .. } => {
                    if let Some(arc) = segment.arc() {
                        length += position.dist(arc.start());
                        length += arc.length(DEFAULT_LENGTH_TOLERANCE);
                        position = arc.end();
                    }
                }
                PathSegment::Close => {
                    length += position.dist(start);
                    position = start;
                }
            }
        }
        length
    }
}

impl IntoIterator for Geometry {
    type Item = PathSegment;
    type IntoIter = std::vec::IntoIter<PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl<'a> IntoIterator for &'a Geometry {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Incremental [`Geometry`] construction
#[derive(Debug, Clone, Default)]
pub struct GeometryBuilder {
    position: Point,
    subpath_start: Point,
    segments: Vec<PathSegment>,
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build geometry
    pub fn build(&mut self) -> Geometry {
        let GeometryBuilder { segments, .. } = std::mem::take(self);
        Geometry { segments }
    }

    /// Current position
    pub fn position(&self) -> Point {
        self.position
    }

    /// Move current position, starting new subpath
    pub fn move_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        self.segments.push(PathSegment::MoveTo(p));
        self.position = p;
        self.subpath_start = p;
        self
    }

    /// Add line from the current position to the specified point
    pub fn line_to(&mut self, p: impl Into<Point>) -> &mut Self {
        let p = p.into();
        self.segments.push(PathSegment::LineTo(p));
        self.position = p;
        self
    }

    /// Add cubic bezier curve
    pub fn cubic_to(
        &mut self,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> &mut Self {
        let p3 = p3.into();
        self.segments
            .push(PathSegment::CubicTo(p1.into(), p2.into(), p3));
        self.position = p3;
        self
    }

    /// Add quadratic bezier curve, it is stored as an equivalent cubic curve
    pub fn quad_to(&mut self, p1: impl Into<Point>, p2: impl Into<Point>) -> &mut Self {
        let Cubic([_, c1, c2, c3]) = Quad::new(self.position, p1, p2).into();
        self.cubic_to(c1, c2, c3)
    }

    /// Add elliptic arc segment
    pub fn arc_to(&mut self, arc: EllipArc) -> &mut Self {
        self.segments.push(arc.into());
        self.position = arc.end();
        self
    }

    /// Close current subpath
    pub fn close(&mut self) -> &mut Self {
        self.segments.push(PathSegment::Close);
        self.position = self.subpath_start;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PI, assert_approx_eq};

    #[test]
    fn test_rect_geometry() {
        let rect = Geometry::rect(1.0, 2.0, 10.0, 20.0);
        assert_eq!(rect.len(), 5);
        assert_eq!(rect.segments()[0], PathSegment::MoveTo(Point::new(1.0, 2.0)));
        assert_eq!(rect.segments()[4], PathSegment::Close);
        assert_approx_eq!(rect.length(), 60.0);
        let bbox = rect.bbox().unwrap();
        assert_eq!(format!("{bbox:?}"), "BBox x=1, y=2, w=10, h=20");
    }

    #[test]
    fn test_round_rect() {
        let rect = Geometry::round_rect(0.0, 0.0, 10.0, 10.0, 2.0, 2.0);
        let arcs = rect.segments().iter().filter(|s| s.arc().is_some()).count();
        assert_eq!(arcs, 4);
        // four straight sides of length 6 and four quarter circles with radius 2
        assert_approx_eq!(rect.length(), 24.0 + 4.0 * PI, 1e-2);
        let bbox = rect.bbox().unwrap();
        assert_approx_eq!(bbox.x(), 0.0, 1e-9);
        assert_approx_eq!(bbox.width(), 10.0, 1e-9);

        // radii are clamped to half of the size
        let pill = Geometry::round_rect(0.0, 0.0, 10.0, 4.0, 5.0, 5.0);
        let bbox = pill.bbox().unwrap();
        assert_approx_eq!(bbox.height(), 4.0, 1e-9);
    }

    #[test]
    fn test_ellipse_geometry() {
        let ellipse = Geometry::ellipse((5.0, 5.0), 3.0, 3.0);
        assert_approx_eq!(ellipse.length(), 6.0 * PI, 1e-2);
        let bbox = ellipse.bbox().unwrap();
        assert_approx_eq!(bbox.x(), 2.0, 1e-6);
        assert_approx_eq!(bbox.y(), 2.0, 1e-6);
        assert_approx_eq!(bbox.width(), 6.0, 1e-6);
    }

    #[test]
    fn test_polyline_length() {
        let points = [(0.0, 0.0), (3.0, 0.0), (3.0, 4.0)].map(Point::from);
        let open = Geometry::polyline(points, false);
        assert_approx_eq!(open.length(), 7.0);
        let closed = Geometry::polyline(points, true);
        assert_approx_eq!(closed.length(), 12.0);
        assert!(Geometry::polyline([], true).is_empty());
    }

    #[test]
    fn test_builder_quad() {
        let mut builder = Geometry::builder();
        builder.move_to((0.0, 0.0)).quad_to((3.0, 3.0), (6.0, 0.0));
        assert!(builder.position().is_close_to(Point::new(6.0, 0.0)));
        let geometry = builder.build();
        match geometry.segments()[1] {
            PathSegment::CubicTo(p1, p2, _) => {
                assert!(p1.is_close_to(Point::new(2.0, 2.0)));
                assert!(p2.is_close_to(Point::new(4.0, 2.0)));
            }
            segment => panic!("unexpected segment {segment:?}"),
        }
    }
}
