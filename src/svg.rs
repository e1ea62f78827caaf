//! SVG path data compiler
//!
//! See [SVG Path Specification](https://www.w3.org/TR/SVG11/paths.html#PathData)
use crate::{
    EllipArc, Geometry, GeometryBuilder, Point, Scalar, Scanner, SvgError, scan::is_command,
};
use std::str::FromStr;

/// Possible SVG path commands, coordinates are already absolute
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SvgPathCmd {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    ArcTo {
        radii: Point,
        x_axis_rot: Scalar,
        large: bool,
        sweep: bool,
        dst: Point,
    },
    Close(Point),
}

impl SvgPathCmd {
    /// Get destination point of the SVG command
    pub fn dst(&self) -> Point {
        use SvgPathCmd::*;
        *match self {
            MoveTo(dst) => dst,
            LineTo(dst) => dst,
            QuadTo(_, dst) => dst,
            CubicTo(_, _, dst) => dst,
            ArcTo { dst, .. } => dst,
            Close(dst) => dst,
        }
    }

    /// Apply SVG command to geometry builder
    ///
    /// Arcs are resolved to the center parametrization. An arc with a zero radius
    /// becomes a line, an arc ending where it starts is dropped.
    pub fn apply(&self, builder: &mut GeometryBuilder) {
        use SvgPathCmd::*;
        match *self {
            MoveTo(p) => builder.move_to(p),
            LineTo(p) => builder.line_to(p),
            QuadTo(p1, p2) => builder.quad_to(p1, p2),
            CubicTo(p1, p2, p3) => builder.cubic_to(p1, p2, p3),
            Close(_) => builder.close(),
            ArcTo {
                radii,
                x_axis_rot,
                large,
                sweep,
                dst,
            } => {
                let src = builder.position();
                match EllipArc::new_param(src, dst, radii.x(), radii.y(), x_axis_rot, large, sweep)
                {
                    Some(arc) => builder.arc_to(arc),
                    None if src.is_close_to(dst) => builder,
                    None => builder.line_to(dst),
                }
            }
        };
    }
}

/// Path parser for SVG encoded path
pub struct SvgPathParser<'a> {
    scanner: Scanner<'a>,
    // previous operation
    prev_op: Option<u8>,
    // previous command (used to determine smooth points)
    prev_cmd: Option<SvgPathCmd>,
    // current position from which next relative curve will start
    position: Point,
    // current sub-path starting position
    subpath_start: Point,
}

impl<'a> SvgPathParser<'a> {
    pub fn new(data: &'a str) -> Self {
        Self {
            scanner: Scanner::new(data),
            prev_op: None,
            prev_cmd: None,
            position: Point::new(0.0, 0.0),
            subpath_start: Point::new(0.0, 0.0),
        }
    }

    /// Current position of the pen
    pub fn position(&self) -> Point {
        self.position
    }

    // parse pair of scalars and convert it to a point
    fn parse_point(&mut self) -> Result<Point, SvgError> {
        let point = Point::new(
            self.scanner.expect_number()?,
            self.scanner.expect_number()?,
        );
        match self.prev_op {
            Some(cmd) if cmd.is_ascii_lowercase() => Ok(point + self.position),
            _ => Ok(point),
        }
    }

    // parse svg command, none indicates end of input
    fn parse_op(&mut self) -> Option<u8> {
        loop {
            self.scanner.skip_separators();
            let byte = self.scanner.peek()?;
            if is_command(byte) {
                self.scanner.bump();
                self.prev_op = match byte {
                    b'm' => Some(b'l'),
                    b'M' => Some(b'L'),
                    b'Z' | b'z' => None,
                    op => Some(op),
                };
                return Some(byte);
            }
            // implicit repetition of the previous command
            if let (Some(op), b'0'..=b'9' | b'+' | b'-' | b'.') = (self.prev_op, byte) {
                return Some(op);
            }
            let offset = self.scanner.offset();
            if let Some(cmd) = self.scanner.bump() {
                tracing::warn!(offset, %cmd, "unknown path command");
            }
        }
    }

    /// Parse single SVG path command from the input
    pub fn parse_cmd(&mut self) -> Result<Option<SvgPathCmd>, SvgError> {
        let op = match self.parse_op() {
            None => return Ok(None),
            Some(op) => op,
        };
        let cmd = match op {
            b'M' | b'm' => {
                let dst = self.parse_point()?;
                self.subpath_start = dst;
                SvgPathCmd::MoveTo(dst)
            }
            b'L' | b'l' => SvgPathCmd::LineTo(self.parse_point()?),
            b'V' | b'v' => {
                let y = self.scanner.expect_number()?;
                let p0 = self.position;
                let p1 = if op == b'v' {
                    Point::new(p0.x(), p0.y() + y)
                } else {
                    Point::new(p0.x(), y)
                };
                SvgPathCmd::LineTo(p1)
            }
            b'H' | b'h' => {
                let x = self.scanner.expect_number()?;
                let p0 = self.position;
                let p1 = if op == b'h' {
                    Point::new(p0.x() + x, p0.y())
                } else {
                    Point::new(x, p0.y())
                };
                SvgPathCmd::LineTo(p1)
            }
            b'Q' | b'q' => SvgPathCmd::QuadTo(self.parse_point()?, self.parse_point()?),
            b'T' | b't' => {
                let p1 = match self.prev_cmd {
                    Some(SvgPathCmd::QuadTo(p1, p2)) => p1.reflect(p2),
                    _ => self.position,
                };
                let p2 = self.parse_point()?;
                SvgPathCmd::QuadTo(p1, p2)
            }
            b'C' | b'c' => SvgPathCmd::CubicTo(
                self.parse_point()?,
                self.parse_point()?,
                self.parse_point()?,
            ),
            b'S' | b's' => {
                let p1 = match self.prev_cmd {
                    Some(SvgPathCmd::CubicTo(_, p2, p3)) => p2.reflect(p3),
                    _ => self.position,
                };
                let p2 = self.parse_point()?;
                let p3 = self.parse_point()?;
                SvgPathCmd::CubicTo(p1, p2, p3)
            }
            b'A' | b'a' => {
                let rx = self.scanner.expect_number()?;
                let ry = self.scanner.expect_number()?;
                let x_axis_rot = self.scanner.expect_number()?;
                let large = self.scanner.flag()?;
                let sweep = self.scanner.flag()?;
                let dst = self.parse_point()?;
                SvgPathCmd::ArcTo {
                    radii: Point::new(rx, ry),
                    x_axis_rot,
                    large,
                    sweep,
                    dst,
                }
            }
            _ => SvgPathCmd::Close(self.subpath_start),
        };
        self.position = cmd.dst();
        self.prev_cmd = Some(cmd);
        Ok(self.prev_cmd)
    }
}

impl Iterator for SvgPathParser<'_> {
    type Item = Result<SvgPathCmd, SvgError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.parse_cmd().transpose()
    }
}

impl FromStr for Geometry {
    type Err = SvgError;

    /// Compile SVG path data
    ///
    /// Closing a subpath reopens a new one at its start, the `MoveTo` is only
    /// emitted if something is drawn afterwards. Drawing commands without a
    /// preceding `MoveTo` start at the origin.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut builder = Geometry::builder();
        let mut reopen = Some(Point::new(0.0, 0.0));
        for cmd in SvgPathParser::new(data) {
            let cmd = cmd?;
            match cmd {
                SvgPathCmd::MoveTo(_) => reopen = None,
                SvgPathCmd::Close(start) => {
                    if reopen.replace(start).is_some() {
                        // nothing was drawn since the subpath was (re)opened
                        continue;
                    }
                }
                _ => {
                    if let Some(start) = reopen.take() {
                        builder.move_to(start);
                    }
                }
            }
            cmd.apply(&mut builder);
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PathSegment, assert_approx_eq};

    fn segments(data: &str) -> Result<Vec<PathSegment>, SvgError> {
        Ok(data.parse::<Geometry>()?.into_segments())
    }

    #[test]
    fn test_close_returns_to_start() -> Result<(), SvgError> {
        let data = "M10,10 L20,20 Z";
        assert_eq!(
            segments(data)?,
            vec![
                PathSegment::MoveTo(Point::new(10.0, 10.0)),
                PathSegment::LineTo(Point::new(20.0, 20.0)),
                PathSegment::Close,
            ]
        );
        let mut parser = SvgPathParser::new(data);
        while parser.parse_cmd()?.is_some() {}
        assert!(parser.position().is_close_to(Point::new(10.0, 10.0)));
        Ok(())
    }

    #[test]
    fn test_draw_after_close() -> Result<(), SvgError> {
        // subpath is reopened at the previous start
        assert_eq!(
            segments("M1,1 h4 z l0,4 z")?,
            vec![
                PathSegment::MoveTo(Point::new(1.0, 1.0)),
                PathSegment::LineTo(Point::new(5.0, 1.0)),
                PathSegment::Close,
                PathSegment::MoveTo(Point::new(1.0, 1.0)),
                PathSegment::LineTo(Point::new(1.0, 5.0)),
                PathSegment::Close,
            ]
        );
        // redundant close is dropped, relative move is relative to the start
        assert_eq!(
            segments("m2 2 l1 0 z z m1 1")?,
            vec![
                PathSegment::MoveTo(Point::new(2.0, 2.0)),
                PathSegment::LineTo(Point::new(3.0, 2.0)),
                PathSegment::Close,
                PathSegment::MoveTo(Point::new(3.0, 3.0)),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_implicit_repetition() -> Result<(), SvgError> {
        assert_eq!(
            segments("M0,0 10,10 20,5")?,
            vec![
                PathSegment::MoveTo(Point::new(0.0, 0.0)),
                PathSegment::LineTo(Point::new(10.0, 10.0)),
                PathSegment::LineTo(Point::new(20.0, 5.0)),
            ]
        );
        assert_eq!(
            segments("m1 1 1 1 h1 1 v-2")?,
            vec![
                PathSegment::MoveTo(Point::new(1.0, 1.0)),
                PathSegment::LineTo(Point::new(2.0, 2.0)),
                PathSegment::LineTo(Point::new(3.0, 2.0)),
                PathSegment::LineTo(Point::new(4.0, 2.0)),
                PathSegment::LineTo(Point::new(4.0, 0.0)),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_smooth_cubic() -> Result<(), SvgError> {
        let segs = segments("M0 0 C 1 2 3 2 4 0 S 7 -2 8 0 s 1 1 2 0")?;
        match segs.as_slice() {
            [
                PathSegment::MoveTo(_),
                PathSegment::CubicTo(_, c2, p),
                PathSegment::CubicTo(s1, s2, s3),
                PathSegment::CubicTo(r1, _, r3),
            ] => {
                assert!(s1.is_close_to(c2.reflect(*p)));
                assert!(s1.is_close_to(Point::new(5.0, -2.0)));
                assert!(r1.is_close_to(s2.reflect(*s3)));
                assert!(r3.is_close_to(Point::new(10.0, 0.0)));
            }
            segs => panic!("unexpected segments {segs:?}"),
        }

        // without a preceding cubic the first control point is the current point
        let segs = segments("M1 1 S 2 2 3 1")?;
        assert_eq!(
            segs[1],
            PathSegment::CubicTo(Point::new(1.0, 1.0), Point::new(2.0, 2.0), Point::new(3.0, 1.0))
        );
        Ok(())
    }

    #[test]
    fn test_quad_elevated() -> Result<(), SvgError> {
        let segs = segments("M0 0 Q 3 3 6 0 T 12 0")?;
        assert_eq!(segs.len(), 3);
        match segs[2] {
            PathSegment::CubicTo(p1, _, p3) => {
                // reflected quad control point is (9, -3)
                assert!(p1.dist(Point::new(8.0, -2.0)) < 1e-9);
                assert!(p3.dist(Point::new(12.0, 0.0)) < 1e-9);
            }
            seg => panic!("unexpected segment {seg:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_arc() -> Result<(), SvgError> {
        let segs = segments("M0 0 A 10 10 0 0 1 10 0")?;
        let arc = segs[1].arc().expect("arc expected");
        assert_approx_eq!(arc.center().x(), 5.0, 1e-9);
        assert_approx_eq!(arc.center().y(), 75.0f64.sqrt(), 1e-9);
        assert_approx_eq!(arc.sweep_angle(), 60.0, 1e-9);

        // zero radius degrades to a line
        assert_eq!(
            segments("M0 0 A 0 5 0 0 1 10 0")?,
            vec![
                PathSegment::MoveTo(Point::new(0.0, 0.0)),
                PathSegment::LineTo(Point::new(10.0, 0.0)),
            ]
        );
        // coincident endpoints is a no-op
        assert_eq!(segments("M3 3 a 5 5 0 1 1 0 0")?.len(), 1);
        // flags without separators
        let segs = segments("M0 0a5 5 0 015 5")?;
        assert!(segs[1].arc().is_some());
        Ok(())
    }

    #[test]
    fn test_errors_and_garbage() -> Result<(), SvgError> {
        // unknown command is skipped
        assert_eq!(
            segments("M0 0 X L 1 1")?,
            vec![
                PathSegment::MoveTo(Point::new(0.0, 0.0)),
                PathSegment::LineTo(Point::new(1.0, 1.0)),
            ]
        );
        // drawing without a move starts at the origin
        assert_eq!(
            segments("L 1 1")?,
            vec![
                PathSegment::MoveTo(Point::new(0.0, 0.0)),
                PathSegment::LineTo(Point::new(1.0, 1.0)),
            ]
        );
        assert!(segments("M 0 0 L 1").is_err());
        assert!(segments("M 0 0 A 1 1 0 2 0 1 1").is_err());
        assert!(segments("")?.is_empty());
        Ok(())
    }
}
