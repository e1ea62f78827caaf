//! Bezier curves used to measure and bound path geometry
use crate::{BBox, Point, Scalar, utils::quadratic_solve};
use std::fmt;

/// Default absolute error of the curve length approximation
pub const DEFAULT_LENGTH_TOLERANCE: Scalar = 1e-3;

/// Subdivision depth limit of the length approximation
const LENGTH_MAX_DEPTH: usize = 16;

/// Quadratic bezier curve
#[derive(Clone, Copy, PartialEq)]
pub struct Quad(pub [Point; 3]);

impl fmt::Debug for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Quad([p0, p1, p2]) = self;
        write!(f, "Quad {:?} {:?} {:?}", p0, p1, p2)
    }
}

impl Quad {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into(), p2.into()])
    }

    pub fn points(&self) -> [Point; 3] {
        self.0
    }
}

/// Cubic bezier curve
#[derive(Clone, Copy, PartialEq)]
pub struct Cubic(pub [Point; 4]);

impl fmt::Debug for Cubic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Cubic([p0, p1, p2, p3]) = self;
        write!(f, "Cubic {:?} {:?} {:?} {:?}", p0, p1, p2, p3)
    }
}

impl Cubic {
    pub fn new(
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> Self {
        Self([p0.into(), p1.into(), p2.into(), p3.into()])
    }

    pub fn points(&self) -> [Point; 4] {
        self.0
    }

    pub fn at(&self, t: Scalar) -> Point {
        // at(t) =
        //   (1 - t) ^ 3 * p0 +
        //   3 * (1 - t) ^ 2 * t * p1 +
        //   3 * (1 - t) * t ^ 2 * p2 +
        //   t ^ 3 * p3
        let Self([p0, p1, p2, p3]) = *self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        let (t3, t_3) = (t2 * t1, t_2 * t_1);
        t_3 * p0 + 3.0 * t1 * t_2 * p1 + 3.0 * t2 * t_1 * p2 + t3 * p3
    }

    /// Optimized version of `split_at(0.5)`
    fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2, p3]) = *self;
        let mid = 0.125 * p0 + 0.375 * p1 + 0.375 * p2 + 0.125 * p3;
        let c0 = Self([
            p0,
            0.5 * p0 + 0.5 * p1,
            0.25 * p0 + 0.5 * p1 + 0.25 * p2,
            mid,
        ]);
        let c1 = Self([
            mid,
            0.25 * p1 + 0.5 * p2 + 0.25 * p3,
            0.5 * p2 + 0.5 * p3,
            p3,
        ]);
        (c0, c1)
    }

    /// Arc length of the curve
    ///
    /// Curve is subdivided until the length of its control polygon and the length
    /// of its chord differ by less than `tolerance`, length of each piece is then
    /// estimated as `(chord + polygon) / 2`.
    ///
    /// [Adaptive subdivision and the length and energy of Bezier curves](https://doi.org/10.1016/0925-7721(95)00054-2)
    pub fn length(&self, tolerance: Scalar) -> Scalar {
        let mut length = 0.0;
        let mut stack = vec![(*self, 0)];
        while let Some((cubic, depth)) = stack.pop() {
            let Self([p0, p1, p2, p3]) = cubic;
            let chord = p0.dist(p3);
            let polygon = p0.dist(p1) + p1.dist(p2) + p2.dist(p3);
            if polygon - chord <= tolerance || depth >= LENGTH_MAX_DEPTH {
                length += (chord + polygon) / 2.0;
            } else {
                let (c0, c1) = cubic.split();
                stack.push((c1, depth + 1));
                stack.push((c0, depth + 1));
            }
        }
        length
    }

    /// Extend `init` with a tight bounding box of the curve
    pub fn bbox(&self, init: Option<BBox>) -> BBox {
        let Self([p0, p1, p2, p3]) = *self;
        let bbox = BBox::new(p0, p3).union_opt(init);
        if bbox.contains(p1) && bbox.contains(p2) {
            return bbox;
        }
        let Point([a0, a1]) = -1.0 * p0 + 3.0 * p1 - 3.0 * p2 + 1.0 * p3;
        let Point([b0, b1]) = 2.0 * p0 - 4.0 * p1 + 2.0 * p2;
        let Point([c0, c1]) = -1.0 * p0 + p1;

        // Solve for `curve'(t)_x = 0 || curve'(t)_y = 0`
        quadratic_solve(a0, b0, c0)
            .chain(quadratic_solve(a1, b1, c1))
            .filter(|t| (0.0..=1.0).contains(t))
            .fold(bbox, |bbox, t| bbox.extend(self.at(t)))
    }
}

/// Degree elevation, produces exactly the same curve
impl From<Quad> for Cubic {
    fn from(quad: Quad) -> Self {
        let Quad([p0, p1, p2]) = quad;
        Self([
            p0,
            (1.0 / 3.0) * p0 + (2.0 / 3.0) * p1,
            (2.0 / 3.0) * p1 + (1.0 / 3.0) * p2,
            p2,
        ])
    }
}
