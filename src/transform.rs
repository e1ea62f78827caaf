//! SVG transform list compiler
//!
//! See [SVG Transform Attribute](https://www.w3.org/TR/SVG11/coords.html#TransformAttribute)
use crate::{PI, Scalar, Scanner, SvgError, Transform};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Matrix,
    Rotate,
    Translate,
    TranslateX,
    TranslateY,
    Scale,
    ScaleX,
    ScaleY,
    SkewX,
    SkewY,
}

impl Op {
    fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "matrix" => Op::Matrix,
            "rotate" => Op::Rotate,
            "translate" => Op::Translate,
            "translateX" => Op::TranslateX,
            "translateY" => Op::TranslateY,
            "scale" => Op::Scale,
            "scaleX" => Op::ScaleX,
            "scaleY" => Op::ScaleY,
            "skewX" => Op::SkewX,
            "skewY" => Op::SkewY,
            _ => return None,
        };
        Some(op)
    }
}

fn invalid_units(value: Scalar, units: &str) -> SvgError {
    SvgError::InvalidAttribute {
        name: "transform",
        value: format!("{value}{units}"),
    }
}

// angle in radians
fn angle((value, units): (Scalar, &str)) -> Result<Scalar, SvgError> {
    match units {
        "" | "deg" => Ok(value * PI / 180.0),
        "rad" => Ok(value),
        _ => Err(invalid_units(value, units)),
    }
}

fn length((value, units): (Scalar, &str)) -> Result<Scalar, SvgError> {
    match units {
        "" | "px" => Ok(value),
        _ => Err(invalid_units(value, units)),
    }
}

fn number((value, units): (Scalar, &str)) -> Result<Scalar, SvgError> {
    match units {
        "" => Ok(value),
        _ => Err(invalid_units(value, units)),
    }
}

// numbers with optional units separated by spaces or commas
fn parse_args(args: &str) -> Result<Vec<(Scalar, &str)>, SvgError> {
    let mut scanner = Scanner::new(args);
    let mut result = Vec::new();
    while let Some(arg) = scanner.number_units()? {
        result.push(arg);
    }
    scanner.skip_separators();
    if scanner.peek().is_some() {
        return Err(SvgError::InvalidAttribute {
            name: "transform",
            value: args.to_owned(),
        });
    }
    Ok(result)
}

fn op_transform(op: Op, args: &[(Scalar, &str)]) -> Result<Transform, SvgError> {
    let tr = match (op, args) {
        (Op::Matrix, &[a, b, c, d, e, f]) => Transform::new(
            number(a)?,
            number(c)?,
            number(e)?,
            number(b)?,
            number(d)?,
            number(f)?,
        ),
        (Op::Rotate, &[a]) => Transform::new_rotate(angle(a)?),
        (Op::Rotate, &[a, cx, cy]) => {
            Transform::identity().pre_rotate_around(angle(a)?, (length(cx)?, length(cy)?))
        }
        (Op::Translate | Op::TranslateX, &[tx]) => Transform::new_translate(length(tx)?, 0.0),
        (Op::Translate, &[tx, ty]) => Transform::new_translate(length(tx)?, length(ty)?),
        (Op::TranslateY, &[ty]) => Transform::new_translate(0.0, length(ty)?),
        (Op::Scale, &[s]) => {
            let s = number(s)?;
            Transform::new_scale(s, s)
        }
        (Op::Scale, &[sx, sy]) => Transform::new_scale(number(sx)?, number(sy)?),
        (Op::ScaleX, &[sx]) => Transform::new_scale(number(sx)?, 1.0),
        (Op::ScaleY, &[sy]) => Transform::new_scale(1.0, number(sy)?),
        (Op::SkewX, &[ax]) => Transform::new_skew(angle(ax)?, 0.0),
        (Op::SkewY, &[ay]) => Transform::new_skew(0.0, angle(ay)?),
        _ => {
            return Err(SvgError::InvalidAttribute {
                name: "transform",
                value: format!("{:?} with {} arguments", op, args.len()),
            });
        }
    };
    Ok(tr)
}

/// Splits transform list into `name(args)` calls
struct SvgTransformParser<'a> {
    text: &'a str,
    scanner: Scanner<'a>,
}

impl<'a> SvgTransformParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            scanner: Scanner::new(text),
        }
    }

    // parse next call, none indicates end of input
    fn parse_call(&mut self) -> Option<(&'a str, &'a str)> {
        loop {
            self.scanner.skip_separators();
            self.scanner.peek()?;
            let offset = self.scanner.offset();
            let name = self.scanner.ident();
            self.scanner.skip_spaces();
            if name.is_empty() || self.scanner.peek() != Some(b'(') {
                let garbage = if name.is_empty() {
                    self.scanner.bump()
                } else {
                    None
                };
                tracing::warn!(offset, name, ?garbage, "transform function expected");
                continue;
            }
            let start = self.scanner.offset() + 1;
            let Some(end) = self.text[start..].find(')').map(|end| start + end) else {
                tracing::warn!(offset, name, "unterminated transform function");
                return None;
            };
            self.scanner = Scanner::with_offset(self.text, end + 1);
            return Some((name, &self.text[start..end]));
        }
    }
}

impl Iterator for SvgTransformParser<'_> {
    type Item = Result<Transform, SvgError>;

    /// Next function contribution, unknown functions contribute identity
    fn next(&mut self) -> Option<Self::Item> {
        let (name, args) = self.parse_call()?;
        let Some(op) = Op::from_name(name) else {
            tracing::warn!(function = name, "unknown transform function");
            return Some(Ok(Transform::identity()));
        };
        Some(parse_args(args).and_then(|args| op_transform(op, &args)))
    }
}

/// Compile `transform` attribute into a single matrix
///
/// Functions are composed left to right with pre-multiplication, so the last
/// function is the first one applied to a point. Unknown functions are skipped
/// and a function with malformed arguments contributes identity.
pub fn parse_transform(text: &str) -> Transform {
    SvgTransformParser::new(text).fold(Transform::identity(), |tr, tr_next| match tr_next {
        Ok(tr_next) => tr.pre_concat(tr_next),
        Err(error) => {
            tracing::debug!(transform = text, %error, "ignoring transform function");
            tr
        }
    })
}

impl FromStr for Transform {
    type Err = SvgError;

    /// Strict version of [`parse_transform`], fails on malformed arguments
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut tr = Transform::identity();
        for tr_next in SvgTransformParser::new(text) {
            tr = tr * tr_next?;
        }
        Ok(tr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, assert_approx_eq};

    #[test]
    fn test_parse_transform() -> Result<(), SvgError> {
        let tr_str = r#"
            translate(1 2)
            skewX(30deg)
            matrix(1  2 3 4 -3-7)
            scale(2,1)
            rotate(10 1 2)
            rotate(1rad)
        "#;
        let tr_fmt = "matrix(6.56129 5.23393 -1.92617 -2.14614 -5.23999 -4.1231)";
        let tr = Transform::from_str(tr_str)?;
        assert_eq!(format!("{tr:?}"), tr_fmt);
        let tr = Transform::from_str(tr_fmt)?;
        assert_eq!(format!("{tr:?}"), tr_fmt);
        assert_eq!(parse_transform(tr_str), Transform::from_str(tr_str)?);
        Ok(())
    }

    #[test]
    fn test_chain_order() {
        let tr = parse_transform("translate(10,0) scale(2)");
        let p = tr.apply(Point::new(1.0, 0.0));
        assert_approx_eq!(p.x(), 12.0);
        assert_approx_eq!(p.y(), 0.0);

        let tr = parse_transform("translateX(5)translateY(-5)scaleY(3)");
        let p = tr.apply(Point::new(1.0, 1.0));
        assert_approx_eq!(p.x(), 6.0);
        assert_approx_eq!(p.y(), -2.0);
    }

    #[test]
    fn test_rotate_around_center() {
        let tr = parse_transform("rotate(90 10 0)");
        let p = tr.apply(Point::new(20.0, 0.0));
        assert_approx_eq!(p.x(), 10.0, 1e-9);
        assert_approx_eq!(p.y(), 10.0, 1e-9);
    }

    #[test]
    fn test_recovery() {
        // unknown function is skipped
        let tr = parse_transform("perspective(10) translate(3 4)");
        assert_eq!(tr, Transform::new_translate(3.0, 4.0));

        // malformed arguments contribute identity
        let tr = parse_transform("scale(2 x) translate(3) rotate(1 2) skewX(1cm)");
        assert_eq!(tr, Transform::new_translate(3.0, 0.0));

        // garbage between functions and unterminated call
        let tr = parse_transform("; translate(1 1) ?? scale(2");
        assert_eq!(tr, Transform::new_translate(1.0, 1.0));

        assert!(parse_transform("").is_identity());
        assert!(Transform::from_str("scale(1 2 3)").is_err());
    }
}
