use crate::{Scalar, Scanner, clamp};
use bytemuck::{Pod, Zeroable};
use std::{fmt, str::FromStr};

/// CSS extended color keywords, sorted, one `name #rrggbb` per line
static SVG_COLORS: &str = include_str!("./svg-colors.txt");

/// sRGB color with straight (not premultiplied) alpha, 8 bits per channel
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Pod, Zeroable)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Construct color from `0xAARRGGBB` packed value
    pub const fn from_argb(argb: u32) -> Self {
        Self::new(
            ((argb >> 16) & 0xff) as u8,
            ((argb >> 8) & 0xff) as u8,
            (argb & 0xff) as u8,
            ((argb >> 24) & 0xff) as u8,
        )
    }

    /// Pack color as `0xAARRGGBB`
    pub const fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn red(self) -> u8 {
        self.r
    }

    pub const fn green(self) -> u8 {
        self.g
    }

    pub const fn blue(self) -> u8 {
        self.b
    }

    pub const fn alpha(self) -> u8 {
        self.a
    }

    /// Replace alpha channel
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self { a: alpha, ..self }
    }

    /// Replace alpha channel with opacity in the range of `[0, 1]`
    pub fn with_opacity(self, opacity: Scalar) -> Self {
        self.with_alpha((clamp(opacity, 0.0, 1.0) * 255.0).round() as u8)
    }

    /// Compare only color channels ignoring alpha
    pub fn same_rgb(self, other: Color) -> bool {
        self.to_rgb() == other.to_rgb()
    }

    /// Convert color to sRGBA list
    pub fn to_rgba(self) -> [u8; 4] {
        bytemuck::cast(self)
    }

    /// Convert color to sRGB list (alpha is discarded)
    pub fn to_rgb(self) -> [u8; 3] {
        let [r, g, b, _] = self.to_rgba();
        [r, g, b]
    }

    /// Find color by its CSS name (case insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        SVG_COLORS.lines().find_map(|line| {
            let (color_name, hex) = line.split_once(' ')?;
            if color_name.eq_ignore_ascii_case(name) {
                hex.parse().ok()
            } else {
                None
            }
        })
    }
}

impl From<[u8; 4]> for Color {
    fn from(rgba: [u8; 4]) -> Self {
        bytemuck::cast(rgba)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color({})", self)
    }
}

/// Formats as `#rrggbb`, or `#aarrggbb` if color is not opaque
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba();
        write!(f, "#")?;
        if a != 255 {
            write!(f, "{:02x}", a)?;
        }
        write!(f, "{:02x}{:02x}{:02x}", r, g, b)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn hex_digit(byte: u8) -> Result<u8, ColorError> {
    match byte {
        b'A'..=b'F' => Ok(byte - b'A' + 10),
        b'a'..=b'f' => Ok(byte - b'a' + 10),
        b'0'..=b'9' => Ok(byte - b'0'),
        _ => Err(ColorError::HexExpected),
    }
}

// parse `r, g, b[, a]` arguments of `rgb(...)` and `rgba(...)`
fn parse_rgb_args(args: &str, with_alpha: bool) -> Result<Color, ColorError> {
    let mut channels = [0u8, 0, 0, 255];
    let mut count = 0;
    for (index, arg) in args.split(',').enumerate() {
        let arg = arg.trim();
        let channel = channels.get_mut(index).ok_or(ColorError::RgbExpected)?;
        let (value, percent) = match arg.strip_suffix('%') {
            Some(value) => (value, true),
            None => (arg, false),
        };
        let mut scanner = Scanner::new(value);
        let value = match scanner.number() {
            Ok(Some(value)) if scanner.rest().trim().is_empty() => value,
            _ => return Err(ColorError::RgbExpected),
        };
        let value = if index == 3 {
            // alpha channel is specified as a fraction of one
            if percent { value / 100.0 } else { value }
        } else if percent {
            value / 100.0
        } else {
            value / 255.0
        };
        *channel = (clamp(value, 0.0, 1.0) * 255.0).round() as u8;
        count += 1;
    }
    if count != if with_alpha { 4 } else { 3 } {
        return Err(ColorError::RgbExpected);
    }
    Ok(channels.into())
}

impl FromStr for Color {
    type Err = ColorError;

    /// Parse `#rgb`, `#rrggbb`, `#aarrggbb`, `rgb(r, g, b)`, `rgba(r, g, b, a)`
    /// or a CSS color name.
    fn from_str(color: &str) -> Result<Self, Self::Err> {
        let color = color.trim();
        if let Some(hex) = color.strip_prefix('#') {
            let digits = hex
                .bytes()
                .map(hex_digit)
                .collect::<Result<Vec<_>, _>>()?;
            let color = match digits.as_slice() {
                [r, g, b] => Color::new(r * 17, g * 17, b * 17, 255),
                [r0, r1, g0, g1, b0, b1] => {
                    Color::new(r0 << 4 | r1, g0 << 4 | g1, b0 << 4 | b1, 255)
                }
                [a0, a1, r0, r1, g0, g1, b0, b1] => Color::new(
                    r0 << 4 | r1,
                    g0 << 4 | g1,
                    b0 << 4 | b1,
                    a0 << 4 | a1,
                ),
                _ => return Err(ColorError::HexExpected),
            };
            Ok(color)
        } else if let Some(args) = strip_function(color, "rgba") {
            parse_rgb_args(args, true)
        } else if let Some(args) = strip_function(color, "rgb") {
            parse_rgb_args(args, false)
        } else {
            Color::from_name(color).ok_or(ColorError::UnknownName)
        }
    }
}

// `name(args)` -> `args`
fn strip_function<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    let prefix = value.get(..name.len())?;
    if !prefix.eq_ignore_ascii_case(name) {
        return None;
    }
    value[name.len()..]
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorError {
    /// `#` followed by 3, 6 or 8 hex digits was expected
    HexExpected,
    /// `rgb(...)` arguments can not be parsed
    RgbExpected,
    /// Not a known color keyword
    UnknownName,
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::HexExpected => write!(f, "color format #rgb, #rrggbb or #aarrggbb expected"),
            ColorError::RgbExpected => write!(f, "color format rgb(r, g, b) expected"),
            ColorError::UnknownName => write!(f, "unknown color name"),
        }
    }
}

impl std::error::Error for ColorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() -> Result<(), ColorError> {
        assert_eq!("#ABC".parse::<Color>()?, "#AABBCC".parse::<Color>()?);
        assert_eq!("#aabbcc".parse::<Color>()?, Color::new(170, 187, 204, 255));
        assert_eq!("#80ff0000".parse::<Color>()?, Color::new(255, 0, 0, 128));
        assert_eq!("#12345".parse::<Color>(), Err(ColorError::HexExpected));
        assert_eq!("#zzz".parse::<Color>(), Err(ColorError::HexExpected));
        Ok(())
    }

    #[test]
    fn test_color_rgb() -> Result<(), ColorError> {
        let color: Color = "rgb(50%,0,0)".parse()?;
        assert_eq!(color.red(), 128);
        assert_eq!(color.alpha(), 255);
        assert_eq!(
            "rgb( 10 , 300, 100% )".parse::<Color>()?,
            Color::new(10, 255, 255, 255)
        );
        assert_eq!(
            "rgba(0, 0, 255, 0.5)".parse::<Color>()?,
            Color::new(0, 0, 255, 128)
        );
        assert_eq!("rgb(1, 2)".parse::<Color>(), Err(ColorError::RgbExpected));
        assert_eq!("rgb(1, x, 2)".parse::<Color>(), Err(ColorError::RgbExpected));
        Ok(())
    }

    #[test]
    fn test_color_names() {
        assert_eq!(Color::from_name("red"), Some(Color::new(255, 0, 0, 255)));
        assert_eq!(Color::from_name("AliceBlue"), Some(Color::new(240, 248, 255, 255)));
        assert_eq!(Color::from_name("yellowgreen"), Some(Color::new(154, 205, 50, 255)));
        assert_eq!("notacolor".parse::<Color>(), Err(ColorError::UnknownName));
        for line in SVG_COLORS.lines() {
            let (name, _) = line.split_once(' ').unwrap();
            assert!(Color::from_name(name).is_some(), "{name}");
        }
    }

    #[test]
    fn test_color_bytes() {
        let color = Color::from_argb(0x80102030);
        assert_eq!(color.to_rgba(), [0x10, 0x20, 0x30, 0x80]);
        assert_eq!(color.to_argb(), 0x80102030);
        assert_eq!(Color::from([1, 2, 3, 4]), Color::new(1, 2, 3, 4));
        assert_eq!(color.to_string(), "#80102030");
        assert_eq!(Color::BLACK.to_string(), "#000000");
        assert_eq!(Color::BLACK.with_opacity(0.5).alpha(), 128);
    }

    #[test]
    fn test_color_display_parse() -> Result<(), ColorError> {
        for color in [
            Color::from_argb(0x80102030),
            Color::TRANSPARENT,
            Color::new(1, 2, 3, 255),
            Color::WHITE.with_opacity(0.25),
        ] {
            assert_eq!(color.to_string().parse::<Color>()?, color);
        }
        Ok(())
    }
}
