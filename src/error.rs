use crate::ColorError;
use std::fmt;

/// Error produced while reading an SVG document
///
/// Only structural errors (see [`SvgError::is_structural`]) abort the whole parse,
/// everything else is reported by attribute parsers and causes the offending
/// element to be skipped.
#[derive(Debug)]
pub enum SvgError {
    /// Document is not a well-formed XML
    Xml(roxmltree::Error),
    /// Document contains DOCTYPE declaration
    Doctype,
    /// IO error propagated while reading input stream
    Io(std::io::Error),
    /// Numeric token failed to parse
    InvalidNumber { offset: usize, token: String },
    /// Number was expected but the input ended or a command followed
    NumberExpected { offset: usize },
    /// Arc flag must be `0` or `1`
    InvalidFlag { offset: usize },
    /// Mandatory attribute is missing
    MissingAttribute(&'static str),
    /// Attribute value can not be interpreted
    InvalidAttribute { name: &'static str, value: String },
    /// Color value can not be parsed
    InvalidColor(ColorError),
    /// JSON error
    #[cfg(feature = "serde")]
    Json(serde_json::Error),
}

impl SvgError {
    /// Whether error must abort the whole document
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Xml(_) | Self::Doctype | Self::Io(_))
    }
}

impl fmt::Display for SvgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml(error) => write!(f, "malformed XML: {error}"),
            Self::Doctype => write!(f, "DOCTYPE declarations are not allowed"),
            Self::Io(error) => write!(f, "{error}"),
            Self::InvalidNumber { offset, token } => {
                write!(f, "invalid number {token:?} at offset {offset}")
            }
            Self::NumberExpected { offset } => write!(f, "number expected at offset {offset}"),
            Self::InvalidFlag { offset } => write!(f, "arc flag expected at offset {offset}"),
            Self::MissingAttribute(name) => write!(f, "missing attribute `{name}`"),
            Self::InvalidAttribute { name, value } => {
                write!(f, "invalid value {value:?} of attribute `{name}`")
            }
            Self::InvalidColor(error) => write!(f, "{error}"),
            #[cfg(feature = "serde")]
            Self::Json(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for SvgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Xml(error) => Some(error),
            Self::Io(error) => Some(error),
            Self::InvalidColor(error) => Some(error),
            #[cfg(feature = "serde")]
            Self::Json(error) => Some(error),
            _ => None,
        }
    }
}

impl From<roxmltree::Error> for SvgError {
    fn from(error: roxmltree::Error) -> Self {
        match error {
            roxmltree::Error::DtdDetected => Self::Doctype,
            error => Self::Xml(error),
        }
    }
}

impl From<std::io::Error> for SvgError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<ColorError> for SvgError {
    fn from(error: ColorError) -> Self {
        Self::InvalidColor(error)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for SvgError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl From<SvgError> for std::io::Error {
    fn from(error: SvgError) -> Self {
        match error {
            SvgError::Io(error) => error,
            _ => Self::new(std::io::ErrorKind::InvalidData, error),
        }
    }
}
