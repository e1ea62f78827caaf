//! Presentation attribute and inline style resolution
use crate::{Element, Scalar, Scanner, SvgError};

/// Split inline `style` declaration `key: value; key: value` into pairs
pub fn parse_style(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|declaration| {
        let (key, value) = declaration.split_once(':')?;
        let key = key.trim();
        (!key.is_empty()).then(|| (key, value.trim()))
    })
}

/// Parse length or number, `px` suffix is ignored and `%` divides value by 100
pub fn parse_length(name: &'static str, value: &str) -> Result<Scalar, SvgError> {
    let invalid = || SvgError::InvalidAttribute {
        name,
        value: value.to_owned(),
    };
    let mut scanner = Scanner::new(value.trim());
    let (number, mut units) = scanner.number_units()?.ok_or_else(invalid)?;
    if units.is_empty() && scanner.peek() == Some(b'%') {
        scanner.bump();
        units = "%";
    }
    if scanner.peek().is_some() {
        return Err(invalid());
    }
    match units {
        "" | "px" => Ok(number),
        "%" => Ok(number / 100.0),
        _ => Err(invalid()),
    }
}

/// Element properties, inline style declarations take precedence over attributes
///
/// Returned values borrow from the document, not from the element.
#[derive(Debug, Clone)]
pub struct Properties<'e, 'a> {
    element: &'e Element<'a>,
    style: Vec<(&'a str, &'a str)>,
}

impl<'e, 'a> Properties<'e, 'a> {
    pub fn new(element: &'e Element<'a>) -> Self {
        let style = element
            .attribute("style")
            .map(|style| parse_style(style).collect())
            .unwrap_or_default();
        Self { element, style }
    }

    pub fn element(&self) -> &'e Element<'a> {
        self.element
    }

    /// Property value, the last style declaration wins, then the attribute
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.style
            .iter()
            .rev()
            .find_map(|(key, value)| (*key == name).then_some(*value))
            .or_else(|| self.element.attribute(name))
    }

    /// Raw attribute, ignoring inline style
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.element.attribute(name)
    }

    /// Length valued attribute (style is ignored), `None` if it is missing
    pub fn length(&self, name: &'static str) -> Result<Option<Scalar>, SvgError> {
        self.attribute(name)
            .map(|value| parse_length(name, value))
            .transpose()
    }

    /// Length valued attribute which must be present
    pub fn required_length(&self, name: &'static str) -> Result<Scalar, SvgError> {
        self.length(name)?.ok_or(SvgError::MissingAttribute(name))
    }

    /// Numeric property, malformed values are reported and treated as missing
    pub fn number(&self, name: &'static str) -> Option<Scalar> {
        let value = self.get(name)?;
        match parse_length(name, value) {
            Ok(number) => Some(number),
            Err(error) => {
                tracing::warn!(element = self.element.name(), %error, "ignoring property");
                None
            }
        }
    }

    /// Whether element has `display: none`
    pub fn is_hidden(&self) -> bool {
        self.get("display").is_some_and(|display| display == "none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_wins() {
        let element = Element::new(
            "rect",
            [
                ("fill", "red"),
                ("stroke", "blue"),
                ("x", "5px"),
                ("style", " fill : #00ff00 ;; stroke-width:2;bad;fill:none"),
            ],
        );
        let props = Properties::new(&element);
        assert_eq!(props.get("fill"), Some("none"));
        assert_eq!(props.get("stroke"), Some("blue"));
        assert_eq!(props.get("stroke-width"), Some("2"));
        assert_eq!(props.get("bad"), None);
        assert_eq!(props.number("stroke-width"), Some(2.0));
        assert_eq!(props.length("x").unwrap(), Some(5.0));
        assert_eq!(props.length("y").unwrap(), None);
        assert!(matches!(
            props.required_length("width"),
            Err(SvgError::MissingAttribute("width"))
        ));
        assert!(!props.is_hidden());

        let element = Element::new("g", [("display", "inline"), ("style", "display:none")]);
        assert!(Properties::new(&element).is_hidden());
    }

    #[test]
    fn test_parse_length() -> Result<(), SvgError> {
        assert_eq!(parse_length("x", "10")?, 10.0);
        assert_eq!(parse_length("x", " 2.5px ")?, 2.5);
        assert_eq!(parse_length("x", "50%")?, 0.5);
        assert_eq!(parse_length("x", "-1e1")?, -10.0);
        assert!(parse_length("x", "3cm").is_err());
        assert!(parse_length("x", "1 2").is_err());
        assert!(parse_length("x", "").is_err());
        assert!(parse_length("x", "auto").is_err());
        Ok(())
    }
}
