//! Pull style event stream over an XML document
use roxmltree::Node;

/// Element with its attributes, names are local (namespace prefixes are dropped)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'a> {
    name: &'a str,
    attributes: Vec<(&'a str, &'a str)>,
}

impl<'a> Element<'a> {
    pub fn new(name: &'a str, attributes: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            name,
            attributes: attributes.into_iter().collect(),
        }
    }

    fn from_node(node: Node<'a, '_>) -> Self {
        Self {
            name: node.tag_name().name(),
            attributes: node
                .attributes()
                .map(|attr| (attr.name(), attr.value()))
                .collect(),
        }
    }

    /// Local name of the element
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Value of the attribute by its local name
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find_map(|(attr, value)| (*attr == name).then_some(*value))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.attributes.iter().copied()
    }
}

/// Document event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    /// Element is opened
    Open(Element<'a>),
    /// Element with the given name is closed
    Close(&'a str),
    /// Character data
    Text(&'a str),
}

/// Lazy sequence of events produced by depth first traversal of the document
///
/// Only elements and text nodes produce events, the document root itself does not.
pub struct Events<'a, 'input> {
    /// Pending nodes, `true` marks an element waiting for its close event
    stack: Vec<(Node<'a, 'input>, bool)>,
}

impl<'a, 'input> Events<'a, 'input> {
    pub fn new(document: &'a roxmltree::Document<'input>) -> Self {
        Self {
            stack: document
                .root()
                .children()
                .rev()
                .map(|node| (node, false))
                .collect(),
        }
    }
}

impl<'a> Iterator for Events<'a, '_> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, closing) = self.stack.pop()?;
            if closing {
                return Some(Event::Close(node.tag_name().name()));
            }
            if node.is_element() {
                self.stack.push((node, true));
                self.stack
                    .extend(node.children().rev().map(|child| (child, false)));
                return Some(Event::Open(Element::from_node(node)));
            }
            if let Some(text) = node.is_text().then(|| node.text()).flatten() {
                return Some(Event::Text(text));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SvgError;

    #[test]
    fn test_events() -> Result<(), SvgError> {
        let text = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
            <!-- comment -->
            <use xlink:href="#a" width="1"/>
            <text>Hi</text>
        </svg>"##;
        let document = roxmltree::Document::parse(text)?;
        let events: Vec<_> = Events::new(&document)
            .filter(|event| !matches!(event, Event::Text(text) if text.trim().is_empty()))
            .collect();
        assert_eq!(events.len(), 7);
        match &events[1] {
            Event::Open(element) => {
                assert_eq!(element.name(), "use");
                assert_eq!(element.attribute("href"), Some("#a"));
                assert_eq!(element.attribute("width"), Some("1"));
                assert_eq!(element.attribute("height"), None);
            }
            event => panic!("unexpected event {event:?}"),
        }
        assert_eq!(events[2], Event::Close("use"));
        assert_eq!(events[4], Event::Text("Hi"));
        assert_eq!(events[6], Event::Close("svg"));
        Ok(())
    }

    #[test]
    fn test_events_nesting() -> Result<(), SvgError> {
        let text = "<?xml version=\"1.0\"?><!-- head --><svg><g><rect/>a<circle/></g><path/></svg>";
        let document = roxmltree::Document::parse(text)?;
        let events: Vec<_> = Events::new(&document).collect();
        let summary: Vec<_> = events
            .iter()
            .map(|event| match event {
                Event::Open(element) => format!("<{}>", element.name()),
                Event::Close(name) => format!("</{}>", name),
                Event::Text(text) => text.to_string(),
            })
            .collect();
        assert_eq!(
            summary,
            [
                "<svg>", "<g>", "<rect>", "</rect>", "a", "<circle>", "</circle>", "</g>",
                "<path>", "</path>", "</svg>",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_doctype_rejected() {
        let text = r#"<!DOCTYPE svg [<!ENTITY x "y">]><svg>&x;</svg>"#;
        let error = roxmltree::Document::parse(text).map_err(SvgError::from);
        assert!(matches!(error, Err(SvgError::Doctype)));
        let error = roxmltree::Document::parse("<svg><g></svg>").map_err(SvgError::from);
        assert!(matches!(error, Err(SvgError::Xml(_))));
    }
}
