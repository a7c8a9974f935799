//! Minimal element tree over `quick-xml` events.
//!
//! Node sets are read into a tree of [`Element`]s first and interpreted
//! afterwards. Element and attribute names are stored without their
//! namespace prefix; `xmlns` declarations are dropped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One XML element with its attributes, text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Value of the attribute with local name `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child with local name `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with local name `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first child named `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }
}

/// A read failure with the byte offset it happened at.
#[derive(Debug)]
pub(crate) struct XmlError {
    pub position: usize,
    pub message: String,
}

/// Parses `input` into its root element.
pub(crate) fn parse(input: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position();
        let event = reader.read_event().map_err(|e| XmlError {
            position,
            message: e.to_string(),
        })?;
        match event {
            Event::Start(start) => stack.push(element(&start, position)?),
            Event::Empty(start) => {
                let el = element(&start, position)?;
                attach(&mut stack, &mut root, el, position)?;
            }
            Event::End(_) => {
                let el = stack.pop().ok_or_else(|| XmlError {
                    position,
                    message: "unbalanced end tag".to_owned(),
                })?;
                attach(&mut stack, &mut root, el, position)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| XmlError {
                    position,
                    message: e.to_string(),
                })?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError {
            position: input.len(),
            message: "unexpected end of document".to_owned(),
        });
    }
    root.ok_or_else(|| XmlError {
        position: 0,
        message: "document has no root element".to_owned(),
    })
}

fn element(start: &BytesStart<'_>, position: usize) -> Result<Element, XmlError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError {
            position,
            message: e.to_string(),
        })?;
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError {
                position,
                message: e.to_string(),
            })?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
    position: usize,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(el);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(el);
            Ok(())
        }
        None => Err(XmlError {
            position,
            message: "more than one root element".to_owned(),
        }),
    }
}
