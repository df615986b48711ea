//! Minimal XML element tree.
//!
//! Both publish-settings documents and service-management responses are small,
//! attribute-heavy documents, so they are read into a plain tree of
//! [`Element`]s rather than deserialized into fixed structs. A child lookup
//! reports whether the field was absent, appeared once, or repeated, and
//! [`Field::normalize`] folds all three shapes into an ordered sequence.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{AccountError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

/// Shape of a named child field as it appears in the tree.
#[derive(Debug, PartialEq, Eq)]
pub enum Field<'a> {
    Absent,
    Single(&'a Element),
    Multiple(Vec<&'a Element>),
}

impl<'a> Field<'a> {
    /// Folds absent/single/repeated into an ordered sequence.
    pub fn normalize(self) -> Vec<&'a Element> {
        match self {
            Field::Absent => Vec::new(),
            Field::Single(element) => vec![element],
            Field::Multiple(elements) => elements,
        }
    }
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value, treating an empty string as absent.
    pub fn non_empty_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).filter(|value| !value.trim().is_empty())
    }

    pub fn field(&self, name: &str) -> Field<'_> {
        let mut matches: Vec<&Element> =
            self.children.iter().filter(|child| child.name == name).collect();
        match matches.len() {
            0 => Field::Absent,
            1 => Field::Single(matches.remove(0)),
            _ => Field::Multiple(matches),
        }
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|child| child.text.trim())
    }

    /// Depth-first walk over this element and all descendants.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }
}

/// Parses a complete document and returns its root element.
pub fn parse_document(input: &[u8]) -> Result<Element> {
    let text = std::str::from_utf8(input)
        .map_err(|e| AccountError::XmlParse(format!("document is not valid UTF-8: {}", e)))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(end) => {
                let element = stack.pop().ok_or_else(|| {
                    AccountError::XmlParse(format!(
                        "unexpected closing tag '{}'",
                        String::from_utf8_lossy(end.local_name().as_ref())
                    ))
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(content) => {
                let value = content
                    .unescape()
                    .map_err(|e| AccountError::XmlParse(e.to_string()))?;
                append_text(&mut stack, value)?;
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data).into_owned();
                append_text(&mut stack, Cow::Owned(value))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(AccountError::XmlParse(format!(
            "unexpected end of document inside '{}'",
            open.name
        )));
    }

    root.ok_or_else(|| AccountError::XmlParse("document has no root element".to_string()))
}

fn element_from(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| AccountError::XmlParse(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| AccountError::XmlParse(e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(AccountError::XmlParse(format!(
            "second root element '{}'",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}

fn append_text(stack: &mut [Element], value: Cow<'_, str>) -> Result<()> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(&value);
            Ok(())
        }
        None if value.trim().is_empty() => Ok(()),
        None => Err(AccountError::XmlParse(
            "text content outside the root element".to_string(),
        )),
    }
}
