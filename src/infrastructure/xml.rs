//! Minimal XML tree reader for gateway documents.
//!
//! Only element names, attributes and text are kept. The tree is used to read
//! values out of received documents; signed regions are never re-serialized
//! from it.

use crate::error::{RedsysError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    /// Local name, namespace prefix stripped.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Unescaped, trimmed text content.
    pub text: String,
}

impl XmlNode {
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_ignore_case(&self, name: &str) -> Option<&XmlNode> {
        self.children
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Depth-first search for the first descendant (or self) named `name`.
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Attributes and leaf-child texts as a flat map. Children win over
    /// attributes with the same name.
    pub fn fields(&self) -> BTreeMap<String, String> {
        let mut fields: BTreeMap<String, String> = self.attributes.iter().cloned().collect();
        for child in self.children.iter().filter(|c| c.children.is_empty()) {
            fields.insert(child.name.clone(), child.text.clone());
        }
        fields
    }
}

fn malformed(err: impl std::fmt::Display) -> RedsysError {
    RedsysError::parse(format!("Malformed XML: {err}"))
}

fn open(start: &BytesStart<'_>) -> Result<XmlNode> {
    let mut node = XmlNode {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(malformed)?.into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn close(
    mut node: XmlNode,
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
) -> Result<()> {
    node.text = node.text.trim().to_string();
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(RedsysError::parse("Malformed XML: multiple root elements")),
    }
    Ok(())
}

/// Parses `xml` and returns its root element.
pub fn parse(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => stack.push(open(&start)?),
            Event::Empty(start) => close(open(&start)?, &mut stack, &mut root)?,
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| RedsysError::parse("Malformed XML: unexpected end tag"))?;
                close(node, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text.unescape().map_err(malformed)?);
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    let raw = data.into_inner();
                    node.text.push_str(&String::from_utf8_lossy(&raw));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(RedsysError::parse("Malformed XML: unclosed element"));
    }
    root.ok_or_else(|| RedsysError::parse("Malformed XML: no root element"))
}

/// Escapes text for use as element content or attribute value.
pub fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}
