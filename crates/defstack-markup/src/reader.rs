//! Definition document reader
//!
//! Parses one document into a plain element tree first, then maps the tree
//! onto records. A field element holding only text (or nothing) becomes a
//! leaf with its text kept verbatim; a field element with child elements
//! becomes an interior node and the whitespace between its children is
//! dropped.

use crate::error::Result;
use crate::markup::{Markup, SceneDocument};
use defstack_core::{DefRecord, Node};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// Container element holding a scene's definitions
pub const SCENE_DEFS: &str = "Defs";

struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart) -> Result<Self> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            attributes.push((key, attr.unescape_value()?.into_owned()));
        }
        Ok(Self {
            tag,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn into_node(self) -> Node {
        if self.children.is_empty() {
            Node::leaf(self.tag, self.text)
        } else {
            Node::interior(
                self.tag,
                self.children.into_iter().map(Element::into_node).collect(),
            )
        }
    }
}

fn close(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(defstack_core::Error::MalformedRecord(format!(
            "second root element <{}>",
            element.tag
        ))
        .into());
    }
    *root = Some(element);
    Ok(())
}

fn parse_document(text: &str) -> Result<Element> {
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                close(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    defstack_core::Error::MalformedRecord("unbalanced end tag".to_string())
                })?;
                close(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    root.ok_or_else(|| {
        defstack_core::Error::MalformedRecord("document has no root element".to_string()).into()
    })
}

impl Markup {
    /// Parse a standalone definition document
    ///
    /// A document without a `Name` attribute yields a nameless record, which
    /// the index keeps as an empty slot.
    pub fn parse_record(&self, text: &str, path: Option<&Path>) -> Result<DefRecord> {
        let root = parse_document(text)?;
        let mut record = self.element_record(root);
        if let Some(path) = path {
            record = record.with_path(path);
        }
        if record.is_tombstone() {
            log::warn!(
                "{} definition in {:?} has no Name attribute",
                record.type_name,
                path
            );
        }
        Ok(record)
    }

    /// Parse a scene document's `Defs` container into scene-local records
    pub fn parse_scene(&self, text: &str) -> Result<SceneDocument> {
        let root = parse_document(text)?;
        let name = root.attribute("Name").unwrap_or_default().to_string();
        let mut records = Vec::new();
        for container in root.children.into_iter().filter(|c| c.tag == SCENE_DEFS) {
            for element in container.children {
                let record = self.element_record(element).in_scene();
                if record.is_tombstone() {
                    log::warn!("scene {} holds a {} without a Name", name, record.type_name);
                }
                records.push(record);
            }
        }
        Ok(SceneDocument { name, records })
    }

    fn element_record(&self, element: Element) -> DefRecord {
        let type_name = self.config.type_name(&element.tag).to_string();
        let mut record =
            DefRecord::new(type_name.as_str(), element.attribute("Name").unwrap_or_default().trim());
        if let Some(parent) = element.attribute("Parent").map(str::trim) {
            if !parent.is_empty() {
                record = record.with_parent(parent);
            }
        }
        if element
            .attribute("Abstract")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
        {
            record = record.abstract_only();
        }
        if !element.text.trim().is_empty() {
            log::warn!("{}: ignoring text directly inside the definition", record.name);
        }
        let fields = element.children.into_iter().map(Element::into_node).collect();
        record.with_body(Node::interior(type_name, fields))
    }
}
