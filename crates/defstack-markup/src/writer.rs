//! Definition document writer
//!
//! Output is indented and fully determined by the record: attributes in a
//! fixed order, fields in body order, empty fields as self-closing tags.
//! Root tags carry the configured namespace prefix and documents end with a
//! newline, so saving an unchanged file reproduces it byte for byte.

use crate::error::Result;
use crate::markup::Markup;
use crate::reader::SCENE_DEFS;
use defstack_core::{DefRecord, Node, NodeKind};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Root element of scene documents
pub const SCENE_ROOT: &str = "Scene";

impl Markup {
    /// Write a standalone definition document
    pub fn write_record(&self, record: &DefRecord) -> Result<String> {
        let mut writer = self.writer();
        write_declaration(&mut writer)?;
        self.write_definition(&mut writer, record)?;
        self.finish(writer)
    }

    /// Write a scene document holding `records` in its `Defs` container
    pub fn write_scene<'r>(
        &self,
        name: &str,
        records: impl IntoIterator<Item = &'r DefRecord>,
    ) -> Result<String> {
        let mut writer = self.writer();
        write_declaration(&mut writer)?;

        let mut root = BytesStart::new(SCENE_ROOT);
        root.push_attribute(("Name", name));
        writer.write_event(Event::Start(root))?;

        let mut records = records.into_iter().peekable();
        if records.peek().is_none() {
            writer.write_event(Event::Empty(BytesStart::new(SCENE_DEFS)))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new(SCENE_DEFS)))?;
            for record in records {
                if !record.scene_local {
                    log::debug!("writing global definition {} into scene {}", record.name, name);
                }
                self.write_definition(&mut writer, record)?;
            }
            writer.write_event(Event::End(BytesEnd::new(SCENE_DEFS)))?;
        }

        writer.write_event(Event::End(BytesEnd::new(SCENE_ROOT)))?;
        self.finish(writer)
    }

    fn writer(&self) -> Writer<Vec<u8>> {
        Writer::new_with_indent(Vec::new(), b' ', self.config.indent)
    }

    fn finish(&self, writer: Writer<Vec<u8>>) -> Result<String> {
        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(String::from_utf8(bytes)?)
    }

    fn write_definition<W: Write>(&self, writer: &mut Writer<W>, record: &DefRecord) -> Result<()> {
        let tag = self.config.tag(&record.type_name);
        let mut start = BytesStart::new(tag.as_str());
        start.push_attribute(("Name", record.name.as_str()));
        if let Some(parent) = &record.parent {
            start.push_attribute(("Parent", parent.as_str()));
        }
        if record.is_abstract {
            start.push_attribute(("Abstract", "true"));
        }

        let fields = record.body.children();
        if fields.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }
        writer.write_event(Event::Start(start))?;
        for field in fields {
            write_node(writer, field)?;
        }
        writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        Ok(())
    }
}

fn write_declaration<W: Write>(writer: &mut Writer<W>) -> Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    Ok(())
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<()> {
    let tag = node.name.as_str();
    match &node.kind {
        NodeKind::Leaf(text) if text.is_empty() => {
            writer.write_event(Event::Empty(BytesStart::new(tag)))?;
        }
        NodeKind::Leaf(text) => {
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            writer.write_event(Event::Text(BytesText::new(text)))?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        NodeKind::Interior(children) if children.is_empty() => {
            writer.write_event(Event::Empty(BytesStart::new(tag)))?;
        }
        NodeKind::Interior(children) => {
            writer.write_event(Event::Start(BytesStart::new(tag)))?;
            for child in children {
                write_node(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
    }
    Ok(())
}
