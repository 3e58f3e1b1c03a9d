//! XHTML fragment reading and writing.
//!
//! Markup must be well-formed XML (void elements written as `<br/>`).
//! Comments, processing instructions and doctype declarations are dropped;
//! CDATA sections become text. Elements carrying a `data-sealed` attribute
//! are read as sealed regions.

use super::document::ContentTree;
use super::node::{ElementData, NodeId, NodeKind};
use crate::error::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Attribute that marks an element as sealed when reading markup.
pub const SEALED_ATTRIBUTE: &str = "data-sealed";

impl ContentTree {
    /// Read an XHTML fragment (any number of top-level nodes) into a new tree.
    pub fn parse_fragment(markup: &str) -> Result<Self> {
        let mut tree = ContentTree::new();
        let root = tree.root();
        tree.append_fragment(root, markup)?;
        Ok(tree)
    }

    /// Read an XHTML fragment and append its nodes to `parent`.
    pub fn append_fragment(&mut self, parent: NodeId, markup: &str) -> Result<()> {
        let mut reader = Reader::from_str(markup);
        reader.trim_text(false);
        reader.check_end_names(true);

        let mut stack = vec![parent];
        loop {
            let current = *stack.last().ok_or_else(|| Error::Markup("unbalanced end tag".into()))?;
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let data = element_data(&e)?;
                    let id = self.append_element(current, data)?;
                    stack.push(id);
                },
                Ok(Event::Empty(e)) => {
                    let data = element_data(&e)?;
                    self.append_element(current, data)?;
                },
                Ok(Event::End(_)) => {
                    if stack.len() == 1 {
                        return Err(Error::Markup(format!(
                            "unexpected end tag at byte {}",
                            reader.buffer_position()
                        )));
                    }
                    stack.pop();
                },
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::Markup(format!("bad text: {}", err)))?;
                    if !text.is_empty() {
                        self.append_text(current, text.into_owned())?;
                    }
                },
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    if !text.is_empty() {
                        self.append_text(current, text)?;
                    }
                },
                Ok(Event::Eof) => break,
                Ok(_) => {},
                Err(err) => {
                    return Err(Error::Markup(format!(
                        "error at byte {}: {}",
                        reader.buffer_position(),
                        err
                    )))
                },
            }
        }

        if stack.len() != 1 {
            return Err(Error::Markup("unclosed element at end of input".into()));
        }
        Ok(())
    }

    /// Serialize a node and its subtree.
    pub fn to_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, true, &mut out);
        out
    }

    /// Serialize the children of a node (the whole document for the root).
    pub fn inner_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, false, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, include_self: bool, out: &mut String) {
        // (node, closing) pairs; closing entries emit end tags
        let mut stack: Vec<(NodeId, bool)> = Vec::new();
        if include_self {
            stack.push((node, false));
        } else {
            let children: Vec<NodeId> = self.children(node).collect();
            stack.extend(children.into_iter().rev().map(|c| (c, false)));
        }

        while let Some((id, closing)) = stack.pop() {
            let Some(n) = self.get(id) else { continue };
            match &n.kind {
                NodeKind::Text(text) => out.push_str(&escape(text.as_str())),
                NodeKind::Document => {
                    let children: Vec<NodeId> = self.children(id).collect();
                    stack.extend(children.into_iter().rev().map(|c| (c, false)));
                },
                NodeKind::Element(data) if closing => {
                    out.push_str("</");
                    out.push_str(&data.tag);
                    out.push('>');
                },
                NodeKind::Element(data) => {
                    out.push('<');
                    out.push_str(&data.tag);
                    for (name, value) in &data.attributes {
                        out.push(' ');
                        out.push_str(name);
                        out.push_str("=\"");
                        out.push_str(&escape(value.as_str()));
                        out.push('"');
                    }
                    if n.first_child.is_none() {
                        out.push_str("/>");
                        continue;
                    }
                    out.push('>');
                    stack.push((id, true));
                    let children: Vec<NodeId> = self.children(id).collect();
                    stack.extend(children.into_iter().rev().map(|c| (c, false)));
                },
            }
        }
    }
}

fn element_data(e: &BytesStart<'_>) -> Result<ElementData> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut data = ElementData::new(tag);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Markup(format!("bad attribute: {}", err)))?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::Markup(format!("bad attribute value: {}", err)))?
            .into_owned();
        if name == SEALED_ATTRIBUTE {
            data.sealed = true;
        }
        data.attributes.insert(name, value);
    }
    Ok(data)
}
