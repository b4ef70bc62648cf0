//! HTML5 parsing using html5ever.

use crate::{Document, NodeKey};
use anyhow::Result;
use html5ever::tendril::TendrilSink as _;
use html5ever::{ParseOpts, parse_document};
use log::debug;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Parse a complete HTML document.
///
/// The returned document's journal holds the inserts produced while parsing,
/// terminated by `EndOfDocument`.
///
/// # Errors
/// Returns an error if the parsed tree cannot be attached to the document.
pub fn parse_html(html: &str) -> Result<Document> {
    let dom: RcDom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    let mut document = Document::new();
    let root = document.root();
    convert_node(&mut document, &dom.document, root)?;
    document.mark_end_of_document();
    debug!(
        "parsed document with {} nodes",
        document.descendants(root).len()
    );
    Ok(document)
}

fn convert_node(document: &mut Document, rc_node: &Handle, parent: NodeKey) -> Result<()> {
    match &rc_node.data {
        NodeData::Document => {
            for child in rc_node.children.borrow().iter() {
                convert_node(document, child, parent)?;
            }
        }
        NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {}
        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            if text.trim().is_empty() {
                return Ok(());
            }
            let node = document.create_text(&text);
            document.append_child(parent, node)?;
        }
        NodeData::Comment { contents } => {
            let node = document.create_comment(contents);
            document.append_child(parent, node)?;
        }
        NodeData::Element { name, attrs, .. } => {
            let node = document.create_element(&name.local);
            for attr in attrs.borrow().iter() {
                document.set_attribute(node, &attr.name.local, &attr.value)?;
            }
            document.append_child(parent, node)?;
            for child in rc_node.children.borrow().iter() {
                convert_node(document, child, node)?;
            }
        }
    }
    Ok(())
}
