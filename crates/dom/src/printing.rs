use core::fmt;

use crate::{DOMNode, Document, NodeKey, NodeKind};

use serde_json::{Map, Value, json};

// -----------------------
// Module-scope helpers
// -----------------------

fn flush_text(children: &mut Vec<Value>, text_buf: &mut String) {
    if !text_buf.trim().is_empty() {
        children.push(json!({ "type": "text", "text": text_buf.clone() }));
    }
    text_buf.clear();
}

fn coalesce_children(doc: &Document, node: NodeKey) -> Vec<Value> {
    let mut children: Vec<Value> = Vec::new();
    let mut text_buf = String::new();
    for child in doc.children(node) {
        if let Some(DOMNode {
            kind: NodeKind::Text { text },
            ..
        }) = doc.node(child)
        {
            text_buf.push_str(text);
            continue;
        }
        flush_text(&mut children, &mut text_buf);
        let value = node_to_json(doc, child);
        if !value.is_null() {
            children.push(value);
        }
    }
    flush_text(&mut children, &mut text_buf);
    children
}

fn sorted_attrs(data: &DOMNode) -> Vec<(&str, &str)> {
    let mut pairs: Vec<(&str, &str)> = data
        .attrs
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    pairs.sort_by(|lhs, rhs| lhs.0.cmp(rhs.0));
    pairs
}

fn node_to_json(doc: &Document, node: NodeKey) -> Value {
    let Some(data) = doc.node(node) else {
        return Value::Null;
    };
    match &data.kind {
        NodeKind::Document => json!({ "type": "document", "children": coalesce_children(doc, node) }),
        NodeKind::Element { tag } => {
            let mut attrs_obj = Map::new();
            for (name, value) in sorted_attrs(data) {
                attrs_obj.insert(name.to_owned(), Value::String(value.to_owned()));
            }
            let mut obj = json!({
                "type": "element",
                "tag": tag,
                "attrs": Value::Object(attrs_obj),
                "children": coalesce_children(doc, node),
            });
            if let (Some(live), Some(map)) = (&data.value, obj.as_object_mut()) {
                map.insert("value".to_owned(), Value::String(live.clone()));
            }
            obj
        }
        NodeKind::Text { text } => {
            if text.trim().is_empty() {
                Value::Null
            } else {
                json!({ "type": "text", "text": text })
            }
        }
        NodeKind::Comment { .. } => Value::Null,
    }
}

fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("  ")?;
    }
    Ok(())
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

fn fmt_node(doc: &Document, node: NodeKey, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    let Some(data) = doc.node(node) else {
        return Ok(());
    };
    match &data.kind {
        NodeKind::Document => {
            write_indent(f, depth)?;
            writeln!(f, "#document")?;
            for child in doc.children(node) {
                fmt_node(doc, child, f, depth + 1)?;
            }
        }
        NodeKind::Element { tag } => {
            write_indent(f, depth)?;
            write!(f, "<{tag}")?;
            for (name, value) in sorted_attrs(data) {
                write!(f, " {name}=\"{}\"", escape_text(value))?;
            }
            writeln!(f, ">")?;
            for child in doc.children(node) {
                fmt_node(doc, child, f, depth + 1)?;
            }
            write_indent(f, depth)?;
            writeln!(f, "</{tag}>")?;
        }
        NodeKind::Text { text } => {
            if text.chars().all(char::is_whitespace) {
                return Ok(());
            }
            write_indent(f, depth)?;
            writeln!(f, "\"{}\"", escape_text(text))?;
        }
        NodeKind::Comment { text } => {
            write_indent(f, depth)?;
            writeln!(f, "<!--{text}-->")?;
        }
    }
    Ok(())
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_node(self, self.root(), f, 0)
    }
}

impl Document {
    /// Build a deterministic JSON representation of the document.
    /// Schema:
    /// - Document: { "type":"document", "children":[ ... ] }
    /// - Element: { "type":"element", "tag": "div", "attrs": {..}, "children":[ ... ], "value"?: "..." }
    /// - Text: { "type":"text", "text":"..." }
    pub fn to_json_value(&self) -> Value {
        node_to_json(self, self.root())
    }

    /// JSON for a single subtree.
    pub fn subtree_json(&self, node: NodeKey) -> Value {
        node_to_json(self, node)
    }

    /// Pretty JSON string for snapshots and test comparisons.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json_value()).unwrap_or_else(|_| String::from("{}"))
    }
}
