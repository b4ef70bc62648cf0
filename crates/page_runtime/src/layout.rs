//! Block layout used for scrolling and intersection.
//!
//! Every rendered element is a full-width block stacked under its previous
//! sibling. Text contributes one line, replaced elements one line, and a
//! `data-height` attribute pins an element's height. Nothing here looks at
//! real CSS beyond `display: none`.

use dom::{Document, NodeKey, NodeKind};
use serde::Serialize;
use std::collections::HashMap;

/// Height of one line of text, in pixels.
pub const LINE_HEIGHT: f64 = 24.0;

const NON_RENDERED: [&str; 8] = [
    "head", "script", "style", "link", "meta", "title", "template", "noscript",
];

const REPLACED: [&str; 8] = [
    "img", "input", "select", "textarea", "button", "hr", "br", "iframe",
];

/// Document-space rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// The overlap of two rectangles, or `None` when they do not touch.
    /// Rectangles that only share an edge produce a zero-area overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right >= left && bottom >= top).then(|| Self::new(left, top, right - left, bottom - top))
    }

    /// Grow (or shrink, for negative values) each side.
    pub fn expand(&self, top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self::new(
            self.x - left,
            self.y - top,
            (self.width + left + right).max(0.0),
            (self.height + top + bottom).max(0.0),
        )
    }
}

/// Computed boxes for one document generation.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    rects: HashMap<NodeKey, Rect>,
    document_height: f64,
}

impl Layout {
    /// Lay out the whole document at the given viewport width.
    pub fn compute(doc: &Document, viewport_width: f64) -> Self {
        let mut layout = Self::default();
        let height = layout.place(doc, doc.root(), 0.0, viewport_width);
        layout.document_height = height;
        layout
    }

    /// Place `node` at `top` and return its height.
    fn place(&mut self, doc: &Document, node: NodeKey, top: f64, width: f64) -> f64 {
        let Some(data) = doc.node(node) else {
            return 0.0;
        };
        let height = match &data.kind {
            NodeKind::Comment { .. } => 0.0,
            NodeKind::Text { text } => {
                if text.trim().is_empty() {
                    0.0
                } else {
                    LINE_HEIGHT
                }
            }
            NodeKind::Document => self.place_children(doc, node, top, width),
            NodeKind::Element { tag } => {
                if !is_rendered(doc, node, tag) {
                    return 0.0;
                }
                let content = self.place_children(doc, node, top, width);
                if let Some(fixed) = doc
                    .attribute(node, "data-height")
                    .and_then(|raw| raw.trim().trim_end_matches("px").parse::<f64>().ok())
                    .filter(|fixed| fixed.is_finite() && *fixed >= 0.0)
                {
                    fixed
                } else if content == 0.0 && REPLACED.contains(&tag.as_str()) {
                    LINE_HEIGHT
                } else {
                    content
                }
            }
        };
        if doc.is_element(node) {
            self.rects.insert(node, Rect::new(0.0, top, width, height));
        }
        height
    }

    fn place_children(&mut self, doc: &Document, node: NodeKey, top: f64, width: f64) -> f64 {
        let mut cursor = top;
        for child in doc.children(node) {
            cursor += self.place(doc, child, cursor, width);
        }
        cursor - top
    }

    /// The box of an element; unrendered elements have none.
    pub fn rect(&self, node: NodeKey) -> Option<Rect> {
        self.rects.get(&node).copied()
    }

    /// Total height of the document content.
    pub const fn document_height(&self) -> f64 {
        self.document_height
    }
}

fn is_rendered(doc: &Document, node: NodeKey, tag: &str) -> bool {
    !NON_RENDERED.contains(&tag)
        && !doc.has_attribute(node, "hidden")
        && doc
            .style_property(node, "display")
            .is_none_or(|display| display.trim() != "none")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_reports_edge_contact_as_empty_overlap() {
        let top = Rect::new(0.0, 0.0, 10.0, 10.0);
        let below = Rect::new(0.0, 10.0, 10.0, 10.0);
        let apart = Rect::new(0.0, 11.0, 10.0, 10.0);
        assert_eq!(top.intersect(&below).map(|rect| rect.area()), Some(0.0));
        assert_eq!(top.intersect(&apart), None);
    }

    #[test]
    fn expand_with_negative_margin_shrinks() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        let shrunk = viewport.expand(0.0, 0.0, -50.0, 0.0);
        assert_eq!(shrunk, Rect::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn blocks_stack_and_skip_unrendered_nodes() {
        let doc = dom::parse_html(
            "<html><head><title>x</title></head><body>\
             <p>one</p><div data-height=\"100\"><p>inner</p></div>\
             <p hidden>gone</p><p style=\"display: none\">gone</p><img src=a.png></body></html>",
        )
        .unwrap();
        let layout = Layout::compute(&doc, 800.0);
        let paragraphs = doc.query_selector_all("p").unwrap();
        assert_eq!(layout.rect(paragraphs[0]), Some(Rect::new(0.0, 0.0, 800.0, 24.0)));
        let div = doc.query_selector("div").unwrap().unwrap();
        assert_eq!(layout.rect(div).unwrap().height, 100.0);
        assert_eq!(layout.rect(paragraphs[2]), None);
        let img = doc.query_selector("img").unwrap().unwrap();
        assert_eq!(layout.rect(img).unwrap().y, 124.0);
        assert_eq!(layout.document_height(), 148.0);
        let head = doc.head().unwrap();
        assert_eq!(layout.rect(head), None);
    }
}
