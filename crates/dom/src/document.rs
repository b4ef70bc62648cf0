//! Arena-backed document tree with a mutation journal.

use crate::selector::SelectorList;
use crate::style::{parse_declarations, serialize_declarations};
use crate::{DOMUpdate, NodeKey};
use anyhow::{Context as _, Result, anyhow, bail};
use indextree::{Arena, NodeId};
use log::warn;
use smallvec::SmallVec;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Document,
    Element {
        tag: String,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DOMNode {
    pub key: NodeKey,
    pub kind: NodeKind,
    pub attrs: SmallVec<(String, String), 4>,
    /// Live value of a form control, `None` while it still shows its default.
    pub value: Option<String>,
}

/// A parsed page document.
pub struct Document {
    arena: Arena<DOMNode>,
    ids: HashMap<NodeKey, NodeId>,
    next_key: u64,
    updates: VecDeque<DOMUpdate>,
    dropped_updates: u64,
    generation: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Undrained updates kept before the oldest are discarded.
pub const JOURNAL_LIMIT: usize = 10_000;

const FORM_CONTROLS: [&str; 3] = ["input", "select", "textarea"];

impl Document {
    /// Create an empty document containing only the root node.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(DOMNode::default());
        let mut ids = HashMap::new();
        ids.insert(NodeKey::ROOT, root);
        Self {
            arena,
            ids,
            next_key: 1,
            updates: VecDeque::new(),
            dropped_updates: 0,
            generation: 0,
        }
    }

    /// The document node key.
    pub const fn root(&self) -> NodeKey {
        NodeKey::ROOT
    }

    fn id_of(&self, key: NodeKey) -> Result<NodeId> {
        self.ids
            .get(&key)
            .copied()
            .ok_or_else(|| anyhow!("unknown node {key:?}"))
    }

    fn key_of(&self, id: NodeId) -> Option<NodeKey> {
        self.arena.get(id).map(|node| node.get().key)
    }

    fn mint(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        let id = self.arena.new_node(DOMNode {
            key,
            kind,
            ..DOMNode::default()
        });
        self.ids.insert(key, id);
        key
    }

    /// Create a detached element. Tag names are stored lowercase.
    pub fn create_element(&mut self, tag: &str) -> NodeKey {
        self.mint(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeKey {
        self.mint(NodeKind::Text {
            text: text.to_owned(),
        })
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeKey {
        self.mint(NodeKind::Comment {
            text: text.to_owned(),
        })
    }

    /// Append `child` as the last child of `parent`, moving it if already attached.
    ///
    /// # Errors
    /// Returns an error if either key is unknown or the append would create a cycle.
    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let parent_id = self.id_of(parent)?;
        let child_id = self.id_of(child)?;
        child_id.detach(&mut self.arena);
        parent_id
            .checked_append(child_id, &mut self.arena)
            .with_context(|| format!("appending {child:?} to {parent:?}"))?;
        let pos = parent_id.children(&self.arena).count() - 1;
        let update = match self.arena.get(child_id).map(|node| node.get().kind.clone()) {
            Some(NodeKind::Element { tag }) => Some(DOMUpdate::InsertElement {
                parent,
                node: child,
                tag,
                pos,
            }),
            Some(NodeKind::Text { text }) => Some(DOMUpdate::InsertText {
                parent,
                node: child,
                text,
                pos,
            }),
            _ => None,
        };
        if let Some(update) = update {
            self.record(update);
        }
        Ok(())
    }

    /// Remove a node and its subtree from the document.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or names the document root.
    pub fn remove_node(&mut self, node: NodeKey) -> Result<()> {
        if node == NodeKey::ROOT {
            bail!("the document node cannot be removed");
        }
        let id = self.id_of(node)?;
        let doomed: Vec<NodeId> = id.descendants(&self.arena).collect();
        for descendant in doomed {
            if let Some(key) = self.key_of(descendant) {
                self.ids.remove(&key);
            }
        }
        id.remove_subtree(&mut self.arena);
        self.record(DOMUpdate::RemoveNode { node });
        Ok(())
    }

    /// Returns true if the key refers to a node that still exists.
    pub fn contains(&self, node: NodeKey) -> bool {
        self.ids.contains_key(&node)
    }

    pub fn node(&self, node: NodeKey) -> Option<&DOMNode> {
        let id = self.ids.get(&node)?;
        self.arena.get(*id).map(indextree::Node::get)
    }

    fn node_mut(&mut self, node: NodeKey) -> Result<&mut DOMNode> {
        let id = self.id_of(node)?;
        self.arena
            .get_mut(id)
            .map(indextree::Node::get_mut)
            .ok_or_else(|| anyhow!("node {node:?} was removed"))
    }

    fn element_mut(&mut self, node: NodeKey) -> Result<&mut DOMNode> {
        let data = self.node_mut(node)?;
        if !matches!(data.kind, NodeKind::Element { .. }) {
            bail!("node {node:?} is not an element");
        }
        Ok(data)
    }

    /// Lowercase tag name, or `None` for non-element nodes.
    pub fn tag_name(&self, node: NodeKey) -> Option<&str> {
        match &self.node(node)?.kind {
            NodeKind::Element { tag } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeKey) -> bool {
        self.tag_name(node).is_some()
    }

    pub fn parent(&self, node: NodeKey) -> Option<NodeKey> {
        let id = self.ids.get(&node)?;
        let parent = self.arena.get(*id)?.parent()?;
        self.key_of(parent)
    }

    /// Nearest ancestor that is an element.
    pub fn parent_element(&self, node: NodeKey) -> Option<NodeKey> {
        self.parent(node).filter(|parent| self.is_element(*parent))
    }

    /// Child nodes in order.
    pub fn children(&self, node: NodeKey) -> Vec<NodeKey> {
        let Some(id) = self.ids.get(&node) else {
            return Vec::new();
        };
        id.children(&self.arena)
            .filter_map(|child| self.key_of(child))
            .collect()
    }

    /// Element children in order.
    pub fn element_children(&self, node: NodeKey) -> Vec<NodeKey> {
        self.children(node)
            .into_iter()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// Descendants in document (pre-)order, excluding `node` itself.
    pub fn descendants(&self, node: NodeKey) -> Vec<NodeKey> {
        let Some(id) = self.ids.get(&node) else {
            return Vec::new();
        };
        id.descendants(&self.arena)
            .skip(1)
            .filter_map(|desc| self.key_of(desc))
            .collect()
    }

    /// Returns true if `node` is `ancestor` or lies inside it.
    pub fn is_inclusive_descendant(&self, node: NodeKey, ancestor: NodeKey) -> bool {
        let mut current = Some(node);
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = self.parent(key);
        }
        false
    }

    // ------------------------------------------------------------------
    // Attributes, classes and inline style
    // ------------------------------------------------------------------

    pub fn attribute(&self, node: NodeKey, name: &str) -> Option<&str> {
        self.node(node)?
            .attrs
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, node: NodeKey, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Set an attribute, keeping its original position if it already exists.
    ///
    /// # Errors
    /// Returns an error if the node is unknown or not an element.
    pub fn set_attribute(&mut self, node: NodeKey, name: &str, value: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let data = self.element_mut(node)?;
        if let Some(slot) = data.attrs.iter_mut().find(|(attr, _)| *attr == name) {
            if slot.1 == value {
                return Ok(());
            }
            value.clone_into(&mut slot.1);
        } else {
            data.attrs.push((name.clone(), value.to_owned()));
        }
        self.record(DOMUpdate::SetAttr {
            node,
            name,
            value: value.to_owned(),
        });
        Ok(())
    }

    /// Remove an attribute if present.
    ///
    /// # Errors
    /// Returns an error if the node is unknown or not an element.
    pub fn remove_attribute(&mut self, node: NodeKey, name: &str) -> Result<()> {
        let data = self.element_mut(node)?;
        let Some(pos) = data
            .attrs
            .iter()
            .position(|(attr, _)| attr.eq_ignore_ascii_case(name))
        else {
            return Ok(());
        };
        let (removed, _) = data.attrs.remove(pos);
        self.record(DOMUpdate::RemoveAttr {
            node,
            name: removed,
        });
        Ok(())
    }

    /// Class tokens in attribute order.
    pub fn class_list(&self, node: NodeKey) -> Vec<&str> {
        self.attribute(node, "class")
            .map(|classes| classes.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, node: NodeKey, class: &str) -> bool {
        self.class_list(node).contains(&class)
    }

    /// Add a class token; a no-op if it is already present.
    ///
    /// # Errors
    /// Returns an error if the node is unknown or not an element.
    pub fn add_class(&mut self, node: NodeKey, class: &str) -> Result<()> {
        if self.has_class(node, class) {
            return Ok(());
        }
        let mut tokens: Vec<String> = self
            .class_list(node)
            .into_iter()
            .map(str::to_owned)
            .collect();
        tokens.push(class.to_owned());
        self.set_attribute(node, "class", &tokens.join(" "))
    }

    /// Remove a class token; a no-op if it is absent.
    ///
    /// # Errors
    /// Returns an error if the node is unknown or not an element.
    pub fn remove_class(&mut self, node: NodeKey, class: &str) -> Result<()> {
        if !self.has_class(node, class) {
            return Ok(());
        }
        let tokens: Vec<String> = self
            .class_list(node)
            .into_iter()
            .filter(|token| *token != class)
            .map(str::to_owned)
            .collect();
        self.set_attribute(node, "class", &tokens.join(" "))
    }

    /// Read one inline style property.
    pub fn style_property(&self, node: NodeKey, property: &str) -> Option<String> {
        let style = self.attribute(node, "style")?;
        parse_declarations(style)
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    /// Set one inline style property. An empty value removes the property.
    ///
    /// # Errors
    /// Returns an error if the node is unknown or not an element.
    pub fn set_style_property(&mut self, node: NodeKey, property: &str, value: &str) -> Result<()> {
        let property = property.to_ascii_lowercase();
        let mut decls = self
            .attribute(node, "style")
            .map(parse_declarations)
            .unwrap_or_default();
        let value = value.trim();
        if value.is_empty() {
            decls.retain(|(name, _)| *name != property);
        } else if let Some(slot) = decls.iter_mut().find(|(name, _)| *name == property) {
            value.clone_into(&mut slot.1);
        } else {
            decls.push((property, value.to_owned()));
        }
        if decls.is_empty() && !self.has_attribute(node, "style") {
            return Ok(());
        }
        self.set_attribute(node, "style", &serialize_declarations(&decls))
    }

    /// Remove one inline style property.
    ///
    /// # Errors
    /// Returns an error if the node is unknown or not an element.
    pub fn remove_style_property(&mut self, node: NodeKey, property: &str) -> Result<()> {
        self.set_style_property(node, property, "")
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeKey) -> String {
        if let Some(DOMNode {
            kind: NodeKind::Text { text },
            ..
        }) = self.node(node)
        {
            return text.clone();
        }
        let mut out = String::new();
        for desc in self.descendants(node) {
            if let Some(DOMNode {
                kind: NodeKind::Text { text },
                ..
            }) = self.node(desc)
            {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace the children of `node` with a single text node.
    ///
    /// A lone existing text child is updated in place so a typing loop does
    /// not churn node keys.
    ///
    /// # Errors
    /// Returns an error if the node is unknown.
    pub fn set_text_content(&mut self, node: NodeKey, text: &str) -> Result<()> {
        let children = self.children(node);
        if let [only] = children.as_slice()
            && let Ok(data) = self.node_mut(*only)
            && let NodeKind::Text { text: current } = &mut data.kind
        {
            if current != text {
                text.clone_into(current);
                self.record(DOMUpdate::SetText {
                    node: *only,
                    text: text.to_owned(),
                });
            }
            return Ok(());
        }
        for child in children {
            self.remove_node(child)?;
        }
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(node, text_node)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Form controls
    // ------------------------------------------------------------------

    pub fn is_form_control(&self, node: NodeKey) -> bool {
        self.tag_name(node)
            .is_some_and(|tag| FORM_CONTROLS.contains(&tag))
    }

    /// The `type` of an input (lowercase, `text` by default), or the tag name
    /// for other controls.
    pub fn control_type(&self, node: NodeKey) -> Option<String> {
        match self.tag_name(node)? {
            "input" => Some(
                self.attribute(node, "type")
                    .map_or_else(|| "text".to_owned(), str::to_ascii_lowercase),
            ),
            other if FORM_CONTROLS.contains(&other) => Some(other.to_owned()),
            _ => None,
        }
    }

    /// Current value of a form control; empty for anything else.
    pub fn value(&self, node: NodeKey) -> String {
        if let Some(live) = self.node(node).and_then(|data| data.value.clone()) {
            return live;
        }
        self.default_value(node)
    }

    fn default_value(&self, node: NodeKey) -> String {
        match self.tag_name(node) {
            Some("input") => self.attribute(node, "value").unwrap_or_default().to_owned(),
            Some("textarea") => self.text_content(node),
            Some("select") => {
                let options: Vec<NodeKey> = self
                    .descendants(node)
                    .into_iter()
                    .filter(|desc| self.tag_name(*desc) == Some("option"))
                    .collect();
                options
                    .iter()
                    .find(|option| self.has_attribute(**option, "selected"))
                    .or_else(|| options.first())
                    .map(|option| {
                        self.attribute(*option, "value")
                            .map_or_else(|| self.text_content(*option).trim().to_owned(), str::to_owned)
                    })
                    .unwrap_or_default()
            }
            _ => String::new(),
        }
    }

    /// Set the live value of a form control.
    ///
    /// # Errors
    /// Returns an error if the node is not a form control.
    pub fn set_value(&mut self, node: NodeKey, value: &str) -> Result<()> {
        if !self.is_form_control(node) {
            bail!("node {node:?} is not a form control");
        }
        self.node_mut(node)?.value = Some(value.to_owned());
        Ok(())
    }

    /// Form controls inside `form`, in document order.
    pub fn form_controls(&self, form: NodeKey) -> Vec<NodeKey> {
        self.descendants(form)
            .into_iter()
            .filter(|desc| self.is_form_control(*desc))
            .collect()
    }

    /// Restore every control inside `form` to its default value.
    ///
    /// # Errors
    /// Returns an error if `form` is not a `form` element.
    pub fn reset_form(&mut self, form: NodeKey) -> Result<()> {
        if self.tag_name(form) != Some("form") {
            bail!("node {form:?} is not a form");
        }
        for control in self.form_controls(form) {
            self.node_mut(control)?.value = None;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All elements under the root matching `selector`, in document order.
    ///
    /// # Errors
    /// Returns an error if the selector does not parse.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeKey>> {
        self.query_selector_all_within(self.root(), selector)
    }

    /// Elements inside `scope` (excluding `scope`) matching `selector`.
    ///
    /// # Errors
    /// Returns an error if the selector does not parse.
    pub fn query_selector_all_within(&self, scope: NodeKey, selector: &str) -> Result<Vec<NodeKey>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|node| list.matches(self, *node))
            .collect())
    }

    /// First element matching `selector` in document order.
    ///
    /// # Errors
    /// Returns an error if the selector does not parse.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeKey>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(self.root())
            .into_iter()
            .find(|node| list.matches(self, *node)))
    }

    /// First element matching `selector` inside `scope`.
    ///
    /// # Errors
    /// Returns an error if the selector does not parse.
    pub fn query_selector_within(&self, scope: NodeKey, selector: &str) -> Result<Option<NodeKey>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .find(|node| list.matches(self, *node)))
    }

    /// First element whose `id` attribute equals `id`, in document order.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeKey> {
        if id.is_empty() {
            return None;
        }
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.attribute(*node, "id") == Some(id))
    }

    /// Nearest inclusive ancestor matching `selector`.
    ///
    /// # Errors
    /// Returns an error if the selector does not parse.
    pub fn closest(&self, node: NodeKey, selector: &str) -> Result<Option<NodeKey>> {
        let list = SelectorList::parse(selector)?;
        let mut current = Some(node);
        while let Some(key) = current {
            if list.matches(self, key) {
                return Ok(Some(key));
            }
            current = self.parent_element(key);
        }
        Ok(None)
    }

    /// The `body` element, if the document has one.
    pub fn body(&self) -> Option<NodeKey> {
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.tag_name(*node) == Some("body"))
    }

    /// The `head` element, if the document has one.
    pub fn head(&self) -> Option<NodeKey> {
        self.descendants(self.root())
            .into_iter()
            .find(|node| self.tag_name(*node) == Some("head"))
    }

    // ------------------------------------------------------------------
    // Journal
    // ------------------------------------------------------------------

    fn record(&mut self, update: DOMUpdate) {
        self.generation += 1;
        if self.updates.len() == JOURNAL_LIMIT {
            if self.dropped_updates == 0 {
                warn!("update journal is full; dropping the oldest undrained updates");
            }
            self.updates.pop_front();
            self.dropped_updates += 1;
        }
        self.updates.push_back(update);
    }

    /// Counter bumped by every journalled mutation; never reset by draining.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Record that parsing reached the end of the document.
    pub fn mark_end_of_document(&mut self) {
        self.record(DOMUpdate::EndOfDocument);
    }

    /// Drain every update recorded since the last call. At most
    /// [`JOURNAL_LIMIT`] of the newest updates are kept between drains.
    pub fn take_updates(&mut self) -> Vec<DOMUpdate> {
        std::mem::take(&mut self.updates).into()
    }

    /// Updates discarded because nobody drained the journal in time.
    pub const fn dropped_updates(&self) -> u64 {
        self.dropped_updates
    }

    /// Number of updates waiting to be drained.
    pub fn pending_updates(&self) -> usize {
        self.updates.len()
    }
}
