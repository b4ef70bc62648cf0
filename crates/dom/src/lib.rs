//! Document model for the folio page runtime.
//!
//! The document is an arena of nodes addressed by stable [`NodeKey`]s. Every
//! mutation is journalled as a [`DOMUpdate`] so that hosts and mirrors can
//! observe what a script changed without diffing the tree.

use anyhow::Result;
use serde::Serialize;

pub mod document;
pub mod parser;
pub mod printing;
pub mod selector;
pub mod style;

pub use document::{DOMNode, Document, JOURNAL_LIMIT, NodeKind};
pub use parser::parse_html;
pub use selector::SelectorList;

/// A 64-bit stable key for DOM nodes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, PartialOrd, Ord, Serialize)]
pub struct NodeKey(pub u64);

impl NodeKey {
    /// The document node key (always present).
    pub const ROOT: Self = Self(0);
}

/// A single mutation applied to a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DOMUpdate {
    InsertElement {
        parent: NodeKey,
        node: NodeKey,
        tag: String,
        pos: usize,
    },
    InsertText {
        parent: NodeKey,
        node: NodeKey,
        text: String,
        pos: usize,
    },
    SetAttr {
        node: NodeKey,
        name: String,
        value: String,
    },
    RemoveAttr {
        node: NodeKey,
        name: String,
    },
    SetText {
        node: NodeKey,
        text: String,
    },
    RemoveNode {
        node: NodeKey,
    },
    EndOfDocument,
}

/// A subscriber that receives `DOMUpdate` batches and mirrors them into its own state.
pub trait DOMSubscriber {
    /// Apply a single `DOMUpdate` to the subscriber state.
    ///
    /// # Errors
    /// Returns an error if the subscriber cannot apply the update.
    fn apply_update(&mut self, update: &DOMUpdate) -> Result<()>;

    /// Apply a batch in order, stopping at the first failure.
    ///
    /// # Errors
    /// Returns the first error produced by [`DOMSubscriber::apply_update`].
    fn apply_batch(&mut self, batch: &[DOMUpdate]) -> Result<()> {
        for update in batch {
            self.apply_update(update)?;
        }
        Ok(())
    }
}
