//! Event kinds, event objects and the listener store.

use crate::Page;
use anyhow::Result;
use dom::NodeKey;
use std::rc::Rc;

/// The events the runtime dispatches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    DomContentLoaded,
    Load,
    Click,
    Input,
    Blur,
    Submit,
    Scroll,
    Error,
}

impl EventKind {
    /// Whether the event travels from its target up through the ancestors.
    pub const fn bubbles(self) -> bool {
        matches!(self, Self::Click | Self::Input | Self::Submit)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::Load => "load",
            Self::Click => "click",
            Self::Input => "input",
            Self::Blur => "blur",
            Self::Submit => "submit",
            Self::Scroll => "scroll",
            Self::Error => "error",
        }
    }
}

/// Where a listener is attached.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Node(NodeKey),
}

/// An event travelling through the dispatch path.
#[derive(Clone, Debug)]
pub struct Event {
    pub kind: EventKind,
    pub target: EventTarget,
    pub current_target: EventTarget,
    /// Message carried by `error` events.
    pub message: Option<String>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    pub const fn new(kind: EventKind, target: EventTarget) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            message: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// The target node, or `None` for window events.
    pub const fn target_node(&self) -> Option<NodeKey> {
        match self.target {
            EventTarget::Node(node) => Some(node),
            EventTarget::Window => None,
        }
    }

    pub const fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub const fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub const fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub const fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// An event listener. Returning an error reports an uncaught error.
pub type Listener = Rc<dyn Fn(&mut Page, &mut Event) -> Result<()>>;

/// Handle returned by [`Page::add_event_listener`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

struct Registration {
    id: ListenerId,
    target: EventTarget,
    kind: EventKind,
    listener: Listener,
}

/// Listeners in registration order.
#[derive(Default)]
pub struct ListenerStore {
    entries: Vec<Registration>,
    next_id: u64,
}

impl ListenerStore {
    pub fn add(&mut self, target: EventTarget, kind: EventKind, listener: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push(Registration {
            id,
            target,
            kind,
            listener,
        });
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Listeners for `kind` on `target`, cloned so they can run against a mutable page.
    pub fn listeners_for(&self, target: EventTarget, kind: EventKind) -> Vec<Listener> {
        self.entries
            .iter()
            .filter(|entry| entry.target == target && entry.kind == kind)
            .map(|entry| Rc::clone(&entry.listener))
            .collect()
    }

    pub fn count(&self, target: EventTarget, kind: EventKind) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.target == target && entry.kind == kind)
            .count()
    }
}
