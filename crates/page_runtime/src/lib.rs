//! Deterministic page runtime.
//!
//! A [`Page`] owns a parsed [`dom::Document`] together with everything a page
//! script expects from its host: a virtual clock with timers and animation
//! frames, event listeners with bubbling and default actions, a block layout
//! for scroll offsets, intersection observers and a console. Hosts drive the
//! page by feeding input (`click`, `type_text`, `scroll_to`, ...) and moving
//! the clock with [`Page::advance`].

pub mod config;
pub mod console;
pub mod events;
pub mod intersection;
pub mod layout;
mod page;
pub mod scheduler;
pub mod timers;

pub use config::PageConfig;
pub use console::{ConsoleEntry, LogLevel};
pub use events::{Event, EventKind, EventTarget, ListenerId};
pub use intersection::{IntersectionEntry, IntersectionObserverInit, ObserverId, RootMargin};
pub use layout::Rect;
pub use page::{Page, ease_in_out_cubic};
pub use timers::{FrameRequestId, TimerId};
