//! Navbar elevation driven by the scroll offset, sampled once per frame.

use anyhow::Result;
use dom::NodeKey;
use log::debug;
use page_runtime::{EventKind, EventTarget, Page};
use std::cell::Cell;
use std::rc::Rc;

/// Offset past which the navbar is drawn elevated.
pub const SCROLL_THRESHOLD: f64 = 50.0;

/// Inline `box-shadow` and `background` for a scroll offset.
pub fn styles_for(offset: f64) -> (&'static str, &'static str) {
    if offset > SCROLL_THRESHOLD {
        ("0 2px 20px rgba(0,0,0,0.1)", "rgba(255, 255, 255, 0.98)")
    } else {
        ("none", "rgba(255, 255, 255, 0.95)")
    }
}

/// Write the styles for the current offset onto the navbar.
///
/// # Errors
/// Returns an error if the navbar is no longer in the document.
pub fn apply(page: &mut Page, navbar: NodeKey) -> Result<()> {
    let (shadow, background) = styles_for(page.scroll_y());
    let doc = page.document_mut();
    doc.set_style_property(navbar, "box-shadow", shadow)?;
    doc.set_style_property(navbar, "background", background)
}

/// # Errors
/// Propagates selector failures.
pub fn init(page: &mut Page) -> Result<()> {
    let Some(navbar) = page.document().query_selector(".navbar")? else {
        debug!("no navbar to style");
        return Ok(());
    };
    let frame_pending = Rc::new(Cell::new(false));
    page.add_event_listener(EventTarget::Window, EventKind::Scroll, move |page, _| {
        if frame_pending.replace(true) {
            return Ok(());
        }
        let frame_pending = Rc::clone(&frame_pending);
        page.request_animation_frame(move |page, _| {
            frame_pending.set(false);
            apply(page, navbar)
        });
        Ok(())
    });
    Ok(())
}
