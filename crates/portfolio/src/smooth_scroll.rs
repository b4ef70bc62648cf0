//! Eased in-page anchor navigation that clears the fixed header.

use anyhow::Result;
use log::debug;
use page_runtime::{EventKind, EventTarget, Page};

/// Height reserved for the fixed navbar above a scroll target.
pub const HEADER_OFFSET: f64 = 80.0;

/// # Errors
/// Propagates selector failures.
pub fn init(page: &mut Page) -> Result<()> {
    let anchors = page.document().query_selector_all(r##"a[href^="#"]"##)?;
    debug!("smooth scrolling {} anchors", anchors.len());
    for anchor in anchors {
        page.add_event_listener(EventTarget::Node(anchor), EventKind::Click, move |page, event| {
            event.prevent_default();
            let Some(fragment) = page
                .document()
                .attribute(anchor, "href")
                .and_then(|href| href.strip_prefix('#'))
                .filter(|fragment| !fragment.is_empty())
            else {
                return Ok(());
            };
            let Some(top) = page
                .document()
                .get_element_by_id(fragment)
                .and_then(|target| page.offset_top(target))
            else {
                debug!("anchor target #{fragment} not found");
                return Ok(());
            };
            page.scroll_to_smooth(top - HEADER_OFFSET);
            Ok(())
        });
    }
    Ok(())
}
