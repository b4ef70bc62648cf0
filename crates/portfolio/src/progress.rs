//! Skill progress bars that fill once when they come into view.

use anyhow::Result;
use core::time::Duration;
use dom::NodeKey;
use log::{debug, warn};
use page_runtime::{IntersectionObserverInit, Page};
use std::collections::HashMap;

pub const RESTORE_DELAY: Duration = Duration::from_millis(200);
pub const TRANSITION: &str = "width 1.5s ease-in-out";

/// # Errors
/// Propagates selector and observer failures.
pub fn init(page: &mut Page) -> Result<()> {
    let mut bars = Vec::new();
    for bar in page.document().query_selector_all(".progress-bar")? {
        match page.document().style_property(bar, "width") {
            Some(width) => bars.push((bar, width)),
            None => warn!("progress bar {bar:?} has no inline width; skipped"),
        }
    }
    if bars.is_empty() {
        debug!("no progress bars to animate");
        return Ok(());
    }
    if !page.supports_intersection_observer() {
        debug!("intersection unsupported; progress bars stay static");
        return Ok(());
    }
    let recorded: HashMap<NodeKey, String> = bars.iter().cloned().collect();
    let observer = page.create_intersection_observer(
        IntersectionObserverInit::with_threshold(0.5),
        move |page, entries, observer| {
            for entry in entries.iter().filter(|entry| entry.is_intersecting) {
                let bar = entry.target;
                let Some(width) = recorded.get(&bar).cloned() else {
                    continue;
                };
                page.document_mut().set_style_property(bar, "width", "0%")?;
                page.set_timeout(RESTORE_DELAY, move |page| {
                    if page.document().contains(bar) {
                        page.document_mut().set_style_property(bar, "width", &width)?;
                    }
                    Ok(())
                });
                page.unobserve(observer, bar);
            }
            Ok(())
        },
    )?;
    for (bar, _) in bars {
        page.document_mut().set_style_property(bar, "transition", TRANSITION)?;
        page.observe(observer, bar)?;
    }
    Ok(())
}
