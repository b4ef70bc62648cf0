//! Scroll-triggered reveal of content cards.

use anyhow::Result;
use core::time::Duration;
use dom::NodeKey;
use log::debug;
use page_runtime::{IntersectionObserverInit, Page, RootMargin};

pub const TARGETS: &str = ".overview-card, .education-item, .activity-item, .skill-card, \
                           .highlight-card, .summary-card, .learning-card, .contact-item";

/// Class marking a container whose children reveal one after another.
pub const STAGGER_CLASS: &str = "stagger-animation";

pub const STAGGER_STEP: Duration = Duration::from_millis(100);

pub const OBSERVER_INIT: IntersectionObserverInit = IntersectionObserverInit {
    threshold: 0.1,
    root_margin: RootMargin::bottom(-50.0),
};

fn hide(page: &mut Page, node: NodeKey) -> Result<()> {
    let doc = page.document_mut();
    doc.set_style_property(node, "opacity", "0")?;
    doc.set_style_property(node, "transform", "translateY(30px)")?;
    doc.set_style_property(node, "transition", "opacity 0.6s ease, transform 0.6s ease")
}

fn show(page: &mut Page, node: NodeKey) -> Result<()> {
    if !page.document().contains(node) {
        return Ok(());
    }
    let doc = page.document_mut();
    doc.set_style_property(node, "opacity", "1")?;
    doc.set_style_property(node, "transform", "translateY(0)")
}

/// Reveal `node`, and schedule its children when it staggers them.
///
/// # Errors
/// Propagates document failures.
pub fn reveal(page: &mut Page, node: NodeKey) -> Result<()> {
    show(page, node)?;
    if !page.document().has_class(node, STAGGER_CLASS) {
        return Ok(());
    }
    for (index, child) in page.document().element_children(node).into_iter().enumerate() {
        page.set_timeout(STAGGER_STEP * index as u32, move |page| show(page, child));
    }
    Ok(())
}

/// Hide every target and reveal each one as it scrolls into view.
///
/// # Errors
/// Propagates selector and observer failures.
pub fn init(page: &mut Page) -> Result<()> {
    let targets = page.document().query_selector_all(TARGETS)?;
    if targets.is_empty() {
        debug!("no reveal targets");
        return Ok(());
    }
    if !page.supports_intersection_observer() {
        debug!("intersection unsupported; leaving {} reveal targets visible", targets.len());
        return Ok(());
    }
    let observer = page.create_intersection_observer(OBSERVER_INIT, |page, entries, _| {
        for entry in entries.iter().filter(|entry| entry.is_intersecting) {
            reveal(page, entry.target)?;
        }
        Ok(())
    })?;
    for target in targets {
        hide(page, target)?;
        page.observe(observer, target)?;
    }
    Ok(())
}
