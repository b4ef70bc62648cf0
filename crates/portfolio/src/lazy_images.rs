//! Images whose real source is swapped in when they scroll into view.

use anyhow::Result;
use log::debug;
use page_runtime::{IntersectionObserverInit, Page};

pub const LAZY_IMAGES: &str = "img[data-src]";

/// # Errors
/// Propagates selector and observer failures.
pub fn init(page: &mut Page) -> Result<()> {
    if !page.supports_intersection_observer() {
        debug!("intersection unsupported; lazy images load as authored");
        return Ok(());
    }
    let images = page.document().query_selector_all(LAZY_IMAGES)?;
    if images.is_empty() {
        return Ok(());
    }
    let observer = page.create_intersection_observer(
        IntersectionObserverInit::default(),
        |page, entries, observer| {
            for entry in entries.iter().filter(|entry| entry.is_intersecting) {
                let img = entry.target;
                page.unobserve(observer, img);
                let Some(source) = page
                    .document()
                    .attribute(img, "data-src")
                    .map(str::to_owned)
                else {
                    continue;
                };
                let doc = page.document_mut();
                doc.set_attribute(img, "src", &source)?;
                doc.remove_class(img, "lazy")?;
            }
            Ok(())
        },
    )?;
    for img in images {
        page.observe(observer, img)?;
    }
    Ok(())
}
