//! Preload hints for critical stylesheets.

use anyhow::Result;
use log::debug;
use page_runtime::Page;

pub const CRITICAL_STYLESHEETS: [&str; 2] = [
    "/static/css/style.css",
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css",
];

/// Append `<link rel="preload" as="style">` to `head` for each resource.
///
/// # Errors
/// Propagates document failures.
pub fn init<S: AsRef<str>>(page: &mut Page, resources: &[S]) -> Result<()> {
    let Some(head) = page.document().head() else {
        debug!("no head to preload into");
        return Ok(());
    };
    let doc = page.document_mut();
    for resource in resources {
        let link = doc.create_element("link");
        doc.set_attribute(link, "rel", "preload")?;
        doc.set_attribute(link, "as", "style")?;
        doc.set_attribute(link, "href", resource.as_ref())?;
        doc.append_child(head, link)?;
    }
    Ok(())
}
