//! Tooltip activation through an optional UI toolkit.

use anyhow::Result;
use dom::NodeKey;
use log::debug;
use page_runtime::Page;

pub const TRIGGERS: &str = r#"[data-bs-toggle="tooltip"]"#;

/// A UI toolkit able to attach tooltip behaviour to an element.
pub trait TooltipToolkit {
    /// Attach a tooltip to `element`.
    ///
    /// # Errors
    /// Implementations report elements they cannot decorate.
    fn attach(&self, page: &mut Page, element: NodeKey) -> Result<()>;
}

/// Hand every tooltip trigger to `toolkit`; without one this does nothing.
/// Returns the number of triggers handed over.
///
/// # Errors
/// Propagates selector and toolkit failures.
pub fn init(page: &mut Page, toolkit: Option<&dyn TooltipToolkit>) -> Result<usize> {
    let Some(toolkit) = toolkit else {
        debug!("no tooltip toolkit available");
        return Ok(0);
    };
    let triggers = page.document().query_selector_all(TRIGGERS)?;
    for trigger in &triggers {
        toolkit.attach(page, *trigger)?;
    }
    Ok(triggers.len())
}
