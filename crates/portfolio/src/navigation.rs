//! Active-link highlighting and the collapsible mobile menu.

use anyhow::{Context as _, Result};
use dom::{Document, NodeKey};
use log::{debug, warn};
use page_runtime::{EventKind, EventTarget, Page};

pub const NAV_LINKS: &str = ".navbar-nav .nav-link";

/// Mark every nav link pointing at the current page path as `active`.
///
/// # Errors
/// Propagates document mutation failures.
pub fn highlight_active_link(page: &mut Page) -> Result<()> {
    let current = page.url().path().to_owned();
    for link in page.document().query_selector_all(NAV_LINKS)? {
        let Some(href) = page.document().attribute(link, "href") else {
            debug!("nav link {link:?} has no href");
            continue;
        };
        let resolved = match page.url().join(href) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!("nav link {href:?} does not resolve: {err}");
                continue;
            }
        };
        if resolved.path() == current {
            page.document_mut().add_class(link, "active")?;
        }
    }
    Ok(())
}

/// The navbar collapse shown on narrow screens.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MobileMenu {
    toggler: NodeKey,
    collapse: NodeKey,
}

impl MobileMenu {
    /// Locate the toggler and collapse pair; `None` unless both exist.
    ///
    /// # Errors
    /// Never fails for the fixed selectors used here; errors come from the selector engine.
    pub fn find(doc: &Document) -> Result<Option<Self>> {
        let toggler = doc.query_selector(".navbar-toggler")?;
        let collapse = doc.query_selector(".navbar-collapse")?;
        Ok(toggler
            .zip(collapse)
            .map(|(toggler, collapse)| Self { toggler, collapse }))
    }

    pub const fn toggler(&self) -> NodeKey {
        self.toggler
    }

    pub const fn collapse(&self) -> NodeKey {
        self.collapse
    }

    pub fn is_open(&self, doc: &Document) -> bool {
        doc.has_class(self.collapse, "show")
    }

    /// Show the menu and lock body scrolling.
    ///
    /// # Errors
    /// Returns an error if the collapse element was removed.
    pub fn open(&self, page: &mut Page) -> Result<()> {
        let doc = page.document_mut();
        doc.add_class(self.collapse, "show")
            .context("opening the mobile menu")?;
        if let Some(body) = doc.body() {
            doc.set_style_property(body, "overflow", "hidden")?;
        }
        Ok(())
    }

    /// Hide the menu and release body scrolling.
    ///
    /// # Errors
    /// Returns an error if the collapse element was removed.
    pub fn close(&self, page: &mut Page) -> Result<()> {
        let doc = page.document_mut();
        doc.remove_class(self.collapse, "show")
            .context("closing the mobile menu")?;
        if let Some(body) = doc.body() {
            doc.remove_style_property(body, "overflow")?;
        }
        Ok(())
    }

    /// # Errors
    /// See [`MobileMenu::open`] and [`MobileMenu::close`].
    pub fn toggle(&self, page: &mut Page) -> Result<()> {
        if self.is_open(page.document()) {
            self.close(page)
        } else {
            self.open(page)
        }
    }

    /// Toggle on toggler clicks and close after any nav link is followed.
    ///
    /// # Errors
    /// Propagates selector failures.
    pub fn install(self, page: &mut Page) -> Result<()> {
        page.add_event_listener(
            EventTarget::Node(self.toggler),
            EventKind::Click,
            move |page, _| self.toggle(page),
        );
        for link in page.document().query_selector_all(NAV_LINKS)? {
            page.add_event_listener(EventTarget::Node(link), EventKind::Click, move |page, _| {
                if self.is_open(page.document()) {
                    self.close(page)?;
                }
                Ok(())
            });
        }
        Ok(())
    }
}

/// Highlight the active link and wire the mobile menu when present.
///
/// # Errors
/// Propagates document failures.
pub fn init(page: &mut Page) -> Result<()> {
    highlight_active_link(page)?;
    match MobileMenu::find(page.document())? {
        Some(menu) => menu.install(page)?,
        None => debug!("no mobile menu on this page"),
    }
    Ok(())
}
