//! Interactive behaviour for the portfolio site.
//!
//! Each module is an independent behaviour wired onto a [`Page`] once its
//! document is ready; [`initialize`] installs them all in the order the site
//! expects. Behaviours whose markup is missing do nothing.

pub mod counters;
pub mod errors;
pub mod form;
pub mod lazy_images;
pub mod navbar;
pub mod navigation;
pub mod preload;
pub mod progress;
pub mod reveal;
pub mod smooth_scroll;
pub mod tooltips;
pub mod typing;

use anyhow::Result;
use log::{debug, info};
use page_runtime::{EventKind, EventTarget, ListenerId, LogLevel, Page};
use std::rc::Rc;

pub use navigation::MobileMenu;
pub use tooltips::TooltipToolkit;

pub const READY_MESSAGE: &str = "Personal Website JavaScript initialized successfully!";

/// What [`initialize`] installs.
#[derive(Clone)]
pub struct PortfolioOptions {
    /// Phrases cycled by the typing effect.
    pub phrases: Vec<String>,
    /// Stylesheets announced with preload hints.
    pub preload: Vec<String>,
    pub lazy_images: bool,
    pub preload_resources: bool,
    pub tooltips: Option<Rc<dyn TooltipToolkit>>,
}

impl Default for PortfolioOptions {
    fn default() -> Self {
        Self {
            phrases: typing::DEFAULT_PHRASES.map(str::to_owned).to_vec(),
            preload: preload::CRITICAL_STYLESHEETS.map(str::to_owned).to_vec(),
            lazy_images: true,
            preload_resources: true,
            tooltips: None,
        }
    }
}

impl core::fmt::Debug for PortfolioOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PortfolioOptions")
            .field("phrases", &self.phrases)
            .field("preload", &self.preload)
            .field("lazy_images", &self.lazy_images)
            .field("preload_resources", &self.preload_resources)
            .field("tooltips", &self.tooltips.is_some())
            .finish()
    }
}

/// Run one setup step; a failure is reported as an uncaught page error.
fn step(page: &mut Page, name: &str, run: impl FnOnce(&mut Page) -> Result<()>) {
    debug!("initializing {name}");
    if let Err(err) = run(page) {
        page.report_error(&format!("{name}: {err:#}"));
    }
}

fn setup(page: &mut Page, options: &PortfolioOptions) {
    step(page, "navigation", navigation::init);
    step(page, "scroll reveal", reveal::init);
    step(page, "typing effect", |page| typing::init(page, &options.phrases));
    step(page, "progress bars", progress::init);
    step(page, "smooth scrolling", smooth_scroll::init);
    step(page, "navbar", navbar::init);
    step(page, "contact form", form::init);
    step(page, "tooltips", |page| {
        tooltips::init(page, options.tooltips.as_deref()).map(drop)
    });
    if options.lazy_images {
        step(page, "lazy images", lazy_images::init);
    }
    if options.preload_resources {
        step(page, "preloading", |page| preload::init(page, &options.preload));
    }
    page.write_console(LogLevel::Log, READY_MESSAGE);
    step(page, "counters", counters::init);
}

/// Install the error listener now and every behaviour once the document is ready.
pub fn initialize(page: &mut Page, options: PortfolioOptions) -> ListenerId {
    errors::install(page);
    info!("portfolio behaviours armed for {}", page.url());
    page.add_event_listener(
        EventTarget::Window,
        EventKind::DomContentLoaded,
        move |page, _| {
            setup(page, &options);
            Ok(())
        },
    )
}
