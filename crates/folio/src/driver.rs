//! Runs the portfolio behaviours over a page file and reports what happened.
//!
//! The clock is virtual by default: the whole run finishes as fast as the
//! behaviours execute. With realtime pacing a tokio interval advances the page
//! one frame budget per tick, so animations play out on the wall clock.

use crate::cli::{Args, ScrollStep};
use anyhow::{Context as _, Result, anyhow};
use core::time::Duration;
use dom::{DOMSubscriber, DOMUpdate};
use log::{debug, info};
use page_runtime::{ConsoleEntry, LogLevel, Page, PageConfig};
use portfolio::{PortfolioOptions, initialize};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;
use url::Url;

/// Counts the document mutations made by the behaviours.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UpdateTally {
    pub inserted: usize,
    pub attributes: usize,
    pub text: usize,
    pub removed: usize,
}

impl DOMSubscriber for UpdateTally {
    fn apply_update(&mut self, update: &DOMUpdate) -> Result<()> {
        match update {
            DOMUpdate::InsertElement { .. } | DOMUpdate::InsertText { .. } => self.inserted += 1,
            DOMUpdate::SetAttr { .. } | DOMUpdate::RemoveAttr { .. } => self.attributes += 1,
            DOMUpdate::SetText { .. } => self.text += 1,
            DOMUpdate::RemoveNode { .. } => self.removed += 1,
            DOMUpdate::EndOfDocument => {}
        }
        Ok(())
    }
}

/// Outcome of a run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub url: String,
    pub elapsed_ms: u64,
    pub scroll_y: f64,
    pub updates: UpdateTally,
    pub console: Vec<ConsoleEntry>,
    pub errors: Vec<String>,
    pub document: Value,
    #[serde(skip)]
    pub tree: String,
}

impl Report {
    fn capture(page: &Page, updates: UpdateTally) -> Self {
        Self {
            url: page.url().to_string(),
            elapsed_ms: page.now_ms(),
            scroll_y: page.scroll_y(),
            updates,
            console: page.console().entries().to_vec(),
            errors: page.errors().to_vec(),
            document: page.document().to_json_value(),
            tree: format!("{:?}", page.document()),
        }
    }
}

/// `FOLIO_REALTIME=1` selects wall-clock pacing.
pub fn realtime_from_env() -> bool {
    env::var("FOLIO_REALTIME").is_ok_and(|val| val == "1")
}

/// Read the page file and arm the behaviours. The document has not loaded yet.
///
/// # Errors
/// Returns an error if the file cannot be read, the URL is invalid or the
/// markup cannot be parsed.
pub fn build_page(path: &Path, url: Option<&str>, config: PageConfig) -> Result<Page> {
    let html = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let url = match url {
        Some(url) => url.to_owned(),
        None => {
            let absolute = path
                .canonicalize()
                .with_context(|| format!("resolving {}", path.display()))?;
            Url::from_file_path(&absolute)
                .map_err(|()| anyhow!("{} has no file URL", absolute.display()))?
                .to_string()
        }
    };
    let mut page = Page::from_html(&html, &url, config)?;
    let parsed = page.document_mut().take_updates().len();
    debug!("parsed {} into {parsed} nodes and attributes", path.display());
    initialize(&mut page, PortfolioOptions::default());
    Ok(page)
}

struct Replay {
    scrolls: VecDeque<ScrollStep>,
    tally: UpdateTally,
}

impl Replay {
    fn new(scrolls: &[ScrollStep]) -> Self {
        let mut ordered = scrolls.to_vec();
        ordered.sort_by_key(|step| step.at_ms);
        Self {
            scrolls: ordered.into(),
            tally: UpdateTally::default(),
        }
    }

    /// Advance `page` to `target_ms`, applying every scroll that falls due on
    /// the way at its own time.
    fn step_to(&mut self, page: &mut Page, target_ms: u64) -> Result<()> {
        while let Some(step) = self.scrolls.front().copied() {
            if step.at_ms > target_ms {
                break;
            }
            self.scrolls.pop_front();
            let wait = step.at_ms.saturating_sub(page.now_ms());
            page.advance(Duration::from_millis(wait))?;
            debug!("scrolling to {} at {}ms", step.y, page.now_ms());
            page.scroll_to(step.y);
        }
        let wait = target_ms.saturating_sub(page.now_ms());
        page.advance(Duration::from_millis(wait))?;
        let updates = page.document_mut().take_updates();
        self.tally.apply_batch(&updates)
    }
}

/// Load the document and run for `duration` on the virtual clock.
///
/// # Errors
/// Returns an error when the page exceeds its step limit.
pub fn run_virtual(page: &mut Page, duration: Duration, scrolls: &[ScrollStep]) -> Result<UpdateTally> {
    let mut replay = Replay::new(scrolls);
    page.load_document();
    let end = page.now_ms().saturating_add(duration.as_millis() as u64);
    replay.step_to(page, end)?;
    Ok(replay.tally)
}

/// Load the document and run for `duration`, pacing each frame budget on the
/// wall clock.
///
/// # Errors
/// Returns an error if the runtime cannot start or the page exceeds its step
/// limit.
pub fn run_realtime(page: &mut Page, duration: Duration, scrolls: &[ScrollStep]) -> Result<UpdateTally> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("starting the pacing runtime")?;
    let budget = page.config().frame_budget();
    runtime.block_on(async move {
        let mut replay = Replay::new(scrolls);
        let mut ticks = tokio::time::interval(budget);
        page.load_document();
        let end = page.now_ms().saturating_add(duration.as_millis() as u64);
        while page.now_ms() < end {
            ticks.tick().await;
            let target = page
                .now_ms()
                .saturating_add(budget.as_millis() as u64)
                .min(end);
            replay.step_to(page, target)?;
        }
        Ok::<_, anyhow::Error>(replay.tally)
    })
}

/// Run the page named by `args` and capture the result.
///
/// # Errors
/// Returns any error from [`build_page`] or the run itself.
pub fn run(args: &Args, config: PageConfig, realtime: bool) -> Result<Report> {
    let mut page = build_page(&args.page, args.url.as_deref(), config)?;
    let duration = Duration::from_millis(args.duration_ms);
    info!(
        "running {} for {}ms ({})",
        page.url(),
        args.duration_ms,
        if realtime { "realtime" } else { "virtual clock" }
    );
    let updates = if realtime {
        run_realtime(&mut page, duration, &args.scrolls)?
    } else {
        run_virtual(&mut page, duration, &args.scrolls)?
    };
    Ok(Report::capture(&page, updates))
}

const fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Log => "log",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

/// Write the report as pretty JSON, or as the document tree followed by the
/// console lines.
///
/// # Errors
/// Returns an error if writing fails.
pub fn render<W: Write>(report: &Report, json: bool, out: &mut W) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
        return Ok(());
    }
    write!(out, "{}", report.tree)?;
    writeln!(out, "-- console ({} entries)", report.console.len())?;
    for entry in &report.console {
        writeln!(
            out,
            "[{:>6}ms] {:<5} {}",
            entry.time_ms,
            level_name(entry.level),
            entry.message
        )?;
    }
    Ok(())
}
