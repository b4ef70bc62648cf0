//! Command line arguments for the driver.

use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use std::path::PathBuf;

/// Default virtual run time in milliseconds.
pub const DEFAULT_DURATION_MS: u64 = 5000;

/// A scroll performed by the simulated reader at a point in time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollStep {
    pub y: f64,
    pub at_ms: u64,
}

impl ScrollStep {
    /// Parse `Y@MS`, for example `1200@500`.
    ///
    /// # Errors
    /// Returns an error when either half is missing or not a number.
    pub fn parse(raw: &str) -> Result<Self> {
        let (y, at) = raw
            .split_once('@')
            .ok_or_else(|| anyhow!("scroll step {raw:?} is not Y@MS"))?;
        Ok(Self {
            y: y.trim()
                .parse()
                .with_context(|| format!("scroll offset in {raw:?}"))?,
            at_ms: at
                .trim()
                .parse()
                .with_context(|| format!("scroll time in {raw:?}"))?,
        })
    }
}

fn parse_scroll(raw: &str) -> Result<ScrollStep, String> {
    ScrollStep::parse(raw).map_err(|err| format!("{err:#}"))
}

#[derive(Parser, Clone, Debug, PartialEq)]
#[command(
    name = "folio",
    version,
    about = "Run the portfolio behaviours over a page and print the resulting document"
)]
pub struct Args {
    /// HTML file to load.
    #[arg(value_name = "PAGE")]
    pub page: PathBuf,

    /// URL the page is served from (default: the file's own URL).
    #[arg(long = "url", value_name = "URL")]
    pub url: Option<String>,

    /// How long to run, in milliseconds.
    #[arg(long = "duration", value_name = "MS", default_value_t = DEFAULT_DURATION_MS)]
    pub duration_ms: u64,

    /// Scroll to offset Y at time MS; repeatable.
    #[arg(long = "scroll", value_name = "Y@MS", value_parser = parse_scroll)]
    pub scrolls: Vec<ScrollStep>,

    /// Print the report as JSON instead of the document tree.
    #[arg(long = "json")]
    pub json: bool,
}
