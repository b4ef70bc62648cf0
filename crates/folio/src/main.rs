use anyhow::Result;
use clap::Parser as _;
use env_logger::{Builder, Env};
use folio::cli::Args;
use folio::driver;
use log::error;
use page_runtime::PageConfig;
use std::io::{self, Write as _};
use std::process::exit;

fn main() {
    Builder::from_env(Env::default().filter_or("RUST_LOG", "warn")).init();
    if let Err(err) = run() {
        error!("{err:#}");
        exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let report = driver::run(&args, PageConfig::from_env(), driver::realtime_from_env())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    driver::render(&report, args.json, &mut out)?;
    out.flush()?;
    Ok(())
}
