//! Command-line interface.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::RunConfig;
use crate::fetch::HttpFetcher;
use crate::models::JobRecord;
use crate::run::run_scrape;
use crate::sink::{JsonlSink, RecordSink, SinkError, StdoutSink};

#[derive(Parser)]
#[command(name = "jobharvest")]
#[command(about = "Remote job listing scraper and normalization pipeline")]
#[command(version)]
pub struct Cli {
    /// Keyword filter (case-insensitive substring)
    #[arg(short, long)]
    keyword: Option<String>,

    /// Location filter (case-insensitive substring)
    #[arg(short, long)]
    location: Option<String>,

    /// Date window: all, today, week, or month
    #[arg(long, value_parser = ["all", "today", "week", "month"])]
    date_filter: Option<String>,

    /// Maximum records to emit (0 = unbounded)
    #[arg(short = 'n', long)]
    max_items: Option<u64>,

    /// Maximum pages to fetch per start URL
    #[arg(long)]
    max_pages: Option<u32>,

    /// Start URL override (repeatable)
    #[arg(long = "start-url")]
    start_urls: Vec<String>,

    /// Source kind: html, rss, or api
    #[arg(short, long, value_parser = ["html", "rss", "api"])]
    source: Option<String>,

    /// Fixed user agent (default rotates a browser pool)
    #[arg(long, env = "JOBHARVEST_USER_AGENT")]
    user_agent: Option<String>,

    /// Output JSONL file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(short, long, env = "JOBHARVEST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

impl Cli {
    /// Fold CLI flags over the file/default configuration.
    fn into_config(self) -> anyhow::Result<RunConfig> {
        let mut config = RunConfig::load(self.config.as_deref())?;
        if let Some(keyword) = self.keyword {
            config.keyword = keyword;
        }
        if let Some(location) = self.location {
            config.location = location;
        }
        if let Some(date_filter) = self.date_filter {
            config.date_filter = date_filter;
        }
        if let Some(max_items) = self.max_items {
            config.max_items = max_items;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if !self.start_urls.is_empty() {
            config.start_urls = self.start_urls;
        }
        if let Some(source) = self.source {
            config.source = source;
        }
        if self.user_agent.is_some() {
            config.user_agent = self.user_agent;
        }
        Ok(config.sanitized())
    }
}

/// Counts emissions on a progress bar while delegating to the real sink.
struct ProgressSink<S> {
    inner: S,
    bar: ProgressBar,
}

impl<S: RecordSink> RecordSink for ProgressSink<S> {
    fn emit(&mut self, record: &JobRecord) -> Result<(), SinkError> {
        self.inner.emit(record)?;
        self.bar.inc(1);
        Ok(())
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let output = cli.output.clone();
    let config = cli.into_config()?;

    let fetcher = {
        let fetcher = HttpFetcher::new(
            Duration::from_secs(config.timeout_secs),
            Duration::from_millis(config.delay_min_ms),
            Duration::from_millis(config.delay_max_ms),
        );
        match &config.user_agent {
            Some(ua) => fetcher.with_user_agent(ua),
            None => fetcher,
        }
    };

    let inner: Box<dyn RecordSink> = match &output {
        Some(path) => Box::new(JsonlSink::open(path)?),
        None => Box::new(StdoutSink),
    };

    let bar = if config.max_items > 0 {
        ProgressBar::new(config.max_items)
    } else {
        ProgressBar::new_spinner()
    };
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} saved")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let mut sink = ProgressSink { inner, bar };

    // Ctrl-C requests a stop at the next page boundary.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupt received, finishing current page...");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let summary = run_scrape(&config, &fetcher, &mut sink, cancel).await?;
    sink.bar.finish_and_clear();

    if let Some(error) = &summary.transport_error {
        eprintln!("{} {}", style("transport failure:").red().bold(), error);
    }
    eprintln!(
        "{} {} pages, {} units, {} matched, {} saved{}",
        style("done:").green().bold(),
        summary.pages_fetched,
        summary.units_seen,
        summary.matched,
        summary.emitted,
        output
            .map(|p| format!(" to {}", p.display()))
            .unwrap_or_default(),
    );

    if summary.transport_error.is_some() {
        std::process::exit(1);
    }
    Ok(())
}
