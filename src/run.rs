//! The scrape orchestrator.
//!
//! Drives fetch → extract → filter → dedupe → emit → paginate, one page
//! at a time. Pagination depends on the fully-parsed current page, so
//! pages are strictly sequential; within a page, units are a pure map
//! and the seen-set plus sink are the only mutable state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use url::Url;

use crate::config::RunConfig;
use crate::dedupe::SeenSet;
use crate::extract;
use crate::fetch::Fetcher;
use crate::filter;
use crate::paginate::{PageContext, Paginator};
use crate::sink::{RecordSink, SinkError};

/// Mutable state owned by a single run. Discarded when the run ends.
pub struct RunContext {
    pub seen: SeenSet,
    pub emitted: u64,
    pub cancel: Arc<AtomicBool>,
}

impl RunContext {
    pub fn new(cancel: Arc<AtomicBool>) -> Self {
        Self {
            seen: SeenSet::new(),
            emitted: 0,
            cancel,
        }
    }
}

/// What happened, reported even when the run ends early.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub pages_fetched: u32,
    pub units_seen: u64,
    pub matched: u64,
    pub emitted: u64,
    /// Set when a transport failure ended the run; records emitted
    /// before the failure are already in the sink.
    pub transport_error: Option<String>,
}

/// Log suffix for progress lines; unbounded runs get no denominator.
fn cap_suffix(max_items: u64) -> String {
    if max_items == 0 {
        String::new()
    } else {
        format!("/{}", max_items)
    }
}

/// Execute one scrape run.
///
/// Transport failures abort the run but preserve partial results in the
/// summary; sink failures propagate, since a broken sink means records
/// are being lost.
pub async fn run_scrape(
    config: &RunConfig,
    fetcher: &dyn Fetcher,
    sink: &mut dyn RecordSink,
    cancel: Arc<AtomicBool>,
) -> Result<RunSummary, SinkError> {
    let kind = config.source_kind();
    let criteria = config.criteria();
    let source_label = config.source_label();
    let paginator = Paginator::new(&config.page_param, config.max_pages, config.min_page_density);
    let cap = if config.max_items == 0 {
        u64::MAX
    } else {
        config.max_items
    };

    let cap_suffix = cap_suffix(config.max_items);
    let mut ctx = RunContext::new(cancel);
    let mut summary = RunSummary::default();

    'run: for start_url in config.start_urls() {
        let mut page_url = start_url;

        for page in 1..=config.max_pages {
            if ctx.cancel.load(Ordering::Relaxed) {
                info!("cancellation requested, stopping after page {}", page - 1);
                break 'run;
            }
            if ctx.emitted >= cap {
                break 'run;
            }

            info!("fetching page {}: {}", page, page_url);
            let body = match fetcher.fetch(&page_url).await {
                Ok(body) => body,
                Err(err) => {
                    warn!("failed to fetch {}: {}", page_url, err);
                    summary.transport_error = Some(err.to_string());
                    break 'run;
                }
            };
            summary.pages_fetched += 1;

            // Relative links resolve against the page we fetched them from.
            let base = match Url::parse(&page_url) {
                Ok(url) => url,
                Err(err) => {
                    warn!("unparseable page URL {}: {}", page_url, err);
                    break;
                }
            };

            let units = extract::collect_units(&body, kind);
            if units.is_empty() {
                warn!("no job units on page {}", page);
            }
            summary.units_seen += units.len() as u64;

            let mut page_matched = 0u64;
            for unit in &units {
                if ctx.emitted >= cap {
                    break;
                }
                let Some(mut record) = extract::extract(unit, &base, &source_label) else {
                    continue;
                };
                // Records with neither a title nor a company are noise.
                if record.is_anonymous() {
                    continue;
                }
                if !filter::matches(&record, &criteria, Utc::now()) {
                    continue;
                }
                page_matched += 1;

                if !ctx.seen.admit(&record.dedup_key()) {
                    continue;
                }
                record.collected_at = Utc::now();
                sink.emit(&record)?;
                ctx.emitted += 1;
                info!(
                    "saved {}{}: {} @ {}",
                    ctx.emitted,
                    cap_suffix,
                    record.title.as_deref().unwrap_or("?"),
                    record.company.as_deref().unwrap_or("?"),
                );
            }
            summary.matched += page_matched;
            info!(
                "page {}: {} / {} matched filters",
                page,
                page_matched,
                units.len()
            );

            let page_context = PageContext {
                url: &page_url,
                body: &body,
                kind,
                unit_count: units.len(),
            };
            match paginator.next(&page_context, page, cap - ctx.emitted) {
                Some(next_url) => page_url = next_url,
                None => break,
            }
        }
    }

    summary.emitted = ctx.emitted;
    info!("done: collected {} job postings", summary.emitted);
    Ok(summary)
}
