//! Run configuration.
//!
//! Values come from an optional TOML file, overridden by CLI flags.
//! Malformed numeric settings are corrected to sane defaults rather than
//! failing the run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::filter::{DateWindow, FilterCriteria};
use crate::models::SourceKind;

/// Default listing endpoints per source kind.
pub const DEFAULT_HTML_URL: &str = "https://remoteok.com/remote-jobs";
pub const DEFAULT_FEED_URL: &str = "https://remoteok.com/remote-jobs.rss";
pub const DEFAULT_API_URL: &str = "https://remoteok.com/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Case-insensitive keyword filter; empty means no filter.
    #[serde(default)]
    pub keyword: String,
    /// Case-insensitive location filter; empty means no filter.
    #[serde(default)]
    pub location: String,
    /// One of "all", "today", "week", "month".
    #[serde(default = "default_date_filter")]
    pub date_filter: String,
    /// Maximum records to emit; 0 means unbounded.
    #[serde(default = "default_max_items", deserialize_with = "de_max_items")]
    pub max_items: u64,
    /// Safety cap on pages fetched per start URL.
    #[serde(default = "default_max_pages", deserialize_with = "de_max_pages")]
    pub max_pages: u32,
    /// Override of the default listing URL(s) for the chosen source.
    #[serde(default)]
    pub start_urls: Vec<String>,
    /// Source kind: "html", "rss", or "api".
    #[serde(default = "default_source")]
    pub source: String,
    /// Query parameter carrying the page number.
    #[serde(default = "default_page_param")]
    pub page_param: String,
    /// Pages yielding fewer units than this end the run.
    #[serde(default = "default_min_density", deserialize_with = "de_min_density")]
    pub min_page_density: usize,
    /// Inter-request delay bounds in milliseconds.
    #[serde(default = "default_delay_min_ms", deserialize_with = "de_delay_min_ms")]
    pub delay_min_ms: u64,
    #[serde(default = "default_delay_max_ms", deserialize_with = "de_delay_max_ms")]
    pub delay_max_ms: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs", deserialize_with = "de_timeout_secs")]
    pub timeout_secs: u64,
    /// Fixed user agent; unset rotates through the built-in pool.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty config deserializes")
    }
}

fn default_date_filter() -> String {
    "all".to_string()
}
fn default_max_items() -> u64 {
    200
}
fn default_max_pages() -> u32 {
    10
}
fn default_source() -> String {
    "html".to_string()
}
fn default_page_param() -> String {
    "pg".to_string()
}
fn default_min_density() -> usize {
    1
}
fn default_delay_min_ms() -> u64 {
    800
}
fn default_delay_max_ms() -> u64 {
    2000
}
fn default_timeout_secs() -> u64 {
    60
}

/// Numeric settings tolerate type mismatches (`max_items = "lots"`) by
/// falling back to the field default instead of failing the load.
macro_rules! lenient_int_field {
    ($fn_name:ident, $ty:ty, $fallback:ident) => {
        fn $fn_name<'de, D>(deserializer: D) -> Result<$ty, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let value = toml::Value::deserialize(deserializer)?;
            Ok(value
                .as_integer()
                .and_then(|n| <$ty>::try_from(n).ok())
                .unwrap_or_else($fallback))
        }
    };
}

lenient_int_field!(de_max_items, u64, default_max_items);
lenient_int_field!(de_max_pages, u32, default_max_pages);
lenient_int_field!(de_min_density, usize, default_min_density);
lenient_int_field!(de_delay_min_ms, u64, default_delay_min_ms);
lenient_int_field!(de_delay_max_ms, u64, default_delay_max_ms);
lenient_int_field!(de_timeout_secs, u64, default_timeout_secs);

impl RunConfig {
    /// Load from a TOML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// Correct malformed values to sane defaults instead of failing.
    pub fn sanitized(mut self) -> Self {
        if self.max_pages == 0 {
            self.max_pages = default_max_pages();
        }
        if self.min_page_density == 0 {
            self.min_page_density = default_min_density();
        }
        if self.page_param.trim().is_empty() {
            self.page_param = default_page_param();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.delay_max_ms < self.delay_min_ms {
            std::mem::swap(&mut self.delay_min_ms, &mut self.delay_max_ms);
        }
        if SourceKind::from_str(&self.source).is_none() {
            self.source = default_source();
        }
        if DateWindow::from_str(&self.date_filter).is_none() && self.date_filter != "all" {
            self.date_filter = default_date_filter();
        }
        self
    }

    pub fn source_kind(&self) -> SourceKind {
        SourceKind::from_str(&self.source).unwrap_or(SourceKind::Html)
    }

    /// Start URLs for the run: the configured override, else the default
    /// endpoint for the source kind.
    pub fn start_urls(&self) -> Vec<String> {
        if !self.start_urls.is_empty() {
            return self.start_urls.clone();
        }
        let default = match self.source_kind() {
            SourceKind::Html => DEFAULT_HTML_URL,
            SourceKind::Feed => DEFAULT_FEED_URL,
            SourceKind::Api => DEFAULT_API_URL,
        };
        vec![default.to_string()]
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            keyword: Some(self.keyword.clone()).filter(|k| !k.is_empty()),
            location: Some(self.location.clone()).filter(|l| !l.is_empty()),
            date_window: DateWindow::from_str(&self.date_filter),
        }
    }

    /// Label recorded in each emitted record's `source` field.
    pub fn source_label(&self) -> String {
        self.start_urls()
            .first()
            .cloned()
            .unwrap_or_else(|| self.source.clone())
    }
}
