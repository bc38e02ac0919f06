//! Raw job units and the source kinds that produce them.

use serde::{Deserialize, Serialize};

/// How the job board is being consumed. Chosen once per run; every unit
/// on a page carries the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// HTML listing pages (table rows).
    Html,
    /// RSS feed items.
    Feed,
    /// Undocumented JSON API objects.
    Api,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Feed => "rss",
            Self::Api => "api",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "html" => Some(Self::Html),
            "rss" | "feed" => Some(Self::Feed),
            "api" | "json" => Some(Self::Api),
            _ => None,
        }
    }
}

/// One raw scraped representation of a single job posting, prior to
/// normalization.
#[derive(Debug, Clone)]
pub enum RawUnit {
    /// Outer HTML of one listing row.
    HtmlRow(String),
    /// One `<item>` block from an RSS feed.
    RssItem(String),
    /// One object from a JSON API response.
    JsonObject(serde_json::Value),
}

impl RawUnit {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::HtmlRow(_) => SourceKind::Html,
            Self::RssItem(_) => SourceKind::Feed,
            Self::JsonObject(_) => SourceKind::Api,
        }
    }
}
