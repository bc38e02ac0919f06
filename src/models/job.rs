//! Canonical job record produced by the field extractor.
//!
//! One `JobRecord` is emitted per admitted job posting, independent of
//! whether it came from an HTML row, an RSS item, or a JSON API object.
//! Optional fields serialize as `null` rather than being omitted, so the
//! wire schema stays stable across sources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Salary information, either free-form text or a numeric range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Salary {
    /// Raw salary text as shown on the listing (e.g. "$90k – $130k").
    Text(String),
    /// Numeric bounds from the source. Bounds are `None` when the source
    /// value was missing, non-finite, or not strictly positive.
    Range {
        min: Option<f64>,
        max: Option<f64>,
    },
}

/// Normalize raw numeric salary bounds.
///
/// A bound survives only when it is finite and strictly positive;
/// everything else becomes `None`, never zero.
pub fn normalize_salary_bounds(
    min: Option<f64>,
    max: Option<f64>,
) -> (Option<f64>, Option<f64>) {
    let keep = |v: Option<f64>| v.filter(|n| n.is_finite() && *n > 0.0);
    (keep(min), keep(max))
}

/// A normalized job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Source-native identifier, used as the dedup key when present.
    pub id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    /// Machine-readable datetime when available, otherwise the raw text.
    pub date_posted: Option<String>,
    /// Derived from the first tag matching an employment-type pattern.
    pub job_type: Option<String>,
    /// Derived from the first non-employment-type tag.
    pub job_category: Option<String>,
    pub salary: Option<Salary>,
    /// Distinct trimmed tags in first-seen order; omitted when empty.
    pub tags: Option<Vec<String>>,
    pub description_html: Option<String>,
    pub description_text: Option<String>,
    /// Always absolute when present.
    pub url: Option<String>,
    pub logo_url: Option<String>,
    /// Constant per run (the listing endpoint scraped).
    pub source: String,
    /// Set at emission time.
    pub collected_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create an empty record for the given source.
    pub fn new(source: &str) -> Self {
        Self {
            id: None,
            title: None,
            company: None,
            location: None,
            date_posted: None,
            job_type: None,
            job_category: None,
            salary: None,
            tags: None,
            description_html: None,
            description_text: None,
            url: None,
            logo_url: None,
            source: source.to_string(),
            collected_at: Utc::now(),
        }
    }

    /// True when both `title` and `company` are absent. Such records are
    /// never emitted.
    pub fn is_anonymous(&self) -> bool {
        self.title.is_none() && self.company.is_none()
    }

    /// Key for duplicate suppression: the source-native id when present,
    /// else the resolved URL, else a title/company composite.
    pub fn dedup_key(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!(
            "{}@{}",
            self.title.as_deref().unwrap_or(""),
            self.company.as_deref().unwrap_or("")
        )
    }
}
