//! Field extraction: raw job units to canonical records.
//!
//! Each source kind has its own strategy table. Within a kind, every
//! field is resolved through an ordered fallback chain; the first
//! non-empty value wins. Structured metadata (schema.org JobPosting
//! blocks) outranks row heuristics wherever both are present.

mod html_row;
mod json_object;
mod rss_item;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::models::{JobRecord, RawUnit, SourceKind};
use crate::sanitize::sanitize;

/// Extract a canonical record from one raw unit.
///
/// Any single-unit failure is logged and yields `None`; one bad unit
/// never aborts the batch.
pub fn extract(unit: &RawUnit, base: &Url, source: &str) -> Option<JobRecord> {
    let result = match unit {
        RawUnit::HtmlRow(html) => html_row::extract(html, base, source),
        RawUnit::RssItem(xml) => rss_item::extract(xml, base, source),
        RawUnit::JsonObject(value) => json_object::extract(value, base, source),
    };
    match result {
        Some(record) => Some(record),
        None => {
            warn!("skipping malformed {} unit", unit.kind().as_str());
            None
        }
    }
}

/// Split a fetched page body into raw job units for the given kind.
pub fn collect_units(body: &str, kind: SourceKind) -> Vec<RawUnit> {
    match kind {
        SourceKind::Html => collect_html_rows(body),
        SourceKind::Feed => rss_item::collect_items(body)
            .into_iter()
            .map(RawUnit::RssItem)
            .collect(),
        SourceKind::Api => json_object::collect_objects(body)
            .into_iter()
            .map(RawUnit::JsonObject)
            .collect(),
    }
}

/// Row selectors tried in order; the first that matches anything wins.
const ROW_SELECTORS: &[&str] = &["tr.job", "li.job", "div.job", "article.job"];

fn collect_html_rows(body: &str) -> Vec<RawUnit> {
    let document = Html::parse_document(body);
    for css in ROW_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let rows: Vec<RawUnit> = document
            .select(&selector)
            .map(|row| RawUnit::HtmlRow(row.html()))
            .collect();
        if !rows.is_empty() {
            debug!("matched {} rows with selector {}", rows.len(), css);
            return rows;
        }
    }
    Vec::new()
}

/// Resolve a possibly-relative URL against the page origin.
pub fn resolve_url(base: &Url, candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    base.join(candidate).ok().map(|u| u.to_string())
}

/// Trailing non-empty path segment of a URL, used as a fallback id when
/// the source exposes none.
pub fn trailing_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(|segment| segment.to_string())
}

/// Canonical employment types, matched case-insensitively and tolerant
/// of separator variants ("full time", "full_time", "full-time").
const EMPLOYMENT_TYPES: &[(&str, &str)] = &[
    ("full time", "Full-Time"),
    ("part time", "Part-Time"),
    ("contract", "Contract"),
    ("freelance", "Freelance"),
    ("internship", "Internship"),
    ("temporary", "Temporary"),
];

/// Classify a tag as an employment type, if it is one.
pub fn employment_type(tag: &str) -> Option<&'static str> {
    let normalized: String = tag
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect();
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    EMPLOYMENT_TYPES
        .iter()
        .find(|(pattern, _)| normalized == *pattern)
        .map(|(_, canonical)| *canonical)
}

/// Derive `job_type` and `job_category` from the tag list.
///
/// `job_type` is the first tag matching an employment-type pattern;
/// `job_category` is the first tag that does not, else the first tag.
pub fn classify_tags(tags: &[String]) -> (Option<String>, Option<String>) {
    let job_type = tags
        .iter()
        .find_map(|tag| employment_type(tag))
        .map(|t| t.to_string());
    let job_category = tags
        .iter()
        .find(|tag| employment_type(tag).is_none())
        .or_else(|| tags.first())
        .cloned();
    (job_type, job_category)
}

/// Trim, drop empties, and dedupe preserving first-seen order. Returns
/// `None` rather than an empty list.
pub fn tidy_tags(raw: Vec<String>) -> Option<Vec<String>> {
    let mut seen = std::collections::HashSet::new();
    let tags: Vec<String> = raw
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect();
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

/// Derive `description_text` from an HTML fragment, dropping empties.
pub fn description_text(html: Option<&str>) -> Option<String> {
    html.map(sanitize).filter(|text| !text.is_empty())
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First element matching the selector.
fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

/// Collapsed visible text of the first element matching the selector.
fn select_text(document: &Html, css: &str) -> Option<String> {
    let element = select_first(document, css)?;
    non_empty(element.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Attribute of the first element matching the selector.
fn select_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let element = select_first(document, css)?;
    element.value().attr(attr).map(str::to_string).and_then(non_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employment_type_separator_variants() {
        assert_eq!(employment_type("Full-Time"), Some("Full-Time"));
        assert_eq!(employment_type("full time"), Some("Full-Time"));
        assert_eq!(employment_type("FULL_TIME"), Some("Full-Time"));
        assert_eq!(employment_type("part-time"), Some("Part-Time"));
        assert_eq!(employment_type("Contract"), Some("Contract"));
        assert_eq!(employment_type("rust"), None);
        assert_eq!(employment_type("fulltime"), None);
    }

    #[test]
    fn test_classify_tags() {
        let tags = vec![
            "rust".to_string(),
            "full-time".to_string(),
            "backend".to_string(),
        ];
        let (job_type, job_category) = classify_tags(&tags);
        assert_eq!(job_type, Some("Full-Time".to_string()));
        assert_eq!(job_category, Some("rust".to_string()));

        // Only employment-type tags: category falls back to the first tag.
        let tags = vec!["contract".to_string()];
        let (job_type, job_category) = classify_tags(&tags);
        assert_eq!(job_type, Some("Contract".to_string()));
        assert_eq!(job_category, Some("contract".to_string()));

        let (job_type, job_category) = classify_tags(&[]);
        assert_eq!(job_type, None);
        assert_eq!(job_category, None);
    }

    #[test]
    fn test_tidy_tags_dedupes_in_order() {
        let tags = tidy_tags(vec![
            " rust ".to_string(),
            "python".to_string(),
            "rust".to_string(),
            "".to_string(),
        ]);
        assert_eq!(
            tags,
            Some(vec!["rust".to_string(), "python".to_string()])
        );
        assert_eq!(tidy_tags(vec!["  ".to_string()]), None);
        assert_eq!(tidy_tags(Vec::new()), None);
    }

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/remote-jobs").unwrap();
        assert_eq!(
            resolve_url(&base, "/remote-jobs/123"),
            Some("https://example.com/remote-jobs/123".to_string())
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            Some("https://other.com/x".to_string())
        );
        assert_eq!(resolve_url(&base, "  "), None);
    }

    #[test]
    fn test_trailing_segment() {
        assert_eq!(
            trailing_segment("https://example.com/remote-jobs/123"),
            Some("123".to_string())
        );
        assert_eq!(
            trailing_segment("https://example.com/remote-jobs/123/"),
            Some("123".to_string())
        );
        assert_eq!(trailing_segment("https://example.com/"), None);
    }

    #[test]
    fn test_collect_html_rows_fallback_selectors() {
        let body = r#"<html><body>
            <ul><li class="job">one</li><li class="job">two</li></ul>
        </body></html>"#;
        assert_eq!(collect_units(body, SourceKind::Html).len(), 2);
        assert!(collect_units("<p>no jobs</p>", SourceKind::Html).is_empty());
    }
}
