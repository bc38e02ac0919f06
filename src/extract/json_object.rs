//! Extraction strategy for JSON API objects.
//!
//! The board's undocumented API returns either a top-level array of job
//! objects or an envelope with the array under a well-known key. The
//! first array element is sometimes a legal-notice object rather than a
//! job; anything without job-like fields is dropped at collection time.

use serde_json::Value;
use url::Url;

use crate::models::{normalize_salary_bounds, JobRecord, Salary};

use super::{classify_tags, description_text, non_empty, resolve_url, tidy_tags, trailing_segment};

/// Envelope keys tried when the response is not a bare array.
const ITEM_KEYS: &[&str] = &["jobs", "results", "data", "items"];

/// Parse an API response body into job-like objects.
pub(super) fn collect_objects(body: &str) -> Vec<Value> {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return Vec::new(),
    };
    let items = match &parsed {
        Value::Array(items) => items.clone(),
        Value::Object(map) => ITEM_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array).cloned())
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    items.into_iter().filter(looks_like_job).collect()
}

/// Weed out non-job envelope entries (e.g. the API's legal notice).
fn looks_like_job(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    ["id", "position", "title", "url"]
        .iter()
        .any(|key| map.contains_key(*key))
}

pub(super) fn extract(object: &Value, base: &Url, source: &str) -> Option<JobRecord> {
    let map = object.as_object()?;
    let field = |keys: &[&str]| -> Option<String> {
        keys.iter().find_map(|key| {
            map.get(*key).and_then(|value| match value {
                Value::String(s) => non_empty(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        })
    };

    let mut record = JobRecord::new(source);

    record.title = field(&["position", "title"]);
    record.company = field(&["company", "company_name"]);
    record.location = field(&["location", "region"]).or_else(|| Some("Worldwide".to_string()));

    let raw_tags: Vec<String> = map
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    record.tags = tidy_tags(raw_tags);
    let (job_type, job_category) = classify_tags(record.tags.as_deref().unwrap_or_default());
    record.job_type = job_type;
    record.job_category = job_category;

    let min = map.get("salary_min").and_then(Value::as_f64);
    let max = map.get("salary_max").and_then(Value::as_f64);
    let (min, max) = normalize_salary_bounds(min, max);
    record.salary = if min.is_some() || max.is_some() {
        Some(Salary::Range { min, max })
    } else {
        field(&["salary"]).map(Salary::Text)
    };

    // Prefer the ISO date field over the raw epoch.
    record.date_posted = field(&["date", "date_posted"]).or_else(|| field(&["epoch"]));

    record.url = field(&["url", "apply_url"]).and_then(|raw| resolve_url(base, &raw));

    record.id = field(&["id", "slug"])
        .or_else(|| record.url.as_deref().and_then(trailing_segment));

    record.logo_url = field(&["logo", "company_logo", "image"])
        .and_then(|raw| resolve_url(base, &raw));

    record.description_html = field(&["description"]);
    record.description_text = description_text(record.description_html.as_deref());

    Some(record)
}
