//! Extraction strategy for HTML listing rows.
//!
//! Priority per field: embedded schema.org JobPosting metadata, then the
//! board's visible markup (itemprop/class selectors), then data
//! attributes on the row element. A malformed or partial metadata block
//! only loses the fields it is missing; row heuristics fill the rest.

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::models::{normalize_salary_bounds, JobRecord, Salary};

use super::{
    classify_tags, description_text, non_empty, resolve_url, select_attr, select_first,
    select_text, tidy_tags, trailing_segment,
};

pub(super) fn extract(row_html: &str, base: &Url, source: &str) -> Option<JobRecord> {
    // Bare <tr> fragments get dropped by the HTML parser without a table
    // context, so give them one.
    let wrapped = format!("<table>{}</table>", row_html);
    let fragment = Html::parse_fragment(&wrapped);
    let row = select_first(&fragment, "tr, li, div, article")?;
    let row_attr = |name: &str| row.value().attr(name).map(str::to_string).and_then(non_empty);

    let meta = job_posting_metadata(&fragment);
    let meta = meta.as_ref();

    let mut record = JobRecord::new(source);

    record.title = meta_str(meta, &["title"])
        .or_else(|| select_text(&fragment, r#"h2[itemprop="title"]"#))
        .or_else(|| select_text(&fragment, "h2"))
        .or_else(|| row_attr("data-position"));

    record.company = meta_str(meta, &["hiringOrganization", "name"])
        .or_else(|| select_text(&fragment, r#"h3[itemprop="name"]"#))
        .or_else(|| select_text(&fragment, "h3"))
        .or_else(|| row_attr("data-company"));

    record.location = meta_location(meta)
        .or_else(|| select_text(&fragment, ".location"))
        .or_else(|| row_attr("data-location"))
        .or_else(|| Some("Worldwide".to_string()));

    let mut raw_tags: Vec<String> = Vec::new();
    if let Ok(selector) = Selector::parse(".tags .tag, .tag") {
        for element in fragment.select(&selector) {
            raw_tags.push(element.text().collect::<Vec<_>>().join(" "));
        }
    }
    record.tags = tidy_tags(raw_tags);

    let (mut job_type, job_category) =
        classify_tags(record.tags.as_deref().unwrap_or_default());
    if job_type.is_none() {
        job_type = meta_employment_type(meta);
    }
    record.job_type = job_type;
    record.job_category = job_category;

    record.salary = meta_salary(meta)
        .or_else(|| select_text(&fragment, ".salary").map(Salary::Text));

    record.date_posted = meta_str(meta, &["datePosted"])
        .or_else(|| select_attr(&fragment, "time", "datetime"))
        .or_else(|| select_text(&fragment, "time"));

    let raw_url = meta_str(meta, &["url"])
        .or_else(|| select_attr(&fragment, "a.preventLink", "href"))
        .or_else(|| select_attr(&fragment, r#"a[itemprop="url"]"#, "href"))
        .or_else(|| select_attr(&fragment, "a[href]", "href"))
        .or_else(|| row_attr("data-url"))
        .or_else(|| row_attr("data-href"));
    record.url = raw_url.and_then(|raw| resolve_url(base, &raw));

    record.id = row_attr("data-id")
        .or_else(|| meta_str(meta, &["identifier", "value"]))
        .or_else(|| record.url.as_deref().and_then(trailing_segment));

    record.logo_url = select_attr(&fragment, "img.logo", "data-src")
        .or_else(|| select_attr(&fragment, "img.logo", "src"))
        .or_else(|| select_attr(&fragment, "img", "src"))
        .and_then(|raw| resolve_url(base, &raw));

    // The visible fragment is richer than the metadata summary, so it
    // wins for descriptions.
    record.description_html = select_first(&fragment, ".description, .expandContents")
        .map(|element| element.inner_html())
        .and_then(non_empty)
        .or_else(|| meta_str(meta, &["description"]));
    record.description_text = description_text(record.description_html.as_deref());

    Some(record)
}

/// Parse the first well-formed JobPosting block in the fragment.
fn job_posting_metadata(fragment: &Html) -> Option<Value> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    for element in fragment.select(&selector) {
        let raw = element.text().collect::<String>();
        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                debug!("unparseable ld+json block: {}", err);
                continue;
            }
        };
        if let Some(posting) = find_job_posting(&parsed) {
            return Some(posting.clone());
        }
    }
    None
}

/// Locate a JobPosting node, descending into arrays and @graph wrappers.
fn find_job_posting(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if map.get("@type").and_then(Value::as_str) == Some("JobPosting") {
                return Some(value);
            }
            map.get("@graph").and_then(find_job_posting)
        }
        Value::Array(items) => items.iter().find_map(find_job_posting),
        _ => None,
    }
}

/// String at a nested key path, empty values dropped.
fn meta_str(meta: Option<&Value>, path: &[&str]) -> Option<String> {
    let mut current = meta?;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str().map(str::to_string).and_then(non_empty)
}

fn meta_location(meta: Option<&Value>) -> Option<String> {
    meta_str(meta, &["jobLocation", "address", "addressLocality"])
        .or_else(|| meta_str(meta, &["jobLocation", "name"]))
        .or_else(|| meta_str(meta, &["applicantLocationRequirements", "name"]))
}

fn meta_employment_type(meta: Option<&Value>) -> Option<String> {
    let raw = match meta?.get("employmentType")? {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.first()?.as_str()?.to_string(),
        _ => return None,
    };
    super::employment_type(&raw).map(str::to_string)
}

fn meta_salary(meta: Option<&Value>) -> Option<Salary> {
    let value = meta?.get("baseSalary")?.get("value")?;
    let min = value.get("minValue").and_then(Value::as_f64);
    let max = value.get("maxValue").and_then(Value::as_f64);
    let (min, max) = normalize_salary_bounds(min, max);
    if min.is_none() && max.is_none() {
        return None;
    }
    Some(Salary::Range { min, max })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/remote-jobs").unwrap()
    }

    const ROW: &str = r#"<tr class="job" data-id="4242" data-url="/remote-jobs/4242">
        <td><img class="logo" data-src="/logos/acme.png"></td>
        <td>
            <a class="preventLink" href="/remote-jobs/4242"></a>
            <h2 itemprop="title">Senior Rust Engineer</h2>
            <h3 itemprop="name">Acme Corp</h3>
            <div class="location">Europe</div>
            <time datetime="2026-08-28T10:00:00+00:00">2d</time>
        </td>
        <td class="tags">
            <span class="tag">rust</span>
            <span class="tag">full-time</span>
            <span class="tag">backend</span>
        </td>
        <td><div class="description"><p>Build <b>fast</b> systems.</p></div></td>
    </tr>"#;

    #[test]
    fn test_row_extraction() {
        let record = extract(ROW, &base(), "remoteok").unwrap();
        assert_eq!(record.title.as_deref(), Some("Senior Rust Engineer"));
        assert_eq!(record.company.as_deref(), Some("Acme Corp"));
        assert_eq!(record.location.as_deref(), Some("Europe"));
        assert_eq!(record.id.as_deref(), Some("4242"));
        assert_eq!(
            record.url.as_deref(),
            Some("https://example.com/remote-jobs/4242")
        );
        assert_eq!(
            record.logo_url.as_deref(),
            Some("https://example.com/logos/acme.png")
        );
        assert_eq!(
            record.date_posted.as_deref(),
            Some("2026-08-28T10:00:00+00:00")
        );
        assert_eq!(record.job_type.as_deref(), Some("Full-Time"));
        assert_eq!(record.job_category.as_deref(), Some("rust"));
        assert_eq!(
            record.tags,
            Some(vec![
                "rust".to_string(),
                "full-time".to_string(),
                "backend".to_string()
            ])
        );
        assert_eq!(
            record.description_text.as_deref(),
            Some("Build fast systems.")
        );
        assert!(record.description_html.as_deref().unwrap().contains("<b>"));
    }

    #[test]
    fn test_missing_location_defaults_to_worldwide() {
        let row = r#"<tr class="job"><td><h2>Dev</h2><h3>Co</h3></td></tr>"#;
        let record = extract(row, &base(), "remoteok").unwrap();
        assert_eq!(record.location.as_deref(), Some("Worldwide"));
    }

    #[test]
    fn test_structured_metadata_wins() {
        let row = r#"<tr class="job">
            <td><script type="application/ld+json">{
                "@type": "JobPosting",
                "title": "Staff Engineer",
                "hiringOrganization": {"name": "Metadata Inc"},
                "datePosted": "2026-08-01",
                "baseSalary": {"value": {"minValue": 0, "maxValue": 150000}}
            }</script>
            <h2>Visible Title</h2><h3>Visible Co</h3></td>
        </tr>"#;
        let record = extract(row, &base(), "remoteok").unwrap();
        assert_eq!(record.title.as_deref(), Some("Staff Engineer"));
        assert_eq!(record.company.as_deref(), Some("Metadata Inc"));
        assert_eq!(record.date_posted.as_deref(), Some("2026-08-01"));
        assert_eq!(
            record.salary,
            Some(Salary::Range {
                min: None,
                max: Some(150000.0)
            })
        );
    }

    #[test]
    fn test_partial_metadata_falls_back_per_field() {
        // Metadata has a title but no organization: company still comes
        // from the row markup.
        let row = r#"<tr class="job">
            <td><script type="application/ld+json">{"@type": "JobPosting", "title": "From Meta"}</script>
            <h3 itemprop="name">Row Co</h3></td>
        </tr>"#;
        let record = extract(row, &base(), "remoteok").unwrap();
        assert_eq!(record.title.as_deref(), Some("From Meta"));
        assert_eq!(record.company.as_deref(), Some("Row Co"));
    }

    #[test]
    fn test_malformed_metadata_ignored() {
        let row = r#"<tr class="job">
            <td><script type="application/ld+json">{not json</script>
            <h2>Still Works</h2><h3>Co</h3></td>
        </tr>"#;
        let record = extract(row, &base(), "remoteok").unwrap();
        assert_eq!(record.title.as_deref(), Some("Still Works"));
    }

    #[test]
    fn test_empty_row_is_anonymous() {
        let record = extract("<tr class=\"job\"><td></td></tr>", &base(), "remoteok").unwrap();
        assert!(record.is_anonymous());
    }

    #[test]
    fn test_find_job_posting_in_graph() {
        let value: Value = serde_json::from_str(
            r#"{"@graph": [{"@type": "WebSite"}, {"@type": "JobPosting", "title": "x"}]}"#,
        )
        .unwrap();
        assert!(find_job_posting(&value).is_some());
    }
}
