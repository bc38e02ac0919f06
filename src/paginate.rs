//! Next-page resolution.
//!
//! Priority: an explicit rel=next link, then an anchor whose label looks
//! like "next", then a synthesized URL bumping the page-number query
//! parameter. Feeds and APIs have no navigation markup, so they go
//! straight to synthesis.

use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::models::SourceKind;

/// Everything the resolver needs to know about the page just processed.
pub struct PageContext<'a> {
    pub url: &'a str,
    pub body: &'a str,
    pub kind: SourceKind,
    /// Number of job units the page yielded.
    pub unit_count: usize,
}

/// Explicit next-link selectors, most specific first.
const NEXT_SELECTORS: &[&str] = &[
    r#"a[rel="next"]"#,
    r#"link[rel="next"]"#,
    ".pagination a.next",
    "a.next-page",
    "a.next",
];

#[derive(Debug, Clone)]
pub struct Paginator {
    /// Query parameter carrying the page number (the board uses `pg`).
    pub page_param: String,
    /// Safety cap on pages per start URL.
    pub max_pages: u32,
    /// Pages yielding fewer units than this signal end-of-results.
    pub min_density: usize,
}

impl Paginator {
    pub fn new(page_param: &str, max_pages: u32, min_density: usize) -> Self {
        Self {
            page_param: page_param.to_string(),
            max_pages,
            min_density,
        }
    }

    /// Decide the next URL to fetch, or `None` to stop paginating.
    ///
    /// `remaining` is the number of records the run may still emit.
    pub fn next(&self, page: &PageContext<'_>, current_page: u32, remaining: u64) -> Option<String> {
        if remaining == 0 {
            debug!("item cap satisfied, stopping pagination");
            return None;
        }
        if page.unit_count < self.min_density {
            debug!(
                "page yielded {} units (minimum {}), treating as end of results",
                page.unit_count, self.min_density
            );
            return None;
        }
        if current_page >= self.max_pages {
            debug!("page cap {} reached", self.max_pages);
            return None;
        }

        match page.kind {
            SourceKind::Html => self
                .next_from_links(page)
                .or_else(|| self.synthesize(page.url, current_page)),
            SourceKind::Feed | SourceKind::Api => self.synthesize(page.url, current_page),
        }
    }

    /// Find an explicit or labeled next link in the page markup.
    fn next_from_links(&self, page: &PageContext<'_>) -> Option<String> {
        let base = Url::parse(page.url).ok()?;
        let document = Html::parse_document(page.body);

        for css in NEXT_SELECTORS {
            let Ok(selector) = Selector::parse(css) else {
                continue;
            };
            if let Some(href) = document
                .select(&selector)
                .find_map(|el| el.value().attr("href"))
            {
                if let Ok(next) = base.join(href) {
                    return Some(next.to_string());
                }
            }
        }

        // Fall back to matching visible anchor labels, arrows included.
        let label_pattern = Regex::new(r"(?i)^(next|more jobs|older)\b|^(»|›|→|>>)$").ok()?;
        let anchors = Selector::parse("a[href]").ok()?;
        for anchor in document.select(&anchors) {
            let label = anchor.text().collect::<String>();
            if label_pattern.is_match(label.trim()) {
                if let Some(href) = anchor.value().attr("href") {
                    if let Ok(next) = base.join(href) {
                        return Some(next.to_string());
                    }
                }
            }
        }
        None
    }

    /// Bump the page-number parameter, preserving existing query params.
    fn synthesize(&self, current_url: &str, current_page: u32) -> Option<String> {
        let mut url = Url::parse(current_url).ok()?;
        let mut params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let next_page = (current_page + 1).to_string();
        match params.iter_mut().find(|(key, _)| *key == self.page_param) {
            Some(pair) => pair.1 = next_page,
            None => params.push((self.page_param.clone(), next_page)),
        }
        url.query_pairs_mut().clear().extend_pairs(&params);
        Some(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginator() -> Paginator {
        Paginator::new("pg", 10, 1)
    }

    fn html_page<'a>(url: &'a str, body: &'a str, unit_count: usize) -> PageContext<'a> {
        PageContext {
            url,
            body,
            kind: SourceKind::Html,
            unit_count,
        }
    }

    #[test]
    fn test_explicit_next_link_wins() {
        let body = r#"<a rel="next" href="/remote-jobs?pg=7">weird label</a>"#;
        let page = html_page("https://example.com/remote-jobs?pg=6", body, 20);
        assert_eq!(
            paginator().next(&page, 6, 100),
            Some("https://example.com/remote-jobs?pg=7".to_string())
        );
    }

    #[test]
    fn test_labeled_next_link() {
        let body = r#"<a href="/page/2">Next →</a>"#;
        let page = html_page("https://example.com/remote-jobs", body, 20);
        assert_eq!(
            paginator().next(&page, 1, 100),
            Some("https://example.com/page/2".to_string())
        );

        let body = r#"<a href="/page/2">»</a>"#;
        let page = html_page("https://example.com/remote-jobs", body, 20);
        assert_eq!(
            paginator().next(&page, 1, 100),
            Some("https://example.com/page/2".to_string())
        );
    }

    #[test]
    fn test_synthesized_page_param() {
        let page = html_page("https://example.com/remote-jobs", "<p>no nav</p>", 20);
        assert_eq!(
            paginator().next(&page, 1, 100),
            Some("https://example.com/remote-jobs?pg=2".to_string())
        );
    }

    #[test]
    fn test_synthesis_preserves_existing_params() {
        let page = PageContext {
            url: "https://example.com/api?tag=rust&pg=3",
            body: "",
            kind: SourceKind::Api,
            unit_count: 50,
        };
        assert_eq!(
            paginator().next(&page, 3, 100),
            Some("https://example.com/api?tag=rust&pg=4".to_string())
        );
    }

    #[test]
    fn test_density_threshold_terminates() {
        let paginator = Paginator::new("pg", 10, 5);
        let page = html_page("https://example.com/remote-jobs", "", 3);
        assert_eq!(paginator.next(&page, 1, 100), None);
    }

    #[test]
    fn test_page_cap_terminates() {
        let paginator = Paginator::new("pg", 3, 1);
        let page = html_page("https://example.com/remote-jobs?pg=3", "", 20);
        assert_eq!(paginator.next(&page, 3, 100), None);
    }

    #[test]
    fn test_item_cap_terminates() {
        let page = html_page("https://example.com/remote-jobs", "", 20);
        assert_eq!(paginator().next(&page, 1, 0), None);
    }

    #[test]
    fn test_unlabeled_links_ignored() {
        let body = r#"<a href="/remote-jobs/123">Senior Engineer</a>"#;
        let page = html_page("https://example.com/remote-jobs", body, 20);
        // No next link in markup: synthesis takes over.
        assert_eq!(
            paginator().next(&page, 1, 100),
            Some("https://example.com/remote-jobs?pg=2".to_string())
        );
    }
}
