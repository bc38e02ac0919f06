//! Extraction strategy for RSS feed items.
//!
//! Feed XML is carved up with plain string scanning rather than the HTML
//! parser; feeds lean on namespaced tags (dc:, media:) that an HTML
//! parser mangles. Item fields are unescaped once (CDATA or entities),
//! after which descriptions are ordinary HTML fragments.

use regex::Regex;
use url::Url;

use crate::models::JobRecord;

use super::{classify_tags, description_text, non_empty, resolve_url, tidy_tags, trailing_segment};

/// Split a feed body into raw `<item>` blocks.
pub(super) fn collect_items(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find("<item") {
        let after = &rest[start..];
        let tail = &after["<item".len()..];
        // "<items>" and other longer tag names are not item blocks.
        let Some(boundary) = tail.chars().next() else {
            break;
        };
        if boundary != '>' && boundary != '/' && !boundary.is_whitespace() {
            rest = tail;
            continue;
        }
        let Some(end) = after.find("</item>") else {
            break;
        };
        items.push(after[..end + "</item>".len()].to_string());
        rest = &after[end + "</item>".len()..];
    }
    items
}

pub(super) fn extract(item_xml: &str, base: &Url, source: &str) -> Option<JobRecord> {
    let mut record = JobRecord::new(source);

    let raw_title = tag_body(item_xml, "title");
    let author = tag_body(item_xml, "dc:creator").or_else(|| tag_body(item_xml, "author"));

    // Feeds commonly encode "Company: Job Title" in the item title; split
    // only when no explicit author field exists.
    match (raw_title, author) {
        (Some(title), Some(company)) => {
            record.title = Some(title);
            record.company = Some(company);
        }
        (Some(title), None) => match title.split_once(": ") {
            Some((company, rest)) if !company.is_empty() && !rest.is_empty() => {
                record.company = Some(company.trim().to_string());
                record.title = Some(rest.trim().to_string());
            }
            _ => record.title = Some(title),
        },
        (None, company) => record.company = company,
    }

    // Feeds rarely carry a location; never guess one.
    record.location = tag_body(item_xml, "region");

    record.tags = tidy_tags(tag_bodies(item_xml, "category"));
    let (job_type, job_category) = classify_tags(record.tags.as_deref().unwrap_or_default());
    record.job_type = job_type;
    record.job_category = job_category;

    record.date_posted = tag_body(item_xml, "pubDate").or_else(|| tag_body(item_xml, "dc:date"));

    let raw_url = tag_body(item_xml, "link").or_else(|| tag_body(item_xml, "guid"));
    record.url = raw_url.and_then(|raw| resolve_url(base, &raw));

    record.id = tag_body(item_xml, "guid")
        .or_else(|| record.url.as_deref().and_then(trailing_segment));

    record.logo_url = thumbnail_url(item_xml).and_then(|raw| resolve_url(base, &raw));

    record.description_html = tag_body(item_xml, "description");
    record.description_text = description_text(record.description_html.as_deref());

    Some(record)
}

/// Unescaped body of the first `<tag>` in the block.
fn tag_body(block: &str, tag: &str) -> Option<String> {
    tag_bodies_iter(block, tag).next()
}

/// All unescaped `<tag>` bodies in the block, in document order.
fn tag_bodies(block: &str, tag: &str) -> Vec<String> {
    tag_bodies_iter(block, tag).collect()
}

fn tag_bodies_iter<'a>(block: &'a str, tag: &'a str) -> impl Iterator<Item = String> + 'a {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut rest = block;
    std::iter::from_fn(move || loop {
        let start = rest.find(&open)?;
        let after_open = &rest[start + open.len()..];
        // Require the match to be the full tag name, not a prefix.
        let boundary = after_open.chars().next()?;
        if boundary != '>' && !boundary.is_whitespace() && boundary != '/' {
            rest = after_open;
            continue;
        }
        let content_start = after_open.find('>')? + 1;
        let body_and_rest = &after_open[content_start..];
        let end = match body_and_rest.find(&close) {
            Some(end) => end,
            None => {
                rest = body_and_rest;
                continue;
            }
        };
        let body = &body_and_rest[..end];
        rest = &body_and_rest[end + close.len()..];
        if let Some(value) = non_empty(unescape(body)) {
            return Some(value);
        }
    })
}

/// URL attribute of a `<media:thumbnail>` or `<enclosure>` tag.
fn thumbnail_url(block: &str) -> Option<String> {
    for tag in ["<media:thumbnail", "<enclosure"] {
        let Some(start) = block.find(tag) else {
            continue;
        };
        let after = &block[start..];
        let end = after.find('>')?;
        let attrs = &after[..end];
        if let Some(pos) = attrs.find("url=\"") {
            let value = &attrs[pos + 5..];
            if let Some(close) = value.find('"') {
                return non_empty(unescape(&value[..close]));
            }
        }
    }
    None
}

/// Unwrap CDATA and decode XML entities.
fn unescape(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(trimmed);

    let mut text = inner
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'");

    // Numeric character references.
    if text.contains("&#") {
        let re = Regex::new(r"&#(x[0-9a-fA-F]+|\d+);").expect("valid entity regex");
        text = re
            .replace_all(&text, |caps: &regex::Captures<'_>| {
                let body = &caps[1];
                let code = if let Some(hex) = body.strip_prefix('x') {
                    u32::from_str_radix(hex, 16).ok()
                } else {
                    body.parse::<u32>().ok()
                };
                code.and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
    }

    text.replace("&amp;", "&")
}
