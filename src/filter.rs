//! Keyword, location, and date-window filtering of job records.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::models::JobRecord;

/// How far back a record's posting date may lie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    Today,
    Week,
    Month,
}

impl DateWindow {
    pub fn duration(&self) -> Duration {
        match self {
            Self::Today => Duration::hours(24),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(31),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "today" => Some(Self::Today),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }
}

/// Run-scoped filter settings; all fields are independently optional.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub date_window: Option<DateWindow>,
}

/// Evaluate a record against the criteria. Sub-matches are ANDed.
pub fn matches(record: &JobRecord, criteria: &FilterCriteria, now: DateTime<Utc>) -> bool {
    matches_keyword(record, criteria.keyword.as_deref())
        && matches_location(record, criteria.location.as_deref())
        && matches_date(record, criteria.date_window, now)
}

fn matches_keyword(record: &JobRecord, keyword: Option<&str>) -> bool {
    let Some(keyword) = keyword.filter(|k| !k.is_empty()) else {
        return true;
    };
    let haystack = [
        record.title.as_deref().unwrap_or(""),
        record.company.as_deref().unwrap_or(""),
        record.description_text.as_deref().unwrap_or(""),
        &record.tags.as_deref().unwrap_or_default().join(" "),
    ]
    .join(" ")
    .to_lowercase();
    haystack.contains(&keyword.to_lowercase())
}

fn matches_location(record: &JobRecord, location: Option<&str>) -> bool {
    let Some(location) = location.filter(|l| !l.is_empty()) else {
        return true;
    };
    match record.location.as_deref() {
        Some(record_location) => record_location
            .to_lowercase()
            .contains(&location.to_lowercase()),
        // A non-empty criteria cannot match a record with no location.
        None => false,
    }
}

fn matches_date(record: &JobRecord, window: Option<DateWindow>, now: DateTime<Utc>) -> bool {
    let Some(window) = window else {
        return true;
    };
    // Ambiguous dates are not grounds for exclusion.
    let Some(posted) = record.date_posted.as_deref().and_then(parse_timestamp) else {
        return true;
    };
    // Future-dated postings pass; excluding them would punish clock skew.
    if posted > now {
        return true;
    }
    now - posted <= window.duration()
}

/// Parse a posting date from epoch seconds or common datetime forms.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(epoch) = raw.parse::<i64>() {
        return Utc.timestamp_opt(epoch, 0).single();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> JobRecord {
        let mut record = JobRecord::new("test");
        record.title = Some("Senior Python Engineer".to_string());
        record.company = Some("Acme Corp".to_string());
        record.location = Some("Europe".to_string());
        record.tags = Some(vec!["backend".to_string()]);
        record.description_text = Some("Distributed systems role".to_string());
        record
    }

    #[test]
    fn test_empty_criteria_matches_everything() {
        assert!(matches(&record(), &FilterCriteria::default(), Utc::now()));
    }

    #[test]
    fn test_keyword_is_case_insensitive_substring() {
        let criteria = FilterCriteria {
            keyword: Some("python".to_string()),
            ..Default::default()
        };
        assert!(matches(&record(), &criteria, Utc::now()));

        let criteria = FilterCriteria {
            keyword: Some("BACKEND".to_string()),
            ..Default::default()
        };
        assert!(matches(&record(), &criteria, Utc::now()));

        let criteria = FilterCriteria {
            keyword: Some("golang".to_string()),
            ..Default::default()
        };
        assert!(!matches(&record(), &criteria, Utc::now()));
    }

    #[test]
    fn test_location_match() {
        let criteria = FilterCriteria {
            location: Some("europe".to_string()),
            ..Default::default()
        };
        assert!(matches(&record(), &criteria, Utc::now()));

        let mut no_location = record();
        no_location.location = None;
        assert!(!matches(&no_location, &criteria, Utc::now()));
        assert!(matches(&no_location, &FilterCriteria::default(), Utc::now()));
    }

    #[test]
    fn test_and_composition() {
        // Keyword passes but location fails: the record is excluded.
        let criteria = FilterCriteria {
            keyword: Some("python".to_string()),
            location: Some("tokyo".to_string()),
            ..Default::default()
        };
        assert!(!matches(&record(), &criteria, Utc::now()));
    }

    #[test]
    fn test_date_window_inclusive_boundary() {
        let now = Utc::now();
        let criteria = FilterCriteria {
            date_window: Some(DateWindow::Today),
            ..Default::default()
        };

        let mut on_boundary = record();
        on_boundary.date_posted = Some((now - Duration::hours(24)).to_rfc3339());
        assert!(matches(&on_boundary, &criteria, now));

        let mut past_boundary = record();
        past_boundary.date_posted =
            Some((now - Duration::hours(24) - Duration::seconds(1)).to_rfc3339());
        assert!(!matches(&past_boundary, &criteria, now));
    }

    #[test]
    fn test_unparseable_and_future_dates_pass() {
        let now = Utc::now();
        let criteria = FilterCriteria {
            date_window: Some(DateWindow::Today),
            ..Default::default()
        };

        let mut garbled = record();
        garbled.date_posted = Some("a fortnight ago".to_string());
        assert!(matches(&garbled, &criteria, now));

        let mut absent = record();
        absent.date_posted = None;
        assert!(matches(&absent, &criteria, now));

        let mut future = record();
        future.date_posted = Some((now + Duration::hours(2)).to_rfc3339());
        assert!(matches(&future, &criteria, now));
    }

    #[test]
    fn test_parse_timestamp_forms() {
        assert!(parse_timestamp("1787824800").is_some());
        assert!(parse_timestamp("2026-08-28T10:00:00+00:00").is_some());
        assert!(parse_timestamp("Fri, 28 Aug 2026 10:00:00 +0000").is_some());
        assert!(parse_timestamp("2026-08-28T10:00:00").is_some());
        assert!(parse_timestamp("2026-08-28").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_epoch_seconds_in_date_window() {
        let now = Utc::now();
        let criteria = FilterCriteria {
            date_window: Some(DateWindow::Week),
            ..Default::default()
        };
        let mut fresh = record();
        fresh.date_posted = Some((now - Duration::days(2)).timestamp().to_string());
        assert!(matches(&fresh, &criteria, now));

        let mut stale = record();
        stale.date_posted = Some((now - Duration::days(9)).timestamp().to_string());
        assert!(!matches(&stale, &criteria, now));
    }
}
