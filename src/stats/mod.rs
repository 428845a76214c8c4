use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

/// Public summary endpoint queried exactly once per session.
pub const SUMMARY_URL: &str = "https://api.covid19api.com/summary";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One country's statistics snapshot. Immutable once fetched.
/// Count fields are optional because the upstream feed occasionally omits
/// them; an absent field still gets a line in the info panel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatRecord {
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub total_confirmed: Option<u64>,
    #[serde(default)]
    pub total_deaths: Option<u64>,
    #[serde(default)]
    pub new_confirmed: Option<u64>,
    #[serde(default)]
    pub new_deaths: Option<u64>,
    #[serde(default)]
    pub date: Option<String>,
}

impl StatRecord {
    /// Sort/scale key. Records without a count sort lowest.
    pub fn confirmed(&self) -> u64 {
        self.total_confirmed.unwrap_or(0)
    }
}

/// Top-level summary payload; only the per-country array matters here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Summary {
    #[serde(default)]
    pub countries: Vec<StatRecord>,
}

/// Blocking GET of the summary feed.
pub fn fetch_summary(url: &str) -> Result<Summary> {
    let response = ureq::get(url)
        .timeout(FETCH_TIMEOUT)
        .call()
        .with_context(|| format!("fetching statistics from {url}"))?;
    response
        .into_json::<Summary>()
        .context("decoding statistics summary")
}

/// Run the one-shot summary fetch on a detached background thread.
/// The UI thread drains the returned channel with `try_recv`; dropping the
/// receiver cancels interest and a late send fails harmlessly.
pub fn spawn_summary_fetch(url: String) -> Receiver<Result<Vec<StatRecord>>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = fetch_summary(&url).map(|summary| summary.countries);
        let _ = tx.send(result);
    });
    rx
}

/// Format an RFC 3339 timestamp from the feed as a short local-style date.
/// Unparseable input is shown as-is rather than dropped.
pub fn format_date(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format("%x").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_summary() {
        let raw = r#"{
            "Countries": [
                {
                    "CountryCode": "US",
                    "TotalConfirmed": 100,
                    "TotalDeaths": 5,
                    "NewConfirmed": 10,
                    "NewDeaths": 1,
                    "Date": "2020-04-05T22:45:05Z"
                }
            ]
        }"#;
        let summary: Summary = serde_json::from_str(raw).unwrap();
        assert_eq!(summary.countries.len(), 1);
        let us = &summary.countries[0];
        assert_eq!(us.country_code, "US");
        assert_eq!(us.total_confirmed, Some(100));
        assert_eq!(us.confirmed(), 100);
    }

    #[test]
    fn test_missing_fields_become_none() {
        let raw = r#"{"Countries":[{"CountryCode":"FR"}]}"#;
        let summary: Summary = serde_json::from_str(raw).unwrap();
        let fr = &summary.countries[0];
        assert_eq!(fr.total_deaths, None);
        assert_eq!(fr.date, None);
        assert_eq!(fr.confirmed(), 0);
    }

    #[test]
    fn test_empty_payload() {
        let summary: Summary = serde_json::from_str("{}").unwrap();
        assert!(summary.countries.is_empty());
    }

    #[test]
    fn test_format_date_rfc3339() {
        let formatted = format_date("2020-04-05T22:45:05Z");
        assert_ne!(formatted, "2020-04-05T22:45:05Z");
        assert!(formatted.contains("20"));
    }

    #[test]
    fn test_format_date_passthrough_on_garbage() {
        assert_eq!(format_date("not a date"), "not a date");
    }
}
