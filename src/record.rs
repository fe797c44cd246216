//! Cached record snapshots
//!
//! Records returned by the store are transient copies for display; re-query
//! the store for current state.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geocoded address cached in the `addresses` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub id: i64,
    /// Matched, normalized address text from the geocoder
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Last fetched temperature with unit, e.g. "68F"
    pub last_temperature: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AddressRecord {
    /// "68F on 2024-08-26" style suffix for listings, empty when never refreshed
    pub fn last_reading(&self) -> String {
        match (&self.last_temperature, self.updated_at) {
            (Some(temp), Some(at)) => format!("{} on {}", temp, at.format("%Y-%m-%d")),
            (Some(temp), None) => temp.clone(),
            (None, _) => String::new(),
        }
    }
}

/// A ticker symbol cached in the `tickers` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    pub id: i64,
    pub symbol: String,
    pub company_name: String,
    pub sector: String,
    pub industry: String,
    pub exchange: String,
    pub address: String,
    pub official_site: String,
    pub revenue_ttm: Option<f64>,
    pub market_cap: Option<f64>,
    pub fiscal_year_end: String,
    pub last_price: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields for a ticker row before it has an identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTicker {
    pub symbol: String,
    pub company_name: String,
    pub sector: String,
    pub industry: String,
    pub exchange: String,
    pub address: String,
    pub official_site: String,
    pub revenue_ttm: Option<f64>,
    pub market_cap: Option<f64>,
    pub fiscal_year_end: String,
    pub last_price: String,
}

/// Format used for every timestamp the store writes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// Current time in the store's text representation
pub fn now_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 (what this crate writes) and SQLite's
/// `CURRENT_TIMESTAMP` layout found in older databases.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_own_format() {
        let written = now_timestamp();
        assert!(parse_timestamp(&written).is_some());
    }

    #[test]
    fn test_parse_sqlite_current_timestamp() {
        let ts = parse_timestamp("2024-08-26 14:25:00").unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.hour(), 14);
        assert_eq!(ts.minute(), 25);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_last_reading() {
        let mut record = AddressRecord {
            id: 1,
            address: "100 MAIN ST, ANYTOWN, CA, 90001".into(),
            latitude: 34.0,
            longitude: -118.0,
            last_temperature: None,
            created_at: None,
            updated_at: parse_timestamp("2024-08-26 14:25:00"),
        };
        assert_eq!(record.last_reading(), "");

        record.last_temperature = Some("68F".into());
        assert_eq!(record.last_reading(), "68F on 2024-08-26");
    }
}
