//! Backend timestamps
//!
//! The backend emits both timezone-aware RFC 3339 strings and naive
//! ISO-8601 strings (database columns without a zone). Naive values are
//! taken as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// UTC timestamp tolerant of naive backend values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse RFC 3339 or naive ISO-8601 (fractional seconds optional)
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| Self(naive.and_utc()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_aware_and_naive() {
        let aware = Timestamp::parse("2024-03-01T10:15:00+03:00").unwrap();
        assert_eq!(aware.0.hour(), 7);

        let naive = Timestamp::parse("2024-03-01T10:15:00.123456").unwrap();
        assert_eq!(naive.0.hour(), 10);

        assert!(Timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn test_deserialize_in_struct() {
        let ts: Timestamp = serde_json::from_str("\"2024-03-01 08:00:00\"").unwrap();
        assert_eq!(ts.0.hour(), 8);
    }
}
