//! UTC timestamps for record fields.
//!
//! Every timestamp that reaches a record file is written in UTC with a `Z`
//! suffix, whatever zone it was produced in, so two machines in different
//! zones never produce a diff for the same instant. Reading is lenient: any
//! RFC 3339 offset is accepted, as is the older `YYYY-MM-DD HH:MM:SS.f ±HH:MM`
//! layout, and the value is normalized to UTC on the way in.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const LEGACY_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %:z", "%Y-%m-%d %H:%M:%S%.f %z"];

/// A point in time, always held in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current instant.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Normalize a zoned date-time to UTC.
    pub fn from_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> Self {
        Self(datetime.with_timezone(&Utc))
    }

    /// The underlying UTC date-time.
    #[must_use]
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// The on-disk form: RFC 3339, UTC, `Z` suffix, sub-second digits only when present.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// `YYYY-MM-DD`, for listings.
    #[must_use]
    pub fn pretty_date(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match DateTime::parse_from_rfc3339(s) {
            Ok(parsed) => Ok(Self::from_datetime(&parsed)),
            Err(rfc_err) => LEGACY_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
                .map(|parsed| Self::from_datetime(&parsed))
                .ok_or(rfc_err),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|e| {
            serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}"))
        })
    }
}
