use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when turning external strings into instants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("Invalid timestamp '{input}': {reason}")]
    InvalidTimestamp { input: String, reason: String },
}

/// A single point in time, always held in UTC.
///
/// The canonical external form is RFC 3339 with a `Z` designator,
/// e.g. `2025-07-15T14:00:00Z`. Fractional seconds are only written
/// when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeInstant(DateTime<Utc>);

impl TimeInstant {
    /// Parse an ISO-8601 instant with either a `Z` suffix or a numeric offset.
    ///
    /// Naive strings (no offset) are rejected: they do not name an instant.
    pub fn parse(input: &str) -> Result<Self, TimeError> {
        let trimmed = input.trim();
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| TimeError::InvalidTimestamp {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Calendar date of the instant in UTC
    pub fn date_utc(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Absolute distance to `other` in (fractional) hours
    #[inline]
    pub fn hours_between(&self, other: &TimeInstant) -> f64 {
        let delta = self.0 - other.0;
        match delta.num_nanoseconds() {
            Some(nanos) => nanos.unsigned_abs() as f64 / 3_600_000_000_000.0,
            // Only spans of ~292 years overflow nanoseconds
            None => delta.num_seconds().unsigned_abs() as f64 / 3_600.0,
        }
    }

    pub fn plus(&self, duration: Duration) -> Self {
        Self(self.0 + duration)
    }

    /// Round to the nearest hour; a minute value of 30 or more rounds up.
    /// Seconds and sub-seconds are discarded before rounding.
    pub fn normalize_to_hour_boundary(&self) -> Self {
        let minute = self.0.minute();
        let floored = self.0 - Duration::minutes(minute as i64)
            - Duration::seconds(self.0.second() as i64)
            - Duration::nanoseconds(self.0.nanosecond() as i64);

        if minute >= 30 {
            Self(floored + Duration::hours(1))
        } else {
            Self(floored)
        }
    }

    /// Canonical string form
    pub fn to_canonical(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl fmt::Display for TimeInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl FromStr for TimeInstant {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DateTime<Utc>> for TimeInstant {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl Serialize for TimeInstant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> Deserialize<'de> for TimeInstant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TimeInstant::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse a batch of external timestamp strings.
///
/// Malformed entries are dropped with a diagnostic rather than failing the
/// whole batch; the order of the valid entries is preserved.
pub fn parse_instants<S: AsRef<str>>(inputs: &[S]) -> Vec<TimeInstant> {
    inputs
        .iter()
        .filter_map(|raw| match TimeInstant::parse(raw.as_ref()) {
            Ok(instant) => Some(instant),
            Err(e) => {
                tracing::warn!("Dropping entry: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> TimeInstant {
        TimeInstant::parse(s).unwrap()
    }

    #[test]
    fn test_parse_z_suffix() {
        let t = at("2025-07-15T14:00:00Z");
        assert_eq!(t.to_string(), "2025-07-15T14:00:00Z");
    }

    #[test]
    fn test_parse_offset_converts_to_utc() {
        let t = at("2025-07-15T09:00:00-05:00");
        assert_eq!(t.to_string(), "2025-07-15T14:00:00Z");
        assert_eq!(t, at("2025-07-15T14:00:00Z"));
    }

    #[test]
    fn test_fractional_seconds_kept() {
        let t = at("2025-07-15T14:00:00.250Z");
        assert_eq!(t.to_string(), "2025-07-15T14:00:00.250Z");
    }

    #[test]
    fn test_rejects_naive_and_garbage() {
        assert!(TimeInstant::parse("2025-07-15T14:00:00").is_err());
        assert!(TimeInstant::parse("next tuesday").is_err());
        assert!(TimeInstant::parse("").is_err());
        assert!(TimeInstant::parse("2025-13-40T99:00:00Z").is_err());
    }

    #[test]
    fn test_parse_instants_drops_invalid() {
        let parsed = parse_instants(&["2025-07-15T14:00:00Z", "bogus", "2025-07-16T10:00:00Z"]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], at("2025-07-16T10:00:00Z"));
    }

    #[test]
    fn test_hours_between() {
        let a = at("2025-07-15T08:00:00Z");
        let b = at("2025-07-15T10:30:00Z");
        assert_eq!(a.hours_between(&b), 2.5);
        assert_eq!(b.hours_between(&a), 2.5);
    }

    #[test]
    fn test_hours_between_keeps_sub_millisecond_precision() {
        let a = at("2025-07-15T10:00:00Z");
        let b = at("2025-07-15T11:00:00.0005Z");
        assert!(a.hours_between(&b) > 1.0);

        let near = at("2025-07-15T12:00:00.0001Z");
        let far = at("2025-07-15T12:00:00.0009Z");
        let base = at("2025-07-15T12:00:00Z");
        assert!(base.hours_between(&near) < base.hours_between(&far));
    }

    #[test]
    fn test_normalize_rounds_down_before_half_hour() {
        assert_eq!(
            at("2025-07-15T14:29:59Z").normalize_to_hour_boundary(),
            at("2025-07-15T14:00:00Z")
        );
    }

    #[test]
    fn test_normalize_rounds_up_at_half_hour() {
        assert_eq!(
            at("2025-07-15T14:30:00Z").normalize_to_hour_boundary(),
            at("2025-07-15T15:00:00Z")
        );
        // Crosses midnight
        assert_eq!(
            at("2025-07-15T23:45:00Z").normalize_to_hour_boundary(),
            at("2025-07-16T00:00:00Z")
        );
    }

    #[test]
    fn test_serde_roundtrip_uses_canonical_form() {
        let t = at("2025-07-15T16:00:00+02:00");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"2025-07-15T14:00:00Z\"");
        let back: TimeInstant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
