use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimezoneError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Unable to parse time string: {0}")]
    UnparseableTime(String),

    #[error("Local time {0} does not exist in the source timezone")]
    NonexistentLocalTime(String),
}

/// Common abbreviations and their IANA zones
const TIMEZONE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("PST", "America/Los_Angeles"),
    ("PDT", "America/Los_Angeles"),
    ("MST", "America/Denver"),
    ("MDT", "America/Denver"),
    ("CST", "America/Chicago"),
    ("CDT", "America/Chicago"),
    ("EST", "America/New_York"),
    ("EDT", "America/New_York"),
    ("GMT", "GMT"),
    ("BST", "Europe/London"),
    ("CET", "Europe/Paris"),
    ("JST", "Asia/Tokyo"),
    ("IST", "Asia/Kolkata"),
    ("AEST", "Australia/Sydney"),
    ("UTC", "UTC"),
    ("Z", "UTC"),
];

/// Map a well-known abbreviation to its IANA name; other input is returned trimmed
pub fn normalize_timezone(label: &str) -> String {
    let trimmed = label.trim();
    let upper = trimmed.to_uppercase();
    TIMEZONE_ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == upper)
        .map(|(_, iana)| iana.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Resolve a user-facing timezone label into a zone
pub fn resolve_tz(label: &str) -> Result<Tz, TimezoneError> {
    normalize_timezone(label)
        .parse::<Tz>()
        .map_err(|_| TimezoneError::UnknownTimezone(label.to_string()))
}

/// Localize a wall-clock time, picking the earlier reading when ambiguous
pub fn localize(tz: &Tz, naive: &NaiveDateTime) -> Result<DateTime<Tz>, TimezoneError> {
    tz.from_local_datetime(naive)
        .earliest()
        .ok_or_else(|| TimezoneError::NonexistentLocalTime(naive.to_string()))
}

enum ParsedTime {
    Aware(DateTime<chrono::FixedOffset>),
    Naive(NaiveDateTime),
}

fn parse_time_string(input: &str) -> Result<ParsedTime, TimezoneError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ParsedTime::Aware(dt));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(ParsedTime::Naive)
        .ok_or_else(|| TimezoneError::UnparseableTime(input.to_string()))
}

/// Convert `time_str` from one zone to another.
///
/// Naive input is read as wall-clock time in `from_tz`; input that already
/// carries an offset keeps its instant. The result is ISO-8601 with the
/// target zone's offset.
pub fn convert_timezone(time_str: &str, from_tz: &str, to_tz: &str) -> Result<String, TimezoneError> {
    let from = resolve_tz(from_tz)?;
    let to = resolve_tz(to_tz)?;

    let localized = match parse_time_string(time_str)? {
        ParsedTime::Aware(dt) => dt.with_timezone(&from),
        ParsedTime::Naive(naive) => localize(&from, &naive)?,
    };

    Ok(localized
        .with_timezone(&to)
        .to_rfc3339_opts(SecondsFormat::AutoSi, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_abbreviations() {
        assert_eq!(normalize_timezone("pst"), "America/Los_Angeles");
        assert_eq!(normalize_timezone(" EST "), "America/New_York");
        assert_eq!(normalize_timezone("Europe/Berlin"), "Europe/Berlin");
    }

    #[test]
    fn test_resolve_unknown() {
        assert!(resolve_tz("Mars/Olympus").is_err());
        assert_eq!(resolve_tz("UTC").unwrap(), chrono_tz::UTC);
    }

    #[test]
    fn test_convert_naive_from_pst() {
        // July is daylight time: PDT is UTC-7
        let converted = convert_timezone("2025-07-15T14:00:00", "PST", "UTC").unwrap();
        assert_eq!(converted, "2025-07-15T21:00:00+00:00");
    }

    #[test]
    fn test_convert_aware_input_keeps_instant() {
        let converted = convert_timezone("2025-07-15T14:00:00Z", "UTC", "EST").unwrap();
        assert_eq!(converted, "2025-07-15T10:00:00-04:00");
    }

    #[test]
    fn test_convert_rejects_bad_input() {
        assert!(matches!(
            convert_timezone("yesterday-ish", "UTC", "UTC"),
            Err(TimezoneError::UnparseableTime(_))
        ));
        assert!(matches!(
            convert_timezone("2025-07-15T14:00:00", "XYZ", "UTC"),
            Err(TimezoneError::UnknownTimezone(_))
        ));
    }
}
