use crate::adapters::timezone::localize;
use crate::core::TimeInstant;
use crate::models::{Intent, ParsedAvailability};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use regex::Regex;

const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";
const MONTHS: &str =
    "january|february|march|april|may|june|july|august|september|october|november|december";
const CLOCK: &str = r"\d{1,2}(:\d{2})?\s*(am|pm)";

/// Longest email excerpt echoed back as context
const RAW_CONTEXT_CHARS: usize = 1000;

const CANCEL_KEYWORDS: &[&str] = &["cancel", "cannot make it", "can't make it", "not available", "unavailable"];
const RESCHEDULE_KEYWORDS: &[&str] = &["reschedule", "change", "move", "different time", "another time"];
const CONFIRM_KEYWORDS: &[&str] = &["confirm", "sounds good", "works for me", "see you then"];
const AVAILABLE_KEYWORDS: &[&str] = &["available", "free", "open", "can do", "works"];

/// Regex-based extraction of proposed meeting times from email text.
///
/// Patterns are compiled once; build one extractor at startup and share it.
#[derive(Debug, Clone)]
pub struct EmailExtractor {
    phrases: Vec<Regex>,
    clock: Regex,
    numeric_date: Regex,
    month_date: Regex,
}

impl EmailExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let phrase_patterns = [
            // Relative day + time
            format!(r"(tomorrow|today)\s+at\s+{CLOCK}"),
            format!(r"({WEEKDAYS})\s+at\s+{CLOCK}"),
            format!(r"{CLOCK}\s+on\s+({WEEKDAYS})"),
            // Explicit date + time
            format!(r"\d{{1,2}}/\d{{1,2}}(/\d{{4}})?\s+at\s+{CLOCK}"),
            format!(r"({MONTHS})\s+\d{{1,2}}(st|nd|rd|th)?\s+at\s+{CLOCK}"),
            // Looser phrasing
            format!(r"available\s+({WEEKDAYS})\s+{CLOCK}"),
            format!(r"free\s+(tomorrow|today)\s+at\s+{CLOCK}"),
        ];

        let phrases = phrase_patterns
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            phrases,
            clock: Regex::new(r"(\d{1,2})(?::(\d{2}))?\s*(am|pm)")?,
            numeric_date: Regex::new(r"(\d{1,2})/(\d{1,2})(?:/(\d{4}))?")?,
            month_date: Regex::new(&format!(r"({MONTHS})\s+(\d{{1,2}})"))?,
        })
    }

    /// Extract times and intent from an email body
    ///
    /// # Arguments
    /// * `email_body` - Raw email text
    /// * `from_email` - Sender address, only used for diagnostics
    /// * `tz` - Zone the sender's wall-clock times are read in
    /// * `now` - Reference instant for relative phrases such as "tomorrow"
    pub fn parse_email(
        &self,
        email_body: &str,
        from_email: &str,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> ParsedAvailability {
        let extracted_times = self.extract_times(email_body, tz, now);
        let mut intent = detect_intent(email_body);

        if extracted_times.is_empty() && intent == Intent::Available {
            intent = Intent::AvailableNoTimes;
        }

        tracing::debug!(
            "Parsed email from {:?}: {} times, intent={}",
            from_email,
            extracted_times.len(),
            intent
        );

        ParsedAvailability {
            extracted_times,
            intent,
            raw_context: Some(email_body.chars().take(RAW_CONTEXT_CHARS).collect()),
        }
    }

    /// All recognised times, in pattern order, without duplicates
    pub fn extract_times(&self, text: &str, tz: Tz, now: DateTime<Utc>) -> Vec<TimeInstant> {
        let lowered = text.to_lowercase();
        let mut found: Vec<TimeInstant> = Vec::new();

        for pattern in &self.phrases {
            for phrase in pattern.find_iter(&lowered) {
                match self.resolve_phrase(phrase.as_str(), tz, now) {
                    Some(instant) if !found.contains(&instant) => found.push(instant),
                    Some(_) => {}
                    None => tracing::debug!("Could not resolve time phrase {:?}", phrase.as_str()),
                }
            }
        }

        found
    }

    /// Turn one matched phrase ("tuesday at 2pm", "7/15 at 10:30am") into an instant
    fn resolve_phrase(&self, phrase: &str, tz: Tz, now: DateTime<Utc>) -> Option<TimeInstant> {
        let today = now.with_timezone(&tz).date_naive();
        let date = self.resolve_date(phrase, today)?;

        let clock = self.clock.captures(phrase)?;
        let mut hour: u32 = clock.get(1)?.as_str().parse().ok()?;
        let minute: u32 = match clock.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        if hour > 12 || minute > 59 {
            return None;
        }

        match clock.get(3)?.as_str() {
            "pm" if hour != 12 => hour += 12,
            "am" if hour == 12 => hour = 0,
            _ => {}
        }

        let naive = date.and_hms_opt(hour, minute, 0)?;
        let local = localize(&tz, &naive).ok()?;
        Some(TimeInstant::from_utc(local.with_timezone(&Utc)))
    }

    fn resolve_date(&self, phrase: &str, today: NaiveDate) -> Option<NaiveDate> {
        if phrase.contains("tomorrow") {
            return today.checked_add_signed(Duration::days(1));
        }
        if phrase.contains("today") {
            return Some(today);
        }
        if let Some(weekday) = weekday_in(phrase) {
            return Some(next_weekday(today, weekday));
        }
        if let Some(caps) = self.numeric_date.captures(phrase) {
            let month: u32 = caps.get(1)?.as_str().parse().ok()?;
            let day: u32 = caps.get(2)?.as_str().parse().ok()?;
            let year = caps.get(3).and_then(|y| y.as_str().parse().ok());
            return calendar_date(today, year, month, day);
        }
        if let Some(caps) = self.month_date.captures(phrase) {
            let month = month_number(caps.get(1)?.as_str())?;
            let day: u32 = caps.get(2)?.as_str().parse().ok()?;
            return calendar_date(today, None, month, day);
        }

        // No day mentioned at all: assume next week
        today.checked_add_signed(Duration::days(7))
    }
}

fn weekday_in(phrase: &str) -> Option<Weekday> {
    [
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sunday", Weekday::Sun),
    ]
    .into_iter()
    .find(|(name, _)| phrase.contains(name))
    .map(|(_, day)| day)
}

/// Next occurrence of `weekday` strictly after `today`
fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut days_ahead = target - current;
    if days_ahead <= 0 {
        days_ahead += 7;
    }
    today + Duration::days(days_ahead)
}

fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .split('|')
        .position(|m| m == name)
        .map(|idx| idx as u32 + 1)
}

/// Explicit month/day; without a year the date rolls into next year once passed
fn calendar_date(today: NaiveDate, year: Option<i32>, month: u32, day: u32) -> Option<NaiveDate> {
    match year {
        Some(y) => NaiveDate::from_ymd_opt(y, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if this_year < today {
                NaiveDate::from_ymd_opt(today.year() + 1, month, day)
            } else {
                Some(this_year)
            }
        }
    }
}

/// Keyword-based intent; earlier categories win
pub fn detect_intent(email_body: &str) -> Intent {
    let text = email_body.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    if mentions(CANCEL_KEYWORDS) {
        Intent::Cancel
    } else if mentions(RESCHEDULE_KEYWORDS) {
        Intent::Reschedule
    } else if mentions(CONFIRM_KEYWORDS) {
        Intent::Confirm
    } else if mentions(AVAILABLE_KEYWORDS) {
        Intent::Available
    } else {
        Intent::Unknown
    }
}
