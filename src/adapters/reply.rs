use crate::core::TimeInstant;
use crate::models::{EmailReply, Intent};
use chrono_tz::Tz;

const SIGNATURE: &str = "Best regards,\nSchedule Helper";
const FALLBACK_NAME: &str = "there";

/// Render an instant for humans, e.g. "Tuesday, July 15 at 02:00 PM UTC"
pub fn format_time_human_readable(instant: &TimeInstant, tz: Tz) -> String {
    instant
        .as_datetime()
        .with_timezone(&tz)
        .format("%A, %B %d at %I:%M %p %Z")
        .to_string()
}

/// Derive a greeting name from an address such as `jane.doe@example.com`
pub fn extract_name_from_email(email: &str) -> String {
    let Some((local, _)) = email.split_once('@') else {
        return FALLBACK_NAME.to_string();
    };

    let words: Vec<String> = local
        .split(['.', '_', '-'])
        .filter(|w| !w.is_empty() && w.chars().all(char::is_alphabetic))
        .map(capitalize)
        .collect();

    if words.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        words.join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn bullet_list(times: &[TimeInstant], tz: Tz) -> String {
    times
        .iter()
        .map(|t| format!("• {}", format_time_human_readable(t, tz)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn body_for_intent(intent: Intent, name: &str, proposed: &[TimeInstant], tz: Tz) -> String {
    match intent {
        Intent::Cancel => format!(
            "Hi {name},\n\n\
             Thank you for letting us know. We understand that schedules can change.\n\n\
             If you'd like to reschedule for a future date, please let us know your availability and we'll be happy to accommodate.\n\n\
             {SIGNATURE}"
        ),
        Intent::Reschedule if !proposed.is_empty() => format!(
            "Hi {name},\n\n\
             No problem! We can definitely reschedule.\n\n\
             Would any of these alternative times work for you?\n\n\
             {}\n\n\
             Please let us know which option works best.\n\n\
             {SIGNATURE}",
            bullet_list(proposed, tz)
        ),
        Intent::Reschedule => format!(
            "Hi {name},\n\n\
             We'd be happy to reschedule. Could you please share your preferred times and we'll check our availability?\n\n\
             {SIGNATURE}"
        ),
        Intent::Confirm => format!(
            "Hi {name},\n\n\
             Perfect! We have you confirmed for the meeting.\n\n\
             We look forward to speaking with you then. You'll receive a calendar invitation shortly with all the details.\n\n\
             {SIGNATURE}"
        ),
        Intent::Available | Intent::AvailableNoTimes if !proposed.is_empty() => format!(
            "Hi {name},\n\n\
             Thank you for sharing your availability!\n\n\
             We'd like to schedule the meeting for one of these times:\n\n\
             {}\n\n\
             Please confirm which time works best for you, and we'll send over a calendar invitation.\n\n\
             {SIGNATURE}",
            bullet_list(proposed, tz)
        ),
        Intent::Available | Intent::AvailableNoTimes => format!(
            "Hi {name},\n\n\
             Thank you for your message! To help us find the best time for our meeting, could you please share a few specific times that work for you?\n\n\
             For example:\n\
             • Day of the week and time (e.g., \"Tuesday at 2pm\")\n\
             • Multiple options if possible\n\
             • Your timezone\n\n\
             We'll do our best to accommodate your schedule.\n\n\
             {SIGNATURE}"
        ),
        Intent::Unknown => format!(
            "Hi {name},\n\n\
             Thank you for your message. To help us schedule our meeting, could you please let us know:\n\n\
             • Your preferred days and times\n\
             • Your timezone\n\
             • Any dates that definitely won't work\n\n\
             We'll get back to you promptly with available options.\n\n\
             {SIGNATURE}"
        ),
    }
}

/// Draft a reply for the detected intent.
///
/// The greeting uses `candidate_name` when given, otherwise a name derived
/// from `from_email`. The first proposed time is surfaced separately as
/// the primary suggestion.
pub fn generate_reply(
    candidate_name: Option<&str>,
    proposed: &[TimeInstant],
    tz: Tz,
    from_email: &str,
    intent: Intent,
) -> EmailReply {
    let name = match candidate_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => extract_name_from_email(from_email),
    };

    EmailReply {
        message: body_for_intent(intent, &name, proposed, tz),
        language: "en".to_string(),
        proposed_time: proposed.first().copied(),
    }
}
