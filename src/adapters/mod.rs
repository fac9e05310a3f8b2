// Collaborators around the matcher: text extraction, reply drafting, zones
pub mod extraction;
pub mod reply;
pub mod timezone;

pub use extraction::{detect_intent, EmailExtractor};
pub use reply::{extract_name_from_email, format_time_human_readable, generate_reply};
pub use timezone::{convert_timezone, normalize_timezone, resolve_tz, TimezoneError};
