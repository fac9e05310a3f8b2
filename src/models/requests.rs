use crate::models::domain::Intent;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to extract availability from an email
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct ParseEmailRequest {
    #[validate(length(min = 1))]
    pub email_body: String,
    #[serde(default)]
    pub from_email: String,
    /// Sender's zone, IANA name or abbreviation such as PST
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Request to check candidate times against the interviewer calendar
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct CheckCalendarRequest {
    /// UTC ISO 8601 instants, e.g. 2025-07-15T14:00:00Z
    #[serde(default)]
    pub candidate_times: Vec<String>,
}

/// Request to match two caller-supplied lists directly
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchAvailabilityRequest {
    #[serde(default)]
    pub candidate_times: Vec<String>,
    #[serde(default)]
    pub interviewer_times: Vec<String>,
}

/// Request to draft a reply
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct GenerateReplyRequest {
    pub candidate_name: Option<String>,
    pub proposed_times: Option<Vec<String>>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub intent: Intent,
}

/// Request to convert a time between timezones
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct ConvertTimezoneRequest {
    #[validate(length(min = 1))]
    pub time_str: String,
    #[validate(length(min = 1))]
    pub from_tz: String,
    #[validate(length(min = 1))]
    pub to_tz: String,
}

/// Request to put a meeting on the interviewer calendar
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(email)]
    pub candidate_email: String,
    #[validate(length(min = 1))]
    pub meeting_time: String,
    pub candidate_name: Option<String>,
}

/// Request to run parse → calendar → reply in one call
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScheduleWorkflowRequest {
    #[validate(length(min = 1))]
    pub email_body: String,
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub create_event: bool,
}
