use crate::core::{ProposalResult, TimeInstant};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the sender of an email is trying to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[default]
    Available,
    /// Offered availability but no time could be extracted
    AvailableNoTimes,
    Reschedule,
    Cancel,
    Confirm,
    Unknown,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Intent::Available => "available",
            Intent::AvailableNoTimes => "available_no_times",
            Intent::Reschedule => "reschedule",
            Intent::Cancel => "cancel",
            Intent::Confirm => "confirm",
            Intent::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Times and intent extracted from an email body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "parsed_availability")]
pub struct ParsedAvailability {
    pub extracted_times: Vec<TimeInstant>,
    pub intent: Intent,
    pub raw_context: Option<String>,
}

/// Wire form of a matching pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "available_slots")]
pub struct AvailableSlots {
    pub candidate_times: Vec<TimeInstant>,
    pub interviewer_times: Vec<TimeInstant>,
    pub proposed_meeting_times: Vec<TimeInstant>,
}

impl From<ProposalResult> for AvailableSlots {
    fn from(result: ProposalResult) -> Self {
        Self {
            candidate_times: result.candidate_times,
            interviewer_times: result.interviewer_times,
            proposed_meeting_times: result.proposed_times,
        }
    }
}

/// Drafted reply to the candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "email_reply")]
pub struct EmailReply {
    pub message: String,
    pub language: String,
    pub proposed_time: Option<TimeInstant>,
}

/// Calendar event created for an agreed meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub event_id: Option<String>,
    pub event_link: Option<String>,
}
