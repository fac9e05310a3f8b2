use serde::{Deserialize, Serialize};
use crate::models::domain::{AvailableSlots, EmailReply, ParsedAvailability};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Configured head of the slot source chain
    pub slot_source: String,
    /// Source that answered the most recent lookup
    pub active_slot_source: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Timezone conversion result; `None` when the input could not be converted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertTimezoneResponse {
    pub result: Option<String>,
}

/// Outcome of an event creation attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventResponse {
    pub success: bool,
    pub event_id: Option<String>,
    pub event_link: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Combined result of the scheduling workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleWorkflowResponse {
    pub success: bool,
    pub workflow_id: String,
    pub parsed: ParsedAvailability,
    pub calendar: AvailableSlots,
    pub reply: EmailReply,
    pub event: Option<CreateEventResponse>,
    pub message: String,
}

/// One entry of the endpoint listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}
