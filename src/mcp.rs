//! MCP tool server: the scheduling tools over stdio for MCP-aware clients.
//!
//! Shares [`AppState`] with the HTTP service, so both surfaces answer from the
//! same slot sources, matcher and extractor.

use rmcp::model::*;
use rmcp::{tool, ServerHandler};
use serde::Serialize;
use validator::Validate;

use crate::adapters;
use crate::core::parse_instants;
use crate::models::{
    CheckCalendarRequest, ConvertTimezoneRequest, ConvertTimezoneResponse, GenerateReplyRequest,
    ParseEmailRequest,
};
use crate::routes::scheduling::AppState;

#[derive(Clone)]
pub struct ScheduleHelperMcp {
    state: AppState,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {e}"))
}

#[tool(tool_box)]
impl ScheduleHelperMcp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    #[tool(description = "Extract proposed meeting times and the sender's intent from an email body. Times in the email are read in `timezone` (default: server default) and returned as UTC ISO 8601 strings.")]
    fn parse_email(&self, #[tool(aggr)] params: ParseEmailRequest) -> String {
        if let Err(e) = params.validate() {
            return format!("Error: {e}");
        }

        match self.state.parse_email(&params) {
            Ok(parsed) => to_json(&parsed),
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "Draft a reply to the candidate for the given intent, listing the proposed times in `timezone`. The greeting uses `candidate_name`, or a name derived from `from_email`.")]
    fn generate_reply(&self, #[tool(aggr)] params: GenerateReplyRequest) -> String {
        match self.state.draft_reply(&params) {
            Ok(reply) => to_json(&reply),
            Err(e) => format!("Error: {e}"),
        }
    }

    #[tool(description = "Convert a time between timezones. Accepts IANA names or abbreviations such as PST; times without an offset are read in `from_tz`. Returns {\"result\": null} when the input cannot be converted.")]
    fn convert_timezone(&self, #[tool(aggr)] params: ConvertTimezoneRequest) -> String {
        let result = match adapters::convert_timezone(&params.time_str, &params.from_tz, &params.to_tz) {
            Ok(converted) => Some(converted),
            Err(e) => {
                tracing::warn!("Timezone conversion error: {}", e);
                None
            }
        };

        to_json(&ConvertTimezoneResponse { result })
    }

    #[tool(description = "Match candidate times (UTC ISO 8601) against a fixed mock interviewer calendar. Useful for testing.")]
    async fn check_calendar(&self, #[tool(aggr)] params: CheckCalendarRequest) -> String {
        let candidate = parse_instants(params.candidate_times.as_slice());
        to_json(&self.state.check_mock_calendar(&candidate).await)
    }

    #[tool(description = "Match candidate times (UTC ISO 8601) against the interviewer's Google Calendar, falling back to generated business-hour slots when the calendar is unavailable.")]
    async fn check_real_calendar(&self, #[tool(aggr)] params: CheckCalendarRequest) -> String {
        let candidate = parse_instants(params.candidate_times.as_slice());
        to_json(&self.state.check_availability(&candidate).await)
    }
}

#[tool(tool_box)]
impl ServerHandler for ScheduleHelperMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "schedule-helper".into(),
                version: env!("CARGO_PKG_VERSION").into(),
            },
            instructions: Some(
                "Schedule Helper: use parse_email to pull times out of a candidate email, \
                 check_real_calendar (or check_calendar for the mock calendar) to find \
                 meeting times, generate_reply to draft the answer and convert_timezone \
                 for zone conversions."
                    .to_string(),
            ),
        }
    }
}
