use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use chrono_tz::Tz;
use std::sync::Arc;
use validator::Validate;

use crate::adapters::{self, EmailExtractor, TimezoneError};
use crate::config::Settings;
use crate::core::{parse_instants, AvailabilityMatcher, SlotWindow, TimeInstant};
use crate::models::{
    AvailableSlots, CheckCalendarRequest, ConvertTimezoneRequest, ConvertTimezoneResponse,
    CreateEventRequest, CreateEventResponse, EmailReply, EndpointInfo, ErrorResponse,
    GenerateReplyRequest, HealthResponse, MatchAvailabilityRequest, ParseEmailRequest,
    ParsedAvailability, ScheduleWorkflowRequest, ScheduleWorkflowResponse,
};
use crate::services::{
    resolve_slot_source, GoogleCalendarClient, NewEvent, SlotSource, SyntheticBasicSource,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved availability chain (live calendar when configured)
    pub slot_source: Arc<dyn SlotSource>,
    /// Fixed fixture behind the mock calendar endpoint
    pub mock_source: Arc<SyntheticBasicSource>,
    pub calendar: Option<Arc<GoogleCalendarClient>>,
    pub matcher: AvailabilityMatcher,
    pub extractor: Arc<EmailExtractor>,
    pub window: SlotWindow,
    pub default_timezone: String,
    pub event_duration_minutes: u32,
}

impl AppState {
    /// Wire sources, matcher and extractor from configuration
    pub fn from_settings(settings: &Settings) -> Result<Self, regex::Error> {
        let (slot_source, calendar) = resolve_slot_source(settings);

        Ok(Self {
            slot_source,
            mock_source: Arc::new(SyntheticBasicSource::from_fixture(&settings.slots.basic_fixture)),
            calendar,
            matcher: AvailabilityMatcher::new(),
            extractor: Arc::new(EmailExtractor::new()?),
            window: settings.slots.window(),
            default_timezone: settings.defaults.timezone.clone(),
            event_duration_minutes: settings.defaults.event_duration_minutes,
        })
    }

    /// Zone named by the caller, or the configured default
    pub fn timezone(&self, requested: Option<&str>) -> Result<Tz, TimezoneError> {
        let label = requested
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.default_timezone);

        adapters::resolve_tz(label)
    }

    pub fn parse_email(&self, req: &ParseEmailRequest) -> Result<ParsedAvailability, TimezoneError> {
        let tz = self.timezone(req.timezone.as_deref())?;
        Ok(self
            .extractor
            .parse_email(&req.email_body, &req.from_email, tz, chrono::Utc::now()))
    }

    pub fn draft_reply(&self, req: &GenerateReplyRequest) -> Result<EmailReply, TimezoneError> {
        let tz = self.timezone(req.timezone.as_deref())?;
        let proposed = parse_instants(req.proposed_times.as_deref().unwrap_or_default());

        Ok(adapters::generate_reply(
            req.candidate_name.as_deref(),
            &proposed,
            tz,
            &req.from_email,
            req.intent,
        ))
    }

    /// Candidate times matched against the fixed mock calendar
    pub async fn check_mock_calendar(&self, candidate: &[TimeInstant]) -> AvailableSlots {
        let slots = match self.mock_source.list_available_slots(&self.window).await {
            Ok(slots) => slots,
            Err(e) => {
                tracing::error!("Mock calendar failed: {}", e);
                Vec::new()
            }
        };

        AvailableSlots::from(self.matcher.match_availability(candidate, &slots))
    }

    /// Interviewer slots from the resolved source, matched against `candidate`.
    /// A source that still fails after its own fallbacks yields no slots.
    pub async fn check_availability(&self, candidate: &[TimeInstant]) -> AvailableSlots {
        let interviewer = match self.slot_source.list_available_slots(&self.window).await {
            Ok(slots) => slots,
            Err(e) => {
                tracing::error!("Slot source {} failed: {}", self.slot_source.name(), e);
                Vec::new()
            }
        };

        let result = self.matcher.match_availability(candidate, &interviewer);

        tracing::info!(
            "Found {} proposed meeting times from {} interviewer slots (via {})",
            result.proposed_times.len(),
            result.interviewer_times.len(),
            self.slot_source.active_name()
        );

        AvailableSlots::from(result)
    }
}

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("/api/v1/parse_email", "POST", "Extract times from email"),
    ("/api/v1/match_availability", "POST", "Match two lists of times"),
    ("/api/v1/check_calendar", "POST", "Check mock calendar"),
    ("/api/v1/check_real_calendar", "POST", "Check real Google Calendar"),
    ("/api/v1/generate_reply", "POST", "Generate email reply"),
    ("/api/v1/convert_timezone", "POST", "Convert timezone"),
    ("/api/v1/create_event", "POST", "Create calendar event"),
    ("/api/v1/schedule_workflow", "POST", "Complete scheduling workflow"),
    ("/api/v1/health", "GET", "Health check"),
    ("/api/v1/endpoints", "GET", "List endpoints"),
];

/// Configure all scheduling routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/endpoints", web::get().to(list_endpoints))
        .route("/parse_email", web::post().to(parse_email))
        .route("/match_availability", web::post().to(match_availability))
        .route("/check_calendar", web::post().to(check_calendar))
        .route("/check_real_calendar", web::post().to(check_real_calendar))
        .route("/generate_reply", web::post().to(generate_reply))
        .route("/convert_timezone", web::post().to(convert_timezone))
        .route("/create_event", web::post().to(create_event))
        .route("/schedule_workflow", web::post().to(schedule_workflow));
}

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    tracing::info!("Validation failed: field_errors={:?}", errors);
    error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string())
}

fn invalid_timezone(e: TimezoneError) -> HttpResponse {
    error_response(StatusCode::BAD_REQUEST, "Invalid timezone", e.to_string())
}

fn request_tz(state: &AppState, requested: Option<&str>) -> Result<Tz, HttpResponse> {
    state.timezone(requested).map_err(invalid_timezone)
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        slot_source: state.slot_source.name().to_string(),
        active_slot_source: state.slot_source.active_name().to_string(),
        timestamp: chrono::Utc::now(),
    })
}

async fn list_endpoints() -> impl Responder {
    let endpoints: Vec<EndpointInfo> = ENDPOINTS
        .iter()
        .map(|(path, method, description)| EndpointInfo {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({ "endpoints": endpoints }))
}

/// Extract availability from email text
///
/// POST /api/v1/parse_email
///
/// Request body:
/// ```json
/// {
///   "email_body": "I'm available Tuesday at 2pm",
///   "from_email": "candidate@example.com",
///   "timezone": "America/Los_Angeles"
/// }
/// ```
async fn parse_email(
    state: web::Data<AppState>,
    req: web::Json<ParseEmailRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    match state.parse_email(&req) {
        Ok(parsed) => HttpResponse::Ok().json(parsed),
        Err(e) => invalid_timezone(e),
    }
}

/// Match two caller-supplied lists
///
/// POST /api/v1/match_availability
///
/// Unparseable entries on either side are dropped before matching.
async fn match_availability(
    state: web::Data<AppState>,
    req: web::Json<MatchAvailabilityRequest>,
) -> impl Responder {
    let candidate = parse_instants(&req.candidate_times);
    let interviewer = parse_instants(&req.interviewer_times);

    let result = state.matcher.match_availability(&candidate, &interviewer);
    tracing::debug!("Matched via {:?}: {} proposals", result.selection, result.proposed_times.len());

    HttpResponse::Ok().json(AvailableSlots::from(result))
}

/// Match candidate times against the fixed mock calendar
async fn check_calendar(
    state: web::Data<AppState>,
    req: web::Json<CheckCalendarRequest>,
) -> impl Responder {
    let candidate = parse_instants(&req.candidate_times);
    HttpResponse::Ok().json(state.check_mock_calendar(&candidate).await)
}

/// Match candidate times against the interviewer's real availability
async fn check_real_calendar(
    state: web::Data<AppState>,
    req: web::Json<CheckCalendarRequest>,
) -> impl Responder {
    let candidate = parse_instants(&req.candidate_times);
    HttpResponse::Ok().json(state.check_availability(&candidate).await)
}

/// Draft a reply
async fn generate_reply(
    state: web::Data<AppState>,
    req: web::Json<GenerateReplyRequest>,
) -> impl Responder {
    match state.draft_reply(&req) {
        Ok(reply) => HttpResponse::Ok().json(reply),
        Err(e) => invalid_timezone(e),
    }
}

/// Convert a time between zones; an unconvertible input yields `{"result": null}`
async fn convert_timezone(req: web::Json<ConvertTimezoneRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let result = match adapters::convert_timezone(&req.time_str, &req.from_tz, &req.to_tz) {
        Ok(converted) => Some(converted),
        Err(e) => {
            tracing::warn!("Timezone conversion error: {}", e);
            None
        }
    };

    HttpResponse::Ok().json(ConvertTimezoneResponse { result })
}

/// Put the meeting on the interviewer's calendar
///
/// Returns the HTTP status to use alongside the outcome.
async fn book_meeting(
    state: &AppState,
    candidate_email: &str,
    meeting_time: &TimeInstant,
    candidate_name: Option<&str>,
) -> (StatusCode, CreateEventResponse) {
    let Some(calendar) = state.calendar.as_ref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            CreateEventResponse {
                success: false,
                event_id: None,
                event_link: None,
                message: "Failed to create calendar event".to_string(),
                error: Some("Google Calendar credentials are not configured".to_string()),
            },
        );
    };

    let display_name = candidate_name
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| candidate_email.split('@').next().unwrap_or(candidate_email).to_string());

    let event = NewEvent {
        summary: format!("Interview - {}", display_name),
        description: format!("Interview scheduled with {}", candidate_email),
        start: *meeting_time,
        duration_minutes: state.event_duration_minutes,
        attendee_emails: vec![candidate_email.to_string()],
    };

    match calendar.create_event(&event).await {
        Ok(created) => (
            StatusCode::OK,
            CreateEventResponse {
                success: true,
                event_id: created.event_id,
                event_link: created.event_link,
                message: "Calendar event created successfully".to_string(),
                error: None,
            },
        ),
        Err(e) => {
            tracing::error!("Error creating meeting event: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                CreateEventResponse {
                    success: false,
                    event_id: None,
                    event_link: None,
                    message: "Failed to create calendar event".to_string(),
                    error: Some(e.to_string()),
                },
            )
        }
    }
}

/// Create a calendar event
///
/// POST /api/v1/create_event
async fn create_event(
    state: web::Data<AppState>,
    req: web::Json<CreateEventRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let meeting_time = match TimeInstant::parse(&req.meeting_time) {
        Ok(t) => t,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "Invalid meeting time", e.to_string()),
    };

    let (status, outcome) = book_meeting(
        &state,
        &req.candidate_email,
        &meeting_time,
        req.candidate_name.as_deref(),
    )
    .await;

    HttpResponse::build(status).json(outcome)
}

/// Complete scheduling workflow in one call
///
/// POST /api/v1/schedule_workflow
///
/// Parses the email, checks availability, drafts the reply and, when
/// `create_event` is set and a time was proposed, books the first proposal.
/// A failed booking is reported in `event` without failing the workflow.
async fn schedule_workflow(
    state: web::Data<AppState>,
    req: web::Json<ScheduleWorkflowRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let tz = match request_tz(&state, req.timezone.as_deref()) {
        Ok(tz) => tz,
        Err(response) => return response,
    };

    let workflow_id = uuid::Uuid::new_v4().to_string();
    tracing::info!("[{}] Parsing email from {:?}", workflow_id, req.from_email);

    let parsed = state
        .extractor
        .parse_email(&req.email_body, &req.from_email, tz, chrono::Utc::now());

    tracing::info!("[{}] Checking calendar for {} times", workflow_id, parsed.extracted_times.len());
    let calendar = state.check_availability(&parsed.extracted_times).await;

    tracing::info!("[{}] Generating reply for {}", workflow_id, parsed.intent);
    let reply = adapters::generate_reply(
        None,
        &calendar.proposed_meeting_times,
        tz,
        &req.from_email,
        parsed.intent,
    );

    let event = match (req.create_event, calendar.proposed_meeting_times.first()) {
        (true, Some(first)) => {
            tracing::info!("[{}] Creating calendar event", workflow_id);
            Some(book_meeting(&state, &req.from_email, first, None).await.1)
        }
        _ => None,
    };

    HttpResponse::Ok().json(ScheduleWorkflowResponse {
        success: true,
        workflow_id,
        parsed,
        calendar,
        reply,
        event,
        message: "Scheduling workflow completed successfully".to_string(),
    })
}
