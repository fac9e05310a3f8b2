// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{AvailableSlots, CreatedEvent, EmailReply, Intent, ParsedAvailability};
pub use requests::{
    CheckCalendarRequest, ConvertTimezoneRequest, CreateEventRequest, GenerateReplyRequest,
    MatchAvailabilityRequest, ParseEmailRequest, ScheduleWorkflowRequest,
};
pub use responses::{
    ConvertTimezoneResponse, CreateEventResponse, EndpointInfo, ErrorResponse, HealthResponse,
    ScheduleWorkflowResponse,
};
