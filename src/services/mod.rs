// Service exports
pub mod google;
pub mod slot_source;

pub use google::{GoogleCalendarClient, GoogleCalendarError, GoogleCredentials, NewEvent};
pub use slot_source::{
    resolve_slot_source, FallbackSlotSource, LiveSlotSource, SlotSource, SlotSourceError,
    SyntheticBasicSource, SyntheticSmartSource, BASIC_FIXTURE,
};
