//! Schedule Helper - interview scheduling assistant
//!
//! Reads availability out of candidate emails, reconciles it with the
//! interviewer's calendar and drafts a reply. The core is a tiered
//! availability matcher (exact, same day, close, fallback).

pub mod adapters;
pub mod config;
pub mod core;
pub mod mcp;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{AvailabilityMatcher, ProposalResult, Selection, TimeInstant};
pub use models::{AvailableSlots, EmailReply, Intent, ParsedAvailability};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let slot = TimeInstant::parse("2025-07-15T14:00:00Z").unwrap();
        let result = AvailabilityMatcher::new().match_availability(&[slot], &[slot]);
        assert_eq!(result.proposed_times, vec![slot]);
    }
}
