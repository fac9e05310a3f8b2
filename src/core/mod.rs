// Core algorithm exports
pub mod matcher;
pub mod slots;
pub mod time;

pub use matcher::{hour_boundary_matches, AvailabilityMatcher, MatchCandidate, MatchTier, ProposalResult, Selection};
pub use slots::{generate_slots, BusyInterval, SlotWindow, WindowError, MAX_DAYS_AHEAD, MAX_SLOTS};
pub use time::{parse_instants, TimeError, TimeInstant};
