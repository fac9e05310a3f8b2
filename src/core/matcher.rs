use crate::core::time::TimeInstant;
use serde::Serialize;

/// Maximum number of entries taken from the winning tier (or the fallback)
pub const TIER_TAKE: usize = 3;

/// Hard cap on the proposed sequence
pub const MAX_PROPOSALS: usize = 5;

const EXACT_MAX_HOURS: f64 = 1.0;
const SAME_DAY_MAX_HOURS: f64 = 3.0;
const CLOSE_MAX_HOURS: f64 = 24.0;

/// Proximity classification between a candidate and an interviewer instant.
/// Declared in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchTier {
    Exact,
    SameDay,
    Close,
}

impl MatchTier {
    /// Classify a pair, or `None` when the pair is too far apart to count
    pub fn classify(candidate: &TimeInstant, interviewer: &TimeInstant) -> Option<(Self, f64)> {
        let hours_diff = candidate.hours_between(interviewer);
        let same_day = candidate.date_utc() == interviewer.date_utc();

        let tier = if same_day && hours_diff <= EXACT_MAX_HOURS {
            MatchTier::Exact
        } else if same_day && hours_diff <= SAME_DAY_MAX_HOURS {
            MatchTier::SameDay
        } else if hours_diff <= CLOSE_MAX_HOURS {
            MatchTier::Close
        } else {
            return None;
        };

        Some((tier, hours_diff))
    }
}

/// A qualifying (interviewer slot, distance) pair discovered during one pass
#[derive(Debug, Clone, Copy)]
pub struct MatchCandidate {
    pub slot: TimeInstant,
    pub hours_diff: f64,
    pub tier: MatchTier,
}

/// How the proposed sequence was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Tier(MatchTier),
    /// No pair qualified; the first interviewer slots were proposed as-is
    Fallback,
    /// The interviewer offered nothing
    Empty,
}

/// Output of one matching pass
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalResult {
    pub candidate_times: Vec<TimeInstant>,
    pub interviewer_times: Vec<TimeInstant>,
    pub proposed_times: Vec<TimeInstant>,
    pub selection: Selection,
}

/// Tiered nearest-neighbour matcher.
///
/// Stateless and synchronous; one instance can be shared by every request.
///
/// # Policy
/// 1. Every (candidate, interviewer) pair is classified into EXACT,
///    SAME_DAY or CLOSE (or discarded)
/// 2. Only the best non-empty tier across the whole request is kept
/// 3. Entries are stably sorted by distance, the first three taken and
///    de-duplicated
/// 4. With no qualifying pair at all, the first three interviewer slots are
///    proposed in their given order
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityMatcher;

impl AvailabilityMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Reconcile candidate-requested instants against interviewer slots
    ///
    /// # Arguments
    /// * `candidate_times` - Instants the candidate asked for (may be empty)
    /// * `interviewer_times` - Slots the interviewer offers, in preference order
    ///
    /// # Returns
    /// ProposalResult whose proposed sequence is drawn only from
    /// `interviewer_times`, holds no duplicates and never exceeds five entries
    pub fn match_availability(
        &self,
        candidate_times: &[TimeInstant],
        interviewer_times: &[TimeInstant],
    ) -> ProposalResult {
        if interviewer_times.is_empty() {
            tracing::debug!("No interviewer availability, returning empty proposal");
            return ProposalResult {
                candidate_times: candidate_times.to_vec(),
                interviewer_times: Vec::new(),
                proposed_times: Vec::new(),
                selection: Selection::Empty,
            };
        }

        let mut exact = Vec::new();
        let mut same_day = Vec::new();
        let mut close = Vec::new();

        // Candidates outer, interviewer slots inner: this discovery order is
        // what the stable sort falls back on for equal distances.
        for candidate in candidate_times {
            for slot in interviewer_times {
                if let Some((tier, hours_diff)) = MatchTier::classify(candidate, slot) {
                    let entry = MatchCandidate { slot: *slot, hours_diff, tier };
                    match tier {
                        MatchTier::Exact => exact.push(entry),
                        MatchTier::SameDay => same_day.push(entry),
                        MatchTier::Close => close.push(entry),
                    }
                }
            }
        }

        tracing::debug!(
            "Classified pairs: exact={}, same_day={}, close={}",
            exact.len(),
            same_day.len(),
            close.len()
        );

        let (selection, picked) = if !exact.is_empty() {
            (Selection::Tier(MatchTier::Exact), take_ranked(exact))
        } else if !same_day.is_empty() {
            (Selection::Tier(MatchTier::SameDay), take_ranked(same_day))
        } else if !close.is_empty() {
            (Selection::Tier(MatchTier::Close), take_ranked(close))
        } else {
            (
                Selection::Fallback,
                interviewer_times.iter().take(TIER_TAKE).copied().collect(),
            )
        };

        let mut proposed_times = dedup_preserving_order(picked);
        proposed_times.truncate(MAX_PROPOSALS);

        ProposalResult {
            candidate_times: candidate_times.to_vec(),
            interviewer_times: interviewer_times.to_vec(),
            proposed_times,
            selection,
        }
    }
}

/// Stable sort by distance, then keep the first `TIER_TAKE` slots
fn take_ranked(mut entries: Vec<MatchCandidate>) -> Vec<TimeInstant> {
    // `sort_by` is stable, so equal distances keep discovery order
    entries.sort_by(|a, b| {
        a.hours_diff
            .partial_cmp(&b.hours_diff)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    entries.into_iter().take(TIER_TAKE).map(|e| e.slot).collect()
}

fn dedup_preserving_order(times: Vec<TimeInstant>) -> Vec<TimeInstant> {
    let mut seen = std::collections::HashSet::with_capacity(times.len());
    times.into_iter().filter(|t| seen.insert(*t)).collect()
}

/// Baseline matching on hour boundaries.
///
/// Both sides are rounded with [`TimeInstant::normalize_to_hour_boundary`]
/// and the rounded candidate instants that also occur on the interviewer
/// side are returned, de-duplicated, in candidate order. Kept for
/// comparison against the tiered policy.
pub fn hour_boundary_matches(
    candidate_times: &[TimeInstant],
    interviewer_times: &[TimeInstant],
) -> Vec<TimeInstant> {
    let interviewer: std::collections::HashSet<TimeInstant> = interviewer_times
        .iter()
        .map(TimeInstant::normalize_to_hour_boundary)
        .collect();

    let matches = candidate_times
        .iter()
        .map(TimeInstant::normalize_to_hour_boundary)
        .filter(|t| interviewer.contains(t))
        .collect();

    dedup_preserving_order(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(items: &[&str]) -> Vec<TimeInstant> {
        items.iter().map(|s| TimeInstant::parse(s).unwrap()).collect()
    }

    #[test]
    fn test_exact_match() {
        let matcher = AvailabilityMatcher::new();
        let candidate = times(&["2025-07-15T14:00:00Z"]);
        let interviewer = times(&["2025-07-15T14:00:00Z", "2025-07-17T09:00:00Z"]);

        let result = matcher.match_availability(&candidate, &interviewer);

        assert_eq!(result.proposed_times, times(&["2025-07-15T14:00:00Z"]));
        assert_eq!(result.selection, Selection::Tier(MatchTier::Exact));
    }

    #[test]
    fn test_same_day_when_no_exact() {
        let matcher = AvailabilityMatcher::new();
        let candidate = times(&["2025-07-15T08:00:00Z"]);
        let interviewer = times(&["2025-07-15T10:30:00Z", "2025-07-20T09:00:00Z"]);

        let result = matcher.match_availability(&candidate, &interviewer);

        assert_eq!(result.proposed_times, times(&["2025-07-15T10:30:00Z"]));
        assert_eq!(result.selection, Selection::Tier(MatchTier::SameDay));
    }

    #[test]
    fn test_exact_wins_over_closer_tiers_from_other_candidates() {
        let matcher = AvailabilityMatcher::new();
        // First candidate only has a SAME_DAY partner, second has an EXACT one
        let candidate = times(&["2025-07-15T08:00:00Z", "2025-07-16T10:00:00Z"]);
        let interviewer = times(&["2025-07-15T10:00:00Z", "2025-07-16T10:45:00Z"]);

        let result = matcher.match_availability(&candidate, &interviewer);

        assert_eq!(result.proposed_times, times(&["2025-07-16T10:45:00Z"]));
    }

    #[test]
    fn test_close_tier_across_midnight() {
        let matcher = AvailabilityMatcher::new();
        let candidate = times(&["2025-07-15T23:30:00Z"]);
        let interviewer = times(&["2025-07-16T00:30:00Z", "2025-07-18T09:00:00Z"]);

        let result = matcher.match_availability(&candidate, &interviewer);

        // One hour apart but on different UTC days, so only CLOSE
        assert_eq!(result.selection, Selection::Tier(MatchTier::Close));
        assert_eq!(result.proposed_times, times(&["2025-07-16T00:30:00Z"]));
    }

    #[test]
    fn test_close_tier_ties_keep_original_order() {
        let matcher = AvailabilityMatcher::new();
        let candidate = times(&["2025-07-15T23:00:00Z"]);
        // Both four hours away; neither qualifies as SAME_DAY
        let interviewer = times(&["2025-07-16T03:00:00Z", "2025-07-15T19:00:00Z"]);

        let result = matcher.match_availability(&candidate, &interviewer);

        assert_eq!(result.selection, Selection::Tier(MatchTier::Close));
        assert_eq!(
            result.proposed_times,
            times(&["2025-07-16T03:00:00Z", "2025-07-15T19:00:00Z"])
        );
    }

    #[test]
    fn test_fallback_takes_first_three_slots() {
        let matcher = AvailabilityMatcher::new();
        let candidate = times(&["2025-09-01T10:00:00Z"]);
        let interviewer = times(&[
            "2025-07-15T14:00:00Z",
            "2025-07-15T21:00:00Z",
            "2025-07-16T10:00:00Z",
            "2025-07-16T21:00:00Z",
        ]);

        let result = matcher.match_availability(&candidate, &interviewer);

        assert_eq!(result.selection, Selection::Fallback);
        assert_eq!(result.proposed_times, interviewer[..3].to_vec());
    }

    #[test]
    fn test_empty_candidates_fall_back() {
        let matcher = AvailabilityMatcher::new();
        let interviewer = times(&[
            "2025-07-15T14:00:00Z",
            "2025-07-15T21:00:00Z",
            "2025-07-16T10:00:00Z",
            "2025-07-16T21:00:00Z",
        ]);

        let result = matcher.match_availability(&[], &interviewer);

        assert_eq!(result.proposed_times, interviewer[..3].to_vec());
    }

    #[test]
    fn test_empty_interviewer_yields_empty_proposal() {
        let matcher = AvailabilityMatcher::new();
        let candidate = times(&["2025-07-15T14:00:00Z"]);

        let result = matcher.match_availability(&candidate, &[]);

        assert!(result.proposed_times.is_empty());
        assert_eq!(result.selection, Selection::Empty);
        assert_eq!(result.candidate_times, candidate);
    }

    #[test]
    fn test_duplicate_pairs_are_deduplicated() {
        let matcher = AvailabilityMatcher::new();
        // Two candidates pointing at the same EXACT slot
        let candidate = times(&["2025-07-15T14:00:00Z", "2025-07-15T14:30:00Z"]);
        let interviewer = times(&["2025-07-15T14:00:00Z"]);

        let result = matcher.match_availability(&candidate, &interviewer);

        assert_eq!(result.proposed_times, times(&["2025-07-15T14:00:00Z"]));
    }

    #[test]
    fn test_tier_takes_at_most_three() {
        let matcher = AvailabilityMatcher::new();
        let candidate = times(&["2025-07-15T12:00:00Z"]);
        let interviewer = times(&[
            "2025-07-15T11:00:00Z",
            "2025-07-15T11:30:00Z",
            "2025-07-15T12:00:00Z",
            "2025-07-15T12:30:00Z",
            "2025-07-15T13:00:00Z",
        ]);

        let result = matcher.match_availability(&candidate, &interviewer);

        assert_eq!(
            result.proposed_times,
            times(&["2025-07-15T12:00:00Z", "2025-07-15T11:30:00Z", "2025-07-15T12:30:00Z"])
        );
    }

    #[test]
    fn test_classify_boundaries() {
        let c = TimeInstant::parse("2025-07-15T10:00:00Z").unwrap();
        let one_hour = TimeInstant::parse("2025-07-15T11:00:00Z").unwrap();
        let three_hours = TimeInstant::parse("2025-07-15T13:00:00Z").unwrap();
        let next_day = TimeInstant::parse("2025-07-16T10:00:00Z").unwrap();
        let too_far = TimeInstant::parse("2025-07-16T10:00:01Z").unwrap();

        assert_eq!(MatchTier::classify(&c, &one_hour).map(|r| r.0), Some(MatchTier::Exact));
        assert_eq!(MatchTier::classify(&c, &three_hours).map(|r| r.0), Some(MatchTier::SameDay));
        assert_eq!(MatchTier::classify(&c, &next_day).map(|r| r.0), Some(MatchTier::Close));
        assert_eq!(MatchTier::classify(&c, &too_far), None);
    }

    #[test]
    fn test_sub_millisecond_past_one_hour_is_same_day() {
        let c = TimeInstant::parse("2025-07-15T10:00:00Z").unwrap();
        let just_over = TimeInstant::parse("2025-07-15T11:00:00.0005Z").unwrap();

        assert_eq!(MatchTier::classify(&c, &just_over).map(|r| r.0), Some(MatchTier::SameDay));
    }

    #[test]
    fn test_ranking_uses_sub_millisecond_distance() {
        let matcher = AvailabilityMatcher::new();
        let candidate = times(&["2025-07-15T12:00:00Z"]);
        let interviewer = times(&["2025-07-15T12:00:00.0009Z", "2025-07-15T12:00:00.0001Z"]);

        let result = matcher.match_availability(&candidate, &interviewer);

        assert_eq!(
            result.proposed_times,
            times(&["2025-07-15T12:00:00.0001Z", "2025-07-15T12:00:00.0009Z"])
        );
    }

    #[test]
    fn test_same_day_beats_nearer_close_pair() {
        let matcher = AvailabilityMatcher::new();
        let candidate = times(&["2025-07-15T23:30:00Z"]);
        // 0.75h away across midnight (CLOSE) vs 2.5h away on the same date
        let interviewer = times(&["2025-07-16T00:15:00Z", "2025-07-15T21:00:00Z"]);

        let result = matcher.match_availability(&candidate, &interviewer);

        assert_eq!(result.selection, Selection::Tier(MatchTier::SameDay));
        assert_eq!(result.proposed_times, times(&["2025-07-15T21:00:00Z"]));
    }

    #[test]
    fn test_hour_boundary_matches() {
        let candidate = times(&["2025-07-15T13:40:00Z", "2025-07-16T10:10:00Z", "2025-07-15T14:20:00Z"]);
        let interviewer = times(&["2025-07-15T14:00:00Z", "2025-07-17T09:00:00Z"]);

        let matches = hour_boundary_matches(&candidate, &interviewer);

        assert_eq!(matches, times(&["2025-07-15T14:00:00Z"]));
    }
}
