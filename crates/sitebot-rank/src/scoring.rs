use std::cmp::Ordering;

use sitebot_core::types::Candidate;

/// Sort key for a candidate: higher `boost` first, then lower `distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankKey {
    pub boost: u32,
    pub distance: f32,
}

impl RankKey {
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other.boost.cmp(&self.boost).then_with(|| self.distance.total_cmp(&other.distance))
    }
}

/// Maps a candidate's signals to its rank key. Extra signals (recency,
/// popularity) become new scorers; the ranker itself does not change.
pub trait RankScorer: Send + Sync {
    fn key(&self, candidate: &Candidate<'_>) -> RankKey;
}

/// Freshness-tagged candidates first, each group by ascending distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshnessFirst;

impl RankScorer for FreshnessFirst {
    fn key(&self, candidate: &Candidate<'_>) -> RankKey {
        RankKey { boost: u32::from(candidate.is_priority), distance: candidate.distance }
    }
}

/// Pure semantic order, ignoring the priority tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceOnly;

impl RankScorer for DistanceOnly {
    fn key(&self, candidate: &Candidate<'_>) -> RankKey {
        RankKey { boost: 0, distance: candidate.distance }
    }
}
