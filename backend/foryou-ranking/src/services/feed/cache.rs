use crate::models::{UserProfile, VideoCandidate, VideoScore};
use crate::services::ranking::ScoringWeights;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

type CacheKey = (String, DateTime<Utc>);

#[derive(Debug, Clone)]
struct CachedRanking {
    candidates: Vec<VideoCandidate>,
    weights: ScoringWeights,
    as_of: DateTime<Utc>,
    ranked: Vec<VideoScore>,
}

/// Ranked lists keyed by `(user_id, profile.last_updated)`.
///
/// Owned and passed around by the caller; nothing here is process-wide. An
/// entry is only reused for an identical candidate sequence (every field, not
/// just ids), the same weights and the same reference time. Inserting a newer
/// profile version evicts the user's older ones.
#[derive(Debug, Default)]
pub struct ScoreCache {
    entries: HashMap<CacheKey, CachedRanking>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        profile: &UserProfile,
        videos: &[VideoCandidate],
        weights: &ScoringWeights,
        as_of: DateTime<Utc>,
    ) -> Option<&[VideoScore]> {
        let entry = self.entries.get(&key(profile))?;
        let fresh = entry.as_of == as_of
            && entry.weights == *weights
            && entry.candidates.as_slice() == videos;

        fresh.then_some(entry.ranked.as_slice())
    }

    pub fn insert(
        &mut self,
        profile: &UserProfile,
        videos: &[VideoCandidate],
        weights: &ScoringWeights,
        as_of: DateTime<Utc>,
        ranked: Vec<VideoScore>,
    ) {
        let before = self.entries.len();
        self.entries.retain(|(user_id, last_updated), _| {
            user_id != &profile.user_id || *last_updated >= profile.last_updated
        });

        debug!(
            user_id = %profile.user_id,
            candidates = videos.len(),
            evicted = before - self.entries.len(),
            "Caching ranked candidates"
        );
        self.entries.insert(
            key(profile),
            CachedRanking {
                candidates: videos.to_vec(),
                weights: *weights,
                as_of,
                ranked,
            },
        );
    }

    /// Drop every entry for `user_id`.
    pub fn invalidate(&mut self, user_id: &str) {
        self.entries.retain(|(cached_user, _), _| cached_user != user_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key(profile: &UserProfile) -> CacheKey {
    (profile.user_id.clone(), profile.last_updated)
}
