// ============================================
// For-You Feed
// ============================================
//
// Pages through a personalized ranking of a fixed candidate snapshot.
// The reference time is captured once so every page of the same feed is
// cut from the same ordering.

pub mod cache;

pub use cache::ScoreCache;

use crate::models::{UserProfile, VideoCandidate, VideoScore};
use crate::services::ranking::VideoScorer;
use chrono::{DateTime, Utc};
use tracing::debug;

pub struct ForYouFeed {
    videos: Vec<VideoCandidate>,
    profile: UserProfile,
    scorer: VideoScorer,
    as_of: DateTime<Utc>,
}

impl ForYouFeed {
    pub fn new(videos: Vec<VideoCandidate>, profile: UserProfile) -> Self {
        Self {
            videos,
            profile,
            scorer: VideoScorer::new(),
            as_of: Utc::now(),
        }
    }

    /// Pin the reference time used for time decay
    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_scorer(mut self, scorer: VideoScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Full ranking of the candidate snapshot
    pub fn ranked(&self) -> Vec<VideoScore> {
        self.scorer.score_all(&self.videos, &self.profile, self.as_of)
    }

    /// `limit` videos starting at `offset` in ranked order.
    ///
    /// An offset past the end yields an empty page.
    pub fn get_personalized_videos(&self, limit: usize, offset: usize) -> Vec<VideoScore> {
        page(self.ranked(), limit, offset)
    }

    /// Same as [`Self::get_personalized_videos`], reusing a ranking from `cache`
    /// when this profile version has already been scored against these
    /// candidates with these weights.
    pub fn get_personalized_videos_cached(
        &self,
        cache: &mut ScoreCache,
        limit: usize,
        offset: usize,
    ) -> Vec<VideoScore> {
        let weights = self.scorer.weights();
        if let Some(ranked) = cache.get(&self.profile, &self.videos, weights, self.as_of) {
            debug!(user_id = %self.profile.user_id, "Score cache hit");
            return ranked.iter().skip(offset).take(limit).cloned().collect();
        }

        let ranked = self.ranked();
        let result = ranked.iter().skip(offset).take(limit).cloned().collect();
        cache.insert(&self.profile, &self.videos, weights, self.as_of, ranked);
        result
    }
}

fn page(ranked: Vec<VideoScore>, limit: usize, offset: usize) -> Vec<VideoScore> {
    ranked.into_iter().skip(offset).take(limit).collect()
}
