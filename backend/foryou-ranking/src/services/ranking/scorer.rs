// ============================================
// Video Scorer
// ============================================
//
// Scores candidate videos against a user profile with a fixed linear
// weighting of five sub-scores, each normalized to [0, 100]:
// - Category match (share of the user's watch time in the video's category)
// - Completion rate (how much of this category the user usually finishes)
// - Interaction score (likes / comments / shares in the category)
// - Time decay (upload age)
// - Engagement ratio (likes + comments on the video from all users)
//
// Pure and total: no I/O, the reference time is an argument, and missing
// profile data maps to documented defaults instead of errors.

use super::{RankingError, Result};
use crate::models::{
    CategoryEngagement, MatchReason, ScoreBreakdown, UserProfile, VideoCandidate, VideoScore,
};
use crate::utils::days_between;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Completion sub-score for a category the user has never watched
pub const NEUTRAL_COMPLETION_SCORE: f64 = 50.0;
/// Time decay sub-score for a video without an upload time
pub const NEUTRAL_TIME_DECAY_SCORE: f64 = 50.0;
/// Weighted interaction total that saturates the interaction sub-score
pub const INTERACTION_SATURATION: f64 = 30.0;
/// Likes + comments that saturate the engagement sub-score
pub const ENGAGEMENT_SATURATION: f64 = 50.0;
/// Videos up to this age keep the full time decay sub-score
pub const FRESHNESS_WINDOW_DAYS: f64 = 30.0;
/// Points lost per day once a video is past the freshness window
pub const DECAY_POINTS_PER_DAY: f64 = 2.0;
/// A sub-score above this threshold produces a match reason (time decay uses its own)
pub const REASON_THRESHOLD: f64 = 70.0;
pub const RECENT_UPLOAD_THRESHOLD: f64 = 90.0;

/// Weights for the five sub-scores; they must sum to 100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub category_match: f64,
    pub completion_rate: f64,
    pub interaction: f64,
    pub time_decay: f64,
    pub engagement_ratio: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            category_match: 35.0,
            completion_rate: 25.0,
            interaction: 20.0,
            time_decay: 10.0,
            engagement_ratio: 10.0,
        }
    }
}

impl ScoringWeights {
    /// Accept custom weights only if each is finite and non-negative and they sum to 100.
    pub fn validated(self) -> Result<Self> {
        let weights = [
            self.category_match,
            self.completion_rate,
            self.interaction,
            self.time_decay,
            self.engagement_ratio,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RankingError::InvalidWeights(format!(
                "weights must be finite and non-negative: {:?}",
                self
            )));
        }
        let total: f64 = weights.iter().sum();
        if (total - 100.0).abs() > 1e-6 {
            return Err(RankingError::InvalidWeights(format!(
                "weights must sum to 100, got {}",
                total
            )));
        }
        Ok(self)
    }

    fn combine(&self, b: &ScoreBreakdown) -> f64 {
        (b.category_match * self.category_match
            + b.completion_rate * self.completion_rate
            + b.interaction * self.interaction
            + b.time_decay * self.time_decay
            + b.engagement_ratio * self.engagement_ratio)
            / 100.0
    }
}

/// Share of the user's watch time, summed over every category, spent in the
/// video's category.
///
/// 0 when the category is unseen or the profile has no watch time. The stored
/// `total_watch_time` is not consulted.
pub fn category_match(video: &VideoCandidate, profile: &UserProfile) -> f64 {
    let Some(category) = profile.category(&video.category) else {
        return 0.0;
    };
    let total: f64 = profile
        .category_preferences
        .values()
        .map(|c| c.watch_time)
        .sum();
    if !total.is_finite() || total <= 0.0 {
        return 0.0;
    }
    bounded(category.watch_time / total * 100.0)
}

/// The category's completion rate, or the neutral score if unseen.
pub fn completion_score(video: &VideoCandidate, profile: &UserProfile) -> f64 {
    profile
        .category(&video.category)
        .map(|c| bounded(c.completion_rate))
        .unwrap_or(NEUTRAL_COMPLETION_SCORE)
}

/// Weighted likes (1), comments (2) and shares (3) in the category, saturating at 30.
pub fn interaction_score(video: &VideoCandidate, profile: &UserProfile) -> f64 {
    profile
        .category(&video.category)
        .map(weighted_interactions)
        .map(|total| bounded(total / INTERACTION_SATURATION * 100.0))
        .unwrap_or(0.0)
}

fn weighted_interactions(category: &CategoryEngagement) -> f64 {
    let counts = category.interactions;
    counts.likes as f64 + counts.comments as f64 * 2.0 + counts.shares as f64 * 3.0
}

/// Full score for the first 30 days, then minus 2 points per day; neutral without a timestamp.
pub fn time_decay_score(video: &VideoCandidate, now: DateTime<Utc>) -> f64 {
    let Some(uploaded_at) = video.timestamp else {
        return NEUTRAL_TIME_DECAY_SCORE;
    };
    let days_old = days_between(uploaded_at, now);
    if days_old <= FRESHNESS_WINDOW_DAYS {
        return 100.0;
    }
    bounded(100.0 - (days_old - FRESHNESS_WINDOW_DAYS) * DECAY_POINTS_PER_DAY)
}

/// Global engagement on the video itself, saturating at 50 likes + comments.
pub fn engagement_score(video: &VideoCandidate) -> f64 {
    let total = video.likes_count.saturating_add(video.comments_count) as f64;
    bounded(total / ENGAGEMENT_SATURATION * 100.0)
}

fn bounded(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Reasons in fixed evaluation order
fn match_reasons(b: &ScoreBreakdown) -> Vec<MatchReason> {
    let mut reasons = Vec::new();
    if b.category_match > REASON_THRESHOLD {
        reasons.push(MatchReason::WatchingHistory);
    }
    if b.completion_rate > REASON_THRESHOLD {
        reasons.push(MatchReason::CompletionHabit);
    }
    if b.interaction > REASON_THRESHOLD {
        reasons.push(MatchReason::PastEngagement);
    }
    if b.time_decay > RECENT_UPLOAD_THRESHOLD {
        reasons.push(MatchReason::RecentlyUploaded);
    }
    if b.engagement_ratio > REASON_THRESHOLD {
        reasons.push(MatchReason::Popular);
    }
    reasons
}

/// Personalized video scorer
#[derive(Debug, Clone, Default)]
pub struct VideoScorer {
    weights: ScoringWeights,
}

impl VideoScorer {
    /// Scorer with the default 35/25/20/10/10 weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Scorer with custom weights
    pub fn with_weights(weights: ScoringWeights) -> Result<Self> {
        Ok(Self {
            weights: weights.validated()?,
        })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn breakdown(
        &self,
        video: &VideoCandidate,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        ScoreBreakdown {
            category_match: category_match(video, profile),
            completion_rate: completion_score(video, profile),
            interaction: interaction_score(video, profile),
            time_decay: time_decay_score(video, now),
            engagement_ratio: engagement_score(video),
        }
    }

    /// Score one candidate for `profile` as of `now`.
    pub fn score(
        &self,
        video: &VideoCandidate,
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> VideoScore {
        let breakdown = self.breakdown(video, profile, now);
        let score = bounded(self.weights.combine(&breakdown));

        debug!(
            video_id = %video.id,
            category = %video.category,
            category_match = breakdown.category_match,
            completion = breakdown.completion_rate,
            interaction = breakdown.interaction,
            time_decay = breakdown.time_decay,
            engagement = breakdown.engagement_ratio,
            score = score,
            "Video scored"
        );

        VideoScore {
            video: video.clone(),
            score,
            match_reasons: match_reasons(&breakdown),
            breakdown,
        }
    }

    /// Score every candidate and sort by score descending.
    ///
    /// The sort is stable, so equal scores keep their input order.
    pub fn score_all(
        &self,
        videos: &[VideoCandidate],
        profile: &UserProfile,
        now: DateTime<Utc>,
    ) -> Vec<VideoScore> {
        let mut scored: Vec<VideoScore> = videos
            .iter()
            .map(|video| self.score(video, profile, now))
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        scored
    }
}
