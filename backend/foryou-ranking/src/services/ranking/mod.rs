/// Ranking Module
///
/// Rule-based personalized scoring of candidate videos.
///
/// # Workflow
/// 1. Compute five sub-scores per candidate from the user profile and the video
/// 2. Combine them with fixed weights into a 0-100 score
/// 3. Attach match reasons for sub-scores above their thresholds
/// 4. Sort descending, keeping input order for ties
pub mod scorer;

pub use scorer::{
    category_match, completion_score, engagement_score, interaction_score, time_decay_score,
    ScoringWeights, VideoScorer,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Invalid scoring weights: {0}")]
    InvalidWeights(String),
}

pub type Result<T> = std::result::Result<T, RankingError>;
