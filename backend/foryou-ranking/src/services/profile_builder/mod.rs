// ============================================
// User Profile Builder
// ============================================
//
// Builds per-user engagement profiles from interaction history:
// 1. InteractionAggregator folds the full history into a UserProfile (pure)
// 2. ProfileService loads stored profiles or rebuilds them through the
//    InteractionStore boundary
//
// ┌──────────────────────────────────────────────┐
// │               ProfileService                 │
// │  load_or_build / refresh                     │
// ├──────────────────────┬───────────────────────┤
// │ InteractionAggregator│   InteractionStore    │
// │  (pure fold)         │   (history/profiles)  │
// └──────────────────────┴───────────────────────┘

pub mod aggregator;
pub mod profile_service;

pub use aggregator::{
    Aggregation, AggregationWarning, AggregatorConfig, CompletionPolicy, InteractionAggregator,
    ASSUMED_VIDEO_DURATION_SECONDS,
};
pub use profile_service::ProfileService;

use crate::services::interaction_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileBuilderError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, ProfileBuilderError>;
