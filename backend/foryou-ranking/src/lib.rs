//! Personalized "For You" video ranking.
//!
//! Folds a user's interaction history into an engagement profile and scores
//! candidate videos against it with a fixed, explainable weighting.

pub mod config;
pub mod jobs;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use models::{UserInteraction, UserProfile, VideoCandidate, VideoScore};
pub use services::{
    ForYouFeed, InMemoryInteractionStore, InteractionAggregator, InteractionStore,
    InteractionTracker, ProfileService, ScoreCache, VideoScorer,
};
