pub mod feed;
pub mod interaction_store;
pub mod profile_builder;
pub mod ranking;
pub mod tracking;

pub use feed::{ForYouFeed, ScoreCache};
pub use interaction_store::{InMemoryInteractionStore, InteractionStore};
pub use profile_builder::{InteractionAggregator, ProfileService};
pub use ranking::VideoScorer;
pub use tracking::InteractionTracker;
