// ============================================
// Interaction Store
// ============================================
//
// Boundary to the persistence collaborator that owns interaction records and
// stored profiles. The ranking core never talks to storage itself; the
// profile service and tracker go through this trait.

pub mod memory;

pub use memory::InMemoryInteractionStore;

use crate::models::{UserInteraction, UserProfile};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage operations for interaction records and derived profiles
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Full interaction history of one user
    async fn fetch_interactions(&self, user_id: &str) -> Result<Vec<UserInteraction>>;

    async fn get_interaction(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> Result<Option<UserInteraction>>;

    /// Insert or overwrite the record keyed by `(user_id, video_id)`
    async fn put_interaction(&self, interaction: UserInteraction) -> Result<()>;

    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Replace the stored profile wholesale
    async fn save_profile(&self, profile: &UserProfile) -> Result<()>;
}
