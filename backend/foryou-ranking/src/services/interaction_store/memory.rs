use super::{InteractionStore, Result, StoreError};
use crate::models::{UserInteraction, UserProfile};
use async_trait::async_trait;
use dashmap::DashMap;

/// In-process store backed by concurrent maps.
///
/// Used by the binary and tests, and as a stand-in wherever the document
/// store is not reachable.
#[derive(Debug, Default)]
pub struct InMemoryInteractionStore {
    interactions: DashMap<(String, String), UserInteraction>,
    profiles: DashMap<String, UserProfile>,
}

impl InMemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records, e.g. from a snapshot.
    pub fn with_interactions(interactions: impl IntoIterator<Item = UserInteraction>) -> Self {
        let store = Self::new();
        for interaction in interactions {
            store.interactions.insert(
                (interaction.user_id.clone(), interaction.video_id.clone()),
                interaction,
            );
        }
        store
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }
}

#[async_trait]
impl InteractionStore for InMemoryInteractionStore {
    async fn fetch_interactions(&self, user_id: &str) -> Result<Vec<UserInteraction>> {
        let mut records: Vec<UserInteraction> = self
            .interactions
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        // DashMap iteration order is arbitrary
        records.sort_by(|a, b| a.video_id.cmp(&b.video_id));
        Ok(records)
    }

    async fn get_interaction(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> Result<Option<UserInteraction>> {
        Ok(self
            .interactions
            .get(&(user_id.to_string(), video_id.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn put_interaction(&self, interaction: UserInteraction) -> Result<()> {
        if interaction.user_id.is_empty() || interaction.video_id.is_empty() {
            return Err(StoreError::InvalidRecord(
                "interaction requires user_id and video_id".to_string(),
            ));
        }
        self.interactions.insert(
            (interaction.user_id.clone(), interaction.video_id.clone()),
            interaction,
        );
        Ok(())
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.get(user_id).map(|entry| entry.value().clone()))
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}
