// ============================================
// Profile Service
// ============================================
//
// Orchestrates profile building against the interaction store:
// 1. load_or_build: return the stored profile, or build one if none exists
// 2. refresh: fetch the full history, aggregate, replace the stored profile
// 3. refresh_many: refresh a batch of users concurrently

use super::aggregator::{Aggregation, InteractionAggregator};
use super::{ProfileBuilderError, Result};
use crate::models::UserProfile;
use crate::services::interaction_store::InteractionStore;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ProfileService<S: InteractionStore> {
    store: Arc<S>,
    aggregator: InteractionAggregator,
}

impl<S: InteractionStore> ProfileService<S> {
    pub fn new(store: Arc<S>, aggregator: InteractionAggregator) -> Self {
        Self { store, aggregator }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Stored profile if one exists, otherwise aggregate and persist a new one.
    pub async fn load_or_build(&self, user_id: &str) -> Result<UserProfile> {
        if let Some(profile) = self.store.load_profile(user_id).await? {
            return Ok(profile);
        }

        info!(user_id = %user_id, "No stored profile, building from interactions");
        Ok(self.refresh(user_id).await?.profile)
    }

    /// Rebuild the profile from the user's full history and store it.
    pub async fn refresh(&self, user_id: &str) -> Result<Aggregation> {
        if user_id.is_empty() {
            return Err(ProfileBuilderError::InvalidData(
                "user id must not be empty".to_string(),
            ));
        }

        let interactions = self.store.fetch_interactions(user_id).await?;
        let aggregation = self.aggregator.aggregate(user_id, &interactions);

        for warning in &aggregation.warnings {
            warn!(user_id = %user_id, warning = %warning, "Profile built with skipped record");
        }

        self.store.save_profile(&aggregation.profile).await?;

        info!(
            user_id = %user_id,
            categories = aggregation.profile.category_preferences.len(),
            total_watch_time = aggregation.profile.total_watch_time,
            "User profile refreshed"
        );

        Ok(aggregation)
    }

    /// Refresh several users concurrently; results are in input order.
    pub async fn refresh_many(&self, user_ids: &[String]) -> Vec<Result<Aggregation>> {
        join_all(user_ids.iter().map(|user_id| self.refresh(user_id))).await
    }
}
