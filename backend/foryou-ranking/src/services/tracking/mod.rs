// ============================================
// Interaction Tracker
// ============================================
//
// Maintains UserInteraction records as the user watches:
// 1. initialize: create the record on first visibility of a video
// 2. update_watch_percentage: persist progress in 5% steps
// 3. set_interaction: flip liked / commented / shared
//
// Records are updated in place, never replaced by a fresh one.

use crate::models::{InteractionKind, UserInteraction, UNCATEGORIZED};
use crate::services::interaction_store::{InteractionStore, Result};
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Watch progress is only written when the rounded percentage is a multiple of this
pub const WATCH_PERCENTAGE_WRITE_STEP: i64 = 5;

pub struct InteractionTracker<S: InteractionStore> {
    store: Arc<S>,
    /// (user_id, video_id) pairs known to exist in the store
    initialized: DashSet<(String, String)>,
}

impl<S: InteractionStore> InteractionTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            initialized: DashSet::new(),
        }
    }

    /// Return the existing record or create one with no progress and no flags.
    pub async fn initialize(
        &self,
        user_id: &str,
        video_id: &str,
        category: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<UserInteraction> {
        let result = self.get_or_create(user_id, video_id, category, seen_at).await;
        self.track_outcome(user_id, video_id, &result);
        result
    }

    /// Record watch progress; returns whether a write happened.
    ///
    /// Only rounded percentages on a 5% step are written, which keeps the
    /// number of writes per view bounded.
    pub async fn update_watch_percentage(
        &self,
        user_id: &str,
        video_id: &str,
        percentage: f64,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let rounded = percentage.round().clamp(0.0, 100.0) as i64;
        if rounded % WATCH_PERCENTAGE_WRITE_STEP != 0 {
            return Ok(false);
        }

        let result = async {
            let mut record = self.get_or_create(user_id, video_id, UNCATEGORIZED, now).await?;
            record.watch_percentage = rounded as f64;
            self.store.put_interaction(record).await
        }
        .await;

        self.track_outcome(user_id, video_id, &result);
        result?;

        debug!(
            user_id = %user_id,
            video_id = %video_id,
            watch_percentage = rounded,
            "Watch progress saved"
        );
        Ok(true)
    }

    /// Set one interaction flag on the record, creating the record if needed.
    pub async fn set_interaction(
        &self,
        user_id: &str,
        video_id: &str,
        kind: InteractionKind,
        value: bool,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let result = async {
            let mut record = self.get_or_create(user_id, video_id, UNCATEGORIZED, now).await?;
            record.interactions.set(kind, value);
            self.store.put_interaction(record).await
        }
        .await;

        self.track_outcome(user_id, video_id, &result);
        result?;

        info!(
            user_id = %user_id,
            video_id = %video_id,
            kind = kind.as_str(),
            value = value,
            "Interaction updated"
        );
        Ok(())
    }

    pub fn is_initialized(&self, user_id: &str, video_id: &str) -> bool {
        self.initialized
            .contains(&(user_id.to_string(), video_id.to_string()))
    }

    async fn get_or_create(
        &self,
        user_id: &str,
        video_id: &str,
        category: &str,
        seen_at: DateTime<Utc>,
    ) -> Result<UserInteraction> {
        if let Some(existing) = self.store.get_interaction(user_id, video_id).await? {
            return Ok(existing);
        }

        let record = UserInteraction::first_view(user_id, video_id, category, seen_at);
        self.store.put_interaction(record.clone()).await?;
        debug!(
            user_id = %user_id,
            video_id = %video_id,
            category = %category,
            "Interaction created"
        );
        Ok(record)
    }

    fn track_outcome<T>(&self, user_id: &str, video_id: &str, result: &Result<T>) {
        let key = (user_id.to_string(), video_id.to_string());
        match result {
            Ok(_) => {
                self.initialized.insert(key);
            }
            Err(e) => {
                error!(
                    user_id = %user_id,
                    video_id = %video_id,
                    error = %e,
                    "Failed to update interaction"
                );
                self.initialized.remove(&key);
            }
        }
    }
}
