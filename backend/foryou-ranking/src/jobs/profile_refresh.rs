// ============================================
// Profile Refresh Job
// ============================================
//
// Periodically rebuilds user profiles from their full interaction history.
//
// Workflow:
// 1. Split the user list into batches
// 2. Refresh every user in a batch concurrently
// 3. Record successes, failures and skipped records
// 4. Sleep for the configured interval (unless run_once) and repeat

use crate::config::ProfileRefreshConfig;
use crate::services::interaction_store::InteractionStore;
use crate::services::profile_builder::ProfileService;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Statistics for one refresh pass
#[derive(Debug, Clone, Default)]
pub struct RefreshStats {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub users_processed: u32,
    pub users_succeeded: u32,
    pub users_failed: u32,
    /// Records skipped across all users because of malformed data
    pub warnings: u32,
    pub total_duration_ms: u64,
}

/// Profile refresh job runner
pub struct ProfileRefreshJob<S: InteractionStore> {
    config: ProfileRefreshConfig,
    service: Arc<ProfileService<S>>,
}

impl<S: InteractionStore> ProfileRefreshJob<S> {
    pub fn new(config: ProfileRefreshConfig, service: Arc<ProfileService<S>>) -> Self {
        Self { config, service }
    }

    /// Run passes until `run_once` stops the loop.
    pub async fn run(&self, user_ids: &[String]) -> Result<RefreshStats> {
        loop {
            let stats = self.run_single_pass(user_ids).await;

            info!(
                processed = stats.users_processed,
                succeeded = stats.users_succeeded,
                failed = stats.users_failed,
                warnings = stats.warnings,
                duration_ms = stats.total_duration_ms,
                "Profile refresh pass completed"
            );

            if self.config.run_once {
                return Ok(stats);
            }

            info!(
                interval_secs = self.config.interval_secs,
                "Sleeping until next pass"
            );
            sleep(Duration::from_secs(self.config.interval_secs)).await;
        }
    }

    /// Refresh every user once. Individual failures are counted, not returned.
    pub async fn run_single_pass(&self, user_ids: &[String]) -> RefreshStats {
        let start_time = Instant::now();
        let mut stats = RefreshStats {
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        info!(
            users = user_ids.len(),
            batch_size = self.config.batch_size,
            "Starting profile refresh pass"
        );

        for (batch_idx, batch) in user_ids.chunks(self.config.batch_size.max(1)).enumerate() {
            let results = self.service.refresh_many(batch).await;

            for (user_id, result) in batch.iter().zip(results) {
                stats.users_processed += 1;
                match result {
                    Ok(aggregation) => {
                        stats.users_succeeded += 1;
                        if !aggregation.warnings.is_empty() {
                            stats.warnings += aggregation.warnings.len() as u32;
                            warn!(
                                user_id = %user_id,
                                skipped = aggregation.warnings.len(),
                                "Profile refreshed with skipped records"
                            );
                        }
                    }
                    Err(e) => {
                        stats.users_failed += 1;
                        error!(
                            user_id = %user_id,
                            batch = batch_idx + 1,
                            error = %e,
                            "Failed to refresh user profile"
                        );
                    }
                }
            }

            if self.config.batch_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }
        }

        stats.completed_at = Some(Utc::now());
        stats.total_duration_ms = start_time.elapsed().as_millis() as u64;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserInteraction;
    use crate::services::interaction_store::{
        InMemoryInteractionStore, MockInteractionStore, StoreError,
    };
    use crate::services::profile_builder::InteractionAggregator;

    fn config() -> ProfileRefreshConfig {
        ProfileRefreshConfig {
            batch_size: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_pass_refreshes_all_users() {
        let now = Utc::now();
        let mut bad = UserInteraction::first_view("u3", "v2", "music", now);
        bad.timestamp = "garbage".to_string();
        let store = Arc::new(InMemoryInteractionStore::with_interactions(vec![
            UserInteraction::first_view("u1", "v1", "music", now),
            UserInteraction::first_view("u2", "v1", "music", now),
            UserInteraction::first_view("u3", "v1", "music", now),
            bad,
        ]));
        let service = Arc::new(ProfileService::new(
            store.clone(),
            InteractionAggregator::default(),
        ));
        let job = ProfileRefreshJob::new(config(), service);

        let users: Vec<String> = vec!["u1".into(), "u2".into(), "u3".into()];
        let stats = job.run(&users).await.unwrap();

        assert_eq!(stats.users_processed, 3);
        assert_eq!(stats.users_succeeded, 3);
        assert_eq!(stats.users_failed, 0);
        assert_eq!(stats.warnings, 1);
        assert!(stats.completed_at.is_some());
        for user in &users {
            assert!(store.load_profile(user).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_failures_are_counted() {
        let mut store = MockInteractionStore::new();
        store
            .expect_fetch_interactions()
            .returning(|_| Err(StoreError::Unavailable("down".to_string())));

        let service = Arc::new(ProfileService::new(
            Arc::new(store),
            InteractionAggregator::default(),
        ));
        let job = ProfileRefreshJob::new(config(), service);

        let stats = job.run_single_pass(&["u1".to_string(), "u2".to_string()]).await;
        assert_eq!(stats.users_processed, 2);
        assert_eq!(stats.users_failed, 2);
        assert_eq!(stats.users_succeeded, 0);
    }

    #[test]
    fn test_default_config_runs_once() {
        let config = ProfileRefreshConfig::default();
        assert!(config.run_once);
        assert_eq!(config.interval_secs, 300);
    }
}
