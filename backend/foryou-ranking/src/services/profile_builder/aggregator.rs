// ============================================
// Interaction Aggregator
// ============================================
//
// Folds a user's full interaction history into a UserProfile:
// 1. Category watch time (watch % x assumed video duration)
// 2. Category completion rate
// 3. Liked / commented / shared counts per category
// 4. Hour-of-day activity histogram (UTC)
//
// The input is the complete, current history of one user. Records are keyed
// by video id, so a history read twice folds to the same profile.

use crate::models::{CategoryEngagement, InteractionCounts, UserInteraction, UserProfile};
use crate::utils::{clamp_percentage, parse_timestamp};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Seconds assumed for every video when converting watch percentage to watch time
pub const ASSUMED_VIDEO_DURATION_SECONDS: f64 = 300.0;

/// How a category's completion rate is combined across interactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Arithmetic mean over every interaction in the category
    #[default]
    CumulativeMean,
    /// `(previous + current) / 2`, where a previous value exists only if it is
    /// non-zero. Depends on input order.
    LastTwoAverage,
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub assumed_video_duration_secs: f64,
    pub completion_policy: CompletionPolicy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            assumed_video_duration_secs: ASSUMED_VIDEO_DURATION_SECONDS,
            completion_policy: CompletionPolicy::default(),
        }
    }
}

/// Non-fatal data problem found while aggregating
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationWarning {
    /// Record skipped because its timestamp could not be parsed
    MalformedTimestamp { video_id: String, timestamp: String },
}

impl std::fmt::Display for AggregationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationWarning::MalformedTimestamp {
                video_id,
                timestamp,
            } => write!(
                f,
                "skipped interaction for video {video_id}: malformed timestamp {timestamp:?}"
            ),
        }
    }
}

/// Result of folding one user's history
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub profile: UserProfile,
    pub warnings: Vec<AggregationWarning>,
}

/// Running state for one category while folding
#[derive(Debug, Default)]
struct CategoryAccumulator {
    watch_time: f64,
    completion_sum: f64,
    samples: u32,
    last_two_rate: f64,
    interactions: InteractionCounts,
    last_interacted: String,
}

impl CategoryAccumulator {
    fn completion_rate(&self, policy: CompletionPolicy) -> f64 {
        match policy {
            CompletionPolicy::CumulativeMean if self.samples > 0 => {
                self.completion_sum / self.samples as f64
            }
            CompletionPolicy::CumulativeMean => 0.0,
            CompletionPolicy::LastTwoAverage => self.last_two_rate,
        }
    }
}

/// Builds user profiles from interaction history
#[derive(Debug, Clone, Default)]
pub struct InteractionAggregator {
    config: AggregatorConfig,
}

impl InteractionAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Aggregate with `last_updated` set to the current time.
    pub fn aggregate(&self, user_id: &str, interactions: &[UserInteraction]) -> Aggregation {
        self.aggregate_at(user_id, interactions, Utc::now())
    }

    /// Fold `interactions` into a profile stamped with `as_of`.
    ///
    /// The caller supplies exactly one user's records; nothing is filtered by
    /// user id here. Records with an unparsable timestamp are skipped and
    /// returned as warnings.
    pub fn aggregate_at(
        &self,
        user_id: &str,
        interactions: &[UserInteraction],
        as_of: DateTime<Utc>,
    ) -> Aggregation {
        let mut warnings = Vec::new();
        let mut categories: BTreeMap<String, CategoryAccumulator> = BTreeMap::new();
        let mut active_hours: BTreeMap<u8, u32> = BTreeMap::new();
        let mut last_active: Option<DateTime<Utc>> = None;

        for (interaction, at) in self.latest_per_video(interactions, &mut warnings) {
            last_active = last_active.max(Some(at));
            let hour = at.hour() as u8;
            *active_hours.entry(hour).or_insert(0) += 1;

            let watch_percentage = clamp_percentage(interaction.watch_percentage);
            let watch_time_secs =
                watch_percentage / 100.0 * self.config.assumed_video_duration_secs.max(0.0);

            let bucket = categories
                .entry(interaction.category.clone())
                .or_default();

            bucket.watch_time += watch_time_secs;
            bucket.completion_sum += watch_percentage;
            bucket.samples += 1;
            bucket.last_two_rate = if bucket.last_two_rate > 0.0 {
                (bucket.last_two_rate + watch_percentage) / 2.0
            } else {
                watch_percentage
            };

            let flags = interaction.interactions;
            if flags.liked {
                bucket.interactions.likes += 1;
            }
            if flags.commented {
                bucket.interactions.comments += 1;
            }
            if flags.shared {
                bucket.interactions.shares += 1;
            }

            if interaction.timestamp > bucket.last_interacted {
                bucket.last_interacted = interaction.timestamp.clone();
            }
        }

        let category_preferences: BTreeMap<String, CategoryEngagement> = categories
            .into_iter()
            .map(|(category, acc)| {
                let engagement = CategoryEngagement {
                    category: category.clone(),
                    watch_time: acc.watch_time,
                    completion_rate: clamp_percentage(
                        acc.completion_rate(self.config.completion_policy),
                    ),
                    interactions: acc.interactions,
                    last_interacted: acc.last_interacted,
                };
                (category, engagement)
            })
            .collect();

        let total_watch_time: f64 = category_preferences.values().map(|c| c.watch_time).sum();

        info!(
            user_id = %user_id,
            interactions = interactions.len(),
            categories = category_preferences.len(),
            skipped = warnings.len(),
            total_watch_time = total_watch_time,
            "Aggregated user interactions"
        );

        Aggregation {
            profile: UserProfile {
                user_id: user_id.to_string(),
                last_active,
                total_watch_time,
                category_preferences,
                active_hours,
                last_updated: as_of,
            },
            warnings,
        }
    }

    /// Keep one record per video (latest timestamp, first seen on ties) and
    /// drop records whose timestamp does not parse.
    fn latest_per_video<'a>(
        &self,
        interactions: &'a [UserInteraction],
        warnings: &mut Vec<AggregationWarning>,
    ) -> Vec<(&'a UserInteraction, DateTime<Utc>)> {
        let mut kept: Vec<(&'a UserInteraction, DateTime<Utc>)> =
            Vec::with_capacity(interactions.len());
        let mut index_by_video: HashMap<&'a str, usize> = HashMap::new();

        for interaction in interactions {
            let at = match parse_timestamp(&interaction.timestamp) {
                Ok(at) => at,
                Err(e) => {
                    warn!(
                        user_id = %interaction.user_id,
                        video_id = %interaction.video_id,
                        timestamp = %interaction.timestamp,
                        error = %e,
                        "Skipping interaction with malformed timestamp"
                    );
                    warnings.push(AggregationWarning::MalformedTimestamp {
                        video_id: interaction.video_id.clone(),
                        timestamp: interaction.timestamp.clone(),
                    });
                    continue;
                }
            };

            match index_by_video.get(interaction.video_id.as_str()) {
                Some(&idx) => {
                    debug!(
                        video_id = %interaction.video_id,
                        "Duplicate interaction record for video"
                    );
                    if at > kept[idx].1 {
                        kept[idx] = (interaction, at);
                    }
                }
                None => {
                    index_by_video.insert(interaction.video_id.as_str(), kept.len());
                    kept.push((interaction, at));
                }
            }
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InteractionFlags;

    fn interaction(
        video_id: &str,
        category: &str,
        timestamp: &str,
        watch_percentage: f64,
        flags: (bool, bool, bool),
    ) -> UserInteraction {
        UserInteraction {
            user_id: "user-1".to_string(),
            video_id: video_id.to_string(),
            timestamp: timestamp.to_string(),
            watch_percentage,
            category: category.to_string(),
            interactions: InteractionFlags {
                liked: flags.0,
                commented: flags.1,
                shared: flags.2,
            },
        }
    }

    fn sample_history() -> Vec<UserInteraction> {
        vec![
            interaction("v1", "music", "2024-04-01T20:05:00Z", 100.0, (true, false, false)),
            interaction("v2", "music", "2024-04-02T21:10:00Z", 50.0, (true, true, false)),
            interaction("v3", "gaming", "2024-04-02T08:00:00Z", 20.0, (false, false, true)),
            interaction("v4", "music", "2024-04-03T20:45:00Z", 90.0, (false, false, false)),
        ]
    }

    #[test]
    fn test_empty_history_yields_empty_profile() {
        let aggregator = InteractionAggregator::default();
        let result = aggregator.aggregate("user-1", &[]);

        assert_eq!(result.profile.total_watch_time, 0.0);
        assert!(result.profile.category_preferences.is_empty());
        assert!(result.profile.active_hours.is_empty());
        assert_eq!(result.profile.last_active, None);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_watch_time_and_counts() {
        let aggregator = InteractionAggregator::default();
        let profile = aggregator.aggregate("user-1", &sample_history()).profile;

        let music = profile.category("music").unwrap();
        assert!((music.watch_time - 720.0).abs() < 1e-9); // (1.0 + 0.5 + 0.9) * 300
        assert_eq!(
            music.interactions,
            InteractionCounts {
                likes: 2,
                comments: 1,
                shares: 0
            }
        );
        assert_eq!(music.last_interacted, "2024-04-03T20:45:00Z");

        let gaming = profile.category("gaming").unwrap();
        assert!((gaming.watch_time - 60.0).abs() < 1e-9);
        assert_eq!(gaming.interactions.shares, 1);

        assert!((profile.total_watch_time - 780.0).abs() < 1e-9);

        let latest: DateTime<Utc> = "2024-04-03T20:45:00Z".parse().unwrap();
        assert_eq!(profile.last_active, Some(latest));
    }

    #[test]
    fn test_active_hours_bucketed_in_utc() {
        let aggregator = InteractionAggregator::default();
        let mut history = sample_history();
        // 23:30 at +02:00 is 21:30 UTC
        history.push(interaction(
            "v5",
            "music",
            "2024-04-04T23:30:00+02:00",
            10.0,
            (false, false, false),
        ));

        let profile = aggregator.aggregate("user-1", &history).profile;
        assert_eq!(profile.active_hours.get(&20), Some(&2));
        assert_eq!(profile.active_hours.get(&21), Some(&2));
        assert_eq!(profile.active_hours.get(&8), Some(&1));
        assert_eq!(profile.active_hours.get(&23), None);
    }

    #[test]
    fn test_completion_rate_cumulative_mean_policy() {
        let aggregator = InteractionAggregator::default();
        let profile = aggregator.aggregate("user-1", &sample_history()).profile;

        // (100 + 50 + 90) / 3
        let music = profile.category("music").unwrap();
        assert!((music.completion_rate - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_completion_rate_last_two_average_policy() {
        let aggregator = InteractionAggregator::new(AggregatorConfig {
            completion_policy: CompletionPolicy::LastTwoAverage,
            ..Default::default()
        });
        let profile = aggregator.aggregate("user-1", &sample_history()).profile;

        // 100 -> (100 + 50) / 2 = 75 -> (75 + 90) / 2 = 82.5
        let music = profile.category("music").unwrap();
        assert!((music.completion_rate - 82.5).abs() < 1e-9);
    }

    #[test]
    fn test_last_two_average_treats_zero_as_no_previous_value() {
        let aggregator = InteractionAggregator::new(AggregatorConfig {
            completion_policy: CompletionPolicy::LastTwoAverage,
            ..Default::default()
        });
        let history = vec![
            interaction("v1", "news", "2024-04-01T10:00:00Z", 0.0, (false, false, false)),
            interaction("v2", "news", "2024-04-01T11:00:00Z", 60.0, (false, false, false)),
        ];

        let profile = aggregator.aggregate("user-1", &history).profile;
        assert!((profile.category("news").unwrap().completion_rate - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_timestamp_is_skipped_with_warning() {
        let aggregator = InteractionAggregator::default();
        let mut history = sample_history();
        history.push(interaction("bad", "music", "not-a-date", 100.0, (true, true, true)));

        let result = aggregator.aggregate("user-1", &history);

        assert_eq!(
            result.warnings,
            vec![AggregationWarning::MalformedTimestamp {
                video_id: "bad".to_string(),
                timestamp: "not-a-date".to_string(),
            }]
        );
        let music = result.profile.category("music").unwrap();
        assert_eq!(music.interactions.likes, 2);
        assert!((result.profile.total_watch_time - 780.0).abs() < 1e-9);
    }

    #[test]
    fn test_watch_percentage_is_clamped() {
        let aggregator = InteractionAggregator::default();
        let history = vec![
            interaction("v1", "music", "2024-04-01T10:00:00Z", 250.0, (false, false, false)),
            interaction("v2", "music", "2024-04-01T11:00:00Z", -40.0, (false, false, false)),
        ];

        let profile = aggregator.aggregate("user-1", &history).profile;
        let music = profile.category_preferences["music"].clone();
        assert!((music.watch_time - 300.0).abs() < 1e-9);
        assert!((music.completion_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_video_records_are_not_double_counted() {
        let aggregator = InteractionAggregator::default();
        let history = vec![
            interaction("v1", "music", "2024-04-01T10:00:00Z", 40.0, (true, false, false)),
            interaction("v1", "music", "2024-04-01T10:05:00Z", 80.0, (true, false, false)),
        ];

        let profile = aggregator.aggregate("user-1", &history).profile;
        let music = profile.category_preferences["music"].clone();
        assert_eq!(music.interactions.likes, 1);
        assert!((music.watch_time - 240.0).abs() < 1e-9);
        assert!((music.completion_rate - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_is_idempotent_and_order_invariant() {
        let aggregator = InteractionAggregator::default();
        let as_of = Utc::now();
        let history = sample_history();
        let mut reversed = history.clone();
        reversed.reverse();

        let first = aggregator.aggregate_at("user-1", &history, as_of).profile;
        let second = aggregator.aggregate_at("user-1", &history, as_of).profile;
        let shuffled = aggregator.aggregate_at("user-1", &reversed, as_of).profile;

        assert_eq!(first, second);
        assert_eq!(
            first.category_preferences.keys().collect::<Vec<_>>(),
            shuffled.category_preferences.keys().collect::<Vec<_>>()
        );
        assert_eq!(first.active_hours, shuffled.active_hours);
        assert_eq!(first.last_active, shuffled.last_active);
        for (category, engagement) in &first.category_preferences {
            let other = &shuffled.category_preferences[category];
            assert!((engagement.watch_time - other.watch_time).abs() < 1e-9);
            assert!((engagement.completion_rate - other.completion_rate).abs() < 1e-9);
            assert_eq!(engagement.interactions, other.interactions);
            assert_eq!(engagement.last_interacted, other.last_interacted);
        }
    }

    #[test]
    fn test_custom_assumed_duration() {
        let aggregator = InteractionAggregator::new(AggregatorConfig {
            assumed_video_duration_secs: 60.0,
            ..Default::default()
        });
        let history = vec![interaction(
            "v1",
            "music",
            "2024-04-01T10:00:00Z",
            50.0,
            (false, false, false),
        )];

        let profile = aggregator.aggregate("user-1", &history).profile;
        assert!((profile.total_watch_time - 30.0).abs() < 1e-9);
    }
}
