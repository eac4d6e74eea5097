use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Category stamped on interactions created before the video's category is known.
pub const UNCATEGORIZED: &str = "uncategorized";

/// One user's engagement with one video.
///
/// Keyed by `(user_id, video_id)`. The record is created the first time the
/// video becomes visible to a signed-in user and then updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInteraction {
    pub user_id: String,
    pub video_id: String,
    /// ISO-8601 timestamp of the interaction
    pub timestamp: String,
    /// Percentage of the video watched (0-100)
    pub watch_percentage: f64,
    /// Category of the video at the time of the interaction
    pub category: String,
    #[serde(default)]
    pub interactions: InteractionFlags,
}

impl UserInteraction {
    /// Fresh record for a video the user has just seen.
    pub fn first_view(
        user_id: impl Into<String>,
        video_id: impl Into<String>,
        category: impl Into<String>,
        seen_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            video_id: video_id.into(),
            timestamp: seen_at.to_rfc3339(),
            watch_percentage: 0.0,
            category: category.into(),
            interactions: InteractionFlags::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionFlags {
    pub liked: bool,
    pub commented: bool,
    pub shared: bool,
}

impl InteractionFlags {
    pub fn set(&mut self, kind: InteractionKind, value: bool) {
        match kind {
            InteractionKind::Liked => self.liked = value,
            InteractionKind::Commented => self.commented = value,
            InteractionKind::Shared => self.shared = value,
        }
    }
}

/// Which flag of an interaction record to update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Liked,
    Commented,
    Shared,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Liked => "liked",
            InteractionKind::Commented => "commented",
            InteractionKind::Shared => "shared",
        }
    }
}

/// Counts of interactions whose flag was set, per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCounts {
    pub likes: u32,
    pub comments: u32,
    pub shares: u32,
}

/// Derived engagement for one category of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEngagement {
    pub category: String,
    /// Total seconds watched
    pub watch_time: f64,
    /// Average completion percentage (0-100)
    pub completion_rate: f64,
    pub interactions: InteractionCounts,
    /// Latest ISO-8601 timestamp seen for this category
    pub last_interacted: String,
}

/// Per-user profile, rebuilt wholesale from the full interaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    /// Time of the most recent interaction; `None` without history
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
    /// Total seconds across all categories
    pub total_watch_time: f64,
    pub category_preferences: BTreeMap<String, CategoryEngagement>,
    /// Hour of day (0-23, UTC) -> number of interactions
    pub active_hours: BTreeMap<u8, u32>,
    pub last_updated: DateTime<Utc>,
}

impl UserProfile {
    /// Profile of a user with no history.
    pub fn empty(user_id: impl Into<String>, last_updated: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            last_active: None,
            total_watch_time: 0.0,
            category_preferences: BTreeMap::new(),
            active_hours: BTreeMap::new(),
            last_updated,
        }
    }

    pub fn category(&self, category: &str) -> Option<&CategoryEngagement> {
        self.category_preferences.get(category)
    }

    /// Up to `n` hours with the most activity, busiest first.
    pub fn peak_hours(&self, n: usize) -> Vec<u8> {
        let mut hours: Vec<(u8, u32)> = self.active_hours.iter().map(|(h, c)| (*h, *c)).collect();
        hours.sort_by(|a, b| b.1.cmp(&a.1));
        hours.into_iter().take(n).map(|(h, _)| h).collect()
    }
}

/// A video eligible for ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCandidate {
    pub id: String,
    pub category: String,
    /// Upload time
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub comments_count: u64,
}

/// Human-readable explanation attached to a scored video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    WatchingHistory,
    CompletionHabit,
    PastEngagement,
    RecentlyUploaded,
    Popular,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::WatchingHistory => "Based on your watching history",
            MatchReason::CompletionHabit => "You often watch videos like this",
            MatchReason::PastEngagement => "Similar to videos you've engaged with",
            MatchReason::RecentlyUploaded => "Recently uploaded",
            MatchReason::Popular => "Popular with other users",
        }
    }
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MatchReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The five sub-scores behind a final score, each in [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub category_match: f64,
    pub completion_rate: f64,
    pub interaction: f64,
    pub time_decay: f64,
    pub engagement_ratio: f64,
}

/// A candidate with its personalized score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoScore {
    pub video: VideoCandidate,
    /// Final score (0-100)
    pub score: f64,
    pub match_reasons: Vec<MatchReason>,
    pub breakdown: ScoreBreakdown,
}

impl VideoScore {
    pub fn reason_messages(&self) -> Vec<&'static str> {
        self.match_reasons.iter().map(MatchReason::as_str).collect()
    }
}
