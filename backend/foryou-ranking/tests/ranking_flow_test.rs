use chrono::{Duration, TimeZone, Utc};
use foryou_ranking::{
    models::{InteractionKind, MatchReason},
    services::profile_builder::{AggregatorConfig, CompletionPolicy},
    ForYouFeed, InMemoryInteractionStore, InteractionAggregator, InteractionStore,
    InteractionTracker, ProfileService, ScoreCache, UserInteraction, VideoCandidate, VideoScorer,
};
use std::sync::Arc;

fn candidate(id: &str, category: &str, likes: u64, comments: u64, age_days: i64) -> VideoCandidate {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    VideoCandidate {
        id: id.to_string(),
        category: category.to_string(),
        timestamp: Some(now - Duration::days(age_days)),
        likes_count: likes,
        comments_count: comments,
    }
}

#[tokio::test]
async fn test_tracked_views_drive_the_feed() {
    let store = Arc::new(InMemoryInteractionStore::new());
    let tracker = InteractionTracker::new(store.clone());
    let seen_at = Utc.with_ymd_and_hms(2024, 5, 30, 21, 0, 0).unwrap();

    // Mostly music, finished and liked; one skipped gaming clip
    for (video_id, pct) in [("m1", 100.0), ("m2", 95.0), ("m3", 80.0)] {
        tracker.initialize("alice", video_id, "music", seen_at).await.unwrap();
        tracker
            .update_watch_percentage("alice", video_id, pct, seen_at)
            .await
            .unwrap();
        tracker
            .set_interaction("alice", video_id, InteractionKind::Liked, true, seen_at)
            .await
            .unwrap();
    }
    tracker.initialize("alice", "g1", "gaming", seen_at).await.unwrap();
    tracker
        .update_watch_percentage("alice", "g1", 10.0, seen_at)
        .await
        .unwrap();

    let service = ProfileService::new(store.clone(), InteractionAggregator::default());
    let profile = service.load_or_build("alice").await.unwrap();

    assert_eq!(profile.category_preferences.len(), 2);
    assert_eq!(profile.active_hours.get(&21), Some(&4));
    assert_eq!(profile.category_preferences["music"].interactions.likes, 3);
    assert!(store.load_profile("alice").await.unwrap().is_some());

    let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let videos = vec![
        candidate("gaming-new", "gaming", 5, 0, 1),
        candidate("music-new", "music", 5, 0, 1),
        candidate("cooking-old", "cooking", 0, 0, 400),
    ];
    let feed = ForYouFeed::new(videos, profile).with_as_of(as_of);
    let page = feed.get_personalized_videos(10, 0);

    let ids: Vec<&str> = page.iter().map(|s| s.video.id.as_str()).collect();
    assert_eq!(ids, vec!["music-new", "gaming-new", "cooking-old"]);
    assert_eq!(page[0].match_reasons[0], MatchReason::WatchingHistory);
    assert!(page.iter().all(|s| (0.0..=100.0).contains(&s.score)));
}

#[test]
fn test_unknown_user_gets_neutral_ranking() {
    let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let profile = InteractionAggregator::default()
        .aggregate_at("nobody", &[], as_of)
        .profile;

    let scored = VideoScorer::new().score(&candidate("v", "music", 0, 0, 0), &profile, as_of);
    // 50 * 25 + 100 * 10, divided by 100
    assert!((scored.score - 22.5).abs() < 1e-9);
    assert_eq!(scored.match_reasons, vec![MatchReason::RecentlyUploaded]);
}

#[test]
fn test_completion_policies_differ_only_in_completion_rate() {
    let history: Vec<UserInteraction> = [(1, 20.0), (2, 100.0), (3, 60.0)]
        .iter()
        .map(|(n, pct)| UserInteraction {
            user_id: "bob".to_string(),
            video_id: format!("v{}", n),
            timestamp: format!("2024-05-0{}T08:00:00Z", n),
            watch_percentage: *pct,
            category: "news".to_string(),
            interactions: Default::default(),
        })
        .collect();
    let as_of = Utc::now();

    let mean = InteractionAggregator::default()
        .aggregate_at("bob", &history, as_of)
        .profile;
    let last_two = InteractionAggregator::new(AggregatorConfig {
        completion_policy: CompletionPolicy::LastTwoAverage,
        ..Default::default()
    })
    .aggregate_at("bob", &history, as_of)
    .profile;

    assert!((mean.category_preferences["news"].completion_rate - 60.0).abs() < 1e-9);
    // 20 -> 60 -> 60
    assert!((last_two.category_preferences["news"].completion_rate - 60.0).abs() < 1e-9);
    assert_eq!(mean.total_watch_time, last_two.total_watch_time);

    let reordered: Vec<UserInteraction> = history.iter().rev().cloned().collect();
    let last_two_reordered = InteractionAggregator::new(AggregatorConfig {
        completion_policy: CompletionPolicy::LastTwoAverage,
        ..Default::default()
    })
    .aggregate_at("bob", &reordered, as_of)
    .profile;
    // 60 -> 80 -> 50: the original averaging depends on input order
    assert!((last_two_reordered.category_preferences["news"].completion_rate - 50.0).abs() < 1e-9);
}

#[test]
fn test_cached_pages_match_uncached() {
    let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let profile = InteractionAggregator::default()
        .aggregate_at(
            "carol",
            &[UserInteraction {
                user_id: "carol".to_string(),
                video_id: "x".to_string(),
                timestamp: "2024-05-01T10:00:00Z".to_string(),
                watch_percentage: 70.0,
                category: "gaming".to_string(),
                interactions: Default::default(),
            }],
            as_of,
        )
        .profile;
    let videos: Vec<VideoCandidate> = (0..20)
        .map(|i| {
            let category = if i % 3 == 0 { "gaming" } else { "music" };
            candidate(&format!("v{}", i), category, i, 0, i as i64 * 5)
        })
        .collect();

    let feed = ForYouFeed::new(videos, profile).with_as_of(as_of);
    let mut cache = ScoreCache::new();
    for offset in (0..20).step_by(5) {
        assert_eq!(
            feed.get_personalized_videos_cached(&mut cache, 5, offset),
            feed.get_personalized_videos(5, offset)
        );
    }
    assert_eq!(cache.len(), 1);
}
