use anyhow::{Context, Result};
use foryou_ranking::{
    jobs::ProfileRefreshJob,
    services::profile_builder::AggregatorConfig,
    Config, ForYouFeed, InMemoryInteractionStore, InteractionAggregator, ProfileService,
    UserInteraction, VideoCandidate,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Interaction history and candidate pool for one user
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    user_id: String,
    #[serde(default)]
    interactions: Vec<UserInteraction>,
    #[serde(default)]
    videos: Vec<VideoCandidate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; LOG_FORMAT=json for log aggregation
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("foryou_ranking=info,info"));
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // Load config
    let config = Config::from_env().context("Failed to load config")?;

    let raw = tokio::fs::read_to_string(&config.ranking.snapshot_path)
        .await
        .with_context(|| format!("Failed to read snapshot {}", config.ranking.snapshot_path))?;
    let snapshot: Snapshot = serde_json::from_str(&raw).context("Invalid snapshot JSON")?;

    info!(
        user_id = %snapshot.user_id,
        interactions = snapshot.interactions.len(),
        videos = snapshot.videos.len(),
        "Loaded snapshot"
    );

    let foreign = snapshot
        .interactions
        .iter()
        .filter(|i| i.user_id != snapshot.user_id)
        .count();
    if foreign > 0 {
        warn!(count = foreign, "Ignoring interactions that belong to other users");
    }

    let store = Arc::new(InMemoryInteractionStore::with_interactions(
        snapshot.interactions,
    ));
    let aggregator = InteractionAggregator::new(AggregatorConfig {
        assumed_video_duration_secs: config.ranking.assumed_video_duration_secs,
        completion_policy: config.ranking.completion_policy,
    });
    let service = Arc::new(ProfileService::new(store, aggregator));

    let profile = service
        .load_or_build(&snapshot.user_id)
        .await
        .context("Failed to build user profile")?;

    let feed = ForYouFeed::new(snapshot.videos, profile);
    let page = feed.get_personalized_videos(
        config.ranking.default_page_size,
        config.ranking.page_offset,
    );

    info!(
        user_id = %snapshot.user_id,
        returned = page.len(),
        top_score = page.first().map(|s| s.score).unwrap_or_default(),
        "Personalized feed ranked"
    );

    println!("{}", serde_json::to_string_pretty(&page)?);

    if !config.refresh.run_once {
        info!(
            interval_secs = config.refresh.interval_secs,
            "Keeping profile fresh until interrupted"
        );
        let job = ProfileRefreshJob::new(config.refresh.clone(), service);
        let users = vec![snapshot.user_id];
        tokio::select! {
            result = job.run(&users) => { result?; }
            _ = tokio::signal::ctrl_c() => info!("Shutting down"),
        }
    }

    Ok(())
}
