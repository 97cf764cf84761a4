use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use ranking_engine::models::{ContentItem, ReadingEvent};
use ranking_engine::services::engagement::RecentEngagement;
use ranking_engine::services::profile::{AffinityProfile, ProfileError};
use ranking_engine::{MemoryProfileStorage, PersonalizationEngine, ProfileStorage};

fn item(title: &str, categories: &[&str], views: u64, upvotes: u64, comments: u64) -> ContentItem {
    ContentItem {
        id: Uuid::new_v4(),
        title: title.to_string(),
        body: format!("{} long form body text", title),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        author_id: Uuid::new_v4(),
        published_at: Utc::now() - Duration::hours(2),
        views,
        upvotes,
        comments,
    }
}

fn engine() -> PersonalizationEngine<MemoryProfileStorage> {
    PersonalizationEngine::with_defaults(Arc::new(MemoryProfileStorage::new()))
}

#[tokio::test]
async fn test_repeated_category_reads_shape_ranking() {
    let engine = engine();
    let viewer = Uuid::new_v4();
    let now = Utc::now();

    // Three completed tech reads, 200s each, spread over two days
    for days_ago in [2, 1, 0] {
        let event = ReadingEvent {
            item_id: Uuid::new_v4(),
            categories: vec!["tech".to_string()],
            timestamp: now - Duration::days(days_ago),
            time_spent_secs: 200.0,
            completed: true,
        };
        engine.profiles().record_event(viewer, event).await.unwrap();
    }

    let profile = engine.profiles().get_profile(viewer).await.unwrap();
    let tech_score = profile.category_scores.get("tech").copied().unwrap_or(0.0);
    assert!(tech_score > 0.0);
    assert!(profile.category_scores.get("lifestyle").is_none());

    // A fresh tech item outranks an equally-engaged lifestyle item
    let tech_item = item("new tech deep dive", &["tech"], 100, 10, 5);
    let mut lifestyle_item = item("lifestyle column", &["lifestyle"], 100, 10, 5);
    lifestyle_item.published_at = tech_item.published_at;

    let ranked = engine
        .rank_for_viewer(viewer, &[lifestyle_item.clone(), tech_item.clone()])
        .await;

    assert_eq!(ranked[0].item.id, tech_item.id);
    assert!(ranked[0].score > ranked[1].score);
}

#[tokio::test]
async fn test_reading_flow_updates_profile_and_recommender() {
    let engine = engine();
    let viewer = Uuid::new_v4();

    let read_item = item("rust async patterns", &["tech"], 100, 10, 5);
    let candidates = vec![
        read_item.clone(),
        item("quiet essay", &["tech"], 100, 10, 5),
        item("other essay", &["tech"], 100, 10, 5),
    ];

    engine
        .record_reading_event(viewer, &read_item, 240.0, true)
        .await
        .unwrap();

    let profile = engine.profiles().get_profile(viewer).await.unwrap();
    assert_eq!(profile.history.len(), 1);
    assert_eq!(profile.last_read_items, vec![read_item.id]);
    assert!(profile.category_scores.contains_key("tech"));

    // The read item is demoted to the tail, never dropped
    let recs = engine.recommendations(viewer, &candidates, 3).await;
    assert_eq!(recs.len(), 3);
    assert_eq!(recs[2].id, read_item.id);

    // Relevance ranking demotes it too, below an otherwise-similar item
    let ranked = engine.rank_for_viewer(viewer, &candidates).await;
    assert_eq!(ranked.len(), 3);
    assert_ne!(ranked[0].item.id, read_item.id);
}

#[tokio::test]
async fn test_new_event_invalidates_recommendations() {
    let engine = engine();
    let viewer = Uuid::new_v4();

    let candidates: Vec<ContentItem> = (0..5)
        .map(|i| item(&format!("piece {}", i), &["tech"], 100 + i, 10, 5))
        .collect();

    // Prime the cache with a short result
    let first = engine.recommendations(viewer, &candidates, 2).await;
    assert_eq!(first.len(), 2);

    // Cached prefix is served until an event for this viewer arrives
    let cached = engine.recommendations(viewer, &candidates, 5).await;
    assert_eq!(cached.len(), 2);

    engine
        .record_reading_event(viewer, &candidates[0], 90.0, false)
        .await
        .unwrap();

    let recomputed = engine.recommendations(viewer, &candidates, 5).await;
    assert_eq!(recomputed.len(), 5);
    assert_eq!(recomputed[4].id, candidates[0].id);
}

#[tokio::test]
async fn test_history_bounded_through_engine() {
    let engine = engine();
    let viewer = Uuid::new_v4();

    for i in 0..101 {
        let event = ReadingEvent {
            item_id: Uuid::from_u128(i as u128 + 1),
            categories: vec!["tech".to_string()],
            timestamp: Utc::now(),
            time_spent_secs: 30.0,
            completed: false,
        };
        engine.profiles().record_event(viewer, event).await.unwrap();
    }

    let profile = engine.profiles().get_profile(viewer).await.unwrap();
    assert_eq!(profile.history.len(), 100);
    // The first event fell off; the latest is at the front
    assert!(profile.history.iter().all(|e| e.item_id != Uuid::from_u128(1)));
    assert_eq!(profile.history[0].item_id, Uuid::from_u128(101));
}

#[tokio::test]
async fn test_trending_velocity_gate_flip() {
    let engine = engine();

    let mut corpus: Vec<ContentItem> = (0..9)
        .map(|i| {
            let mut it = item(&format!("steady {}", i), &["tech"], 100, 10, 10);
            it.published_at = Utc::now() - Duration::hours(72);
            it
        })
        .collect();

    let mut candidate = item("breakout story", &["tech"], 5000, 500, 200);
    candidate.published_at = Utc::now() - Duration::hours(1);
    corpus.push(candidate.clone());

    // Dominant score, baseline velocity: not trending
    assert!(!engine.is_trending(&candidate, &corpus));

    // Same item with recent engagement equal to lifetime: the velocity
    // gate opens and the verdict flips
    let surging = RecentEngagement {
        views: candidate.views as f64,
        upvotes: candidate.upvotes as f64,
        comments: candidate.comments as f64,
    };
    assert!(engine
        .engagement()
        .is_trending_with(&candidate, &corpus, surging, Utc::now()));

    // And the same corpus ranks the breakout story first overall
    let ranked = engine.engagement_ranking(&corpus);
    assert_eq!(ranked[0].item.id, candidate.id);
}

/// Storage that always fails, for exercising degraded ranking.
struct FailingStorage;

#[async_trait]
impl ProfileStorage for FailingStorage {
    async fn load(&self, _viewer_id: Uuid) -> Result<Option<AffinityProfile>, ProfileError> {
        Err(ProfileError::Storage("backend unavailable".to_string()))
    }

    async fn save(
        &self,
        _viewer_id: Uuid,
        _profile: &AffinityProfile,
    ) -> Result<(), ProfileError> {
        Err(ProfileError::Storage("backend unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_ranking_degrades_when_storage_is_down() {
    let engine = PersonalizationEngine::with_defaults(Arc::new(FailingStorage));
    let viewer = Uuid::new_v4();

    let hot = item("popular", &["tech"], 10_000, 1_000, 400);
    let cold = item("obscure", &["tech"], 10, 1, 0);

    // Read path: ranking still answers, unpersonalized
    let ranked = engine.rank_for_viewer(viewer, &[cold.clone(), hot.clone()]).await;
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].item.id, hot.id);

    // Write path: the failure surfaces to the producer
    let result = engine.record_reading_event(viewer, &hot, 60.0, true).await;
    assert!(matches!(result, Err(ProfileError::Storage(_))));
}
