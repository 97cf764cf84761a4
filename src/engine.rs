//! Engine facade wiring the four components together.
//!
//! External subsystems talk to this type: the reading-event producer
//! calls [`PersonalizationEngine::record_reading_event`], presentation
//! surfaces call [`PersonalizationEngine::rank_for_viewer`] or
//! [`PersonalizationEngine::recommendations`], and trending surfaces call
//! [`PersonalizationEngine::is_trending`]. The engine never fetches
//! content on its own; callers supply candidate snapshots.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{ContentItem, RankedItem};
use crate::services::engagement::EngagementCalculator;
use crate::services::profile::{
    AffinityProfile, AffinityProfileStore, ProfileError, ProfileStorage,
};
use crate::services::relevance::RelevanceScorer;
use crate::services::similarity::SimilarityRecommender;

pub struct PersonalizationEngine<S: ProfileStorage> {
    profiles: AffinityProfileStore<S>,
    scorer: RelevanceScorer,
    recommender: SimilarityRecommender,
    engagement: EngagementCalculator,
}

impl<S: ProfileStorage> PersonalizationEngine<S> {
    pub fn new(config: Config, storage: Arc<S>) -> Self {
        Self {
            profiles: AffinityProfileStore::new(storage, config.scoring.clone()),
            scorer: RelevanceScorer::new(config.scoring),
            recommender: SimilarityRecommender::new(config.recommender),
            engagement: EngagementCalculator::new(config.engagement),
        }
    }

    pub fn with_defaults(storage: Arc<S>) -> Self {
        Self::new(Config::default(), storage)
    }

    /// Record that a viewer consumed an item. Updates the affinity
    /// profile, feeds the recommender's interaction counters, and
    /// invalidates the viewer's cached recommendations.
    ///
    /// A persistence failure propagates: silently dropping the update
    /// would corrupt future ranking. The recommender state is only
    /// touched after the profile persists.
    pub async fn record_reading_event(
        &self,
        viewer_id: Uuid,
        item: &ContentItem,
        time_spent_secs: f64,
        completed: bool,
    ) -> Result<AffinityProfile, ProfileError> {
        let profile = self
            .profiles
            .record_reading_event(
                viewer_id,
                item.id,
                item.categories.clone(),
                time_spent_secs,
                completed,
            )
            .await?;

        self.recommender.record_interaction(viewer_id, item);

        Ok(profile)
    }

    /// Profile-weighted ranking. A storage fault degrades to ranking
    /// with an empty profile rather than failing the call.
    pub async fn rank_for_viewer(
        &self,
        viewer_id: Uuid,
        items: &[ContentItem],
    ) -> Vec<RankedItem> {
        let profile = self.profiles.get_profile_or_default(viewer_id).await;
        self.scorer.rank_for_viewer(&profile, items, Utc::now())
    }

    /// Similarity-blended ranking with per-viewer caching.
    pub async fn recommendations(
        &self,
        viewer_id: Uuid,
        candidates: &[ContentItem],
        limit: usize,
    ) -> Vec<ContentItem> {
        self.recommender
            .get_recommendations(viewer_id, candidates, limit)
            .await
    }

    /// Viewer-independent engagement ranking of a corpus snapshot.
    pub fn engagement_ranking(&self, corpus: &[ContentItem]) -> Vec<RankedItem> {
        self.engagement.rank_by_engagement(corpus, Utc::now())
    }

    pub fn is_trending(&self, item: &ContentItem, corpus: &[ContentItem]) -> bool {
        self.engagement.is_trending(item, corpus, Utc::now())
    }

    pub fn profiles(&self) -> &AffinityProfileStore<S> {
        &self.profiles
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    pub fn recommender(&self) -> &SimilarityRecommender {
        &self.recommender
    }

    pub fn engagement(&self) -> &EngagementCalculator {
        &self.engagement
    }
}
