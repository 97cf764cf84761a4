use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::storage::ProfileStorage;
use super::{AffinityProfile, Result, HISTORY_CAP, LAST_READ_CAP};
use crate::config::ScoringWeights;
use crate::models::ReadingEvent;

/// Engagement factor saturates at 3 minutes of reading.
const TIME_SPENT_CAP_SECS: f64 = 180.0;

/// Durable per-viewer accumulation of preference signal.
///
/// Updates for the same viewer are serialized through a sharded lock map;
/// different viewers proceed fully in parallel. The storage adapter is
/// the source of truth: an update mutates a working copy and publishes it
/// only on a successful save, so a persistence failure leaves the
/// pre-update profile visible to later reads.
pub struct AffinityProfileStore<S: ProfileStorage> {
    storage: Arc<S>,
    weights: ScoringWeights,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl<S: ProfileStorage> AffinityProfileStore<S> {
    pub fn new(storage: Arc<S>, weights: ScoringWeights) -> Self {
        Self {
            storage,
            weights,
            locks: DashMap::new(),
        }
    }

    /// Existing profile, or a freshly initialized empty one. Storage
    /// faults surface as a recoverable error.
    pub async fn get_profile(&self, viewer_id: Uuid) -> Result<AffinityProfile> {
        Ok(self.storage.load(viewer_id).await?.unwrap_or_default())
    }

    /// Profile for ranking paths: a storage fault degrades to the empty
    /// profile, since ranking with no personalization is a valid mode.
    pub async fn get_profile_or_default(&self, viewer_id: Uuid) -> AffinityProfile {
        match self.storage.load(viewer_id).await {
            Ok(profile) => profile.unwrap_or_default(),
            Err(e) => {
                warn!(
                    viewer_id = %viewer_id,
                    error = %e,
                    "Profile load failed, ranking with empty profile"
                );
                AffinityProfile::default()
            }
        }
    }

    /// Record a reading event stamped with the current time.
    pub async fn record_reading_event(
        &self,
        viewer_id: Uuid,
        item_id: Uuid,
        categories: Vec<String>,
        time_spent_secs: f64,
        completed: bool,
    ) -> Result<AffinityProfile> {
        let event = ReadingEvent {
            item_id,
            categories,
            timestamp: Utc::now(),
            time_spent_secs,
            completed,
        };
        self.record_event(viewer_id, event).await
    }

    /// Record a pre-stamped reading event (backfill, replay).
    pub async fn record_event(
        &self,
        viewer_id: Uuid,
        event: ReadingEvent,
    ) -> Result<AffinityProfile> {
        let lock = self.viewer_lock(viewer_id);
        let _guard = lock.lock().await;

        let current = self.storage.load(viewer_id).await?.unwrap_or_default();
        let updated = Self::apply_event(current, &event, &self.weights);
        self.storage.save(viewer_id, &updated).await?;

        debug!(
            viewer_id = %viewer_id,
            item_id = %event.item_id,
            category_count = event.categories.len(),
            completed = event.completed,
            history_len = updated.history.len(),
            "Reading event recorded"
        );

        Ok(updated)
    }

    fn viewer_lock(&self, viewer_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(viewer_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Fold one event into a profile. Trend and completion signals are
    /// computed over the history as it stands before the event is
    /// appended, so an event never feeds its own trend.
    fn apply_event(
        mut profile: AffinityProfile,
        event: &ReadingEvent,
        weights: &ScoringWeights,
    ) -> AffinityProfile {
        let engagement = (event.time_spent_secs.max(0.0) / TIME_SPENT_CAP_SECS).min(1.0);
        let base = if event.completed {
            weights.match_weight
        } else {
            weights.match_weight * 0.5
        };

        for category in &event.categories {
            let trend = profile.trend(category, event.timestamp);
            let completion = profile.completion_rate(category, event.timestamp);

            let delta = base
                + engagement * weights.time_weight
                + trend * weights.trend_weight
                + completion * weights.completion_weight;

            let old = profile
                .category_scores
                .get(category)
                .copied()
                .unwrap_or(0.0);
            let next = (old * weights.time_decay + delta)
                .min(weights.max_boost)
                .max(0.0);
            profile.category_scores.insert(category.clone(), next);
        }

        profile.history.insert(0, event.clone());
        profile.history.truncate(HISTORY_CAP);

        profile.last_read_items.retain(|id| id != &event.item_id);
        profile.last_read_items.insert(0, event.item_id);
        profile.last_read_items.truncate(LAST_READ_CAP);

        profile
    }
}
