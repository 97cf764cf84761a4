// ============================================
// Content-Similarity Recommender
// ============================================
//
// Alternative ranking path blending category/author affinity, a
// term-frequency similarity signal against the viewer's recent reads,
// and raw engagement, with per-viewer result caching.
//
// Caches:
// - vector cache: item_id -> TF vector, process lifetime, no eviction
//   (item text is immutable from this engine's point of view)
// - result cache: viewer_id -> ordered items, 15-minute TTL, invalidated
//   by any interaction from that viewer
//
// Cold computations collapse per viewer (singleflight): concurrent
// callers wait on one in-flight computation and read its cached result.

pub mod vectorizer;

pub use vectorizer::{cosine_similarity, vectorize};

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::config::RecommenderConfig;
use crate::models::ContentItem;

/// Items the viewer already read sort last, but stay in the result.
const READ_ITEM_SCORE: f64 = -1.0;

/// Unweighted per-viewer interaction counters. Simpler than the affinity
/// profile's decayed scores on purpose.
#[derive(Debug, Clone, Default)]
struct ViewerInteractions {
    author_counts: HashMap<Uuid, u32>,
    category_counts: HashMap<String, u32>,
    read_items: HashSet<Uuid>,
    /// Most recent first; only the newest few feed the similarity term.
    recent_reads: VecDeque<Uuid>,
}

#[derive(Debug, Clone)]
struct CachedRecommendations {
    items: Vec<ContentItem>,
    computed_at: Instant,
}

pub struct SimilarityRecommender {
    config: RecommenderConfig,
    ttl: Duration,
    vectors: DashMap<Uuid, Arc<Vec<f64>>>,
    interactions: DashMap<Uuid, ViewerInteractions>,
    results: DashMap<Uuid, CachedRecommendations>,
    flights: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl Default for SimilarityRecommender {
    fn default() -> Self {
        Self::new(RecommenderConfig::default())
    }
}

impl SimilarityRecommender {
    pub fn new(config: RecommenderConfig) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        Self {
            config,
            ttl,
            vectors: DashMap::new(),
            interactions: DashMap::new(),
            results: DashMap::new(),
            flights: DashMap::new(),
        }
    }

    /// Record that a viewer consumed an item: bump author/category
    /// counters, mark it read, remember it among the recent reads, and
    /// invalidate the viewer's cached recommendations.
    pub fn record_interaction(&self, viewer_id: Uuid, item: &ContentItem) {
        // Warm the vector cache while the item text is at hand; the
        // similarity term needs this vector after the item has left the
        // candidate set.
        self.vector_for(item);

        let mut state = self.interactions.entry(viewer_id).or_default();
        *state.author_counts.entry(item.author_id).or_insert(0) += 1;
        for category in &item.categories {
            *state.category_counts.entry(category.clone()).or_insert(0) += 1;
        }
        state.read_items.insert(item.id);
        state.recent_reads.retain(|id| id != &item.id);
        state.recent_reads.push_front(item.id);
        state.recent_reads.truncate(self.config.recent_reads);
        drop(state);

        self.invalidate(viewer_id);

        debug!(
            viewer_id = %viewer_id,
            item_id = %item.id,
            "Interaction recorded"
        );
    }

    /// Drop the viewer's cached recommendations.
    pub fn invalidate(&self, viewer_id: Uuid) {
        if self.results.remove(&viewer_id).is_some() {
            debug!(viewer_id = %viewer_id, "Recommendation cache invalidated");
        }
    }

    /// Rank the candidate list for a viewer and return the top `limit`.
    ///
    /// The candidate list is authoritative: items are only reordered and
    /// truncated, never fetched. Results are cached per viewer until the
    /// TTL expires or a new interaction arrives.
    pub async fn get_recommendations(
        &self,
        viewer_id: Uuid,
        candidates: &[ContentItem],
        limit: usize,
    ) -> Vec<ContentItem> {
        if let Some(hit) = self.cached(viewer_id, limit) {
            debug!(viewer_id = %viewer_id, returned = hit.len(), "Recommendation cache hit");
            return hit;
        }

        let flight = self
            .flights
            .entry(viewer_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let _in_flight = flight.lock().await;

        // A concurrent caller may have populated the cache while this
        // task waited on the flight lock.
        if let Some(hit) = self.cached(viewer_id, limit) {
            debug!(viewer_id = %viewer_id, returned = hit.len(), "Recommendation cache hit");
            return hit;
        }

        let items = self.compute(viewer_id, candidates, limit);
        self.results.insert(
            viewer_id,
            CachedRecommendations {
                items: items.clone(),
                computed_at: Instant::now(),
            },
        );

        items
    }

    fn cached(&self, viewer_id: Uuid, limit: usize) -> Option<Vec<ContentItem>> {
        let entry = self.results.get(&viewer_id)?;
        if entry.computed_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.items.iter().take(limit).cloned().collect())
    }

    fn compute(&self, viewer_id: Uuid, candidates: &[ContentItem], limit: usize) -> Vec<ContentItem> {
        let state = self
            .interactions
            .get(&viewer_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        let recent_vectors: Vec<Arc<Vec<f64>>> = state
            .recent_reads
            .iter()
            .filter_map(|id| self.vectors.get(id).map(|v| Arc::clone(v.value())))
            .collect();

        let mut scored: Vec<(ContentItem, f64)> = candidates
            .iter()
            .map(|item| {
                let score = if state.read_items.contains(&item.id) {
                    READ_ITEM_SCORE
                } else {
                    self.score_candidate(item, &state, &recent_vectors)
                };
                (item.clone(), score)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.0.published_at.cmp(&a.0.published_at))
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        scored.truncate(limit);

        debug!(
            viewer_id = %viewer_id,
            candidate_count = candidates.len(),
            returned = scored.len(),
            "Recommendations computed"
        );

        scored.into_iter().map(|(item, _)| item).collect()
    }

    fn score_candidate(
        &self,
        item: &ContentItem,
        state: &ViewerInteractions,
        recent_vectors: &[Arc<Vec<f64>>],
    ) -> f64 {
        let category_sum: f64 = item
            .categories
            .iter()
            .map(|c| f64::from(state.category_counts.get(c).copied().unwrap_or(0)))
            .sum();

        let author = f64::from(
            state
                .author_counts
                .get(&item.author_id)
                .copied()
                .unwrap_or(0),
        );

        let similarity = if recent_vectors.is_empty() {
            0.0
        } else {
            let vector = self.vector_for(item);
            let total: f64 = recent_vectors
                .iter()
                .map(|recent| cosine_similarity(&vector, recent))
                .sum();
            total / recent_vectors.len() as f64
        };

        let engagement = (item.upvotes as f64 * 2.0
            + item.views as f64
            + item.comments as f64 * 3.0)
            / 100.0;

        self.config.category_weight * category_sum
            + self.config.author_weight * author
            + self.config.similarity_weight * similarity
            + self.config.raw_engagement_weight * engagement
    }

    fn vector_for(&self, item: &ContentItem) -> Arc<Vec<f64>> {
        if let Some(vector) = self.vectors.get(&item.id) {
            return Arc::clone(vector.value());
        }
        let vector = Arc::new(vectorize(item));
        self.vectors.insert(item.id, vector.clone());
        vector
    }
}
