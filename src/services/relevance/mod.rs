/// Relevance Scorer
///
/// Pure viewer-relative ranking of candidate items. No I/O, no interior
/// state: safe to evaluate concurrently across many items.
use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::ScoringWeights;
use crate::models::{ContentItem, RankedItem};
use crate::services::profile::{AffinityProfile, LAST_READ_CAP};
use crate::utils::{exponential_age_decay, safe_fraction};

/// Only the strongest category affinities count, so heavily-tagged items
/// cannot stack unbounded affinity.
const TOP_AFFINITY_CATEGORIES: usize = 2;

/// Raw engagement saturates here before weighting.
const ENGAGEMENT_CAP: f64 = 10.0;

/// Age decay horizon in days; a 30-day-old item keeps ~37% of its score.
const AGE_DECAY_HORIZON_DAYS: f64 = 30.0;

/// Events considered by the coarse completion boost.
const COMPLETION_WINDOW_EVENTS: usize = 20;

pub struct RelevanceScorer {
    weights: ScoringWeights,
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}

impl RelevanceScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Score one item for one viewer. Higher = more relevant. Degenerate
    /// inputs (no categories, zero counts, empty profile) contribute 0 to
    /// their term; the result is always finite.
    pub fn score(&self, profile: &AffinityProfile, item: &ContentItem, now: DateTime<Utc>) -> f64 {
        let w = &self.weights;

        let mut affinities: Vec<f64> = item
            .categories
            .iter()
            .map(|category| {
                let category_score = profile
                    .category_scores
                    .get(category)
                    .copied()
                    .unwrap_or(0.0);
                let trend = profile.trend(category, now);
                category_score * w.match_weight * (1.0 + trend * w.trend_weight)
            })
            .collect();
        affinities.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

        let mut score: f64 = affinities.iter().take(TOP_AFFINITY_CATEGORIES).sum();

        let distinct_categories: HashSet<&str> =
            item.categories.iter().map(|c| c.as_str()).collect();
        if distinct_categories.len() > 1 {
            score *= w.diversity_bonus;
        }

        let raw_engagement = (item.upvotes as f64) * 2.0
            + (item.views as f64) / 10.0
            + (item.comments as f64) * 3.0;
        score += raw_engagement.min(ENGAGEMENT_CAP) * w.engagement_weight;

        score *= exponential_age_decay(item.age_days(now), AGE_DECAY_HORIZON_DAYS);

        // Recently read items are demoted, not excluded: the most recent
        // read carries the full penalty, the oldest slot almost none.
        if let Some(index) = profile.last_read_items.iter().position(|id| *id == item.id) {
            let penalty = (LAST_READ_CAP as f64 - index as f64) * w.recency_penalty;
            score = (score - penalty).max(0.0);
        }

        if self.completion_boost_applies(profile, item) {
            score *= w.completion_weight;
        }

        if score.is_finite() {
            score
        } else {
            debug!(item_id = %item.id, "Non-finite score degraded to 0");
            0.0
        }
    }

    /// Rank candidates descending by score. Ties break toward the more
    /// recently published item, then by item id for determinism.
    pub fn rank_for_viewer(
        &self,
        profile: &AffinityProfile,
        items: &[ContentItem],
        now: DateTime<Utc>,
    ) -> Vec<RankedItem> {
        let mut ranked: Vec<RankedItem> = items
            .iter()
            .map(|item| RankedItem {
                score: self.score(profile, item, now),
                item: item.clone(),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.item.published_at.cmp(&a.item.published_at))
                .then_with(|| a.item.id.cmp(&b.item.id))
        });

        debug!(
            candidate_count = items.len(),
            top_score = ranked.first().map(|r| r.score),
            "Ranked candidates for viewer"
        );

        ranked
    }

    /// The coarse completion boost: over the viewer's last 20 events,
    /// does any of the item's categories complete more often than the
    /// viewer's overall rate? Distinct from the per-update completion
    /// signal folded into the profile scores.
    fn completion_boost_applies(&self, profile: &AffinityProfile, item: &ContentItem) -> bool {
        let window_len = profile.history.len().min(COMPLETION_WINDOW_EVENTS);
        if window_len == 0 {
            return false;
        }
        let window = &profile.history[..window_len];

        let completed = window.iter().filter(|e| e.completed).count();
        let overall_rate = safe_fraction(completed as f64, window.len() as f64);

        item.categories.iter().any(|category| {
            let mut in_category = 0usize;
            let mut in_category_completed = 0usize;
            for event in window {
                if event.categories.iter().any(|c| c == category) {
                    in_category += 1;
                    if event.completed {
                        in_category_completed += 1;
                    }
                }
            }
            in_category > 0
                && safe_fraction(in_category_completed as f64, in_category as f64) > overall_rate
        })
    }
}
