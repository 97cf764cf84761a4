// ============================================
// Engagement / Trending Calculator
// ============================================
//
// Viewer-independent, corpus-relative scoring: "how hot is this item
// right now" and "is it trending". Stateless; the corpus snapshot and
// the clock are passed per call, so identical inputs always produce
// identical scores.
//
// Score shape:
//   total = (norm_views*1.0 + norm_upvotes*3.0 + norm_comments*2.0)
//           * time_decay * recency_boost * velocity_multiplier
//
// Trending requires BOTH a corpus-relative score (> mean * 1.5) and
// acceleration (velocity > 1.2): a high absolute score from an old,
// no-longer-accelerating item is not trending.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::EngagementWeights;
use crate::models::{ContentItem, RankedItem};
use crate::utils::log_normalize;

/// Velocity component clamp: an item can look at most twice as hot, or
/// half as cold, as its baseline.
const VELOCITY_FLOOR: f64 = 0.5;
const VELOCITY_CEILING: f64 = 2.0;

/// Velocity blend shares for views / upvotes / comments.
const VELOCITY_VIEW_SHARE: f64 = 0.5;
const VELOCITY_UPVOTE_SHARE: f64 = 0.3;
const VELOCITY_COMMENT_SHARE: f64 = 0.2;

/// Logarithmic-in-time decay parameters: one halving step of base 1.5
/// per 24x growth in age. Gentler over long horizons than exponential.
const DECAY_BASE: f64 = 1.5;
const DECAY_HORIZON_HOURS: f64 = 24.0;

/// Per-metric corpus maxima used for normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusMaxima {
    pub views: u64,
    pub upvotes: u64,
    pub comments: u64,
}

impl CorpusMaxima {
    pub fn from_corpus(items: &[ContentItem]) -> Self {
        items.iter().fold(Self::default(), |acc, item| Self {
            views: acc.views.max(item.views),
            upvotes: acc.upvotes.max(item.upvotes),
            comments: acc.comments.max(item.comments),
        })
    }
}

/// Observed recent engagement for one item.
///
/// Without time-windowed telemetry the engine approximates "recent" as a
/// fixed fraction of lifetime totals; real counters can be injected
/// through the `*_with` methods without touching the scoring formulas.
#[derive(Debug, Clone, Copy)]
pub struct RecentEngagement {
    pub views: f64,
    pub upvotes: f64,
    pub comments: f64,
}

impl RecentEngagement {
    /// Built-in approximation: `max(1, round(fraction * lifetime))` per
    /// counter, which sits at the velocity baseline by construction.
    pub fn approximate(item: &ContentItem, fraction: f64) -> Self {
        let approx = |total: u64| (total as f64 * fraction).round().max(1.0);
        Self {
            views: approx(item.views),
            upvotes: approx(item.upvotes),
            comments: approx(item.comments),
        }
    }
}

pub struct EngagementCalculator {
    weights: EngagementWeights,
}

impl Default for EngagementCalculator {
    fn default() -> Self {
        Self::new(EngagementWeights::default())
    }
}

impl EngagementCalculator {
    pub fn new(weights: EngagementWeights) -> Self {
        Self { weights }
    }

    /// Logarithmic-in-time decay: 1.0 at publish, ~0.67 after a day,
    /// still ~0.45 after a month.
    pub fn time_decay(&self, item: &ContentItem, now: DateTime<Utc>) -> f64 {
        let hours = item.age_hours(now);
        DECAY_BASE.powf(-((hours + 1.0).ln() / DECAY_HORIZON_HOURS.ln()))
    }

    /// Blended recent-vs-baseline engagement ratio, clamped per metric to
    /// [0.5, 2.0]. ~1.0 under the built-in approximation.
    pub fn velocity(&self, item: &ContentItem) -> f64 {
        self.velocity_with(
            item,
            RecentEngagement::approximate(item, self.weights.recent_fraction),
        )
    }

    pub fn velocity_with(&self, item: &ContentItem, recent: RecentEngagement) -> f64 {
        VELOCITY_VIEW_SHARE * self.velocity_component(recent.views, item.views)
            + VELOCITY_UPVOTE_SHARE * self.velocity_component(recent.upvotes, item.upvotes)
            + VELOCITY_COMMENT_SHARE * self.velocity_component(recent.comments, item.comments)
    }

    fn velocity_component(&self, recent: f64, lifetime: u64) -> f64 {
        let baseline = lifetime as f64 * self.weights.recent_fraction;
        if baseline <= 0.0 {
            // No lifetime engagement to accelerate against
            return 1.0;
        }
        (recent / baseline).clamp(VELOCITY_FLOOR, VELOCITY_CEILING)
    }

    /// Corpus-relative engagement score. Deterministic for identical
    /// inputs; an empty corpus (zero maxima) scores 0, never NaN.
    pub fn engagement_score(
        &self,
        item: &ContentItem,
        maxima: CorpusMaxima,
        now: DateTime<Utc>,
    ) -> f64 {
        self.score_with(
            item,
            maxima,
            RecentEngagement::approximate(item, self.weights.recent_fraction),
            now,
        )
    }

    pub fn score_with(
        &self,
        item: &ContentItem,
        maxima: CorpusMaxima,
        recent: RecentEngagement,
        now: DateTime<Utc>,
    ) -> f64 {
        let w = &self.weights;
        let decay = self.time_decay(item, now);

        let view_score =
            log_normalize(item.views as f64, maxima.views as f64) * w.view_weight * decay;
        let upvote_score =
            log_normalize(item.upvotes as f64, maxima.upvotes as f64) * w.upvote_weight * decay;
        let comment_score =
            log_normalize(item.comments as f64, maxima.comments as f64) * w.comment_weight * decay;

        let recency_boost = if item.age_hours(now) < w.recency_boost_hours {
            w.recency_boost
        } else {
            1.0
        };

        let velocity = self.velocity_with(item, recent);
        let velocity_multiplier = 1.0 + (velocity - 1.0) * w.velocity_amplifier;

        (view_score + upvote_score + comment_score) * recency_boost * velocity_multiplier
    }

    /// Trending gate: corpus-relative score AND acceleration, both
    /// required. False on an empty corpus.
    pub fn is_trending(&self, item: &ContentItem, corpus: &[ContentItem], now: DateTime<Utc>) -> bool {
        self.is_trending_with(
            item,
            corpus,
            RecentEngagement::approximate(item, self.weights.recent_fraction),
            now,
        )
    }

    pub fn is_trending_with(
        &self,
        item: &ContentItem,
        corpus: &[ContentItem],
        recent: RecentEngagement,
        now: DateTime<Utc>,
    ) -> bool {
        if corpus.is_empty() {
            return false;
        }

        let maxima = CorpusMaxima::from_corpus(corpus);
        let mean = self.mean_score(corpus, maxima, now);
        let total = self.score_with(item, maxima, recent, now);
        let velocity = self.velocity_with(item, recent);

        let trending =
            total > mean * self.weights.trending_score_ratio
                && velocity > self.weights.trending_velocity_gate;

        debug!(
            item_id = %item.id,
            total = total,
            corpus_mean = mean,
            velocity = velocity,
            trending = trending,
            "Trending check"
        );

        trending
    }

    /// Viewer-independent ranking of a corpus by engagement score.
    pub fn rank_by_engagement(&self, corpus: &[ContentItem], now: DateTime<Utc>) -> Vec<RankedItem> {
        let maxima = CorpusMaxima::from_corpus(corpus);

        let mut ranked: Vec<RankedItem> = corpus
            .iter()
            .map(|item| RankedItem {
                score: self.engagement_score(item, maxima, now),
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

        ranked
    }

    fn mean_score(&self, corpus: &[ContentItem], maxima: CorpusMaxima, now: DateTime<Utc>) -> f64 {
        if corpus.is_empty() {
            return 0.0;
        }
        let total: f64 = corpus
            .iter()
            .map(|item| self.engagement_score(item, maxima, now))
            .sum();
        total / corpus.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn item(views: u64, upvotes: u64, comments: u64, age_hours: i64, now: DateTime<Utc>) -> ContentItem {
        ContentItem {
            id: Uuid::new_v4(),
            title: "title".to_string(),
            body: "body".to_string(),
            categories: vec!["tech".to_string()],
            author_id: Uuid::new_v4(),
            published_at: now - Duration::hours(age_hours),
            views,
            upvotes,
            comments,
        }
    }

    #[test]
    fn test_time_decay_at_twenty_three_hours() {
        let calc = EngagementCalculator::default();
        let now = Utc::now();

        // hours+1 = 24: exactly one decay step, factor 1/1.5
        let decay = calc.time_decay(&item(0, 0, 0, 23, now), now);
        assert!((decay - 1.0 / 1.5).abs() < 0.001);

        let fresh = calc.time_decay(&item(0, 0, 0, 0, now), now);
        assert!((fresh - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_decay_ordering_by_age() {
        let calc = EngagementCalculator::default();
        let now = Utc::now();
        let corpus = vec![item(100, 10, 10, 1, now), item(100, 10, 10, 48, now)];
        let maxima = CorpusMaxima::from_corpus(&corpus);

        let newer = calc.engagement_score(&corpus[0], maxima, now);
        let older = calc.engagement_score(&corpus[1], maxima, now);
        assert!(older <= newer);
    }

    #[test]
    fn test_zero_corpus_scores_zero() {
        let calc = EngagementCalculator::default();
        let now = Utc::now();
        let dead = item(0, 0, 0, 10, now);

        let score = calc.engagement_score(&dead, CorpusMaxima::default(), now);
        assert_eq!(score, 0.0);
        assert!(score.is_finite());
    }

    #[test]
    fn test_default_velocity_is_neutral() {
        let calc = EngagementCalculator::default();
        // Round counts: the approximation hits the baseline exactly
        let velocity = calc.velocity(&item(1000, 100, 50, 1, Utc::now()));
        assert!((velocity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_clamps() {
        let calc = EngagementCalculator::default();
        let subject = item(1000, 100, 50, 1, Utc::now());

        let surging = RecentEngagement {
            views: 1000.0,
            upvotes: 100.0,
            comments: 50.0,
        };
        assert!((calc.velocity_with(&subject, surging) - 2.0).abs() < 1e-9);

        let stalled = RecentEngagement {
            views: 0.0,
            upvotes: 0.0,
            comments: 0.0,
        };
        assert!((calc.velocity_with(&subject, stalled) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_lifetime_velocity_is_neutral() {
        let calc = EngagementCalculator::default();
        let velocity = calc.velocity(&item(0, 0, 0, 1, Utc::now()));
        assert!((velocity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_trending_requires_both_gates() {
        let calc = EngagementCalculator::default();
        let now = Utc::now();

        let mut corpus: Vec<ContentItem> = (0..9).map(|_| item(100, 10, 10, 72, now)).collect();
        let candidate = item(5000, 500, 200, 1, now);
        corpus.push(candidate.clone());

        // Default approximation: velocity ~1.0, the gate fails despite
        // the dominant score
        assert!(!calc.is_trending(&candidate, &corpus, now));

        // Same score inputs, but recent engagement equals lifetime:
        // velocity clamps to 2.0 and the gate opens
        let surging = RecentEngagement {
            views: 5000.0,
            upvotes: 500.0,
            comments: 200.0,
        };
        assert!(calc.is_trending_with(&candidate, &corpus, surging, now));
    }

    #[test]
    fn test_high_score_alone_is_not_trending() {
        let calc = EngagementCalculator::default();
        let now = Utc::now();

        // Old dominant item: huge absolute score, no acceleration
        let mut corpus: Vec<ContentItem> = (0..9).map(|_| item(100, 10, 10, 24, now)).collect();
        let veteran = item(100_000, 10_000, 5_000, 24 * 30, now);
        corpus.push(veteran.clone());

        assert!(!calc.is_trending(&veteran, &corpus, now));
    }

    #[test]
    fn test_empty_corpus_never_trends() {
        let calc = EngagementCalculator::default();
        let now = Utc::now();
        assert!(!calc.is_trending(&item(1000, 100, 50, 1, now), &[], now));
    }

    #[test]
    fn test_rank_by_engagement_orders_corpus() {
        let calc = EngagementCalculator::default();
        let now = Utc::now();

        let hot = item(5000, 500, 200, 1, now);
        let warm = item(500, 50, 20, 10, now);
        let cold = item(50, 5, 2, 100, now);
        let corpus = vec![cold.clone(), hot.clone(), warm.clone()];

        let ranked = calc.rank_by_engagement(&corpus, now);

        assert_eq!(ranked[0].item.id, hot.id);
        assert_eq!(ranked[1].item.id, warm.id);
        assert_eq!(ranked[2].item.id, cold.id);
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[test]
    fn test_scores_are_deterministic() {
        let calc = EngagementCalculator::default();
        let now = Utc::now();
        let corpus = vec![item(1000, 100, 50, 5, now)];
        let maxima = CorpusMaxima::from_corpus(&corpus);

        let first = calc.engagement_score(&corpus[0], maxima, now);
        let second = calc.engagement_score(&corpus[0], maxima, now);
        assert_eq!(first, second);
    }
}
