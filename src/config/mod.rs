use serde::Deserialize;

/// Engine configuration. Every tunable defaults to the value the scoring
/// formulas were calibrated with; overrides come from the environment.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub scoring: ScoringWeights,
    pub engagement: EngagementWeights,
    pub recommender: RecommenderConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        Ok(Config {
            scoring: envy::prefixed("RANKING_").from_env()?,
            engagement: envy::prefixed("ENGAGEMENT_").from_env()?,
            recommender: envy::prefixed("RECOMMENDER_").from_env()?,
        })
    }
}

/// Weights shared by the affinity profile update and the relevance scorer.
///
/// Tuning is allowed, but the relative ordering of the defaults is load
/// bearing for ranking behavior: category match dominates, trend and time
/// spent follow, completion is the lightest signal.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringWeights {
    /// Base contribution of a category match.
    #[serde(default = "default_match_weight")]
    pub match_weight: f64,
    /// Multiplier on the 7-day category trend signal.
    #[serde(default = "default_trend_weight")]
    pub trend_weight: f64,
    /// Multiplier on the time-spent engagement factor.
    #[serde(default = "default_time_weight")]
    pub time_weight: f64,
    /// Multiplier on completion-rate signals.
    #[serde(default = "default_completion_weight")]
    pub completion_weight: f64,
    /// Per-update decay applied to an existing category score (EMA-like,
    /// not a function of elapsed time).
    #[serde(default = "default_time_decay")]
    pub time_decay: f64,
    /// Upper bound on any single category score.
    #[serde(default = "default_max_boost")]
    pub max_boost: f64,
    /// Multiplier for items carrying more than one distinct category.
    #[serde(default = "default_diversity_bonus")]
    pub diversity_bonus: f64,
    /// Multiplier on the capped raw-engagement term.
    #[serde(default = "default_engagement_weight")]
    pub engagement_weight: f64,
    /// Per-slot penalty for recently read items.
    #[serde(default = "default_recency_penalty")]
    pub recency_penalty: f64,
}

fn default_match_weight() -> f64 {
    3.0
}
fn default_trend_weight() -> f64 {
    2.0
}
fn default_time_weight() -> f64 {
    2.0
}
fn default_completion_weight() -> f64 {
    1.5
}
fn default_time_decay() -> f64 {
    0.8
}
fn default_max_boost() -> f64 {
    5.0
}
fn default_diversity_bonus() -> f64 {
    1.2
}
fn default_engagement_weight() -> f64 {
    1.8
}
fn default_recency_penalty() -> f64 {
    0.7
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            match_weight: default_match_weight(),
            trend_weight: default_trend_weight(),
            time_weight: default_time_weight(),
            completion_weight: default_completion_weight(),
            time_decay: default_time_decay(),
            max_boost: default_max_boost(),
            diversity_bonus: default_diversity_bonus(),
            engagement_weight: default_engagement_weight(),
            recency_penalty: default_recency_penalty(),
        }
    }
}

/// Weights for the viewer-independent engagement/trending calculator.
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementWeights {
    #[serde(default = "default_view_weight")]
    pub view_weight: f64,
    #[serde(default = "default_upvote_weight")]
    pub upvote_weight: f64,
    #[serde(default = "default_comment_weight")]
    pub comment_weight: f64,
    /// Multiplier for items published within `recency_boost_hours`.
    #[serde(default = "default_recency_boost")]
    pub recency_boost: f64,
    #[serde(default = "default_recency_boost_hours")]
    pub recency_boost_hours: f64,
    /// How strongly velocity deviations from 1.0 amplify the score.
    #[serde(default = "default_velocity_amplifier")]
    pub velocity_amplifier: f64,
    /// Fraction of lifetime engagement assumed "recent" by the built-in
    /// approximation; also the baseline velocity is measured against.
    #[serde(default = "default_recent_fraction")]
    pub recent_fraction: f64,
    /// Trending requires score > corpus mean * this ratio.
    #[serde(default = "default_trending_score_ratio")]
    pub trending_score_ratio: f64,
    /// Trending requires velocity strictly above this gate.
    #[serde(default = "default_trending_velocity_gate")]
    pub trending_velocity_gate: f64,
}

fn default_view_weight() -> f64 {
    1.0
}
fn default_upvote_weight() -> f64 {
    3.0
}
fn default_comment_weight() -> f64 {
    2.0
}
fn default_recency_boost() -> f64 {
    1.2
}
fn default_recency_boost_hours() -> f64 {
    6.0
}
fn default_velocity_amplifier() -> f64 {
    2.0
}
fn default_recent_fraction() -> f64 {
    0.1
}
fn default_trending_score_ratio() -> f64 {
    1.5
}
fn default_trending_velocity_gate() -> f64 {
    1.2
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            view_weight: default_view_weight(),
            upvote_weight: default_upvote_weight(),
            comment_weight: default_comment_weight(),
            recency_boost: default_recency_boost(),
            recency_boost_hours: default_recency_boost_hours(),
            velocity_amplifier: default_velocity_amplifier(),
            recent_fraction: default_recent_fraction(),
            trending_score_ratio: default_trending_score_ratio(),
            trending_velocity_gate: default_trending_velocity_gate(),
        }
    }
}

/// Configuration for the content-similarity recommender.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommenderConfig {
    /// Recommendation cache TTL in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// How many of the viewer's most recent reads feed the similarity term.
    #[serde(default = "default_recent_reads")]
    pub recent_reads: usize,
    #[serde(default = "default_category_weight")]
    pub category_weight: f64,
    #[serde(default = "default_author_weight")]
    pub author_weight: f64,
    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f64,
    #[serde(default = "default_raw_engagement_weight")]
    pub raw_engagement_weight: f64,
}

fn default_cache_ttl_secs() -> u64 {
    900
}
fn default_recent_reads() -> usize {
    5
}
fn default_category_weight() -> f64 {
    0.3
}
fn default_author_weight() -> f64 {
    0.2
}
fn default_similarity_weight() -> f64 {
    0.3
}
fn default_raw_engagement_weight() -> f64 {
    0.2
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            recent_reads: default_recent_reads(),
            category_weight: default_category_weight(),
            author_weight: default_author_weight(),
            similarity_weight: default_similarity_weight(),
            raw_engagement_weight: default_raw_engagement_weight(),
        }
    }
}
