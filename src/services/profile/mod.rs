// ============================================
// Affinity Profile
// ============================================
//
// Per-viewer accumulation of preference signal from reading behavior.
//
// Category score update formula (per event, per category):
// score = min(old * TIME_DECAY + base + time_bonus + trend + completion, MAX_BOOST)
//
// - base: category match, halved for abandoned reads
// - time_bonus: time spent, capped at 3 minutes
// - trend: 7-day frequency of the category in the viewer's reading
// - completion: 7-day completion rate within the category

pub mod storage;
pub mod store;

pub use storage::{MemoryProfileStorage, ProfileStorage, RedisProfileStorage};
pub use store::AffinityProfileStore;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ReadingEvent;
use crate::utils::safe_fraction;

/// Maximum reading events retained per viewer, oldest evicted.
pub const HISTORY_CAP: usize = 100;

/// Maximum recently-read item ids retained per viewer.
pub const LAST_READ_CAP: usize = 30;

/// Window for the category trend and completion-rate signals, in days.
pub const TREND_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile storage error: {0}")]
    Storage(String),

    #[error("Profile serialization failed: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, ProfileError>;

/// Accumulated preference state for one viewer.
///
/// Created lazily with all-empty defaults on the first event; mutated only
/// through the record-reading-event operation; never deleted by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffinityProfile {
    /// Category -> score, each bounded to [0, max_boost].
    pub category_scores: HashMap<String, f64>,
    /// Item ids, most recent first, capped at [`LAST_READ_CAP`].
    pub last_read_items: Vec<Uuid>,
    /// Reading events, most recent first, capped at [`HISTORY_CAP`].
    pub history: Vec<ReadingEvent>,
}

impl AffinityProfile {
    /// Fraction of the viewer's reading events in the trailing 7-day
    /// window that include `category`. 0 with no recent events.
    pub fn trend(&self, category: &str, now: DateTime<Utc>) -> f64 {
        let recent: Vec<&ReadingEvent> = self.recent_events(now).collect();
        let matching = recent
            .iter()
            .filter(|e| e.categories.iter().any(|c| c == category))
            .count();
        safe_fraction(matching as f64, recent.len() as f64)
    }

    /// Fraction of the viewer's trailing 7-day events in `category` that
    /// were completed. 0 with no such events.
    pub fn completion_rate(&self, category: &str, now: DateTime<Utc>) -> f64 {
        let in_category: Vec<&ReadingEvent> = self
            .recent_events(now)
            .filter(|e| e.categories.iter().any(|c| c == category))
            .collect();
        let completed = in_category.iter().filter(|e| e.completed).count();
        safe_fraction(completed as f64, in_category.len() as f64)
    }

    fn recent_events(&self, now: DateTime<Utc>) -> impl Iterator<Item = &ReadingEvent> {
        let window_secs = TREND_WINDOW_DAYS * 86_400;
        self.history
            .iter()
            .filter(move |e| (now - e.timestamp).num_seconds() <= window_secs)
    }
}
