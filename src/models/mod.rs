use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable snapshot of a content item, supplied by the content
/// collaborator. The engine never mutates counts; it only reads copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    /// Category tags; order is irrelevant. Empty = uncategorized.
    pub categories: Vec<String>,
    pub author_id: Uuid,
    pub published_at: DateTime<Utc>,
    pub views: u64,
    pub upvotes: u64,
    pub comments: u64,
}

impl ContentItem {
    /// Item age relative to `now`, in fractional days. Future publish
    /// timestamps clamp to zero age.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.published_at).num_seconds().max(0) as f64 / 86_400.0
    }

    /// Item age relative to `now`, in fractional hours, clamped at zero.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        (now - self.published_at).num_seconds().max(0) as f64 / 3_600.0
    }
}

/// A single consumption of an item by a viewer. Append-only: events are
/// never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingEvent {
    pub item_id: Uuid,
    /// The item's category set at read time.
    pub categories: Vec<String>,
    pub timestamp: DateTime<Utc>,
    /// Seconds spent reading; negative input is treated as 0.
    pub time_spent_secs: f64,
    pub completed: bool,
}

/// An item paired with the score that ranked it.
#[derive(Debug, Clone)]
pub struct RankedItem {
    pub item: ContentItem,
    pub score: f64,
}
