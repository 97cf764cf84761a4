pub mod engagement;
pub mod profile;
pub mod relevance;
pub mod similarity;

pub use engagement::EngagementCalculator;
pub use profile::{AffinityProfileStore, MemoryProfileStorage, ProfileStorage};
pub use relevance::RelevanceScorer;
pub use similarity::SimilarityRecommender;
