pub mod config;
pub mod engine;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use engine::PersonalizationEngine;
pub use services::{
    AffinityProfileStore, EngagementCalculator, MemoryProfileStorage, ProfileStorage,
    RelevanceScorer, SimilarityRecommender,
};
