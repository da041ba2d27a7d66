//! Hybrid Event Recommendation Engine
//!
//! Scores (user, event) pairs for a geographically distributed event
//! marketplace by fusing learned identity embeddings (collaborative
//! signal) with engineered content features (demographic, geospatial,
//! categorical), trained from implicit interaction signals of varying
//! strength (view < like < bookmark < review < purchase).

pub mod datagen;
pub mod error;
pub mod features;
pub mod geo;
pub mod matrix;
pub mod model;
pub mod recommend;
pub mod sampling;
pub mod trainer;
pub mod types;

// Re-export key types
pub use error::{RecommenderError, Result};
pub use features::{FeatureSchema, IdentityIndex, MinMaxScaler, TitleVectorizer};
pub use geo::{haversine_km, CityCatalog};
pub use matrix::InteractionMatrix;
pub use model::{HybridModel, ModelDims};
pub use recommend::Recommender;
pub use sampling::{generate_samples, split_samples, TrainingSample};
pub use trainer::EpochStats;
pub use types::{Event, InteractionKind, InteractionRecord, RankedEvent, User, EVENT_CATEGORIES};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Identity embedding dimensionality (default: 64)
    pub embedding_dim: usize,
    /// Hidden layer width of the combiner MLP (default: 128)
    pub hidden_dim: usize,
    /// Training epochs (default: 15)
    pub epochs: usize,
    /// Minibatch size (default: 64)
    pub batch_size: usize,
    /// Adam learning rate (default: 1e-3)
    pub learning_rate: f32,
    /// Held-out validation fraction (default: 0.2)
    pub val_fraction: f32,
    /// Seed for every stochastic step (default: 42)
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 64,
            hidden_dim: 128,
            epochs: 15,
            batch_size: 64,
            learning_rate: 1e-3,
            val_fraction: 0.2,
            seed: 42,
        }
    }
}

#[cfg(test)]
mod tests;

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.embedding_dim, 64);
        assert_eq!(config.hidden_dim, 128);
        assert_eq!(config.seed, 42);
        assert!((config.val_fraction - 0.2).abs() < f32::EPSILON);
    }
}
