//! End-to-end pipeline: fit the feature schema, build the interaction
//! matrix, train the hybrid model, and answer geo-filtered ranking queries.

use crate::error::{RecommenderError, Result};
use crate::features::FeatureSchema;
use crate::geo::{haversine_km, CityCatalog};
use crate::matrix::InteractionMatrix;
use crate::model::{gather_rows, Batch, HybridModel, ModelDims};
use crate::sampling::{generate_samples, split_samples};
use crate::trainer::{self, EpochStats};
use crate::types::{Event, InteractionRecord, RankedEvent, User};
use crate::EngineConfig;
use chrono::Utc;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Fitted recommendation engine.
///
/// The schema, feature matrices, and trained model are immutable once
/// `fit` returns; queries only read them.
pub struct Recommender {
    config: EngineConfig,
    schema: FeatureSchema,
    model: HybridModel,
    users: Vec<User>,
    events: Vec<Event>,
    user_features: Array2<f32>,
    event_features: Array2<f32>,
    training_stats: Vec<EpochStats>,
}

impl Recommender {
    /// Fit the whole pipeline over the known population.
    ///
    /// Users and events are re-sorted by ascending id so that row `i` of
    /// each feature matrix corresponds to internal index `i`.
    pub fn fit(
        mut users: Vec<User>,
        mut events: Vec<Event>,
        interactions: &[InteractionRecord],
        config: EngineConfig,
    ) -> Result<Self> {
        users.sort_by_key(|u| u.user_id);
        events.sort_by_key(|e| e.event_id);

        let schema = FeatureSchema::fit(
            &users,
            &events,
            CityCatalog::indian_cities(),
            Utc::now().date_naive(),
        );
        let user_features = schema.user_feature_matrix(&users)?;
        let event_features = schema.event_feature_matrix(&events)?;

        let matrix = InteractionMatrix::build(schema.users(), schema.events(), interactions)?;
        tracing::debug!(
            "interaction matrix {}x{} with {} positives",
            matrix.num_users(),
            matrix.num_events(),
            matrix.positives().len()
        );

        let mut rng = StdRng::seed_from_u64(config.seed);
        let samples = generate_samples(&matrix, &mut rng);
        let (train_set, val_set) = split_samples(samples, config.val_fraction, config.seed);

        let dims = ModelDims {
            num_users: users.len(),
            num_events: events.len(),
            user_feature_dim: schema.user_dim(),
            event_feature_dim: schema.event_dim(),
            embedding_dim: config.embedding_dim,
            hidden_dim: config.hidden_dim,
        };
        let mut model = HybridModel::new(dims, &mut rng);
        let training_stats = trainer::train(
            &mut model,
            &user_features,
            &event_features,
            &train_set,
            &val_set,
            &config,
        )?;

        Ok(Self {
            config,
            schema,
            model,
            users,
            events,
            user_features,
            event_features,
            training_stats,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn training_stats(&self) -> &[EpochStats] {
        &self.training_stats
    }

    /// Rank events within `radius_km` of the user's city.
    ///
    /// Candidates are scored with the same fitted schema and column layout
    /// used during training, sorted descending by score (score ties break
    /// arbitrarily), and truncated to `top_n`. An empty candidate set is a
    /// valid outcome, reported with a notice rather than an error.
    pub fn recommend(&self, user_id: u64, top_n: usize, radius_km: f64) -> Result<Vec<RankedEvent>> {
        let user_idx = self
            .schema
            .users()
            .encode(user_id)
            .ok_or(RecommenderError::UnknownUser(user_id))?;
        let user = &self.users[user_idx];
        let origin = self.schema.catalog().coords(&user.city);

        let candidates: Vec<(usize, f64)> = self
            .events
            .iter()
            .enumerate()
            .filter_map(|(idx, event)| {
                let distance = haversine_km(origin, self.schema.catalog().coords(&event.city));
                (distance <= radius_km).then_some((idx, distance))
            })
            .collect();

        if candidates.is_empty() {
            tracing::info!(
                "no events within {:.0} km of {} for user {}",
                radius_km,
                user.city,
                user_id
            );
            return Ok(Vec::new());
        }

        let user_indices = vec![user_idx; candidates.len()];
        let event_indices: Vec<usize> = candidates.iter().map(|&(idx, _)| idx).collect();
        let batch = Batch {
            users: &user_indices,
            events: &event_indices,
            user_features: gather_rows(&self.user_features, &user_indices),
            event_features: gather_rows(&self.event_features, &event_indices),
        };
        let scores = self.model.scores(&batch);

        let mut ranked: Vec<RankedEvent> = candidates
            .iter()
            .zip(scores.iter())
            .map(|(&(idx, distance_km), &score)| {
                let event = &self.events[idx];
                RankedEvent {
                    event_id: event.event_id,
                    title: event.title.clone(),
                    category: event.category.clone(),
                    city: event.city.clone(),
                    distance_km,
                    price: event.price,
                    score,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        ranked.truncate(top_n);
        Ok(ranked)
    }
}
