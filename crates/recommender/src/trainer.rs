//! Minibatch training loop with held-out validation.

use crate::error::{RecommenderError, Result};
use crate::model::{bce_loss, gather_rows, Batch, Gradients, HybridModel, ModelDims};
use crate::sampling::TrainingSample;
use crate::EngineConfig;
use ndarray::{Array1, Array2, Dimension};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const BETA1: f32 = 0.9;
const BETA2: f32 = 0.999;
const ADAM_EPS: f32 = 1e-8;

/// Per-epoch loss report.
#[derive(Debug, Clone, Copy)]
pub struct EpochStats {
    pub epoch: usize,
    pub train_loss: f32,
    pub val_loss: f32,
}

/// Adam optimizer with dense first/second moment estimates per parameter.
struct Adam {
    lr: f32,
    step: i32,
    m: Gradients,
    v: Gradients,
}

impl Adam {
    fn new(dims: &ModelDims, lr: f32) -> Self {
        Self {
            lr,
            step: 0,
            m: Gradients::zeros(dims),
            v: Gradients::zeros(dims),
        }
    }

    fn update(&mut self, model: &mut HybridModel, grads: &Gradients) {
        self.step += 1;
        let bc1 = 1.0 - BETA1.powi(self.step);
        let bc2 = 1.0 - BETA2.powi(self.step);
        let lr = self.lr;

        adam_step(
            &mut model.user_embedding,
            &grads.user_embedding,
            &mut self.m.user_embedding,
            &mut self.v.user_embedding,
            lr,
            bc1,
            bc2,
        );
        adam_step(
            &mut model.event_embedding,
            &grads.event_embedding,
            &mut self.m.event_embedding,
            &mut self.v.event_embedding,
            lr,
            bc1,
            bc2,
        );
        adam_step(
            &mut model.user_proj_w,
            &grads.user_proj_w,
            &mut self.m.user_proj_w,
            &mut self.v.user_proj_w,
            lr,
            bc1,
            bc2,
        );
        adam_step(
            &mut model.user_proj_b,
            &grads.user_proj_b,
            &mut self.m.user_proj_b,
            &mut self.v.user_proj_b,
            lr,
            bc1,
            bc2,
        );
        adam_step(
            &mut model.event_proj_w,
            &grads.event_proj_w,
            &mut self.m.event_proj_w,
            &mut self.v.event_proj_w,
            lr,
            bc1,
            bc2,
        );
        adam_step(
            &mut model.event_proj_b,
            &grads.event_proj_b,
            &mut self.m.event_proj_b,
            &mut self.v.event_proj_b,
            lr,
            bc1,
            bc2,
        );
        adam_step(
            &mut model.hidden_w,
            &grads.hidden_w,
            &mut self.m.hidden_w,
            &mut self.v.hidden_w,
            lr,
            bc1,
            bc2,
        );
        adam_step(
            &mut model.hidden_b,
            &grads.hidden_b,
            &mut self.m.hidden_b,
            &mut self.v.hidden_b,
            lr,
            bc1,
            bc2,
        );
        adam_step(
            &mut model.output_w,
            &grads.output_w,
            &mut self.m.output_w,
            &mut self.v.output_w,
            lr,
            bc1,
            bc2,
        );

        // Scalar output bias
        self.m.output_b = BETA1 * self.m.output_b + (1.0 - BETA1) * grads.output_b;
        self.v.output_b = BETA2 * self.v.output_b + (1.0 - BETA2) * grads.output_b * grads.output_b;
        let m_hat = self.m.output_b / bc1;
        let v_hat = self.v.output_b / bc2;
        model.output_b -= lr * m_hat / (v_hat.sqrt() + ADAM_EPS);
    }
}

fn adam_step<D: Dimension>(
    param: &mut ndarray::Array<f32, D>,
    grad: &ndarray::Array<f32, D>,
    m: &mut ndarray::Array<f32, D>,
    v: &mut ndarray::Array<f32, D>,
    lr: f32,
    bc1: f32,
    bc2: f32,
) {
    ndarray::Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = BETA1 * *m + (1.0 - BETA1) * g;
            *v = BETA2 * *v + (1.0 - BETA2) * g * g;
            let m_hat = *m / bc1;
            let v_hat = *v / bc2;
            *p -= lr * m_hat / (v_hat.sqrt() + ADAM_EPS);
        });
}

fn batch_parts(
    samples: impl Iterator<Item = TrainingSample> + Clone,
) -> (Vec<usize>, Vec<usize>, Array1<f32>) {
    let users: Vec<usize> = samples.clone().map(|s| s.user).collect();
    let events: Vec<usize> = samples.clone().map(|s| s.event).collect();
    let targets = Array1::from_iter(samples.map(|s| s.label));
    (users, events, targets)
}

/// Train the model in place for a fixed epoch count.
///
/// Each epoch iterates the training set in a freshly shuffled order,
/// applying one Adam step per minibatch against binary cross-entropy;
/// validation loss is then evaluated forward-only. No early stopping,
/// no checkpointing, no learning-rate schedule.
pub fn train(
    model: &mut HybridModel,
    user_features: &Array2<f32>,
    event_features: &Array2<f32>,
    train_set: &[TrainingSample],
    val_set: &[TrainingSample],
    config: &EngineConfig,
) -> Result<Vec<EpochStats>> {
    let dims = *model.dims();
    if user_features.ncols() != dims.user_feature_dim {
        return Err(RecommenderError::DimensionMismatch {
            expected: dims.user_feature_dim,
            actual: user_features.ncols(),
        });
    }
    if event_features.ncols() != dims.event_feature_dim {
        return Err(RecommenderError::DimensionMismatch {
            expected: dims.event_feature_dim,
            actual: event_features.ncols(),
        });
    }

    let mut optimizer = Adam::new(&dims, config.learning_rate);
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));
    let mut order: Vec<usize> = (0..train_set.len()).collect();
    let mut stats = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        order.shuffle(&mut rng);

        let mut train_loss = 0.0;
        let mut train_batches = 0;
        for chunk in order.chunks(config.batch_size) {
            let (users, events, targets) = batch_parts(chunk.iter().map(|&i| train_set[i]));
            let batch = Batch {
                users: &users,
                events: &events,
                user_features: gather_rows(user_features, &users),
                event_features: gather_rows(event_features, &events),
            };
            let fwd = model.forward(&batch);
            train_loss += bce_loss(&fwd.output, &targets);
            let grads = model.backward(&batch, &fwd, &targets);
            optimizer.update(model, &grads);
            train_batches += 1;
        }

        // Validation: forward only, parameters untouched
        let mut val_loss = 0.0;
        let mut val_batches = 0;
        for chunk in val_set.chunks(config.batch_size) {
            let (users, events, targets) = batch_parts(chunk.iter().copied());
            let batch = Batch {
                users: &users,
                events: &events,
                user_features: gather_rows(user_features, &users),
                event_features: gather_rows(event_features, &events),
            };
            val_loss += bce_loss(&model.scores(&batch), &targets);
            val_batches += 1;
        }

        let epoch_stats = EpochStats {
            epoch,
            train_loss: train_loss / train_batches.max(1) as f32,
            val_loss: val_loss / val_batches.max(1) as f32,
        };
        tracing::info!(
            "epoch {}: train loss {:.4}, val loss {:.4}",
            epoch_stats.epoch,
            epoch_stats.train_loss,
            epoch_stats.val_loss
        );
        stats.push(epoch_stats);
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_setup() -> (HybridModel, Array2<f32>, Array2<f32>, Vec<TrainingSample>) {
        let dims = ModelDims {
            num_users: 3,
            num_events: 3,
            user_feature_dim: 4,
            event_feature_dim: 4,
            embedding_dim: 8,
            hidden_dim: 16,
        };
        let mut rng = StdRng::seed_from_u64(42);
        let model = HybridModel::new(dims, &mut rng);

        let user_features = Array2::from_shape_fn((3, 4), |(r, c)| (r + c) as f32 * 0.25);
        let event_features = Array2::from_shape_fn((3, 4), |(r, c)| (r * 2 + c) as f32 * 0.2);

        let samples = vec![
            TrainingSample {
                user: 0,
                event: 0,
                label: 5.0,
            },
            TrainingSample {
                user: 1,
                event: 1,
                label: 2.0,
            },
            TrainingSample {
                user: 0,
                event: 1,
                label: 0.0,
            },
            TrainingSample {
                user: 2,
                event: 0,
                label: 0.0,
            },
            TrainingSample {
                user: 1,
                event: 2,
                label: 0.0,
            },
            TrainingSample {
                user: 2,
                event: 2,
                label: 0.0,
            },
        ];
        (model, user_features, event_features, samples)
    }

    fn config(epochs: usize) -> EngineConfig {
        EngineConfig {
            epochs,
            batch_size: 2,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_training_reduces_loss() {
        let (mut model, user_features, event_features, samples) = toy_setup();
        let stats = train(
            &mut model,
            &user_features,
            &event_features,
            &samples,
            &samples,
            &config(40),
        )
        .unwrap();

        assert_eq!(stats.len(), 40);
        let first = stats.first().unwrap().train_loss;
        let last = stats.last().unwrap().train_loss;
        assert!(last < first, "loss did not decrease: {first} -> {last}");
    }

    #[test]
    fn test_zero_epochs_leaves_parameters_untouched() {
        let (mut model, user_features, event_features, samples) = toy_setup();

        // Zero epochs of training: the loop never runs, parameters stay put
        let before = model.user_embedding.clone();
        let stats = train(
            &mut model,
            &user_features,
            &event_features,
            &samples,
            &samples,
            &config(0),
        )
        .unwrap();
        assert!(stats.is_empty());
        assert_eq!(model.user_embedding, before);
    }

    #[test]
    fn test_training_is_reproducible() {
        let (mut model_a, user_features, event_features, samples) = toy_setup();
        let (mut model_b, ..) = toy_setup();

        let stats_a = train(
            &mut model_a,
            &user_features,
            &event_features,
            &samples,
            &samples,
            &config(5),
        )
        .unwrap();
        let stats_b = train(
            &mut model_b,
            &user_features,
            &event_features,
            &samples,
            &samples,
            &config(5),
        )
        .unwrap();

        for (a, b) in stats_a.iter().zip(stats_b.iter()) {
            assert_eq!(a.train_loss, b.train_loss);
            assert_eq!(a.val_loss, b.val_loss);
        }
        assert_eq!(model_a.user_embedding, model_b.user_embedding);
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let (mut model, _, event_features, samples) = toy_setup();
        let wrong = Array2::zeros((3, 7));
        let result = train(
            &mut model,
            &wrong,
            &event_features,
            &samples,
            &samples,
            &config(1),
        );
        assert!(matches!(
            result,
            Err(RecommenderError::DimensionMismatch { expected: 4, actual: 7 })
        ));
    }

    #[test]
    fn test_empty_training_set() {
        let (mut model, user_features, event_features, _) = toy_setup();
        let stats = train(
            &mut model,
            &user_features,
            &event_features,
            &[],
            &[],
            &config(2),
        )
        .unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].train_loss, 0.0);
    }
}
