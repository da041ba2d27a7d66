//! Dual-tower hybrid scoring model.
//!
//! Identity embeddings capture latent collaborative affinity for users and
//! events with interaction history; content projections inject explicit
//! demographic, geospatial, and categorical structure and carry identities
//! the embeddings alone cannot see. The four D-dimensional blocks are
//! concatenated and pushed through a small MLP ending in a sigmoid, so
//! every score lands in (0, 1).
//!
//! Forward and backward passes are written out by hand over `ndarray`;
//! parameters only mutate through [`crate::trainer`] optimization steps.

use ndarray::{s, Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::Rng;

/// Shape summary of a model instance.
#[derive(Debug, Clone, Copy)]
pub struct ModelDims {
    pub num_users: usize,
    pub num_events: usize,
    pub user_feature_dim: usize,
    pub event_feature_dim: usize,
    pub embedding_dim: usize,
    pub hidden_dim: usize,
}

/// One minibatch of (user, event) pairs with their gathered content
/// feature rows.
pub struct Batch<'a> {
    pub users: &'a [usize],
    pub events: &'a [usize],
    /// [batch, user_feature_dim]
    pub user_features: Array2<f32>,
    /// [batch, event_feature_dim]
    pub event_features: Array2<f32>,
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Copy the rows of `source` selected by `indices` into a new matrix.
pub fn gather_rows(source: &Array2<f32>, indices: &[usize]) -> Array2<f32> {
    let mut out = Array2::zeros((indices.len(), source.ncols()));
    for (row, &i) in indices.iter().enumerate() {
        out.row_mut(row).assign(&source.row(i));
    }
    out
}

/// Activations cached during a forward pass, reused by backpropagation.
pub struct ForwardPass {
    user_pre: Array2<f32>,
    event_pre: Array2<f32>,
    concat: Array2<f32>,
    hidden_pre: Array2<f32>,
    hidden_act: Array2<f32>,
    /// Sigmoid scores, [batch]
    pub output: Array1<f32>,
}

/// Parameter gradients, same shapes as the model parameters.
pub struct Gradients {
    pub user_embedding: Array2<f32>,
    pub event_embedding: Array2<f32>,
    pub user_proj_w: Array2<f32>,
    pub user_proj_b: Array1<f32>,
    pub event_proj_w: Array2<f32>,
    pub event_proj_b: Array1<f32>,
    pub hidden_w: Array2<f32>,
    pub hidden_b: Array1<f32>,
    pub output_w: Array1<f32>,
    pub output_b: f32,
}

impl Gradients {
    pub fn zeros(dims: &ModelDims) -> Self {
        let d = dims.embedding_dim;
        Self {
            user_embedding: Array2::zeros((dims.num_users, d)),
            event_embedding: Array2::zeros((dims.num_events, d)),
            user_proj_w: Array2::zeros((d, dims.user_feature_dim)),
            user_proj_b: Array1::zeros(d),
            event_proj_w: Array2::zeros((d, dims.event_feature_dim)),
            event_proj_b: Array1::zeros(d),
            hidden_w: Array2::zeros((dims.hidden_dim, 4 * d)),
            hidden_b: Array1::zeros(dims.hidden_dim),
            output_w: Array1::zeros(dims.hidden_dim),
            output_b: 0.0,
        }
    }
}

/// Hybrid dual-tower predictor.
pub struct HybridModel {
    dims: ModelDims,
    /// [num_users, embedding_dim]
    pub(crate) user_embedding: Array2<f32>,
    /// [num_events, embedding_dim]
    pub(crate) event_embedding: Array2<f32>,
    /// [embedding_dim, user_feature_dim]
    pub(crate) user_proj_w: Array2<f32>,
    pub(crate) user_proj_b: Array1<f32>,
    /// [embedding_dim, event_feature_dim]
    pub(crate) event_proj_w: Array2<f32>,
    pub(crate) event_proj_b: Array1<f32>,
    /// [hidden_dim, 4 * embedding_dim]
    pub(crate) hidden_w: Array2<f32>,
    pub(crate) hidden_b: Array1<f32>,
    /// [hidden_dim]
    pub(crate) output_w: Array1<f32>,
    pub(crate) output_b: f32,
}

fn relu(x: &Array2<f32>) -> Array2<f32> {
    x.mapv(|v| v.max(0.0))
}

fn relu_mask(pre: &Array2<f32>) -> Array2<f32> {
    pre.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn xavier_uniform(rows: usize, cols: usize, rng: &mut StdRng) -> Array2<f32> {
    let limit = (6.0 / (rows + cols) as f32).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-limit..limit))
}

fn outer(a: &Array1<f32>, b: &Array1<f32>) -> Array2<f32> {
    let col = a.view().insert_axis(Axis(1));
    let row = b.view().insert_axis(Axis(0));
    col.dot(&row)
}

impl HybridModel {
    /// Initialize a model: embeddings uniform in (-0.1, 0.1), linear
    /// layers Xavier-uniform, biases zero.
    pub fn new(dims: ModelDims, rng: &mut StdRng) -> Self {
        let d = dims.embedding_dim;
        let user_embedding =
            Array2::from_shape_fn((dims.num_users, d), |_| rng.gen_range(-0.1..0.1));
        let event_embedding =
            Array2::from_shape_fn((dims.num_events, d), |_| rng.gen_range(-0.1..0.1));

        Self {
            user_proj_w: xavier_uniform(d, dims.user_feature_dim, rng),
            user_proj_b: Array1::zeros(d),
            event_proj_w: xavier_uniform(d, dims.event_feature_dim, rng),
            event_proj_b: Array1::zeros(d),
            hidden_w: xavier_uniform(dims.hidden_dim, 4 * d, rng),
            hidden_b: Array1::zeros(dims.hidden_dim),
            output_w: xavier_uniform(1, dims.hidden_dim, rng).row(0).to_owned(),
            output_b: 0.0,
            user_embedding,
            event_embedding,
            dims,
        }
    }

    pub fn dims(&self) -> &ModelDims {
        &self.dims
    }

    /// Forward pass over a minibatch, caching activations for backprop.
    pub fn forward(&self, batch: &Batch) -> ForwardPass {
        let d = self.dims.embedding_dim;
        let user_emb = gather_rows(&self.user_embedding, batch.users);
        let event_emb = gather_rows(&self.event_embedding, batch.events);

        let user_pre = batch.user_features.dot(&self.user_proj_w.t()) + &self.user_proj_b;
        let user_act = relu(&user_pre);
        let event_pre = batch.event_features.dot(&self.event_proj_w.t()) + &self.event_proj_b;
        let event_act = relu(&event_pre);

        let mut concat = Array2::zeros((batch.len(), 4 * d));
        concat.slice_mut(s![.., 0..d]).assign(&user_emb);
        concat.slice_mut(s![.., d..2 * d]).assign(&event_emb);
        concat.slice_mut(s![.., 2 * d..3 * d]).assign(&user_act);
        concat.slice_mut(s![.., 3 * d..4 * d]).assign(&event_act);

        let hidden_pre = concat.dot(&self.hidden_w.t()) + &self.hidden_b;
        let hidden_act = relu(&hidden_pre);
        let logits = hidden_act.dot(&self.output_w) + self.output_b;
        let output = logits.mapv(sigmoid);

        ForwardPass {
            user_pre,
            event_pre,
            concat,
            hidden_pre,
            hidden_act,
            output,
        }
    }

    /// Inference-only scores for a minibatch.
    pub fn scores(&self, batch: &Batch) -> Array1<f32> {
        self.forward(batch).output
    }

    /// Backpropagate binary cross-entropy against `targets`, returning
    /// gradients averaged over the batch. Parameters are untouched.
    pub fn backward(&self, batch: &Batch, fwd: &ForwardPass, targets: &Array1<f32>) -> Gradients {
        let d = self.dims.embedding_dim;
        let batch_size = batch.len() as f32;
        let mut grads = Gradients::zeros(&self.dims);

        // BCE + sigmoid collapse to (y - t) at the logit
        let grad_logits = (&fwd.output - targets) / batch_size;

        grads.output_w = fwd.hidden_act.t().dot(&grad_logits);
        grads.output_b = grad_logits.sum();

        let grad_hidden_act = outer(&grad_logits, &self.output_w);
        let grad_hidden_pre = &grad_hidden_act * &relu_mask(&fwd.hidden_pre);
        grads.hidden_w = grad_hidden_pre.t().dot(&fwd.concat);
        grads.hidden_b = grad_hidden_pre.sum_axis(Axis(0));

        let grad_concat = grad_hidden_pre.dot(&self.hidden_w);
        let grad_user_emb = grad_concat.slice(s![.., 0..d]);
        let grad_event_emb = grad_concat.slice(s![.., d..2 * d]);
        let grad_user_act = grad_concat.slice(s![.., 2 * d..3 * d]).to_owned();
        let grad_event_act = grad_concat.slice(s![.., 3 * d..4 * d]).to_owned();

        // Scatter-add embedding gradients; repeated indices accumulate
        for (row, &u) in batch.users.iter().enumerate() {
            let mut target_row = grads.user_embedding.row_mut(u);
            target_row += &grad_user_emb.row(row);
        }
        for (row, &e) in batch.events.iter().enumerate() {
            let mut target_row = grads.event_embedding.row_mut(e);
            target_row += &grad_event_emb.row(row);
        }

        let grad_user_pre = &grad_user_act * &relu_mask(&fwd.user_pre);
        grads.user_proj_w = grad_user_pre.t().dot(&batch.user_features);
        grads.user_proj_b = grad_user_pre.sum_axis(Axis(0));

        let grad_event_pre = &grad_event_act * &relu_mask(&fwd.event_pre);
        grads.event_proj_w = grad_event_pre.t().dot(&batch.event_features);
        grads.event_proj_b = grad_event_pre.sum_axis(Axis(0));

        grads
    }
}

/// Mean binary cross-entropy between sigmoid outputs and targets.
///
/// Targets carry the raw interaction strength (0 or 1..=5): the loss is
/// evaluated on targets outside [0, 1] exactly as the trained system
/// always has. Outputs are clamped away from 0 and 1 before the log.
pub fn bce_loss(output: &Array1<f32>, targets: &Array1<f32>) -> f32 {
    const EPS: f32 = 1e-7;
    if output.is_empty() {
        return 0.0;
    }
    let total: f32 = output
        .iter()
        .zip(targets.iter())
        .map(|(&y, &t)| {
            let y = y.clamp(EPS, 1.0 - EPS);
            -(t * y.ln() + (1.0 - t) * (1.0 - y).ln())
        })
        .sum();
    total / output.len() as f32
}
