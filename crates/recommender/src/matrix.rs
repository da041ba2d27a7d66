//! User × event interaction matrix.

use crate::error::{RecommenderError, Result};
use crate::features::IdentityIndex;
use crate::types::InteractionRecord;
use ndarray::Array2;

/// Dense user × event strength matrix.
///
/// A cell holds the maximum interaction strength ever observed for that
/// pair; 0 strictly means "no observed signal". Memory is O(users × events),
/// an accepted ceiling for the target population sizes.
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    data: Array2<f32>,
}

impl InteractionMatrix {
    /// Fold interaction records into a fresh matrix.
    ///
    /// Repeated interactions on the same pair keep the strongest kind
    /// (max-reduction), so a late view never erases an earlier purchase.
    /// Records referencing ids outside the fitted indices fail the build.
    pub fn build(
        users: &IdentityIndex,
        events: &IdentityIndex,
        interactions: &[InteractionRecord],
    ) -> Result<Self> {
        let mut data = Array2::zeros((users.len(), events.len()));
        for record in interactions {
            let u = users
                .encode(record.user_id)
                .ok_or(RecommenderError::UnknownUser(record.user_id))?;
            let e = events
                .encode(record.event_id)
                .ok_or(RecommenderError::UnknownEvent(record.event_id))?;

            let strength = record.kind.strength();
            if strength > data[[u, e]] {
                data[[u, e]] = strength;
            }
        }
        Ok(Self { data })
    }

    pub fn get(&self, user: usize, event: usize) -> f32 {
        self.data[[user, event]]
    }

    pub fn num_users(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_events(&self) -> usize {
        self.data.ncols()
    }

    /// Total number of cells.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Every nonzero cell as (user index, event index, strength),
    /// row-major order.
    pub fn positives(&self) -> Vec<(usize, usize, f32)> {
        self.data
            .indexed_iter()
            .filter(|(_, &v)| v > 0.0)
            .map(|((u, e), &v)| (u, e, v))
            .collect()
    }
}
