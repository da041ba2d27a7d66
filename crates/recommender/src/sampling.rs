//! Training-set construction from the interaction matrix.

use crate::matrix::InteractionMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Negatives drawn per positive sample.
const NEGATIVE_RATIO: usize = 2;

/// One labeled (user, event) training pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSample {
    pub user: usize,
    pub event: usize,
    /// Raw interaction strength for positives (1..=5), 0 for negatives.
    pub label: f32,
}

/// Convert the interaction matrix into a labeled sample set.
///
/// Positives are every nonzero cell with the cell value as label.
/// Negatives are rejection-sampled: draw a uniform (user, event) pair and
/// accept it iff the cell is exactly zero, until the target count
/// `min(NEGATIVE_RATIO × positives, capacity − positives)` is reached.
/// The cap bounds the target by the zero-cell supply, and a zero target
/// short-circuits before the loop, so sampling always terminates.
pub fn generate_samples(matrix: &InteractionMatrix, rng: &mut StdRng) -> Vec<TrainingSample> {
    let mut samples: Vec<TrainingSample> = matrix
        .positives()
        .into_iter()
        .map(|(user, event, label)| TrainingSample { user, event, label })
        .collect();

    let positives = samples.len();
    let target = (NEGATIVE_RATIO * positives).min(matrix.capacity() - positives);
    if target == 0 {
        return samples;
    }

    let mut accepted = 0;
    while accepted < target {
        let user = rng.gen_range(0..matrix.num_users());
        let event = rng.gen_range(0..matrix.num_events());
        if matrix.get(user, event) == 0.0 {
            samples.push(TrainingSample {
                user,
                event,
                label: 0.0,
            });
            accepted += 1;
        }
    }
    samples
}

/// Shuffle with a fixed seed and hold out `val_fraction` of the samples.
/// Deterministic: the same input and seed always produce the same split.
pub fn split_samples(
    mut samples: Vec<TrainingSample>,
    val_fraction: f32,
    seed: u64,
) -> (Vec<TrainingSample>, Vec<TrainingSample>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let val_len = (samples.len() as f32 * val_fraction).round() as usize;
    let train = samples.split_off(val_len);
    (train, samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::IdentityIndex;
    use crate::types::{InteractionKind, InteractionRecord};
    use chrono::Utc;

    fn record(user_id: u64, event_id: u64, kind: InteractionKind) -> InteractionRecord {
        InteractionRecord {
            interaction_id: 0,
            user_id,
            event_id,
            kind,
            timestamp: Utc::now(),
        }
    }

    fn matrix_3x3(interactions: &[InteractionRecord]) -> InteractionMatrix {
        let users = IdentityIndex::fit(vec![1, 2, 3]);
        let events = IdentityIndex::fit(vec![1, 2, 3]);
        InteractionMatrix::build(&users, &events, interactions).unwrap()
    }

    #[test]
    fn test_positive_samples_keep_strength_labels() {
        let matrix = matrix_3x3(&[
            record(1, 1, InteractionKind::Purchase),
            record(2, 2, InteractionKind::Like),
        ]);
        let mut rng = StdRng::seed_from_u64(42);
        let samples = generate_samples(&matrix, &mut rng);

        let positives: Vec<_> = samples.iter().filter(|s| s.label > 0.0).collect();
        assert_eq!(positives.len(), 2);
        assert!(positives
            .iter()
            .any(|s| s.user == 0 && s.event == 0 && s.label == 5.0));
        assert!(positives
            .iter()
            .any(|s| s.user == 1 && s.event == 1 && s.label == 2.0));
    }

    #[test]
    fn test_negative_count_bounded_and_all_zero_cells() {
        let matrix = matrix_3x3(&[
            record(1, 1, InteractionKind::Purchase),
            record(2, 2, InteractionKind::Like),
        ]);
        let mut rng = StdRng::seed_from_u64(42);
        let samples = generate_samples(&matrix, &mut rng);

        let negatives: Vec<_> = samples.iter().filter(|s| s.label == 0.0).collect();
        // min(2 * 2, 9 - 2) = 4
        assert_eq!(negatives.len(), 4);
        for neg in negatives {
            assert_eq!(matrix.get(neg.user, neg.event), 0.0);
        }
    }

    #[test]
    fn test_full_matrix_short_circuits() {
        // Every cell occupied: negative target is 0, loop must not spin
        let mut interactions = Vec::new();
        for user_id in 1..=3 {
            for event_id in 1..=3 {
                interactions.push(record(user_id, event_id, InteractionKind::View));
            }
        }
        let matrix = matrix_3x3(&interactions);
        let mut rng = StdRng::seed_from_u64(42);
        let samples = generate_samples(&matrix, &mut rng);

        assert_eq!(samples.len(), 9);
        assert!(samples.iter().all(|s| s.label > 0.0));
    }

    #[test]
    fn test_empty_matrix_yields_no_samples() {
        let matrix = matrix_3x3(&[]);
        let mut rng = StdRng::seed_from_u64(42);
        assert!(generate_samples(&matrix, &mut rng).is_empty());
    }

    #[test]
    fn test_split_is_deterministic_under_fixed_seed() {
        let samples: Vec<TrainingSample> = (0..100)
            .map(|i| TrainingSample {
                user: i % 10,
                event: i / 10,
                label: (i % 5) as f32,
            })
            .collect();

        let (train_a, val_a) = split_samples(samples.clone(), 0.2, 42);
        let (train_b, val_b) = split_samples(samples.clone(), 0.2, 42);
        assert_eq!(train_a, train_b);
        assert_eq!(val_a, val_b);

        assert_eq!(val_a.len(), 20);
        assert_eq!(train_a.len(), 80);

        // A different seed produces a different partition
        let (train_c, _) = split_samples(samples, 0.2, 43);
        assert_ne!(train_a, train_c);
    }
}
