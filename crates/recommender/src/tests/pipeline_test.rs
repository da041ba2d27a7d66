//! End-to-end pipeline scenarios.

use crate::features::IdentityIndex;
use crate::matrix::InteractionMatrix;
use crate::recommend::Recommender;
use crate::sampling::generate_samples;
use crate::types::{Event, InteractionKind, InteractionRecord, User};
use crate::{EngineConfig, RecommenderError};
use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn user(user_id: u64, city: &str, interests: &[&str]) -> User {
    User {
        user_id,
        name: format!("User {user_id}"),
        age: 25 + user_id as u32,
        city: city.to_string(),
        interests: interests.iter().map(|i| i.to_string()).collect(),
        join_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
    }
}

fn event(event_id: u64, city: &str, category: &str) -> Event {
    Event {
        event_id,
        title: format!("{category} Event 2024 {city}"),
        category: category.to_string(),
        description: format!("Join this amazing {category} event in {city}"),
        city: city.to_string(),
        price: 100.0 * event_id as f32,
        capacity: 500,
        duration_hours: 3,
        organizer_rating: 4.0,
    }
}

fn interaction(user_id: u64, event_id: u64, kind: InteractionKind) -> InteractionRecord {
    InteractionRecord {
        interaction_id: user_id * 100 + event_id,
        user_id,
        event_id,
        kind,
        timestamp: Utc::now(),
    }
}

fn small_config() -> EngineConfig {
    EngineConfig {
        embedding_dim: 8,
        hidden_dim: 16,
        epochs: 3,
        batch_size: 4,
        ..EngineConfig::default()
    }
}

/// 3 users, 3 events: [(u1,e1,purchase), (u1,e1,view), (u2,e2,like)]
fn three_by_three() -> (Vec<User>, Vec<Event>, Vec<InteractionRecord>) {
    let users = vec![
        user(1, "Mumbai", &["cricket"]),
        user(2, "Delhi", &["food"]),
        user(3, "Mumbai", &["technology"]),
    ];
    let events = vec![
        event(1, "Mumbai", "cricket"),
        event(2, "Delhi", "food"),
        event(3, "Thane", "technology"),
    ];
    let interactions = vec![
        interaction(1, 1, InteractionKind::Purchase),
        interaction(1, 1, InteractionKind::View),
        interaction(2, 2, InteractionKind::Like),
    ];
    (users, events, interactions)
}

#[test]
fn test_end_to_end_matrix_and_sample_counts() {
    let (users, events, interactions) = three_by_three();
    let user_index = IdentityIndex::fit(users.iter().map(|u| u.user_id));
    let event_index = IdentityIndex::fit(events.iter().map(|e| e.event_id));

    let matrix = InteractionMatrix::build(&user_index, &event_index, &interactions).unwrap();
    assert_eq!(matrix.get(0, 0), 5.0); // purchase dominates the later view
    assert_eq!(matrix.get(1, 1), 2.0);
    for (u, e) in [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)] {
        assert_eq!(matrix.get(u, e), 0.0);
    }

    let mut rng = StdRng::seed_from_u64(42);
    let samples = generate_samples(&matrix, &mut rng);
    let positives = samples.iter().filter(|s| s.label > 0.0).count();
    assert_eq!(positives, 2);
}

#[test]
fn test_user_without_history_still_gets_recommendations() {
    let (users, events, interactions) = three_by_three();
    let recommender = Recommender::fit(users, events, &interactions, small_config()).unwrap();

    // u3 has no interaction history; content-tower scoring still ranks
    // the events within radius of Mumbai (Thane is ~20 km away)
    let results = recommender.recommend(3, 10, 50.0).unwrap();
    assert!(!results.is_empty());
    for row in &results {
        assert!(row.distance_km <= 50.0);
        assert!(row.score > 0.0 && row.score < 1.0);
    }
    // Delhi is far beyond 50 km of Mumbai and must never appear
    assert!(results.iter().all(|r| r.city != "Delhi"));
}

#[test]
fn test_zero_radius_returns_empty_not_error() {
    let (mut users, events, interactions) = three_by_three();
    // User 2 sits in Delhi; move them to a city with no events at all
    users[1].city = "Chennai".to_string();
    let recommender = Recommender::fit(users, events, &interactions, small_config()).unwrap();

    let results = recommender.recommend(2, 10, 0.0).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_zero_radius_same_city_keeps_exact_matches() {
    let (users, events, interactions) = three_by_three();
    let recommender = Recommender::fit(users, events, &interactions, small_config()).unwrap();

    // Distance to an event in the user's own city is exactly 0
    let results = recommender.recommend(1, 10, 0.0).unwrap();
    assert!(results.iter().all(|r| r.city == "Mumbai"));
    assert!(!results.is_empty());
}

#[test]
fn test_unknown_user_is_lookup_failure() {
    let (users, events, interactions) = three_by_three();
    let recommender = Recommender::fit(users, events, &interactions, small_config()).unwrap();

    let result = recommender.recommend(999, 10, 100.0);
    assert!(matches!(result, Err(RecommenderError::UnknownUser(999))));
}

#[test]
fn test_ranking_is_sorted_and_truncated() {
    let (events, users, interactions) = crate::datagen::generate(40, 20, 300, 42);
    let recommender = Recommender::fit(users, events, &interactions, small_config()).unwrap();

    let results = recommender.recommend(1, 5, 2000.0).unwrap();
    assert!(results.len() <= 5);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_training_reports_one_stat_per_epoch() {
    let (users, events, interactions) = three_by_three();
    let config = small_config();
    let epochs = config.epochs;
    let recommender = Recommender::fit(users, events, &interactions, config).unwrap();

    let stats = recommender.training_stats();
    assert_eq!(stats.len(), epochs);
    for stat in stats {
        assert!(stat.train_loss.is_finite());
        assert!(stat.val_loss.is_finite());
    }
}
