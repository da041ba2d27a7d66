//! Synthetic marketplace data for demos and tests.
//!
//! Generation is biased so nearby events matching a user's interests draw
//! stronger interactions, giving the trained model a learnable signal.

use crate::geo::{haversine_km, CityCatalog};
use crate::types::{Event, InteractionKind, InteractionRecord, User, EVENT_CATEGORIES};
use chrono::{Duration, Utc};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;

const TITLE_TEMPLATES: [(&str, &[&str]); 6] = [
    (
        "technology",
        &[
            "Tech Summit {} Bangalore",
            "AI Conference {} Hyderabad",
            "Startup Pitch {} Mumbai",
            "Digital India {} Delhi",
        ],
    ),
    (
        "bollywood",
        &[
            "Film Festival {} Mumbai",
            "Celebrity Night {} Delhi",
            "Award Function {} Goa",
            "Movie Premiere {} Mumbai",
        ],
    ),
    (
        "cricket",
        &[
            "IPL Match {} Mumbai",
            "Cricket Tournament {} Delhi",
            "Sports Festival {} Bangalore",
            "Cricket Clinic {} Kolkata",
        ],
    ),
    (
        "food",
        &[
            "Food Festival {} Delhi",
            "Street Food Tour {} Mumbai",
            "Mango Festival {} Lucknow",
            "Spice Expo {} Hyderabad",
        ],
    ),
    (
        "cultural",
        &[
            "Diwali Mela {} Delhi",
            "Holi Festival {} Mathura",
            "Durga Puja {} Kolkata",
            "Ganesh Chaturthi {} Mumbai",
        ],
    ),
    (
        "spiritual",
        &[
            "Yoga Retreat {} Rishikesh",
            "Meditation Camp {} Dharamshala",
            "Ayurveda Workshop {} Kerala",
            "Temple Festival {} Varanasi",
        ],
    ),
];

const NAMES: [&str; 12] = [
    "Aarav", "Aanya", "Vihaan", "Ananya", "Aditya", "Diya", "Krishna", "Ishaan", "Myra",
    "Shaurya", "Anika", "Arjun",
];

fn event_title(category: &str, year: i32, city: &str, rng: &mut StdRng) -> String {
    if let Some((_, templates)) = TITLE_TEMPLATES.iter().find(|(c, _)| *c == category) {
        let template = templates.choose(rng).unwrap();
        template.replace("{}", &year.to_string())
    } else {
        let mut capitalized = category.to_string();
        if let Some(first) = capitalized.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        format!("{capitalized} Event {year} {city}")
    }
}

/// Generate a synthetic marketplace: events, users, and interactions.
pub fn generate(
    n_events: usize,
    n_users: usize,
    n_interactions: usize,
    seed: u64,
) -> (Vec<Event>, Vec<User>, Vec<InteractionRecord>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let catalog = CityCatalog::indian_cities();
    let cities = catalog.names();
    let now = Utc::now();
    let year = 2024;

    let events: Vec<Event> = (1..=n_events as u64)
        .map(|event_id| {
            let category = EVENT_CATEGORIES.choose(&mut rng).unwrap().to_string();
            let city = cities.choose(&mut rng).unwrap().clone();
            Event {
                event_id,
                title: event_title(&category, year, &city, &mut rng),
                description: format!("Join this amazing {category} event in {city}"),
                category,
                city,
                price: (rng.gen_range(0.0..2000.0f32) * 100.0).round() / 100.0,
                capacity: rng.gen_range(50..=5000),
                duration_hours: rng.gen_range(1..=12),
                organizer_rating: (rng.gen_range(2.5..=5.0f32) * 10.0).round() / 10.0,
            }
        })
        .collect();

    let users: Vec<User> = (1..=n_users as u64)
        .map(|user_id| {
            let city = cities.choose(&mut rng).unwrap().clone();
            let interest_count = rng.gen_range(2..=4);
            let interests = EVENT_CATEGORIES
                .choose_multiple(&mut rng, interest_count)
                .map(|c| c.to_string())
                .collect();
            User {
                user_id,
                name: format!(
                    "{} {}",
                    NAMES.choose(&mut rng).unwrap(),
                    NAMES.choose(&mut rng).unwrap()
                ),
                age: rng.gen_range(18..=70),
                city,
                interests,
                join_date: (now - Duration::days(rng.gen_range(30..=730))).date_naive(),
            }
        })
        .collect();

    // Engaged users (nearby event matching their interests) skew towards
    // strong kinds; everyone else mostly views
    let kinds = [
        InteractionKind::View,
        InteractionKind::Like,
        InteractionKind::Bookmark,
        InteractionKind::Purchase,
        InteractionKind::Review,
    ];
    let engaged = WeightedIndex::new([0.1, 0.2, 0.3, 0.3, 0.1]).unwrap();
    let casual = WeightedIndex::new([0.5, 0.3, 0.15, 0.04, 0.01]).unwrap();

    let interactions: Vec<InteractionRecord> = (1..=n_interactions as u64)
        .map(|interaction_id| {
            let user = users.choose(&mut rng).unwrap();
            let event = events.choose(&mut rng).unwrap();

            let distance = haversine_km(catalog.coords(&user.city), catalog.coords(&event.city));
            let interested = user.interests.iter().any(|i| *i == event.category);
            let weights = if distance < 100.0 && interested {
                &engaged
            } else {
                &casual
            };

            InteractionRecord {
                interaction_id,
                user_id: user.user_id,
                event_id: event.event_id,
                kind: kinds[weights.sample(&mut rng)],
                timestamp: now - Duration::days(rng.gen_range(1..=180)),
            }
        })
        .collect();

    (events, users, interactions)
}
