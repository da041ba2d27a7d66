//! Core record types exchanged with the data layer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Fixed category vocabulary shared by events and user interests.
pub const EVENT_CATEGORIES: [&str; 25] = [
    "technology",
    "bollywood",
    "art",
    "cricket",
    "food",
    "business",
    "education",
    "yoga",
    "travel",
    "entertainment",
    "fashion",
    "photography",
    "science",
    "literature",
    "dance",
    "theater",
    "gaming",
    "automotive",
    "real_estate",
    "finance",
    "spiritual",
    "cultural",
    "wedding",
    "startups",
    "health",
];

/// An event listed on the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: u64,
    pub title: String,
    pub category: String,
    pub description: String,
    pub city: String,
    pub price: f32,
    pub capacity: u32,
    pub duration_hours: u32,
    pub organizer_rating: f32,
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: u64,
    pub name: String,
    pub age: u32,
    pub city: String,
    /// Declared interests drawn from [`EVENT_CATEGORIES`].
    pub interests: Vec<String>,
    pub join_date: NaiveDate,
}

/// Implicit feedback kind, ordered by engagement strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    View,
    Like,
    Bookmark,
    Review,
    Purchase,
}

impl InteractionKind {
    /// Signal strength on the fixed total order view < like < bookmark
    /// < review < purchase.
    pub fn strength(self) -> f32 {
        match self {
            InteractionKind::View => 1.0,
            InteractionKind::Like => 2.0,
            InteractionKind::Bookmark => 3.0,
            InteractionKind::Review => 4.0,
            InteractionKind::Purchase => 5.0,
        }
    }
}

/// One observed user-event interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub interaction_id: u64,
    pub user_id: u64,
    pub event_id: u64,
    pub kind: InteractionKind,
    pub timestamp: DateTime<Utc>,
}

/// One row of a ranked recommendation result.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEvent {
    pub event_id: u64,
    pub title: String,
    pub category: String,
    pub city: String,
    pub distance_km: f64,
    pub price: f32,
    pub score: f32,
}
