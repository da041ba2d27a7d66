//! Recommender demo - end-to-end training and query run
//!
//! Generates a synthetic marketplace, trains the hybrid model, and prints
//! ranked recommendations for a sample user.

use anyhow::Result;
use event_recommender::{datagen, EngineConfig, Recommender};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = EngineConfig::default();

    info!("generating synthetic marketplace data");
    let (events, users, interactions) = datagen::generate(500, 1000, 8000, config.seed);
    let sample_user = users[0].user_id;

    info!(
        "training hybrid model over {} users, {} events, {} interactions",
        users.len(),
        events.len(),
        interactions.len()
    );
    let recommender = Recommender::fit(users, events, &interactions, config)?;

    info!("top recommendations for user {sample_user}");
    let recommendations = recommender.recommend(sample_user, 10, 200.0)?;
    println!("{}", serde_json::to_string_pretty(&recommendations)?);

    Ok(())
}
