//! Feature schema: identity indexing, scaling, and content feature layout.
//!
//! The schema is fitted exactly once over the full population and then
//! shared, immutable, between training and inference so both assemble
//! feature vectors with the identical column layout:
//!
//! - events: category one-hot (25) | title lexical (50) | scaled price,
//!   capacity, duration, organizer rating (4) | latitude, longitude (2)
//! - users:  interest multi-hot (25) | scaled age, days since join (2) |
//!   latitude, longitude (2)

use crate::error::{RecommenderError, Result};
use crate::geo::CityCatalog;
use crate::types::{Event, User, EVENT_CATEGORIES};
use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Width of the lexical title block.
pub const TITLE_VOCAB_SIZE: usize = 50;

/// Order-preserving bijection between external ids and dense indices
/// in `[0, N)`. Immutable after fitting: an id unseen at fit time is a
/// lookup failure, never a new index.
#[derive(Debug, Clone)]
pub struct IdentityIndex {
    to_index: HashMap<u64, usize>,
    to_id: Vec<u64>,
}

impl IdentityIndex {
    /// Fit over the full known population. Ids are deduplicated and
    /// assigned indices in ascending id order.
    pub fn fit(ids: impl IntoIterator<Item = u64>) -> Self {
        let mut to_id: Vec<u64> = ids.into_iter().collect();
        to_id.sort_unstable();
        to_id.dedup();
        let to_index = to_id.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        Self { to_index, to_id }
    }

    pub fn encode(&self, id: u64) -> Option<usize> {
        self.to_index.get(&id).copied()
    }

    pub fn decode(&self, index: usize) -> Option<u64> {
        self.to_id.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_id.is_empty()
    }
}

/// Column-wise min-max scaler fitted once over the training population.
///
/// Values outside the fitted range scale outside [0, 1]; no reclamping
/// is applied at inference time. Known limitation.
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    min: Array1<f32>,
    range: Array1<f32>,
}

impl MinMaxScaler {
    pub fn fit(data: &Array2<f32>) -> Self {
        let cols = data.ncols();
        let mut min = Array1::zeros(cols);
        let mut range = Array1::ones(cols);
        if data.nrows() > 0 {
            for c in 0..cols {
                let col = data.column(c);
                let lo = col.fold(f32::INFINITY, |a, &b| a.min(b));
                let hi = col.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
                min[c] = lo;
                // Constant columns collapse to 0 instead of dividing by zero
                range[c] = if hi > lo { hi - lo } else { 1.0 };
            }
        }
        Self { min, range }
    }

    pub fn transform(&self, values: &Array1<f32>) -> Array1<f32> {
        (values - &self.min) / &self.range
    }
}

fn tokenize(title: &str) -> impl Iterator<Item = String> + '_ {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(|t| t.to_lowercase())
}

/// Bounded-vocabulary lexical features over event titles.
///
/// The vocabulary is the `TITLE_VOCAB_SIZE` most frequent tokens in the
/// fit population, ties broken alphabetically so fitting is deterministic.
/// Tokens unseen at fit time contribute nothing (zero columns).
#[derive(Debug, Clone)]
pub struct TitleVectorizer {
    vocab: HashMap<String, usize>,
}

impl TitleVectorizer {
    pub fn fit<'a>(titles: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for title in titles {
            for token in tokenize(title) {
                *counts.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(TITLE_VOCAB_SIZE);

        let vocab = ranked
            .into_iter()
            .enumerate()
            .map(|(i, (token, _))| (token, i))
            .collect();
        Self { vocab }
    }

    /// Term-frequency vector over the fitted vocabulary. Always
    /// `TITLE_VOCAB_SIZE` wide regardless of vocabulary fill.
    pub fn transform(&self, title: &str) -> Array1<f32> {
        let mut out = Array1::zeros(TITLE_VOCAB_SIZE);
        for token in tokenize(title) {
            if let Some(&i) = self.vocab.get(&token) {
                out[i] += 1.0;
            }
        }
        out
    }
}

/// Immutable feature schema produced by one fit step and passed by
/// reference to every subsequent transform and query call.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    users: IdentityIndex,
    events: IdentityIndex,
    catalog: CityCatalog,
    titles: TitleVectorizer,
    event_scaler: MinMaxScaler,
    user_scaler: MinMaxScaler,
    /// Reference date for join recency, captured at fit time so
    /// transforms stay deterministic afterwards.
    as_of: NaiveDate,
}

fn event_numeric(event: &Event) -> Array1<f32> {
    Array1::from(vec![
        event.price,
        event.capacity as f32,
        event.duration_hours as f32,
        event.organizer_rating,
    ])
}

fn user_numeric(user: &User, as_of: NaiveDate) -> Array1<f32> {
    let days_since_join = (as_of - user.join_date).num_days() as f32;
    Array1::from(vec![user.age as f32, days_since_join])
}

impl FeatureSchema {
    /// Fit scalers, vectorizer, and identity indices over the full
    /// population. Must be called exactly once per population.
    pub fn fit(users: &[User], events: &[Event], catalog: CityCatalog, as_of: NaiveDate) -> Self {
        let user_index = IdentityIndex::fit(users.iter().map(|u| u.user_id));
        let event_index = IdentityIndex::fit(events.iter().map(|e| e.event_id));
        let titles = TitleVectorizer::fit(events.iter().map(|e| e.title.as_str()));

        let event_rows = Array2::from_shape_fn((events.len(), 4), |(r, c)| {
            let e = &events[r];
            match c {
                0 => e.price,
                1 => e.capacity as f32,
                2 => e.duration_hours as f32,
                _ => e.organizer_rating,
            }
        });
        let user_rows = Array2::from_shape_fn((users.len(), 2), |(r, c)| {
            let u = &users[r];
            match c {
                0 => u.age as f32,
                _ => (as_of - u.join_date).num_days() as f32,
            }
        });

        Self {
            users: user_index,
            events: event_index,
            catalog,
            titles,
            event_scaler: MinMaxScaler::fit(&event_rows),
            user_scaler: MinMaxScaler::fit(&user_rows),
            as_of,
        }
    }

    pub fn users(&self) -> &IdentityIndex {
        &self.users
    }

    pub fn events(&self) -> &IdentityIndex {
        &self.events
    }

    pub fn catalog(&self) -> &CityCatalog {
        &self.catalog
    }

    pub fn user_dim(&self) -> usize {
        EVENT_CATEGORIES.len() + 2 + 2
    }

    pub fn event_dim(&self) -> usize {
        EVENT_CATEGORIES.len() + TITLE_VOCAB_SIZE + 4 + 2
    }

    /// Content feature vector for one user. Fails when the user id was
    /// not part of the fit population.
    pub fn user_features(&self, user: &User) -> Result<Array1<f32>> {
        self.users
            .encode(user.user_id)
            .ok_or(RecommenderError::UnknownUser(user.user_id))?;

        let mut out = Array1::zeros(self.user_dim());
        for (i, category) in EVENT_CATEGORIES.iter().enumerate() {
            if user.interests.iter().any(|int| int == category) {
                out[i] = 1.0;
            }
        }

        let scaled = self.user_scaler.transform(&user_numeric(user, self.as_of));
        let base = EVENT_CATEGORIES.len();
        out[base] = scaled[0];
        out[base + 1] = scaled[1];

        let (lat, lon) = self.catalog.coords(&user.city);
        out[base + 2] = lat as f32;
        out[base + 3] = lon as f32;
        Ok(out)
    }

    /// Content feature vector for one event. Fails when the event id was
    /// not part of the fit population. A category outside the fixed
    /// vocabulary yields an all-zero one-hot block, not an error.
    pub fn event_features(&self, event: &Event) -> Result<Array1<f32>> {
        self.events
            .encode(event.event_id)
            .ok_or(RecommenderError::UnknownEvent(event.event_id))?;

        let mut out = Array1::zeros(self.event_dim());
        if let Some(i) = EVENT_CATEGORIES.iter().position(|c| *c == event.category) {
            out[i] = 1.0;
        }

        let lexical = self.titles.transform(&event.title);
        let base = EVENT_CATEGORIES.len();
        for i in 0..TITLE_VOCAB_SIZE {
            out[base + i] = lexical[i];
        }

        let scaled = self.event_scaler.transform(&event_numeric(event));
        let base = base + TITLE_VOCAB_SIZE;
        for i in 0..4 {
            out[base + i] = scaled[i];
        }

        let (lat, lon) = self.catalog.coords(&event.city);
        out[base + 4] = lat as f32;
        out[base + 5] = lon as f32;
        Ok(out)
    }

    /// Feature matrix with one row per user, rows ordered by internal
    /// index. Input must be sorted by ascending user id.
    pub fn user_feature_matrix(&self, users: &[User]) -> Result<Array2<f32>> {
        let mut out = Array2::zeros((users.len(), self.user_dim()));
        for (row, user) in users.iter().enumerate() {
            out.row_mut(row).assign(&self.user_features(user)?);
        }
        Ok(out)
    }

    /// Feature matrix with one row per event, rows ordered by internal
    /// index. Input must be sorted by ascending event id.
    pub fn event_feature_matrix(&self, events: &[Event]) -> Result<Array2<f32>> {
        let mut out = Array2::zeros((events.len(), self.event_dim()));
        for (row, event) in events.iter().enumerate() {
            out.row_mut(row).assign(&self.event_features(event)?);
        }
        Ok(out)
    }
}
