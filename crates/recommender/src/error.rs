//! Error types for the recommendation engine.

pub type Result<T> = std::result::Result<T, RecommenderError>;

#[derive(Debug, thiserror::Error)]
pub enum RecommenderError {
    #[error("unknown user id: {0}")]
    UnknownUser(u64),

    #[error("unknown event id: {0}")]
    UnknownEvent(u64),

    #[error("feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
