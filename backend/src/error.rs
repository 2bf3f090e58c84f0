use thiserror::Error;

use crate::ors::ServiceError;

/// Everything that can stop a single load. None of these abort a batch.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not parse coordinate '{raw}'")]
    Parse { raw: String },
    #[error("at least 2 valid coordinates are required, found {found}")]
    InsufficientWaypoints { found: usize },
    #[error("manual distance must be non-negative, got {value}")]
    InvalidManualDistance { value: f64 },
    #[error("routing service error: {0}")]
    Routing(#[from] ServiceError),
    #[error("malformed route response: {0}")]
    MalformedRoute(String),
}
