use thiserror::Error;

use crate::{
    db_types::{TradeId, TradeStatus},
    state_machine::InvalidTransition,
};

/// Errors produced by storage backends.
#[derive(Debug, Clone, Error)]
pub enum TradeGatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Trade {0} does not exist")]
    TradeNotFound(TradeId),
    #[error("Listing {0} does not exist")]
    ListingNotFound(i64),
    #[error("Trade {id} was modified concurrently. Expected status {expected}, found {actual}")]
    TransitionConflict { id: TradeId, expected: TradeStatus, actual: TradeStatus },
}

impl From<sqlx::Error> for TradeGatewayError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Errors surfaced by [`crate::TradeFlowApi`]. This is the taxonomy HTTP handlers translate into status codes:
/// NotFound → 404, Forbidden → 403, InvalidTerms → 400, Conflict → 409, StorageError → 500.
#[derive(Debug, Clone, Error)]
pub enum TradeFlowError {
    #[error("Not found. {0}")]
    NotFound(String),
    #[error("Forbidden. {0}")]
    Forbidden(String),
    #[error("Invalid trade terms. {0}")]
    InvalidTerms(String),
    #[error("The trade changed since you last looked. Refetch and try again. {0}")]
    Conflict(String),
    #[error("An error occurred in the storage backend. {0}")]
    StorageError(String),
}

impl From<TradeGatewayError> for TradeFlowError {
    fn from(e: TradeGatewayError) -> Self {
        match e {
            TradeGatewayError::TradeNotFound(id) => Self::NotFound(format!("Trade {id} does not exist")),
            TradeGatewayError::ListingNotFound(_) => Self::NotFound(e.to_string()),
            TradeGatewayError::TransitionConflict { .. } => Self::Conflict(e.to_string()),
            other => Self::StorageError(other.to_string()),
        }
    }
}

impl From<InvalidTransition> for TradeFlowError {
    fn from(e: InvalidTransition) -> Self {
        Self::Forbidden(e.to_string())
    }
}
