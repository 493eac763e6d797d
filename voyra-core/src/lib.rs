pub mod audit;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod identity;
pub mod pii;
pub mod provider;
pub mod repository;
pub mod rules;
pub mod search;

use uuid::Uuid;

/// Error taxonomy shared by every engine component.
///
/// The booking coordinator is the only component that decides state
/// transitions; everything below it propagates these variants unchanged.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Network failure or timeout talking to the provider. Retryable by the caller.
    #[error("Upstream provider unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The provider rejected the request for a business reason. Not retryable
    /// without changed input.
    #[error("Upstream provider rejected request: {0}")]
    UpstreamRejected(String),

    #[error("Room search session not found: {0}")]
    SessionNotFound(String),

    #[error("Room search session expired: {0}")]
    SessionExpired(String),

    #[error("Price code not present in session result set: {0}")]
    InvalidPriceCode(String),

    /// The upstream booking outcome is unknown (timeout after dispatch). The
    /// reservation stays PENDING until `reconcile_pending` resolves it. Never
    /// treated as success or failure.
    #[error("Booking outcome unknown, reservation {0} pending reconciliation")]
    Indeterminate(Uuid),

    #[error("Local store failure: {0}")]
    PersistenceFailure(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid reservation state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Sync already in progress")]
    SyncInProgress,
}

pub type EngineResult<T> = Result<T, EngineError>;
