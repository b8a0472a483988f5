//! Error types for DealScout

use thiserror::Error;

/// Main error type for DealScout
#[derive(Error, Debug)]
pub enum DealScoutError {
    // Input errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid offer: {amount} is outside [0, {asking_price}]")]
    InvalidOffer { amount: i64, asking_price: u64 },

    // Negotiation errors
    #[error("Invalid transition: cannot {operation} from state {state}")]
    InvalidTransition {
        state: String,
        operation: &'static str,
    },

    #[error("Stale round: expected {expected}, caller observed {observed}")]
    StaleRound { expected: u32, observed: u32 },

    #[error("Negotiation not found: {0}")]
    NegotiationNotFound(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DealScoutError {
    /// True for malformed or out-of-range input, including offers outside the asking range
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DealScoutError::Validation(_) | DealScoutError::InvalidOffer { .. }
        )
    }

    /// Every engine error leaves the negotiation intact; the caller re-fetches and retries.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DealScoutError::Internal(_))
    }
}

/// Result type alias for DealScout operations
pub type Result<T> = std::result::Result<T, DealScoutError>;
