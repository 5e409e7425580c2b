//! Error types for the gridhunt settlement engine.
//!
//! Every fallible entry point surfaces one of these synchronously; nothing is
//! retried internally. A failed submit or fulfillment leaves all state exactly
//! as it was before the call.

use crate::hunt::custody::TransferError;

/// Root error type for all gridhunt operations
#[derive(Debug, thiserror::Error)]
pub enum HuntError {
    /// Guess coordinate outside the 5x5 grid; rejected before any state change
    #[error("coordinate ({x}, {y}) is outside the grid")]
    CoordinateOutOfRange { x: u8, y: u8 },

    /// Zero-value stake on submit; rejected before any state change
    #[error("stake must be greater than zero")]
    ZeroStake,

    /// Stake below the configured minimum
    #[error("stake {stake} is below the minimum of {min}")]
    StakeBelowMinimum { stake: u64, min: u64 },

    /// A request is already in flight for this participant (see DESIGN.md)
    #[error("participant {0} already has a guess awaiting settlement")]
    GuessPending(String),

    /// Fulfillment received from an identity other than the configured oracle
    #[error("fulfillment caller {0} is not the authorized oracle")]
    Unauthorized(String),

    /// Fulfillment for a request id the client never recorded
    #[error("no pending request with id {0}")]
    UnknownRequest(u64),

    /// Fulfillment carried the wrong number of random words
    #[error("expected {expected} random words, got {got}")]
    WordCountMismatch { expected: usize, got: usize },

    /// Prize transfer could not complete; the enclosing settlement rolls back
    #[error("payout failed: {0}")]
    Transfer(#[from] TransferError),

    /// The randomness request could not be issued; the whole submit aborts
    #[error("randomness request could not be issued: {0}")]
    OracleUnavailable(String),

    /// Pool balance arithmetic overflow on deposit
    #[error("prize pool balance overflow")]
    PoolOverflow,

    /// Configuration loading or validation failure
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results
pub type HuntResult<T> = Result<T, HuntError>;
