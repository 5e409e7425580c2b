//! Gridhunt - single-round commit/reveal treasure hunt with oracle-driven
//! settlement.
//!
//! Participants stake on a cell of a 5x5 grid. An external randomness oracle
//! later delivers two random words; the engine reduces them to a revealed
//! cell, compares it against the committed guess, and pays the entire pooled
//! stake to a winner. The randomness source and the payout destination are
//! injected capabilities, so the whole pipeline runs against deterministic
//! doubles in tests and against a real oracle in production.
//!
//! The flow, end to end:
//!
//! 1. [`TreasureHunt::submit_guess`] validates the guess and stake, stores
//!    the commitment, issues the oracle request, and pools the stake.
//! 2. The oracle fulfills asynchronously through
//!    [`TreasureHunt::fulfill_randomness`], gated on the configured fulfiller
//!    identity.
//! 3. Settlement reveals the cell, pays the pool on a match, and clears the
//!    commitment - atomically, win or lose.

pub mod config;
pub mod errors;
pub mod hunt;

pub use config::{ConfigLoader, GameConfig, HuntConfig, OracleConfig};
pub use errors::{HuntError, HuntResult};
pub use hunt::{
    FundTransfer, GridCoord, HuntEvent, HuntOutcome, MemoryVault, RandomnessFulfillment,
    RandomnessRequest, RandomnessSource, RequestId, Settlement, SubmitReceipt, TreasureHunt,
    VrfRandomnessSource, GRID_SIZE,
};
