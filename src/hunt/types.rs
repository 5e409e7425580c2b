use crate::hunt::coord::GridCoord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque request identifier assigned by the randomness oracle
pub type RequestId = u64;

/// Outcome of a settled round
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HuntOutcome {
    /// The revealed cell matched the committed guess
    Treasure,
    /// No match, or no guess on record
    Miss,
}

impl fmt::Display for HuntOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HuntOutcome::Treasure => write!(f, "treasure"),
            HuntOutcome::Miss => write!(f, "miss"),
        }
    }
}

/// Receipt returned by a successful guess submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub participant: String,
    pub coord: GridCoord,
    pub stake: u64,
    /// Identifier the oracle will echo back on fulfillment
    pub request_id: RequestId,
}

/// Result of one fulfilled and settled round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settlement {
    pub request_id: RequestId,
    pub participant: String,
    pub revealed: GridCoord,
    pub outcome: HuntOutcome,
    /// Amount paid to the participant; zero on a miss
    pub payout: u64,
}

impl Settlement {
    pub fn is_win(&self) -> bool {
        self.outcome == HuntOutcome::Treasure
    }
}
