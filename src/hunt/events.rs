//! Observable events emitted by the hunt pipeline.
//!
//! Events fan out on a lossy broadcast channel: subscribers that lag past the
//! channel capacity miss events, and publishing with no subscribers is fine.
//! Every event is also written to the log.

use crate::hunt::coord::GridCoord;
use crate::hunt::types::RequestId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Externally observable state changes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HuntEvent {
    /// A guess was committed together with its stake
    GuessSubmitted {
        participant: String,
        coord: GridCoord,
        stake: u64,
        request_id: RequestId,
    },
    /// The oracle's randomness was reduced to a grid cell; fires on every
    /// committed settlement, win or lose
    TreasureRevealed {
        request_id: RequestId,
        coord: GridCoord,
    },
    /// A winning settlement paid out the pool
    TreasureFound { participant: String, amount: u64 },
}

/// Broadcast fan-out for [`HuntEvent`]s
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HuntEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HuntEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: HuntEvent) {
        match &event {
            HuntEvent::GuessSubmitted {
                participant,
                coord,
                stake,
                request_id,
            } => log::info!(
                "guess submitted: {} at {} staking {} (request {})",
                participant,
                coord,
                stake,
                request_id
            ),
            HuntEvent::TreasureRevealed { request_id, coord } => {
                log::info!("treasure revealed at {} (request {})", coord, request_id)
            }
            HuntEvent::TreasureFound {
                participant,
                amount,
            } => log::info!("treasure found by {}, paying {}", participant, amount),
        }

        // Send only fails when no subscriber is listening; that is fine.
        let _ = self.tx.send(event);
    }
}
