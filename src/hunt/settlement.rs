//! Settlement of fulfilled randomness requests.
//!
//! A settlement is terminal in one step: reveal the cell, compare it to the
//! stored guess, pay the pool on a match, clear the slot. Everything between
//! the access check and the commit is all-or-nothing; in particular a failed
//! payout transfer leaves the guess, the pool, the pending request, and the
//! event stream exactly as they were, so the oracle's retry can settle again.

use crate::config::OracleConfig;
use crate::errors::{HuntError, HuntResult};
use crate::hunt::coord::GridCoord;
use crate::hunt::custody::FundCustody;
use crate::hunt::events::{EventBus, HuntEvent};
use crate::hunt::ledger::GuessLedger;
use crate::hunt::oracle::OracleClient;
use crate::hunt::types::{HuntOutcome, RequestId, Settlement};
use std::sync::Arc;

/// Applies fulfilled randomness to the ledger and the pool
pub struct SettlementEngine {
    ledger: Arc<GuessLedger>,
    custody: Arc<FundCustody>,
    oracle: Arc<OracleClient>,
    events: EventBus,
    authorized_fulfiller: String,
    word_count: usize,
}

impl SettlementEngine {
    pub fn new(
        ledger: Arc<GuessLedger>,
        custody: Arc<FundCustody>,
        oracle: Arc<OracleClient>,
        events: EventBus,
        config: &OracleConfig,
    ) -> Self {
        Self {
            ledger,
            custody,
            oracle,
            events,
            authorized_fulfiller: config.authorized_fulfiller.clone(),
            word_count: config.word_count as usize,
        }
    }

    /// Only the configured oracle identity may deliver fulfillments
    pub fn authorize(&self, caller: &str) -> HuntResult<()> {
        if caller != self.authorized_fulfiller {
            log::warn!("rejected fulfillment from unauthorized caller {}", caller);
            return Err(HuntError::Unauthorized(caller.to_string()));
        }
        Ok(())
    }

    /// Settle one fulfilled request for `participant`.
    ///
    /// The caller has already authorized the fulfiller, resolved the request
    /// id to this participant, and holds the participant's lock.
    pub async fn settle(
        &self,
        participant: &str,
        request_id: RequestId,
        words: &[u64],
    ) -> HuntResult<Settlement> {
        if words.len() != self.word_count {
            log::warn!(
                "fulfillment {} carried {} random words, expected {}",
                request_id,
                words.len(),
                self.word_count
            );
            return Err(HuntError::WordCountMismatch {
                expected: self.word_count,
                got: words.len(),
            });
        }

        let revealed = GridCoord::reveal(words[0], words[1]);

        // An empty slot is a guaranteed miss, not an error.
        let guess = self.ledger.read(participant);
        let won = guess.map_or(false, |g| g == revealed);

        // Events are buffered until the commit point so an aborted settlement
        // publishes nothing.
        let mut pending_events = vec![HuntEvent::TreasureRevealed {
            request_id,
            coord: revealed,
        }];

        let mut payout = 0;
        if won {
            // Entire current pool, atomically; a transfer failure aborts the
            // whole settlement here with nothing committed.
            payout = self.custody.pay_all(participant).await?;
            pending_events.push(HuntEvent::TreasureFound {
                participant: participant.to_string(),
                amount: payout,
            });
        }

        // Commit: clear the slot win or lose, drop the request record,
        // publish in order.
        self.ledger.clear(participant);
        self.oracle.evict(request_id);
        for event in pending_events {
            self.events.publish(event);
        }

        let outcome = if won {
            HuntOutcome::Treasure
        } else {
            HuntOutcome::Miss
        };
        log::info!(
            "request {} settled for {}: revealed {}, {}",
            request_id,
            participant,
            revealed,
            outcome
        );

        Ok(Settlement {
            request_id,
            participant: participant.to_string(),
            revealed,
            outcome,
            payout,
        })
    }
}
