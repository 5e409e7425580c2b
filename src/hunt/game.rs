//! The `TreasureHunt` facade: submit, fulfill, fund.
//!
//! Wires the ledger, oracle client, custody, and settlement engine together
//! and owns the per-participant locks that serialize a submit against a
//! settlement for the same participant. Entry points for distinct
//! participants run independently.

use crate::config::HuntConfig;
use crate::errors::{HuntError, HuntResult};
use crate::hunt::coord::GridCoord;
use crate::hunt::custody::{FundCustody, FundTransfer};
use crate::hunt::events::{EventBus, HuntEvent};
use crate::hunt::ledger::GuessLedger;
use crate::hunt::oracle::{OracleClient, RandomnessSource};
use crate::hunt::settlement::SettlementEngine;
use crate::hunt::types::{RequestId, Settlement, SubmitReceipt};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// One round of the hunt, end to end
pub struct TreasureHunt {
    config: HuntConfig,
    ledger: Arc<GuessLedger>,
    custody: Arc<FundCustody>,
    oracle: Arc<OracleClient>,
    engine: SettlementEngine,
    events: EventBus,
    locks: DashMap<String, Arc<Mutex<()>>>,
    seed_nonce: AtomicU64,
}

impl TreasureHunt {
    /// Build a hunt from validated config and the injected capabilities
    pub fn new(
        config: HuntConfig,
        source: Arc<dyn RandomnessSource>,
        transfer: Arc<dyn FundTransfer>,
    ) -> HuntResult<Self> {
        config.validate()?;

        let ledger = Arc::new(GuessLedger::new());
        let custody = Arc::new(FundCustody::new(transfer));
        let oracle = Arc::new(OracleClient::new(source, config.oracle.clone()));
        let events = EventBus::new(config.game.event_capacity);
        let engine = SettlementEngine::new(
            ledger.clone(),
            custody.clone(),
            oracle.clone(),
            events.clone(),
            &config.oracle,
        );

        Ok(Self {
            config,
            ledger,
            custody,
            oracle,
            engine,
            events,
            locks: DashMap::new(),
            seed_nonce: AtomicU64::new(0),
        })
    }

    fn participant_lock(&self, participant: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(participant.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Entropy bound into each oracle request: caller context, a local
    /// counter, and fresh OS randomness
    fn derive_seed(&self, participant: &str, coord: GridCoord) -> [u8; 32] {
        let nonce = self.seed_nonce.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha256::new();
        hasher.update(b"gridhunt.seed");
        hasher.update(participant.as_bytes());
        hasher.update([coord.pack()]);
        hasher.update(nonce.to_le_bytes());
        hasher.update(rand::random::<u64>().to_le_bytes());
        hasher.finalize().into()
    }

    /// Commit a guess with its stake and request the reveal.
    ///
    /// Validation happens before any state change. If the oracle request
    /// cannot be issued the stored guess is rolled back, leaving all state as
    /// it was before the call.
    pub async fn submit_guess(
        &self,
        participant: &str,
        x: u8,
        y: u8,
        stake: u64,
    ) -> HuntResult<SubmitReceipt> {
        let coord = GridCoord::new(x, y);
        if !coord.in_grid() {
            return Err(HuntError::CoordinateOutOfRange { x, y });
        }
        if stake == 0 {
            return Err(HuntError::ZeroStake);
        }
        if stake < self.config.game.min_stake {
            return Err(HuntError::StakeBelowMinimum {
                stake,
                min: self.config.game.min_stake,
            });
        }

        let lock = self.participant_lock(participant);
        let _guard = lock.lock().await;

        // A live slot implies a request in flight (see DESIGN.md): no silent
        // overwrite of a guess the oracle is still going to settle.
        if self.ledger.read(participant).is_some() {
            return Err(HuntError::GuessPending(participant.to_string()));
        }

        self.ledger.store(participant, coord);

        let seed = self.derive_seed(participant, coord);
        let request_id = match self.oracle.request(participant, seed).await {
            Ok(id) => id,
            Err(e) => {
                // A guess with no request in flight must not survive.
                self.ledger.clear(participant);
                return Err(e);
            }
        };

        if let Err(e) = self.custody.deposit(stake).await {
            self.ledger.clear(participant);
            self.oracle.evict(request_id);
            return Err(e);
        }

        self.events.publish(HuntEvent::GuessSubmitted {
            participant: participant.to_string(),
            coord,
            stake,
            request_id,
        });

        Ok(SubmitReceipt {
            participant: participant.to_string(),
            coord,
            stake,
            request_id,
        })
    }

    /// Oracle fulfillment entry point: settles the round for whoever issued
    /// `request_id`. Only the configured fulfiller identity is accepted.
    pub async fn fulfill_randomness(
        &self,
        caller: &str,
        request_id: RequestId,
        words: &[u64],
    ) -> HuntResult<Settlement> {
        self.engine.authorize(caller)?;

        let participant = self.oracle.participant_for(request_id).ok_or_else(|| {
            log::warn!("fulfillment for unknown request {}", request_id);
            HuntError::UnknownRequest(request_id)
        })?;

        let lock = self.participant_lock(&participant);
        let _guard = lock.lock().await;

        self.engine.settle(&participant, request_id, words).await
    }

    /// Unconditional pool funding: value in, no guess, no event
    pub async fn fund(&self, amount: u64) -> HuntResult<u64> {
        self.custody.deposit(amount).await
    }

    /// Current prize pool balance
    pub async fn pool_balance(&self) -> u64 {
        self.custody.balance().await
    }

    /// Requests issued but not yet settled
    pub fn pending_requests(&self) -> usize {
        self.oracle.pending_count()
    }

    /// The participant's live guess, if any
    pub fn outstanding_guess(&self, participant: &str) -> Option<GridCoord> {
        self.ledger.read(participant)
    }

    /// Subscribe to the observable event stream
    pub fn subscribe(&self) -> broadcast::Receiver<HuntEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OracleConfig;
    use crate::hunt::custody::MemoryVault;
    use crate::hunt::oracle::RandomnessRequest;
    use async_trait::async_trait;

    /// Source that hands out sequential ids and never fulfills on its own
    struct ScriptedSource {
        next: AtomicU64,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl RandomnessSource for ScriptedSource {
        async fn request_randomness(&self, _request: &RandomnessRequest) -> HuntResult<RequestId> {
            Ok(self.next.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    /// Source standing in for an exhausted subscription
    struct UnavailableSource;

    #[async_trait]
    impl RandomnessSource for UnavailableSource {
        async fn request_randomness(&self, _request: &RandomnessRequest) -> HuntResult<RequestId> {
            Err(HuntError::OracleUnavailable(
                "subscription exhausted".to_string(),
            ))
        }
    }

    fn test_config() -> HuntConfig {
        HuntConfig {
            oracle: OracleConfig {
                authorized_fulfiller: "oracle-operator".to_string(),
                ..OracleConfig::default()
            },
            ..HuntConfig::default()
        }
    }

    fn scripted_hunt() -> TreasureHunt {
        TreasureHunt::new(
            test_config(),
            Arc::new(ScriptedSource::new()),
            Arc::new(MemoryVault::new()),
        )
        .expect("valid config")
    }

    #[tokio::test]
    async fn test_submit_validation_precedes_state_changes() {
        let hunt = scripted_hunt();

        assert!(matches!(
            hunt.submit_guess("alice", 5, 0, 100).await,
            Err(HuntError::CoordinateOutOfRange { x: 5, y: 0 })
        ));
        assert!(matches!(
            hunt.submit_guess("alice", 0, 7, 100).await,
            Err(HuntError::CoordinateOutOfRange { .. })
        ));
        assert!(matches!(
            hunt.submit_guess("alice", 1, 1, 0).await,
            Err(HuntError::ZeroStake)
        ));

        assert_eq!(hunt.pool_balance().await, 0);
        assert_eq!(hunt.pending_requests(), 0);
        assert_eq!(hunt.outstanding_guess("alice"), None);
    }

    #[tokio::test]
    async fn test_submit_below_min_stake_rejected() {
        let mut config = test_config();
        config.game.min_stake = 50;
        let hunt = TreasureHunt::new(
            config,
            Arc::new(ScriptedSource::new()),
            Arc::new(MemoryVault::new()),
        )
        .expect("valid config");

        assert!(matches!(
            hunt.submit_guess("alice", 1, 1, 49).await,
            Err(HuntError::StakeBelowMinimum { stake: 49, min: 50 })
        ));
        assert_eq!(hunt.pool_balance().await, 0);
    }

    #[tokio::test]
    async fn test_submit_stores_requests_and_deposits() {
        let hunt = scripted_hunt();

        let receipt = hunt
            .submit_guess("alice", 2, 3, 100)
            .await
            .expect("submit accepted");
        assert_eq!(receipt.request_id, 1);
        assert_eq!(receipt.coord, GridCoord::new(2, 3));

        assert_eq!(hunt.outstanding_guess("alice"), Some(GridCoord::new(2, 3)));
        assert_eq!(hunt.pool_balance().await, 100);
        assert_eq!(hunt.pending_requests(), 1);
    }

    #[tokio::test]
    async fn test_resubmission_while_pending_rejected() {
        let hunt = scripted_hunt();
        hunt.submit_guess("alice", 1, 1, 10)
            .await
            .expect("first submit");

        let err = hunt
            .submit_guess("alice", 2, 2, 10)
            .await
            .expect_err("second submit must fail");
        assert!(matches!(err, HuntError::GuessPending(_)));

        // The original commitment is untouched.
        assert_eq!(hunt.outstanding_guess("alice"), Some(GridCoord::new(1, 1)));
        assert_eq!(hunt.pool_balance().await, 10);
        assert_eq!(hunt.pending_requests(), 1);
    }

    #[tokio::test]
    async fn test_oracle_failure_rolls_back_submit() {
        let hunt = TreasureHunt::new(
            test_config(),
            Arc::new(UnavailableSource),
            Arc::new(MemoryVault::new()),
        )
        .expect("valid config");

        let err = hunt
            .submit_guess("alice", 2, 3, 100)
            .await
            .expect_err("request cannot be issued");
        assert!(matches!(err, HuntError::OracleUnavailable(_)));

        // No orphaned guess, no stake taken, nothing pending.
        assert_eq!(hunt.outstanding_guess("alice"), None);
        assert_eq!(hunt.pool_balance().await, 0);
        assert_eq!(hunt.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_fulfill_unknown_request() {
        let hunt = scripted_hunt();
        let err = hunt
            .fulfill_randomness("oracle-operator", 42, &[0, 0])
            .await
            .expect_err("nothing pending");
        assert!(matches!(err, HuntError::UnknownRequest(42)));
    }

    #[tokio::test]
    async fn test_fulfill_checks_caller_before_lookup() {
        let hunt = scripted_hunt();
        // Even an unknown request id must not leak past the identity check.
        let err = hunt
            .fulfill_randomness("mallory", 42, &[0, 0])
            .await
            .expect_err("unauthorized");
        assert!(matches!(err, HuntError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_fund_adds_without_guess() {
        let hunt = scripted_hunt();
        assert_eq!(hunt.fund(500).await.expect("fund"), 500);
        assert_eq!(hunt.pool_balance().await, 500);
        assert_eq!(hunt.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_at_construction() {
        let mut config = test_config();
        config.oracle.word_count = 1;
        let result = TreasureHunt::new(
            config,
            Arc::new(ScriptedSource::new()),
            Arc::new(MemoryVault::new()),
        );
        assert!(matches!(result, Err(HuntError::Config(_))));
    }
}
