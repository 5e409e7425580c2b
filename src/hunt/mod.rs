pub mod coord;
pub mod custody;
pub mod events;
pub mod game;
pub mod ledger;
pub mod oracle;
pub mod settlement;
pub mod types;

pub use coord::{GridCoord, GRID_SIZE};
pub use custody::{FundCustody, FundTransfer, MemoryVault, TransferError};
pub use events::{EventBus, HuntEvent};
pub use game::TreasureHunt;
pub use ledger::GuessLedger;
pub use oracle::{
    OracleClient, RandomnessFulfillment, RandomnessRequest, RandomnessSource, VrfRandomnessSource,
};
pub use settlement::SettlementEngine;
pub use types::{HuntOutcome, RequestId, Settlement, SubmitReceipt};
