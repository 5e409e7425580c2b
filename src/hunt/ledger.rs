use crate::hunt::coord::GridCoord;
use dashmap::DashMap;

/// Thread-safe store of the single outstanding guess per participant.
///
/// One slot per participant, kept packed. A store overwrites unconditionally;
/// a cleared or never-written slot reads back as `None`. Cross-operation
/// exclusion for a settlement in flight is the caller's job (the facade holds
/// a per-participant lock); each individual operation here is atomic on its
/// own.
pub struct GuessLedger {
    slots: DashMap<String, u8>,
}

impl GuessLedger {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Store a guess, silently replacing any previous one for the participant
    pub fn store(&self, participant: &str, coord: GridCoord) {
        self.slots.insert(participant.to_string(), coord.pack());
    }

    /// Read the current guess, if any
    pub fn read(&self, participant: &str) -> Option<GridCoord> {
        self.slots
            .get(participant)
            .map(|packed| GridCoord::unpack(*packed))
    }

    /// Reset the participant's slot to empty
    pub fn clear(&self, participant: &str) {
        self.slots.remove(participant);
    }

    /// Number of participants with a live guess
    pub fn live_count(&self) -> usize {
        self.slots.len()
    }
}

impl Default for GuessLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_read() {
        let ledger = GuessLedger::new();
        assert_eq!(ledger.read("alice"), None);

        ledger.store("alice", GridCoord::new(2, 3));
        assert_eq!(ledger.read("alice"), Some(GridCoord::new(2, 3)));
        assert_eq!(ledger.live_count(), 1);
    }

    #[test]
    fn test_store_replaces_never_merges() {
        let ledger = GuessLedger::new();
        ledger.store("alice", GridCoord::new(1, 1));
        ledger.store("alice", GridCoord::new(2, 2));

        assert_eq!(ledger.read("alice"), Some(GridCoord::new(2, 2)));
        assert_eq!(ledger.live_count(), 1);
    }

    #[test]
    fn test_clear_empties_slot() {
        let ledger = GuessLedger::new();
        ledger.store("alice", GridCoord::new(0, 4));
        ledger.clear("alice");

        assert_eq!(ledger.read("alice"), None);
        assert_eq!(ledger.live_count(), 0);

        // Clearing an empty slot is a no-op.
        ledger.clear("alice");
        assert_eq!(ledger.read("alice"), None);
    }

    #[test]
    fn test_participants_are_independent() {
        let ledger = GuessLedger::new();
        ledger.store("alice", GridCoord::new(1, 2));
        ledger.store("bob", GridCoord::new(3, 4));

        ledger.clear("alice");
        assert_eq!(ledger.read("alice"), None);
        assert_eq!(ledger.read("bob"), Some(GridCoord::new(3, 4)));
    }
}
