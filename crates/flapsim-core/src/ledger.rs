//! Per-(agent, obstacle slot) pass flags
//!
//! A flat arena of `agents x slots` booleans. Obstacle pairs borrow a slot
//! for their lifetime, and the slot's column is wiped when a new pair moves
//! in, so a bonus can fire at most once per agent per pair.

pub struct PassLedger {
    slots: usize,
    flags: Vec<bool>,
}

impl PassLedger {
    pub fn new(agents: usize, slots: usize) -> Self {
        Self {
            slots,
            flags: vec![false; agents * slots],
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn is_passed(&self, agent: usize, slot: usize) -> bool {
        self.flags[agent * self.slots + slot]
    }

    /// Forget every agent's flag for a slot that now holds a new pair
    pub fn reset_slot(&mut self, slot: usize) {
        debug_assert!(slot < self.slots);
        for row in self.flags.chunks_exact_mut(self.slots) {
            row[slot] = false;
        }
    }

    /// One mutable row per agent, in agent order
    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, bool> {
        self.flags.chunks_exact_mut(self.slots)
    }

    #[cfg(feature = "parallel")]
    pub fn par_rows_mut(&mut self) -> rayon::slice::ChunksExactMut<'_, bool> {
        use rayon::slice::ParallelSliceMut;
        self.flags.par_chunks_exact_mut(self.slots)
    }
}

/// Set the flag for `slot`, returning true only the first time
pub fn mark_passed(row: &mut [bool], slot: usize) -> bool {
    !std::mem::replace(&mut row[slot], true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_passed_once() {
        let mut ledger = PassLedger::new(2, 4);
        let mut rows = ledger.rows_mut();
        let row0 = rows.next().unwrap();
        assert!(mark_passed(row0, 1));
        assert!(!mark_passed(row0, 1));
        assert!(ledger.is_passed(0, 1));
        assert!(!ledger.is_passed(1, 1));
    }

    #[test]
    fn test_reset_slot_clears_column() {
        let mut ledger = PassLedger::new(3, 2);
        for row in ledger.rows_mut() {
            mark_passed(row, 0);
            mark_passed(row, 1);
        }
        ledger.reset_slot(0);
        for agent in 0..3 {
            assert!(!ledger.is_passed(agent, 0));
            assert!(ledger.is_passed(agent, 1));
        }
    }

    #[test]
    fn test_rows_match_agents() {
        let mut ledger = PassLedger::new(5, 3);
        assert_eq!(ledger.rows_mut().count(), 5);
        assert_eq!(ledger.slots(), 3);
    }
}
