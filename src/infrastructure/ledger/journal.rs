//! Write-ahead undo journal backing `Ledger::atomic`

use solana_sdk::pubkey::Pubkey;

/// Previous value of one storage slot, recorded before the slot is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Balance {
        token: Pubkey,
        holder: Pubkey,
        previous: u128,
    },
    Allowance {
        token: Pubkey,
        owner: Pubkey,
        spender: Pubkey,
        previous: u128,
    },
    Native {
        holder: Pubkey,
        previous: u64,
    },
}

/// Position in the journal and the pending event buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub(crate) journal_len: usize,
    pub(crate) events_len: usize,
}

#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
    depth: usize,
}

impl Journal {
    pub fn record(&mut self, entry: JournalEntry) {
        // Outside an operation there is nothing to undo
        if self.depth > 0 {
            self.entries.push(entry);
        }
    }

    pub fn enter(&mut self) -> usize {
        self.depth += 1;
        self.entries.len()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Leave a frame keeping its entries; the outermost commit discards them
    pub fn commit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.entries.clear();
        }
    }

    /// Leave a frame, returning its entries newest first for undoing
    pub fn unwind(&mut self, journal_len: usize) -> Vec<JournalEntry> {
        self.depth = self.depth.saturating_sub(1);
        let mut undone = self.entries.split_off(journal_len);
        undone.reverse();
        undone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_outside_frame_are_dropped() {
        let mut journal = Journal::default();
        journal.record(JournalEntry::Native { holder: Pubkey::new_unique(), previous: 1 });
        assert!(journal.is_empty());
    }

    #[test]
    fn test_nested_unwind_keeps_outer_entries() {
        let mut journal = Journal::default();
        let holder = Pubkey::new_unique();
        journal.enter();
        journal.record(JournalEntry::Native { holder, previous: 1 });
        let inner = journal.enter();
        journal.record(JournalEntry::Native { holder, previous: 2 });
        journal.record(JournalEntry::Native { holder, previous: 3 });

        let undone = journal.unwind(inner);
        assert_eq!(undone.len(), 2);
        assert_eq!(undone[0], JournalEntry::Native { holder, previous: 3 });
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.depth(), 1);

        journal.commit();
        assert!(journal.is_empty());
        assert_eq!(journal.depth(), 0);
    }
}
