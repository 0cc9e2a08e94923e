//! In-process token ledger with all-or-nothing operations.
//!
//! Holds fungible token balances and allowances, native lamport balances and
//! the committed event log. `Ledger::atomic` runs a closure as one operation:
//! every slot write inside it is journaled, and an `Err` restores every slot
//! and drops every event recorded since the operation began. Operations nest;
//! only the outermost commit makes effects permanent.

mod journal;

pub use journal::{Checkpoint, Journal, JournalEntry};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::shared::errors::LedgerError;
use crate::shared::types::{EngineEvent, RecordedEvent, Token, MAX_DECIMALS};

#[derive(Debug)]
pub struct Ledger {
    tokens: HashMap<Pubkey, Token>,
    balances: HashMap<(Pubkey, Pubkey), u128>,
    allowances: HashMap<(Pubkey, Pubkey, Pubkey), u128>,
    native: HashMap<Pubkey, u64>,
    journal: Journal,
    pending_events: Vec<RecordedEvent>,
    events: Vec<RecordedEvent>,
    timestamp: DateTime<Utc>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_timestamp(Utc::now())
    }

    pub fn with_timestamp(timestamp: DateTime<Utc>) -> Self {
        Self {
            tokens: HashMap::new(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            native: HashMap::new(),
            journal: Journal::default(),
            pending_events: Vec::new(),
            events: Vec::new(),
            timestamp,
        }
    }

    /// Block time seen by operations
    pub fn now(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn register_token(&mut self, token: Token) -> Result<(), LedgerError> {
        if self.tokens.contains_key(&token.mint) {
            return Err(LedgerError::DuplicateToken(token.mint));
        }
        if token.decimals > MAX_DECIMALS {
            return Err(LedgerError::UnsupportedDecimals {
                mint: token.mint,
                decimals: token.decimals,
                max: MAX_DECIMALS,
            });
        }
        debug!("🪙 Registered token {} ({} decimals)", token.symbol, token.decimals);
        self.tokens.insert(token.mint, token);
        Ok(())
    }

    pub fn token(&self, mint: &Pubkey) -> Result<&Token, LedgerError> {
        self.tokens.get(mint).ok_or(LedgerError::UnknownToken(*mint))
    }

    pub fn decimals(&self, mint: &Pubkey) -> Result<u8, LedgerError> {
        self.token(mint).map(|t| t.decimals)
    }

    pub fn balance(&self, token: &Pubkey, holder: &Pubkey) -> u128 {
        self.balances.get(&(*token, *holder)).copied().unwrap_or(0)
    }

    pub fn allowance(&self, token: &Pubkey, owner: &Pubkey, spender: &Pubkey) -> u128 {
        self.allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn native_balance(&self, holder: &Pubkey) -> u64 {
        self.native.get(holder).copied().unwrap_or(0)
    }

    /// Create new units out of thin air. Used to seed markets and test accounts.
    pub fn mint_to(&mut self, token: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), LedgerError> {
        self.token(token)?;
        let current = self.balance(token, to);
        let updated = current.checked_add(amount).ok_or(LedgerError::Overflow(*to))?;
        self.write_balance(token, to, updated);
        Ok(())
    }

    pub fn transfer(
        &mut self,
        token: &Pubkey,
        from: &Pubkey,
        to: &Pubkey,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.token(token)?;
        let available = self.balance(token, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                token: *token,
                holder: *from,
                available,
                required: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let credited = self
            .balance(token, to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(*to))?;
        self.write_balance(token, from, available - amount);
        self.write_balance(token, to, credited);
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s tokens. Replaces, never adds.
    pub fn approve(
        &mut self,
        token: &Pubkey,
        owner: &Pubkey,
        spender: &Pubkey,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.token(token)?;
        self.write_allowance(token, owner, spender, amount);
        Ok(())
    }

    /// Move `owner`'s tokens on behalf of `spender`, consuming allowance
    pub fn transfer_from(
        &mut self,
        token: &Pubkey,
        spender: &Pubkey,
        owner: &Pubkey,
        to: &Pubkey,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let available = self.allowance(token, owner, spender);
        if available < amount {
            return Err(LedgerError::InsufficientAllowance {
                token: *token,
                owner: *owner,
                spender: *spender,
                available,
                required: amount,
            });
        }
        self.transfer(token, owner, to, amount)?;
        self.write_allowance(token, owner, spender, available - amount);
        Ok(())
    }

    /// Credit lamports to an account. Used to seed balances.
    pub fn airdrop_native(&mut self, to: &Pubkey, lamports: u64) -> Result<(), LedgerError> {
        let updated = self
            .native_balance(to)
            .checked_add(lamports)
            .ok_or(LedgerError::Overflow(*to))?;
        self.write_native(to, updated);
        Ok(())
    }

    pub fn transfer_native(&mut self, from: &Pubkey, to: &Pubkey, lamports: u64) -> Result<(), LedgerError> {
        let available = self.native_balance(from);
        if available < lamports {
            return Err(LedgerError::InsufficientNative {
                holder: *from,
                available,
                required: lamports,
            });
        }
        if from == to || lamports == 0 {
            return Ok(());
        }
        let credited = self
            .native_balance(to)
            .checked_add(lamports)
            .ok_or(LedgerError::Overflow(*to))?;
        self.write_native(from, available - lamports);
        self.write_native(to, credited);
        Ok(())
    }

    /// Record an event. Inside an operation it only becomes visible on commit.
    pub fn emit(&mut self, event: EngineEvent) {
        let recorded = RecordedEvent {
            timestamp: self.timestamp,
            event,
        };
        if self.journal.depth() > 0 {
            self.pending_events.push(recorded);
        } else {
            self.events.push(recorded);
        }
    }

    /// Committed events, oldest first
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Hand committed events to the caller; the ledger keeps none afterwards
    pub fn drain_events(&mut self) -> Vec<RecordedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn in_operation(&self) -> bool {
        self.journal.depth() > 0
    }

    /// Run `f` as one all-or-nothing operation
    pub fn atomic<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Ledger) -> Result<T, E>,
    {
        let checkpoint = self.begin();
        match f(self) {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(err) => {
                self.revert(checkpoint);
                Err(err)
            }
        }
    }

    fn begin(&mut self) -> Checkpoint {
        let journal_len = self.journal.enter();
        Checkpoint {
            journal_len,
            events_len: self.pending_events.len(),
        }
    }

    fn commit(&mut self) {
        self.journal.commit();
        if self.journal.depth() == 0 {
            self.events.append(&mut self.pending_events);
        }
    }

    fn revert(&mut self, checkpoint: Checkpoint) {
        let undone = self.journal.unwind(checkpoint.journal_len);
        if !undone.is_empty() {
            warn!("↩️  Reverting {} ledger writes", undone.len());
        }
        for entry in undone {
            match entry {
                JournalEntry::Balance { token, holder, previous } => {
                    self.put_balance(token, holder, previous);
                }
                JournalEntry::Allowance { token, owner, spender, previous } => {
                    self.put_allowance(token, owner, spender, previous);
                }
                JournalEntry::Native { holder, previous } => {
                    self.put_native(holder, previous);
                }
            }
        }
        self.pending_events.truncate(checkpoint.events_len);
    }

    fn write_balance(&mut self, token: &Pubkey, holder: &Pubkey, value: u128) {
        self.journal.record(JournalEntry::Balance {
            token: *token,
            holder: *holder,
            previous: self.balance(token, holder),
        });
        self.put_balance(*token, *holder, value);
    }

    fn write_allowance(&mut self, token: &Pubkey, owner: &Pubkey, spender: &Pubkey, value: u128) {
        self.journal.record(JournalEntry::Allowance {
            token: *token,
            owner: *owner,
            spender: *spender,
            previous: self.allowance(token, owner, spender),
        });
        self.put_allowance(*token, *owner, *spender, value);
    }

    fn write_native(&mut self, holder: &Pubkey, value: u64) {
        self.journal.record(JournalEntry::Native {
            holder: *holder,
            previous: self.native_balance(holder),
        });
        self.put_native(*holder, value);
    }

    fn put_balance(&mut self, token: Pubkey, holder: Pubkey, value: u128) {
        if value == 0 {
            self.balances.remove(&(token, holder));
        } else {
            self.balances.insert((token, holder), value);
        }
    }

    fn put_allowance(&mut self, token: Pubkey, owner: Pubkey, spender: Pubkey, value: u128) {
        if value == 0 {
            self.allowances.remove(&(token, owner, spender));
        } else {
            self.allowances.insert((token, owner, spender), value);
        }
    }

    fn put_native(&mut self, holder: Pubkey, value: u64) {
        if value == 0 {
            self.native.remove(&holder);
        } else {
            self.native.insert(holder, value);
        }
    }
}
