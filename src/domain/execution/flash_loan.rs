//! Lending pool interface: the loan request and the callback it triggers

use solana_sdk::pubkey::Pubkey;

use crate::infrastructure::ledger::Ledger;
use crate::math::percent_mul;
use crate::shared::errors::ArbitrageError;

/// Authenticated identity of whoever invoked the callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Pubkey,
}

/// Payload the lending pool delivers with the borrowed funds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanContext {
    pub assets: Vec<Pubkey>,
    pub amounts: Vec<u128>,
    pub premiums: Vec<u128>,
    pub initiator: Pubkey,
    pub params: Vec<u8>,
}

impl LoanContext {
    /// Lengths agree and at least one asset was borrowed
    pub fn is_well_formed(&self) -> bool {
        !self.assets.is_empty()
            && self.assets.len() == self.amounts.len()
            && self.assets.len() == self.premiums.len()
    }
}

/// Receiver side of a flash loan. The pool calls `execute_operation` after
/// transferring the principal; returning anything but `Ok(true)` voids the loan.
pub trait FlashLoanReceiver {
    fn receiver_address(&self) -> Pubkey;

    fn execute_operation(
        &self,
        ledger: &mut Ledger,
        call: &CallContext,
        loan: &LoanContext,
    ) -> Result<bool, ArbitrageError>;
}

/// Lender side. `flash_loan` transfers `amounts` of `assets` to the receiver,
/// runs its callback and pulls back principal plus premium, all as one operation.
pub trait LendingPool: Send + Sync {
    fn address(&self) -> Pubkey;

    fn premium_bps(&self) -> u32;

    /// Premium charged on `amount`, rounded half up
    fn premium_for(&self, amount: u128) -> Result<u128, ArbitrageError> {
        percent_mul(amount, self.premium_bps())
            .ok_or_else(|| ArbitrageError::FlashLoanRejected("premium overflow".to_string()))
    }

    fn flash_loan(
        &self,
        ledger: &mut Ledger,
        initiator: &Pubkey,
        receiver: &dyn FlashLoanReceiver,
        assets: &[Pubkey],
        amounts: &[u128],
        params: Vec<u8>,
    ) -> Result<(), ArbitrageError>;
}
