//! Common types used across the engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Largest precision a token may declare; leaves headroom in u128 amounts
pub const MAX_DECIMALS: u8 = 36;

/// Token representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub mint: Pubkey,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(mint: Pubkey, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            mint,
            symbol: symbol.into(),
            decimals,
        }
    }

    /// One whole token in raw units. Requires `decimals <= MAX_DECIMALS`.
    pub fn one(&self) -> u128 {
        10u128.pow(self.decimals as u32)
    }

    /// Convert whole units to raw units, e.g. `units(1000)` for 1000 DAI
    pub fn units(&self, whole: u128) -> u128 {
        whole * self.one()
    }

    /// `units` for untrusted input: `None` when the result does not fit
    pub fn checked_units(&self, whole: u128) -> Option<u128> {
        10u128
            .checked_pow(self.decimals as u32)
            .and_then(|one| whole.checked_mul(one))
    }
}

/// Amount representation with precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount {
    pub value: u128,
    pub decimals: u8,
}

impl Amount {
    pub fn new(value: u128, decimals: u8) -> Self {
        Self { value, decimals }
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(scale) = 10u128.checked_pow(self.decimals as u32) else {
            return write!(f, "{}e-{}", self.value, self.decimals);
        };
        let whole = self.value / scale;
        let frac = self.value % scale;
        if self.decimals == 0 {
            write!(f, "{}", whole)
        } else {
            write!(f, "{}.{:0width$}", whole, frac, width = self.decimals as usize)
        }
    }
}

/// Accounting of one flash loan, emitted on completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSettlement {
    pub asset: Pubkey,
    pub amount_borrowed: u128,
    pub fee: u128,
    pub amount_repaid: u128,
    pub profit: u128,
}

/// Events recorded by the engine. Only operations that commit leave events behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    FlashLoanExecuted(LoanSettlement),
    ArbitrageExecuted {
        settlement: LoanSettlement,
        venue_a: Pubkey,
        venue_b: Pubkey,
        token_out: Pubkey,
    },
    ProfitsWithdrawn {
        asset: Pubkey,
        to: Pubkey,
        amount: u128,
    },
    EmergencyWithdrawal {
        asset: Pubkey,
        to: Pubkey,
        amount: u128,
    },
    NativeWithdrawal {
        to: Pubkey,
        lamports: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub timestamp: DateTime<Utc>,
    pub event: EngineEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_display_keeps_decimals() {
        assert_eq!(Amount::new(1_500_000, 6).to_string(), "1.500000");
        assert_eq!(Amount::new(42, 0).to_string(), "42");
        assert_eq!(Amount::new(5, 18).to_string(), "0.000000000000000005");
    }

    #[test]
    fn test_token_units() {
        let dai = Token::new(Pubkey::new_unique(), "DAI", 18);
        let usdc = Token::new(Pubkey::new_unique(), "USDC", 6);
        assert_eq!(dai.units(1000), 1_000_000_000_000_000_000_000);
        assert_eq!(usdc.units(1000), 1_000_000_000);
    }

    #[test]
    fn test_checked_units_refuses_overflow() {
        let wide = Token::new(Pubkey::new_unique(), "WIDE", MAX_DECIMALS);
        assert_eq!(wide.checked_units(100), Some(100 * 10u128.pow(36)));
        assert_eq!(wide.checked_units(1_000), None);
        let absurd = Token::new(Pubkey::new_unique(), "X", 40);
        assert_eq!(absurd.checked_units(1), None);
        assert_eq!(Amount::new(5, 40).to_string(), "5e-40");
    }
}
