//! Arbitrage instructions carried through the lending pool as opaque bytes

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::shared::errors::ArbitrageError;

/// Two-leg trade: `token_in -> token_out` on `venue_a`, back on `venue_b`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub token_in: Pubkey,
    pub token_out: Pubkey,
    pub venue_a: Pubkey,
    pub venue_b: Pubkey,
    pub amount_in: u128,
    /// Caller's floor for leg A output
    pub min_amount_out: u128,
    pub venue_call_data_a: Vec<u8>,
    pub venue_call_data_b: Vec<u8>,
}

impl StrategyParams {
    pub fn encode(&self) -> Result<Vec<u8>, ArbitrageError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, ArbitrageError> {
        Ok(bincode::deserialize(data)?)
    }

    pub fn validate(&self) -> Result<(), ArbitrageError> {
        let zero = Pubkey::default();
        if self.venue_a == zero || self.venue_b == zero {
            return Err(ArbitrageError::InvalidParams("venue is the zero address".to_string()));
        }
        if self.token_in == zero || self.token_out == zero {
            return Err(ArbitrageError::InvalidParams("token is the zero address".to_string()));
        }
        if self.venue_a == self.venue_b {
            return Err(ArbitrageError::InvalidParams("venue_a and venue_b must differ".to_string()));
        }
        if self.token_in == self.token_out {
            return Err(ArbitrageError::InvalidParams("token_in and token_out must differ".to_string()));
        }
        if self.amount_in == 0 {
            return Err(ArbitrageError::InvalidParams("amount_in must be positive".to_string()));
        }
        Ok(())
    }
}
