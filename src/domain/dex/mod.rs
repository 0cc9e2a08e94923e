//! DEX domain - venue adapters, quotes and swap orders

mod constant_product;
mod dex_interface;
mod dex_registry;
mod price_oracle;
mod stable_swap;
mod weighted_pool;

pub use constant_product::{constant_product_amount_out, ConstantProductVenue};
pub use dex_interface::Venue;
pub use dex_registry::VenueRegistry;
pub use price_oracle::{PriceOracle, RoundTripPlan};
pub use stable_swap::StableSwapVenue;
pub use weighted_pool::{WeightedPoolVenue, MAX_WEIGHT_EXPONENT};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::shared::errors::DexError;

/// Pricing model of a venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DexLabel {
    ConstantProduct,
    WeightedPool,
    StableSwap,
}

impl DexLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DexLabel::ConstantProduct => "Constant Product",
            DexLabel::WeightedPool => "Weighted Pool",
            DexLabel::StableSwap => "Stable Swap",
        }
    }
}

impl std::fmt::Display for DexLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only price observation. `amount_out == 0` means "no quote".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub venue: Pubkey,
    pub token_in: Pubkey,
    pub token_out: Pubkey,
    pub amount_in: u128,
    pub amount_out: u128,
}

impl Quote {
    pub fn is_empty(&self) -> bool {
        self.amount_out == 0
    }
}

/// Swap request handed to a venue router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOrder {
    /// Account whose tokens are spent, through its allowance to the venue
    pub trader: Pubkey,
    pub recipient: Pubkey,
    pub token_in: Pubkey,
    pub token_out: Pubkey,
    pub amount_in: u128,
    pub min_amount_out: u128,
    pub call_data: Vec<u8>,
}

/// Optional router arguments carried as venue call data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterCall {
    /// Unix timestamp after which the swap must not execute
    pub deadline: Option<i64>,
}

impl RouterCall {
    pub fn with_deadline(deadline: i64) -> Self {
        Self { deadline: Some(deadline) }
    }

    pub fn encode(&self) -> Result<Vec<u8>, DexError> {
        bincode::serialize(self).map_err(|e| DexError::InvalidCallData(e.to_string()))
    }

    /// Empty call data decodes to the default call
    pub fn decode(data: &[u8]) -> Result<Self, DexError> {
        if data.is_empty() {
            return Ok(Self::default());
        }
        bincode::deserialize(data).map_err(|e| DexError::InvalidCallData(e.to_string()))
    }
}
