//! Executes one swap leg with bounded approvals and measured output

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::domain::dex::{SwapOrder, Venue};
use crate::infrastructure::ledger::Ledger;
use crate::shared::errors::{ArbitrageError, DexError};

/// One leg of a round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegOrder {
    pub token_in: Pubkey,
    pub token_out: Pubkey,
    pub amount_in: u128,
    pub min_amount_out: u128,
    pub call_data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SwapExecutor;

impl SwapExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Swap `leg.amount_in` on `venue` for `trader`, returning the output
    /// actually received. The venue is approved for exactly the input and
    /// any allowance it leaves unused is revoked.
    pub fn execute_leg(
        &self,
        ledger: &mut Ledger,
        trader: &Pubkey,
        venue: &dyn Venue,
        leg: &LegOrder,
    ) -> Result<u128, ArbitrageError> {
        let venue_address = venue.address();
        let before = ledger.balance(&leg.token_out, trader);

        ledger.approve(&leg.token_in, trader, &venue_address, leg.amount_in)?;
        let order = SwapOrder {
            trader: *trader,
            recipient: *trader,
            token_in: leg.token_in,
            token_out: leg.token_out,
            amount_in: leg.amount_in,
            min_amount_out: leg.min_amount_out,
            call_data: leg.call_data.clone(),
        };
        let reported = venue.swap(ledger, &order).map_err(|e| match e {
            DexError::SlippageExceeded {
                amount_out,
                min_amount_out,
            } => ArbitrageError::SlippageExceeded {
                venue: venue_address,
                amount_out,
                min_amount_out,
            },
            other => ArbitrageError::Dex(other),
        })?;

        if ledger.allowance(&leg.token_in, trader, &venue_address) > 0 {
            ledger.approve(&leg.token_in, trader, &venue_address, 0)?;
        }

        let received = ledger.balance(&leg.token_out, trader).saturating_sub(before);
        if received != reported {
            warn!("⚠️  {} reported {} but delivered {}", venue.name(), reported, received);
        }
        if received < leg.min_amount_out {
            return Err(ArbitrageError::SlippageExceeded {
                venue: venue_address,
                amount_out: received,
                min_amount_out: leg.min_amount_out,
            });
        }
        debug!("✅ Leg on {}: {} -> {}", venue.name(), leg.amount_in, received);
        Ok(received)
    }
}
