//! DEX interface trait

use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use super::{DexLabel, Quote, RouterCall, SwapOrder};
use crate::infrastructure::ledger::Ledger;
use crate::shared::errors::DexError;

/// Common interface for all venue adapters.
///
/// A venue's reserves are its own ledger balances, so quotes always reflect
/// the live state and a swap moves real balances.
pub trait Venue: Send + Sync {
    fn label(&self) -> DexLabel;

    fn name(&self) -> &str;

    fn address(&self) -> Pubkey;

    fn tokens(&self) -> (Pubkey, Pubkey);

    fn fee_bps(&self) -> u32;

    /// Pricing formula evaluated against current reserves
    fn amount_out(
        &self,
        ledger: &Ledger,
        token_in: &Pubkey,
        token_out: &Pubkey,
        amount_in: u128,
    ) -> Result<u128, DexError>;

    fn supports(&self, token_in: &Pubkey, token_out: &Pubkey) -> bool {
        let (a, b) = self.tokens();
        (*token_in == a && *token_out == b) || (*token_in == b && *token_out == a)
    }

    /// `(reserve_in, reserve_out)` for the direction of the trade
    fn reserves(
        &self,
        ledger: &Ledger,
        token_in: &Pubkey,
        token_out: &Pubkey,
    ) -> Result<(u128, u128), DexError> {
        if !self.supports(token_in, token_out) {
            return Err(DexError::UnsupportedPair {
                token_in: *token_in,
                token_out: *token_out,
            });
        }
        let address = self.address();
        let reserve_in = ledger.balance(token_in, &address);
        let reserve_out = ledger.balance(token_out, &address);
        if reserve_in == 0 || reserve_out == 0 {
            return Err(DexError::ZeroReserves);
        }
        Ok((reserve_in, reserve_out))
    }

    /// Never fails: any pricing error is reported as the "no quote" value 0
    fn quote(&self, ledger: &Ledger, token_in: &Pubkey, token_out: &Pubkey, amount_in: u128) -> u128 {
        match self.amount_out(ledger, token_in, token_out, amount_in) {
            Ok(out) => out,
            Err(e) => {
                debug!("🔍 {} ({}) has no quote: {}", self.name(), self.label(), e);
                0
            }
        }
    }

    fn quote_full(&self, ledger: &Ledger, token_in: &Pubkey, token_out: &Pubkey, amount_in: u128) -> Quote {
        Quote {
            venue: self.address(),
            token_in: *token_in,
            token_out: *token_out,
            amount_in,
            amount_out: self.quote(ledger, token_in, token_out, amount_in),
        }
    }

    /// Execute an order: pull `amount_in` through the trader's allowance and
    /// pay the recipient. Returns the amount paid out.
    fn swap(&self, ledger: &mut Ledger, order: &SwapOrder) -> Result<u128, DexError> {
        let call = RouterCall::decode(&order.call_data)?;
        if let Some(deadline) = call.deadline {
            let now = ledger.now().timestamp();
            if now > deadline {
                return Err(DexError::DeadlineExpired { deadline, now });
            }
        }

        let amount_out = self.amount_out(ledger, &order.token_in, &order.token_out, order.amount_in)?;
        if amount_out == 0 {
            return Err(DexError::InsufficientLiquidity("output rounds to zero".to_string()));
        }
        if amount_out < order.min_amount_out {
            return Err(DexError::SlippageExceeded {
                amount_out,
                min_amount_out: order.min_amount_out,
            });
        }

        let address = self.address();
        ledger.transfer_from(&order.token_in, &address, &order.trader, &address, order.amount_in)?;
        ledger.transfer(&order.token_out, &address, &order.recipient, amount_out)?;
        debug!(
            "🔄 {} swapped {} -> {} for {}",
            self.name(),
            order.amount_in,
            amount_out,
            order.recipient
        );
        Ok(amount_out)
    }
}
