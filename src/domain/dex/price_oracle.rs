//! Read-only price surface over the venue registry

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use super::{Quote, VenueRegistry};
use crate::domain::arbitrage::StrategyParams;
use crate::infrastructure::ledger::Ledger;
use crate::math::calculate_min_out;

/// Best venue ordering found for a round trip, ready to submit
#[derive(Debug, Clone, Serialize)]
pub struct RoundTripPlan {
    #[serde(skip)]
    pub params: StrategyParams,
    pub quote_buy: Quote,
    pub quote_sell: Quote,
}

impl RoundTripPlan {
    pub fn expected_amount_out(&self) -> u128 {
        self.quote_sell.amount_out
    }
}

pub struct PriceOracle<'a> {
    registry: &'a VenueRegistry,
}

impl<'a> PriceOracle<'a> {
    pub fn new(registry: &'a VenueRegistry) -> Self {
        Self { registry }
    }

    /// Quote one venue; unknown venues yield the "no quote" value
    pub fn quote(&self, ledger: &Ledger, venue: &Pubkey, token_in: &Pubkey, token_out: &Pubkey, amount_in: u128) -> Quote {
        match self.registry.get(venue) {
            Some(v) => v.quote_full(ledger, token_in, token_out, amount_in),
            None => Quote {
                venue: *venue,
                token_in: *token_in,
                token_out: *token_out,
                amount_in,
                amount_out: 0,
            },
        }
    }

    /// Quote every registered venue listing the pair, in registration order
    pub fn quote_all(&self, ledger: &Ledger, token_in: &Pubkey, token_out: &Pubkey, amount_in: u128) -> Vec<Quote> {
        self.registry
            .iter()
            .filter(|v| v.supports(token_in, token_out))
            .map(|v| v.quote_full(ledger, token_in, token_out, amount_in))
            .collect()
    }

    /// Ordered venue pair with the highest round-trip output: buy `token_out`
    /// on one venue, sell it back on a different one. `allowed` filters
    /// candidates on both sides.
    pub fn plan_round_trip<F>(
        &self,
        ledger: &Ledger,
        token_in: &Pubkey,
        token_out: &Pubkey,
        amount_in: u128,
        max_slippage_bps: u32,
        allowed: F,
    ) -> Option<RoundTripPlan>
    where
        F: Fn(&Pubkey) -> bool,
    {
        let buys: Vec<Quote> = self
            .quote_all(ledger, token_in, token_out, amount_in)
            .into_iter()
            .filter(|q| !q.is_empty() && allowed(&q.venue))
            .collect();

        let allowed = &allowed;
        let (quote_buy, quote_sell) = buys
            .iter()
            .flat_map(|buy| {
                self.quote_all(ledger, token_out, token_in, buy.amount_out)
                    .into_iter()
                    .filter(move |sell| !sell.is_empty() && sell.venue != buy.venue && allowed(&sell.venue))
                    .map(move |sell| (*buy, sell))
            })
            .max_by_key(|(_, sell)| sell.amount_out)?;

        debug!(
            "🧭 Planned {} -> {} via {} then {}: {} -> {}",
            token_in, token_out, quote_buy.venue, quote_sell.venue, amount_in, quote_sell.amount_out
        );

        let params = StrategyParams {
            token_in: *token_in,
            token_out: *token_out,
            venue_a: quote_buy.venue,
            venue_b: quote_sell.venue,
            amount_in,
            min_amount_out: calculate_min_out(quote_buy.amount_out, max_slippage_bps),
            venue_call_data_a: Vec::new(),
            venue_call_data_b: Vec::new(),
        };
        Some(RoundTripPlan {
            params,
            quote_buy,
            quote_sell,
        })
    }
}
