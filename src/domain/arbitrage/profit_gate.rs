//! Profitability gate: decides from two quotes whether a round trip pays
//! for the loan premium and the profit threshold.

use serde::Serialize;
use tracing::debug;

use crate::domain::dex::Quote;
use crate::math::{bps_of_ceil, calculate_min_out, calculate_spread_bps, mul_div_floor};

/// Result of evaluating a round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub proceed: bool,
    /// Slippage-protected floor for the round trip's final output
    pub min_amount_out: u128,
    pub expected_profit_bps: i64,
    pub spread_bps: u128,
    /// Round-trip output in `token_in` units implied by the quotes
    pub expected_amount_out: u128,
}

impl GateDecision {
    fn reject() -> Self {
        Self {
            proceed: false,
            min_amount_out: 0,
            expected_profit_bps: 0,
            spread_bps: 0,
            expected_amount_out: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfitabilityGate {
    /// Round-trip venue fees assumed on top of the quotes
    pub venue_fee_budget_bps: u32,
}

impl ProfitabilityGate {
    pub fn new(venue_fee_budget_bps: u32) -> Self {
        Self { venue_fee_budget_bps }
    }

    /// `quote_buy` prices `amount_in` of token_in into token_out, `quote_sell`
    /// prices token_out back into token_in.
    pub fn evaluate(
        &self,
        quote_buy: &Quote,
        quote_sell: &Quote,
        amount_in: u128,
        premium: u128,
        min_profit_bps: u32,
        max_slippage_bps: u32,
    ) -> GateDecision {
        if quote_buy.is_empty() || quote_sell.is_empty() || amount_in == 0 || quote_sell.amount_in == 0 {
            debug!("🚫 Gate: missing quote");
            return GateDecision::reject();
        }

        // out_b * out_a / in_b, exact when the sell leg was quoted on out_a
        let round_trip = if quote_sell.amount_in == quote_buy.amount_out {
            quote_sell.amount_out
        } else {
            match mul_div_floor(quote_sell.amount_out, quote_buy.amount_out, quote_sell.amount_in) {
                Some(v) => v,
                None => return GateDecision::reject(),
            }
        };

        let (spread_bps, loan_fee_bps) = match (
            calculate_spread_bps(amount_in, round_trip),
            bps_of_ceil(premium, amount_in),
        ) {
            (Some(s), Some(f)) => (s, f),
            _ => return GateDecision::reject(),
        };

        let expected_profit_bps = clamp_i64(spread_bps) - clamp_i64(loan_fee_bps) - self.venue_fee_budget_bps as i64;
        let proceed = round_trip > amount_in && expected_profit_bps >= min_profit_bps as i64;

        let owed = amount_in.saturating_add(premium);
        let decision = GateDecision {
            proceed,
            min_amount_out: calculate_min_out(owed, max_slippage_bps),
            expected_profit_bps,
            spread_bps,
            expected_amount_out: round_trip,
        };
        debug!(
            "📐 Gate: spread {} bps, loan fee {} bps, expected {} bps, threshold {} -> {}",
            spread_bps, loan_fee_bps, expected_profit_bps, min_profit_bps, proceed
        );
        decision
    }
}

fn clamp_i64(v: u128) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
