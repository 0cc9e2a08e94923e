//! Weighted pools (Balancer style)

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};
use solana_sdk::pubkey::Pubkey;

use super::{constant_product_amount_out, DexLabel, Venue};
use crate::infrastructure::ledger::Ledger;
use crate::math::{mul_div_floor, BPS_DENOMINATOR};
use crate::shared::errors::DexError;

#[derive(Debug, Clone)]
pub struct WeightedPoolVenue {
    name: String,
    address: Pubkey,
    token_a: Pubkey,
    token_b: Pubkey,
    weight_a: u32,
    weight_b: u32,
    fee_bps: u32,
}

impl WeightedPoolVenue {
    pub fn new(
        name: impl Into<String>,
        address: Pubkey,
        (token_a, weight_a): (Pubkey, u32),
        (token_b, weight_b): (Pubkey, u32),
        fee_bps: u32,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            token_a,
            token_b,
            weight_a,
            weight_b,
            fee_bps,
        }
    }

    fn weights(&self, token_in: &Pubkey) -> (u32, u32) {
        if *token_in == self.token_a {
            (self.weight_a, self.weight_b)
        } else {
            (self.weight_b, self.weight_a)
        }
    }
}

/// Largest numerator or denominator of the reduced weight ratio
pub const MAX_WEIGHT_EXPONENT: u32 = 100;

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Smallest `r` with `r^n >= value`
fn ceil_root(value: &BigUint, n: u32) -> BigUint {
    let root = value.nth_root(n);
    if &root.pow(n) < value {
        root + BigUint::one()
    } else {
        root
    }
}

/// `out = B_o * (1 - (B_i / (B_i + in*(1-fee)))^(w_i/w_o))`
///
/// Evaluated exactly: with `w_i/w_o = p/q` reduced, the retained balance is
/// `ceil(q-th root of ceil(B_o^q * B_i^p / (B_i + in)^p))`, so the output is
/// never above the invariant's.
fn weighted_amount_out(
    amount_in: u128,
    balance_in: u128,
    balance_out: u128,
    weight_in: u32,
    weight_out: u32,
    fee_bps: u32,
) -> Result<u128, DexError> {
    if balance_in == 0 || balance_out == 0 {
        return Err(DexError::ZeroReserves);
    }
    if weight_in == 0 || weight_out == 0 {
        return Err(DexError::InsufficientLiquidity("zero weight".to_string()));
    }
    if weight_in == weight_out {
        return constant_product_amount_out(amount_in, balance_in, balance_out, fee_bps);
    }
    let g = gcd(weight_in, weight_out);
    let (p, q) = (weight_in / g, weight_out / g);
    if p > MAX_WEIGHT_EXPONENT || q > MAX_WEIGHT_EXPONENT {
        return Err(DexError::MathOverflow("weight ratio too fine"));
    }
    let keep = BPS_DENOMINATOR
        .checked_sub(fee_bps as u128)
        .ok_or(DexError::MathOverflow("fee above 100%"))?;
    let in_after_fee = mul_div_floor(amount_in, keep, BPS_DENOMINATOR).ok_or(DexError::MathOverflow("weighted fee"))?;
    if in_after_fee == 0 {
        return Ok(0);
    }

    let b_in = BigUint::from(balance_in);
    let b_out = BigUint::from(balance_out);
    let num = b_out.pow(q) * b_in.pow(p);
    let den = (&b_in + BigUint::from(in_after_fee)).pow(p);
    let ratio = (&num + &den - BigUint::one()) / &den;
    let retained = ceil_root(&ratio, q);
    if retained >= b_out {
        return Ok(0);
    }
    let out = (b_out - retained)
        .to_u128()
        .ok_or(DexError::MathOverflow("weighted out"))?;
    Ok(out.min(balance_out - 1))
}

impl Venue for WeightedPoolVenue {
    fn label(&self) -> DexLabel {
        DexLabel::WeightedPool
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> Pubkey {
        self.address
    }

    fn tokens(&self) -> (Pubkey, Pubkey) {
        (self.token_a, self.token_b)
    }

    fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    fn amount_out(
        &self,
        ledger: &Ledger,
        token_in: &Pubkey,
        token_out: &Pubkey,
        amount_in: u128,
    ) -> Result<u128, DexError> {
        let (balance_in, balance_out) = self.reserves(ledger, token_in, token_out)?;
        let (weight_in, weight_out) = self.weights(token_in);
        weighted_amount_out(amount_in, balance_in, balance_out, weight_in, weight_out, self.fee_bps)
    }
}
