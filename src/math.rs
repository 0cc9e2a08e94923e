// src/math.rs
//! Integer basis-point math. All helpers round against the trader:
//! profits and outputs round down, fees and minimum outputs round up.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

pub const BPS_DENOMINATOR: u128 = 10_000;

/// `a * b / c` rounded down, with a 256-bit safe intermediate.
/// `None` on division by zero or if the result does not fit `u128`.
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> Option<u128> {
    if c == 0 {
        return None;
    }
    (BigUint::from(a) * BigUint::from(b) / BigUint::from(c)).to_u128()
}

/// `a * b / c` rounded up
pub fn mul_div_ceil(a: u128, b: u128, c: u128) -> Option<u128> {
    if c == 0 {
        return None;
    }
    let num = BigUint::from(a) * BigUint::from(b);
    let den = BigUint::from(c);
    let q = &num / &den;
    let r = num % &den;
    let q = if r.is_zero() { q } else { q + 1u32 };
    q.to_u128()
}

/// Relative gain of `actual` over `base` in whole basis points, floor.
/// Zero when `actual <= base`; `None` when `base` is zero.
pub fn calculate_spread_bps(base: u128, actual: u128) -> Option<u128> {
    if base == 0 {
        return None;
    }
    if actual <= base {
        return Some(0);
    }
    mul_div_floor(actual - base, BPS_DENOMINATOR, base)
}

/// `part` as basis points of `whole`, rounded up
pub fn bps_of_ceil(part: u128, whole: u128) -> Option<u128> {
    mul_div_ceil(part, BPS_DENOMINATOR, whole)
}

/// Minimum acceptable output for `amount` under a slippage tolerance, rounded up
pub fn calculate_min_out(amount: u128, slippage_bps: u32) -> u128 {
    let keep = BPS_DENOMINATOR.saturating_sub(slippage_bps as u128);
    // amount * keep / 10000 <= amount, so it always fits
    mul_div_ceil(amount, keep, BPS_DENOMINATOR).unwrap_or(amount)
}

/// `amount * bps / 10000` rounded half up
pub fn percent_mul(amount: u128, bps: u32) -> Option<u128> {
    let num = BigUint::from(amount) * BigUint::from(bps) + BigUint::from(BPS_DENOMINATOR / 2);
    (num / BigUint::from(BPS_DENOMINATOR)).to_u128()
}
