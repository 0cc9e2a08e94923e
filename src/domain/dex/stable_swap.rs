//! Two-coin stable swap venues (Curve, Wombat)
//!
//! Balances are normalized to 18 decimals before solving the invariant, so a
//! DAI/USDC pool prices 1 DAI against 1 USDC regardless of raw precision.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use solana_sdk::pubkey::Pubkey;

use super::{DexLabel, Venue};
use crate::infrastructure::ledger::Ledger;
use crate::math::BPS_DENOMINATOR;
use crate::shared::errors::DexError;

const N_COINS: u32 = 2;
const PRECISION_DECIMALS: u8 = 18;
const MAX_ITERATIONS: usize = 255;

#[derive(Debug, Clone)]
pub struct StableSwapVenue {
    name: String,
    address: Pubkey,
    token_a: Pubkey,
    token_b: Pubkey,
    amplification: u64,
    fee_bps: u32,
}

impl StableSwapVenue {
    pub fn new(
        name: impl Into<String>,
        address: Pubkey,
        token_a: Pubkey,
        token_b: Pubkey,
        amplification: u64,
        fee_bps: u32,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            token_a,
            token_b,
            amplification,
            fee_bps,
        }
    }
}

fn pow10(exp: u8) -> BigUint {
    BigUint::from(10u32).pow(exp as u32)
}

fn normalize(amount: u128, decimals: u8) -> BigUint {
    let amount = BigUint::from(amount);
    if decimals <= PRECISION_DECIMALS {
        amount * pow10(PRECISION_DECIMALS - decimals)
    } else {
        amount / pow10(decimals - PRECISION_DECIMALS)
    }
}

fn denormalize(amount: BigUint, decimals: u8) -> Result<u128, DexError> {
    let scaled = if decimals <= PRECISION_DECIMALS {
        amount / pow10(PRECISION_DECIMALS - decimals)
    } else {
        amount * pow10(decimals - PRECISION_DECIMALS)
    };
    scaled.to_u128().ok_or(DexError::MathOverflow("stable swap output"))
}

fn converged(a: &BigUint, b: &BigUint) -> bool {
    let diff = if a > b { a - b } else { b - a };
    diff <= BigUint::one()
}

/// Invariant D for balances `xp` and amplification `amp`
fn get_d(xp: &[BigUint; 2], amp: u64) -> Result<BigUint, DexError> {
    let n = BigUint::from(N_COINS);
    let s = &xp[0] + &xp[1];
    if s.is_zero() {
        return Ok(BigUint::zero());
    }
    if xp.iter().any(|x| x.is_zero()) {
        return Err(DexError::ZeroReserves);
    }
    let ann = BigUint::from(amp) * &n;
    let mut d = s.clone();
    for _ in 0..MAX_ITERATIONS {
        let mut d_p = d.clone();
        for x in xp {
            d_p = d_p * &d / (x * &n);
        }
        let d_prev = d.clone();
        let numerator = (&ann * &s + &d_p * &n) * &d;
        let denominator = (&ann - 1u32) * &d + (&n + 1u32) * &d_p;
        d = numerator / denominator;
        if converged(&d, &d_prev) {
            return Ok(d);
        }
    }
    Err(DexError::MathOverflow("stable swap D did not converge"))
}

/// Balance of the other coin that keeps D when this coin's balance is `x`
fn get_y(x: &BigUint, d: &BigUint, amp: u64) -> Result<BigUint, DexError> {
    let n = BigUint::from(N_COINS);
    let ann = BigUint::from(amp) * &n;
    let mut c = d * d / (x * &n);
    c = c * d / (&ann * &n);
    let b = x + d / &ann;

    let mut y = d.clone();
    for _ in 0..MAX_ITERATIONS {
        let y_prev = y.clone();
        let lhs = &y * 2u32 + &b;
        if lhs <= *d {
            return Err(DexError::MathOverflow("stable swap y"));
        }
        y = (&y * &y + &c) / (lhs - d);
        if converged(&y, &y_prev) {
            return Ok(y);
        }
    }
    Err(DexError::MathOverflow("stable swap y did not converge"))
}

impl Venue for StableSwapVenue {
    fn label(&self) -> DexLabel {
        DexLabel::StableSwap
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
        if self.amplification == 0 {
            return Err(DexError::InsufficientLiquidity("zero amplification".to_string()));
        }
        let (reserve_in, reserve_out) = self.reserves(ledger, token_in, token_out)?;
        if amount_in == 0 {
            return Ok(0);
        }
        let decimals_in = ledger.decimals(token_in)?;
        let decimals_out = ledger.decimals(token_out)?;

        let xp = [normalize(reserve_in, decimals_in), normalize(reserve_out, decimals_out)];
        let d = get_d(&xp, self.amplification)?;
        let x = &xp[0] + normalize(amount_in, decimals_in);
        let y = get_y(&x, &d, self.amplification)?;

        // -1 keeps rounding inside the pool
        let y_floor = y + 1u32;
        if y_floor >= xp[1] {
            return Ok(0);
        }
        let dy = &xp[1] - y_floor;
        let fee_num = &dy * BigUint::from(self.fee_bps) + BigUint::from(BPS_DENOMINATOR - 1);
        let fee = fee_num / BigUint::from(BPS_DENOMINATOR);
        if fee >= dy {
            return Ok(0);
        }
        let out = denormalize(dy - fee, decimals_out)?;
        if out >= reserve_out {
            return Err(DexError::InsufficientLiquidity(format!("{} drained", self.name)));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dex::constant_product_amount_out;
    use crate::shared::types::Token;

    fn dai_usdc(amp: u64) -> (Ledger, StableSwapVenue, Token, Token) {
        let mut ledger = Ledger::new();
        let dai = Token::new(Pubkey::new_unique(), "DAI", 18);
        let usdc = Token::new(Pubkey::new_unique(), "USDC", 6);
        ledger.register_token(dai.clone()).unwrap();
        ledger.register_token(usdc.clone()).unwrap();
        let venue = StableSwapVenue::new("curve", Pubkey::new_unique(), dai.mint, usdc.mint, amp, 4);
        ledger.mint_to(&dai.mint, &venue.address(), dai.units(1_000_000)).unwrap();
        ledger.mint_to(&usdc.mint, &venue.address(), usdc.units(1_000_000)).unwrap();
        (ledger, venue, dai, usdc)
    }

    #[test]
    fn test_invariant_of_balanced_pool_is_sum() {
        let xp = [BigUint::from(1_000u32), BigUint::from(1_000u32)];
        assert_eq!(get_d(&xp, 100).unwrap(), BigUint::from(2_000u32));
    }

    #[test]
    fn test_beats_constant_product_near_peg() {
        let (ledger, venue, dai, usdc) = dai_usdc(100);
        let amount_in = dai.units(1_000);
        let stable = venue.quote(&ledger, &dai.mint, &usdc.mint, amount_in);

        // Same trade on x*y=k with identical normalized reserves and fee
        let cp = constant_product_amount_out(amount_in, dai.units(1_000_000), dai.units(1_000_000), 4).unwrap()
            / 1_000_000_000_000;

        assert!(stable > cp, "stable {} vs constant product {}", stable, cp);
        assert!(stable > usdc.units(999));
        assert!(stable < usdc.units(1_000));
    }

    #[test]
    fn test_reverse_direction_across_decimals() {
        let (ledger, venue, dai, usdc) = dai_usdc(100);
        let out = venue.quote(&ledger, &usdc.mint, &dai.mint, usdc.units(1_000));
        assert!(out > dai.units(999));
        assert!(out < dai.units(1_000));
    }

    #[test]
    fn test_zero_amplification_has_no_quote() {
        let (ledger, venue, dai, usdc) = dai_usdc(0);
        assert_eq!(venue.quote(&ledger, &dai.mint, &usdc.mint, dai.units(1)), 0);
    }
}
