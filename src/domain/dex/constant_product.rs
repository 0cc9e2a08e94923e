//! x*y=k venues (Uniswap V2, SushiSwap, Camelot)

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use solana_sdk::pubkey::Pubkey;

use super::{DexLabel, Venue};
use crate::infrastructure::ledger::Ledger;
use crate::math::BPS_DENOMINATOR;
use crate::shared::errors::DexError;

/// `out = in*(1-fee)*R_out / (R_in + in*(1-fee))`, floor
pub fn constant_product_amount_out(
    amount_in: u128,
    reserve_in: u128,
    reserve_out: u128,
    fee_bps: u32,
) -> Result<u128, DexError> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(DexError::ZeroReserves);
    }
    if fee_bps as u128 > BPS_DENOMINATOR {
        return Err(DexError::MathOverflow("fee above 100%"));
    }
    let in_with_fee = BigUint::from(amount_in) * BigUint::from(BPS_DENOMINATOR - fee_bps as u128);
    let numerator = &in_with_fee * BigUint::from(reserve_out);
    let denominator = BigUint::from(reserve_in) * BigUint::from(BPS_DENOMINATOR) + in_with_fee;
    if denominator == BigUint::from(0u32) {
        return Err(DexError::ZeroReserves);
    }
    (numerator / denominator)
        .to_u128()
        .ok_or(DexError::MathOverflow("constant product"))
}

#[derive(Debug, Clone)]
pub struct ConstantProductVenue {
    name: String,
    address: Pubkey,
    token_a: Pubkey,
    token_b: Pubkey,
    fee_bps: u32,
}

impl ConstantProductVenue {
    pub fn new(name: impl Into<String>, address: Pubkey, token_a: Pubkey, token_b: Pubkey, fee_bps: u32) -> Self {
        Self {
            name: name.into(),
            address,
            token_a,
            token_b,
            fee_bps,
        }
    }
}

impl Venue for ConstantProductVenue {
    fn label(&self) -> DexLabel {
        DexLabel::ConstantProduct
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
        let (reserve_in, reserve_out) = self.reserves(ledger, token_in, token_out)?;
        constant_product_amount_out(amount_in, reserve_in, reserve_out, self.fee_bps)
    }
}
