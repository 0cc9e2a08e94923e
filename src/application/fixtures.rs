//! Shared test fixtures: a DAI/USDC world with fixed-rate venues

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;

use super::{EngineConfig, FlashLoanArbitrage};
use crate::domain::arbitrage::StrategyParams;
use crate::domain::dex::{DexLabel, SwapOrder, Venue, VenueRegistry};
use crate::domain::execution::LendingPool;
use crate::infrastructure::ledger::Ledger;
use crate::infrastructure::lending_pool::SimulatedLendingPool;
use crate::math::{calculate_min_out, mul_div_floor};
use crate::shared::errors::DexError;
use crate::shared::types::Token;

const E6: u128 = 1_000_000;
const E18: u128 = 1_000_000_000_000_000_000;

/// Fixed-price venue: `amount_from` of `from` quotes `quoted_to` of `to` and
/// actually pays `delivered_to`. The reverse direction quotes the inverse.
#[derive(Debug, Clone)]
pub struct FixedRateVenue {
    pub name: String,
    pub address: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount_from: u128,
    pub quoted_to: u128,
    pub delivered_to: u128,
}

impl FixedRateVenue {
    /// USDC -> DAI venue priced in whole units, delivering as quoted
    pub fn whole(usdc_in: u128, dai_out: u128) -> Self {
        Self::shortchanging(usdc_in, dai_out, dai_out)
    }

    /// USDC -> DAI venue quoting `dai_quoted` but paying `dai_delivered`
    pub fn shortchanging(usdc_in: u128, dai_quoted: u128, dai_delivered: u128) -> Self {
        Self::shortchanging_raw(usdc_in * E6, dai_quoted * E18, dai_delivered * E18)
    }

    pub fn shortchanging_raw(usdc_in: u128, dai_quoted: u128, dai_delivered: u128) -> Self {
        Self {
            name: "venue-b".to_string(),
            address: Pubkey::new_unique(),
            from: Pubkey::default(),
            to: Pubkey::default(),
            amount_from: usdc_in,
            quoted_to: dai_quoted,
            delivered_to: dai_delivered,
        }
    }

    fn rate(&self, token_in: &Pubkey, amount_in: u128, to_amount: u128) -> Result<u128, DexError> {
        let out = if *token_in == self.from {
            mul_div_floor(amount_in, to_amount, self.amount_from)
        } else {
            mul_div_floor(amount_in, self.amount_from, to_amount)
        };
        out.ok_or(DexError::MathOverflow("fixed rate"))
    }
}

impl Venue for FixedRateVenue {
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
        (self.from, self.to)
    }

    fn fee_bps(&self) -> u32 {
        0
    }

    fn amount_out(&self, ledger: &Ledger, token_in: &Pubkey, token_out: &Pubkey, amount_in: u128) -> Result<u128, DexError> {
        self.reserves(ledger, token_in, token_out)?;
        self.rate(token_in, amount_in, self.quoted_to)
    }

    fn swap(&self, ledger: &mut Ledger, order: &SwapOrder) -> Result<u128, DexError> {
        self.reserves(ledger, &order.token_in, &order.token_out)?;
        let paid = self.rate(&order.token_in, order.amount_in, self.delivered_to)?;
        if paid < order.min_amount_out {
            return Err(DexError::SlippageExceeded {
                amount_out: paid,
                min_amount_out: order.min_amount_out,
            });
        }
        ledger.transfer_from(&order.token_in, &self.address, &order.trader, &self.address, order.amount_in)?;
        ledger.transfer(&order.token_out, &self.address, &order.recipient, paid)?;
        Ok(paid)
    }
}

pub struct World {
    pub ledger: Ledger,
    pub engine: FlashLoanArbitrage,
    pub pool: Arc<SimulatedLendingPool>,
    pub owner: Pubkey,
    pub dai: Token,
    pub usdc: Token,
    pub venue_a: Pubkey,
    pub venue_b: Pubkey,
}

impl World {
    /// 1000 DAI -> 995 USDC on venue A, 995 USDC -> 1002 DAI on venue B,
    /// 5 bps premium, 50 bps max slippage
    pub fn scenario_a() -> Self {
        Self::with_venue_b(FixedRateVenue::whole(995, 1002))
    }

    pub fn with_venue_b(mut venue_b: FixedRateVenue) -> Self {
        let mut ledger = Ledger::new();
        let dai = Token::new(Pubkey::new_unique(), "DAI", 18);
        let usdc = Token::new(Pubkey::new_unique(), "USDC", 6);
        ledger.register_token(dai.clone()).unwrap();
        ledger.register_token(usdc.clone()).unwrap();

        let venue_a = FixedRateVenue {
            name: "venue-a".to_string(),
            address: Pubkey::new_unique(),
            from: dai.mint,
            to: usdc.mint,
            amount_from: dai.units(1000),
            quoted_to: usdc.units(995),
            delivered_to: usdc.units(995),
        };
        venue_b.from = usdc.mint;
        venue_b.to = dai.mint;

        let owner = Pubkey::new_unique();
        let pool = Arc::new(SimulatedLendingPool::with_default_premium(Pubkey::new_unique()));
        ledger.mint_to(&dai.mint, &pool.address(), dai.units(1_000_000)).unwrap();
        ledger.mint_to(&usdc.mint, &pool.address(), usdc.units(1_000_000)).unwrap();
        for venue in [&venue_a, &venue_b] {
            ledger.mint_to(&dai.mint, &venue.address, dai.units(1_000_000)).unwrap();
            ledger.mint_to(&usdc.mint, &venue.address, usdc.units(1_000_000)).unwrap();
        }

        let (a, b) = (venue_a.address, venue_b.address);
        let mut registry = VenueRegistry::new();
        registry.register(Box::new(venue_a)).unwrap();
        registry.register(Box::new(venue_b)).unwrap();

        let config = EngineConfig::new(owner, pool.address())
            .with_thresholds(10, 50)
            .trust([a, b]);
        let engine = FlashLoanArbitrage::new(Pubkey::new_unique(), config, pool.clone(), registry).unwrap();

        Self {
            ledger,
            engine,
            pool,
            owner,
            dai,
            usdc,
            venue_a: a,
            venue_b: b,
        }
    }

    pub fn set_min_profit(&mut self, bps: u32) {
        let owner = self.owner;
        self.engine.set_min_profit_bps(&owner, bps).unwrap();
    }

    /// Borrow 1000 DAI, buy USDC on venue A, sell on venue B
    pub fn params(&self) -> StrategyParams {
        StrategyParams {
            token_in: self.dai.mint,
            token_out: self.usdc.mint,
            venue_a: self.venue_a,
            venue_b: self.venue_b,
            amount_in: self.dai.units(1000),
            min_amount_out: calculate_min_out(self.usdc.units(995), 50),
            venue_call_data_a: Vec::new(),
            venue_call_data_b: Vec::new(),
        }
    }

    /// Every balance and allowance the engine can touch, plus the event count
    pub fn snapshot(&self) -> Vec<u128> {
        let engine = self.engine.address();
        let accounts = [engine, self.pool.address(), self.venue_a, self.venue_b, self.owner];
        let mut out = Vec::new();
        for token in [self.dai.mint, self.usdc.mint] {
            for account in accounts {
                out.push(self.ledger.balance(&token, &account));
            }
            for spender in [self.pool.address(), self.venue_a, self.venue_b] {
                out.push(self.ledger.allowance(&token, &engine, &spender));
            }
        }
        out.push(self.ledger.native_balance(&engine) as u128);
        out.push(self.ledger.events().len() as u128);
        out
    }
}
