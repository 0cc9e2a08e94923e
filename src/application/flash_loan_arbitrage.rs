//! Flash-loan arbitrage engine: configuration, loan entry points and views.
//!
//! The engine never trades on its own initiative. An owner call requests a
//! loan from the pool; all trading happens inside the pool's callback (see
//! `callback.rs`), and the whole borrow-swap-repay sequence commits or
//! reverts as one ledger operation.

use std::collections::HashSet;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::domain::arbitrage::{ProfitabilityGate, StrategyParams};
use crate::domain::dex::{PriceOracle, Quote, VenueRegistry};
use crate::domain::execution::{LendingPool, SwapExecutor};
use crate::infrastructure::ledger::Ledger;
use crate::math::BPS_DENOMINATOR;
use crate::shared::errors::ArbitrageError;
use crate::shared::utils::generate_id;

/// Engine configuration, fixed at construction and changed only by owner setters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub owner: Pubkey,
    pub pool: Pubkey,
    pub min_profit_bps: u32,
    pub max_slippage_bps: u32,
    /// Round-trip venue fees assumed by the gate on top of quoted outputs
    pub venue_fee_budget_bps: u32,
    pub trusted_venues: HashSet<Pubkey>,
}

impl EngineConfig {
    pub fn new(owner: Pubkey, pool: Pubkey) -> Self {
        Self {
            owner,
            pool,
            min_profit_bps: 10,
            max_slippage_bps: 50,
            venue_fee_budget_bps: 0,
            trusted_venues: HashSet::new(),
        }
    }

    pub fn with_thresholds(mut self, min_profit_bps: u32, max_slippage_bps: u32) -> Self {
        self.min_profit_bps = min_profit_bps;
        self.max_slippage_bps = max_slippage_bps;
        self
    }

    pub fn with_venue_fee_budget(mut self, venue_fee_budget_bps: u32) -> Self {
        self.venue_fee_budget_bps = venue_fee_budget_bps;
        self
    }

    pub fn trust(mut self, venues: impl IntoIterator<Item = Pubkey>) -> Self {
        self.trusted_venues.extend(venues);
        self
    }

    pub fn validate(&self) -> Result<(), ArbitrageError> {
        if self.owner == Pubkey::default() {
            return Err(ArbitrageError::InvalidConfig("owner is the zero address".to_string()));
        }
        if self.pool == Pubkey::default() {
            return Err(ArbitrageError::InvalidConfig("pool is the zero address".to_string()));
        }
        check_bps("min_profit_bps", self.min_profit_bps)?;
        check_bps("max_slippage_bps", self.max_slippage_bps)?;
        check_bps("venue_fee_budget_bps", self.venue_fee_budget_bps)?;
        Ok(())
    }
}

pub(crate) fn check_bps(name: &str, value: u32) -> Result<(), ArbitrageError> {
    if value as u128 > BPS_DENOMINATOR {
        return Err(ArbitrageError::InvalidConfig(format!(
            "{} must be <= {}, got {}",
            name, BPS_DENOMINATOR, value
        )));
    }
    Ok(())
}

pub struct FlashLoanArbitrage {
    pub(crate) address: Pubkey,
    pub(crate) config: EngineConfig,
    pub(crate) pool: Arc<dyn LendingPool>,
    pub(crate) venues: VenueRegistry,
    pub(crate) executor: SwapExecutor,
}

impl FlashLoanArbitrage {
    pub fn new(
        address: Pubkey,
        config: EngineConfig,
        pool: Arc<dyn LendingPool>,
        venues: VenueRegistry,
    ) -> Result<Self, ArbitrageError> {
        if address == Pubkey::default() {
            return Err(ArbitrageError::InvalidConfig("engine is the zero address".to_string()));
        }
        config.validate()?;
        if config.pool != pool.address() {
            return Err(ArbitrageError::InvalidConfig(format!(
                "configured pool {} does not match lender {}",
                config.pool,
                pool.address()
            )));
        }
        info!(
            "🚀 Engine {} ready: {} venues, min profit {} bps, max slippage {} bps",
            address,
            venues.len(),
            config.min_profit_bps,
            config.max_slippage_bps
        );
        Ok(Self {
            address,
            config,
            pool,
            venues,
            executor: SwapExecutor::new(),
        })
    }

    pub(crate) fn only_owner(&self, caller: &Pubkey) -> Result<(), ArbitrageError> {
        if *caller != self.config.owner {
            return Err(ArbitrageError::NotOwner);
        }
        Ok(())
    }

    pub(crate) fn gate(&self) -> ProfitabilityGate {
        ProfitabilityGate::new(self.config.venue_fee_budget_bps)
    }

    /// Borrow `amount` of `asset` and repay it with the premium, without trading
    pub fn execute_flash_loan(
        &self,
        ledger: &mut Ledger,
        caller: &Pubkey,
        asset: &Pubkey,
        amount: u128,
    ) -> Result<(), ArbitrageError> {
        self.execute_multi_asset_flash_loan(ledger, caller, &[*asset], &[amount])
    }

    /// Plain flash loan over several assets at once
    pub fn execute_multi_asset_flash_loan(
        &self,
        ledger: &mut Ledger,
        caller: &Pubkey,
        assets: &[Pubkey],
        amounts: &[u128],
    ) -> Result<(), ArbitrageError> {
        self.only_owner(caller)?;
        if assets.is_empty() || assets.len() != amounts.len() {
            return Err(ArbitrageError::InvalidLoan(
                "assets and amounts must be non-empty and of equal length".to_string(),
            ));
        }
        if amounts.iter().any(|a| *a == 0) {
            return Err(ArbitrageError::InvalidLoan("zero loan amount".to_string()));
        }
        let op = generate_id();
        info!("⚡ [{}] Requesting flash loan of {:?} for {} assets", op, amounts, assets.len());
        ledger.atomic(|ledger| {
            self.pool
                .flash_loan(ledger, &self.address, self, assets, amounts, Vec::new())
        })?;
        info!("✅ [{}] Flash loan repaid", op);
        Ok(())
    }

    /// Borrow `amount` of `asset` and run the round trip described by `params`
    pub fn execute_arbitrage_flash_loan(
        &self,
        ledger: &mut Ledger,
        caller: &Pubkey,
        asset: &Pubkey,
        amount: u128,
        params: &StrategyParams,
    ) -> Result<(), ArbitrageError> {
        self.only_owner(caller)?;
        params.validate()?;
        if params.token_in != *asset {
            return Err(ArbitrageError::InvalidParams(format!(
                "token_in {} is not the borrowed asset {}",
                params.token_in, asset
            )));
        }
        if params.amount_in > amount {
            return Err(ArbitrageError::InvalidParams(format!(
                "amount_in {} exceeds loan {}",
                params.amount_in, amount
            )));
        }
        let encoded = params.encode()?;

        let op = generate_id();
        info!(
            "⚡ [{}] Requesting arbitrage flash loan of {} {} via {} -> {}",
            op, amount, asset, params.venue_a, params.venue_b
        );
        ledger.atomic(|ledger| {
            self.pool
                .flash_loan(ledger, &self.address, self, &[*asset], &[amount], encoded)
        })?;
        info!("💰 [{}] Arbitrage committed", op);
        Ok(())
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn owner(&self) -> Pubkey {
        self.config.owner
    }

    pub fn pool(&self) -> Pubkey {
        self.config.pool
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn venues(&self) -> &VenueRegistry {
        &self.venues
    }

    pub fn is_trusted(&self, venue: &Pubkey) -> bool {
        self.config.trusted_venues.contains(venue)
    }

    pub fn balance(&self, ledger: &Ledger, asset: &Pubkey) -> u128 {
        ledger.balance(asset, &self.address)
    }

    pub fn native_balance(&self, ledger: &Ledger) -> u64 {
        ledger.native_balance(&self.address)
    }

    /// Price of `amount_in` on one venue; 0 when the venue cannot quote
    pub fn quote(&self, ledger: &Ledger, venue: &Pubkey, token_in: &Pubkey, token_out: &Pubkey, amount_in: u128) -> u128 {
        PriceOracle::new(&self.venues)
            .quote(ledger, venue, token_in, token_out, amount_in)
            .amount_out
    }

    pub fn quote_all(&self, ledger: &Ledger, token_in: &Pubkey, token_out: &Pubkey, amount_in: u128) -> Vec<Quote> {
        PriceOracle::new(&self.venues).quote_all(ledger, token_in, token_out, amount_in)
    }
}

impl std::fmt::Debug for FlashLoanArbitrage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlashLoanArbitrage")
            .field("address", &self.address)
            .field("config", &self.config)
            .field("venues", &self.venues)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::World;

    #[test]
    fn test_construction_checks_pool_and_bps() {
        let world = World::scenario_a();
        let config = EngineConfig::new(world.owner, Pubkey::new_unique());
        let err = FlashLoanArbitrage::new(Pubkey::new_unique(), config, world.pool.clone(), VenueRegistry::new())
            .unwrap_err();
        assert!(matches!(err, ArbitrageError::InvalidConfig(_)));

        let config = EngineConfig::new(world.owner, world.pool.address()).with_thresholds(10_001, 50);
        assert!(FlashLoanArbitrage::new(Pubkey::new_unique(), config, world.pool.clone(), VenueRegistry::new()).is_err());
    }

    #[test]
    fn test_views() {
        let world = World::scenario_a();
        let engine = &world.engine;
        assert_eq!(engine.owner(), world.owner);
        assert_eq!(engine.pool(), world.pool.address());
        assert_eq!(engine.balance(&world.ledger, &world.dai.mint), 0);
        assert_eq!(
            engine.quote(&world.ledger, &world.venue_a, &world.dai.mint, &world.usdc.mint, world.dai.units(1000)),
            world.usdc.units(995)
        );
        assert_eq!(engine.quote_all(&world.ledger, &world.dai.mint, &world.usdc.mint, world.dai.units(1000)).len(), 2);
    }

    #[test]
    fn test_plain_flash_loan_pays_premium_from_holdings() {
        let mut world = World::scenario_a();
        let engine_address = world.engine.address();
        world.ledger.mint_to(&world.dai.mint, &engine_address, world.dai.units(1)).unwrap();

        world
            .engine
            .execute_flash_loan(&mut world.ledger, &world.owner, &world.dai.mint, world.dai.units(1000))
            .unwrap();

        // 5 bps of 1000 DAI
        assert_eq!(world.engine.balance(&world.ledger, &world.dai.mint), world.dai.units(1) / 2);
        let events = world.ledger.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0].event,
            crate::shared::types::EngineEvent::FlashLoanExecuted(s) if s.fee == world.dai.units(1) / 2
        ));
    }

    #[test]
    fn test_plain_flash_loan_without_premium_funds_reverts() {
        let mut world = World::scenario_a();
        let pool_before = world.ledger.balance(&world.dai.mint, &world.pool.address());
        let err = world
            .engine
            .execute_flash_loan(&mut world.ledger, &world.owner, &world.dai.mint, world.dai.units(1000))
            .unwrap_err();
        assert!(matches!(err, ArbitrageError::InsufficientFundsToRepay { .. }));
        assert_eq!(world.ledger.balance(&world.dai.mint, &world.pool.address()), pool_before);
        assert!(world.ledger.events().is_empty());
    }

    #[test]
    fn test_multi_asset_flash_loan() {
        let mut world = World::scenario_a();
        let engine_address = world.engine.address();
        world.ledger.mint_to(&world.dai.mint, &engine_address, world.dai.units(1)).unwrap();
        world.ledger.mint_to(&world.usdc.mint, &engine_address, world.usdc.units(1)).unwrap();

        world
            .engine
            .execute_multi_asset_flash_loan(
                &mut world.ledger,
                &world.owner,
                &[world.dai.mint, world.usdc.mint],
                &[world.dai.units(100), world.usdc.units(100)],
            )
            .unwrap();
        assert_eq!(world.ledger.events().len(), 2);
    }

    #[test]
    fn test_arbitrage_params_must_match_loan() {
        let mut world = World::scenario_a();
        let mut params = world.params();
        params.amount_in = world.dai.units(2000);
        let err = world
            .engine
            .execute_arbitrage_flash_loan(&mut world.ledger, &world.owner, &world.dai.mint, world.dai.units(1000), &params)
            .unwrap_err();
        assert!(matches!(err, ArbitrageError::InvalidParams(_)));

        let params = world.params();
        let err = world
            .engine
            .execute_arbitrage_flash_loan(&mut world.ledger, &world.owner, &world.usdc.mint, world.dai.units(1000), &params)
            .unwrap_err();
        assert!(matches!(err, ArbitrageError::InvalidParams(_)));
    }
}
