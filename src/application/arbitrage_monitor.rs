//! Мониторинг арбитража: periodic scan for profitable round trips

use std::time::Duration;

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info, warn};

use super::FlashLoanArbitrage;
use crate::domain::arbitrage::GateDecision;
use crate::domain::dex::{PriceOracle, RoundTripPlan};
use crate::domain::execution::LendingPool;
use crate::infrastructure::ledger::Ledger;

/// Конфигурация мониторинга
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub interval_ms: u64,
    /// Stop after this many rounds; `None` runs until the task is dropped
    pub max_rounds: Option<u64>,
    pub auto_execute: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            max_rounds: None,
            auto_execute: false,
        }
    }
}

/// Статистика мониторинга
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    pub rounds: u64,
    pub opportunities_found: u64,
    pub trades_executed: u64,
    pub failed_trades: u64,
    pub total_profit: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct Opportunity {
    pub plan: RoundTripPlan,
    pub decision: GateDecision,
    pub premium: u128,
}

/// Trade the monitor watches: borrow `amount` of `asset`, route through `counter_asset`
#[derive(Debug, Clone, Copy)]
pub struct WatchedTrade {
    pub asset: Pubkey,
    pub counter_asset: Pubkey,
    pub amount: u128,
}

pub struct ArbitrageMonitor<'a> {
    engine: &'a FlashLoanArbitrage,
    config: MonitorConfig,
}

impl<'a> ArbitrageMonitor<'a> {
    pub fn new(engine: &'a FlashLoanArbitrage, config: MonitorConfig) -> Self {
        Self { engine, config }
    }

    /// Best round trip over trusted venues and the gate's verdict on it
    pub fn scan(&self, ledger: &Ledger, trade: &WatchedTrade) -> Option<Opportunity> {
        let engine = self.engine;
        let cfg = engine.config();
        let plan = PriceOracle::new(engine.venues()).plan_round_trip(
            ledger,
            &trade.asset,
            &trade.counter_asset,
            trade.amount,
            cfg.max_slippage_bps,
            |venue| engine.is_trusted(venue),
        )?;
        let premium = engine.pool.premium_for(trade.amount).ok()?;
        let decision = engine.gate().evaluate(
            &plan.quote_buy,
            &plan.quote_sell,
            trade.amount,
            premium,
            cfg.min_profit_bps,
            cfg.max_slippage_bps,
        );
        Some(Opportunity { plan, decision, premium })
    }

    /// One monitoring round; executes the opportunity when configured to
    pub fn tick(&self, ledger: &mut Ledger, caller: &Pubkey, trade: &WatchedTrade, stats: &mut MonitorStats) {
        stats.rounds += 1;
        let opportunity = match self.scan(ledger, trade) {
            Some(o) if o.decision.proceed => o,
            Some(o) => {
                debug!("🔍 Round {}: best route {} bps, below threshold", stats.rounds, o.decision.expected_profit_bps);
                return;
            }
            None => {
                debug!("🔍 Round {}: no route", stats.rounds);
                return;
            }
        };
        stats.opportunities_found += 1;
        info!(
            "🎯 Round {}: {} -> {} expected {} bps",
            stats.rounds,
            opportunity.plan.params.venue_a,
            opportunity.plan.params.venue_b,
            opportunity.decision.expected_profit_bps
        );
        if !self.config.auto_execute {
            return;
        }

        let before = self.engine.balance(ledger, &trade.asset);
        match self
            .engine
            .execute_arbitrage_flash_loan(ledger, caller, &trade.asset, trade.amount, &opportunity.plan.params)
        {
            Ok(()) => {
                stats.trades_executed += 1;
                stats.total_profit += self.engine.balance(ledger, &trade.asset).saturating_sub(before);
            }
            Err(e) => {
                stats.failed_trades += 1;
                warn!("❌ Execution failed: {}", e);
            }
        }
        // Long-running: events are logged, never accumulated
        for recorded in ledger.drain_events() {
            info!("📣 {:?}", recorded.event);
        }
    }

    pub async fn run(&self, ledger: &mut Ledger, caller: &Pubkey, trade: WatchedTrade) -> MonitorStats {
        let mut stats = MonitorStats::default();
        let mut interval = tokio::time::interval(Duration::from_millis(self.config.interval_ms.max(1)));
        info!(
            "👀 Monitoring {} -> {} with {} venues every {}ms",
            trade.asset,
            trade.counter_asset,
            self.engine.venues().len(),
            self.config.interval_ms
        );
        loop {
            interval.tick().await;
            self.tick(ledger, caller, &trade, &mut stats);
            if let Some(max) = self.config.max_rounds {
                if stats.rounds >= max {
                    break;
                }
            }
        }
        info!(
            "📊 Monitor finished: {} rounds, {} opportunities, {} executed, {} failed",
            stats.rounds, stats.opportunities_found, stats.trades_executed, stats.failed_trades
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::World;

    fn trade(world: &World) -> WatchedTrade {
        WatchedTrade {
            asset: world.dai.mint,
            counter_asset: world.usdc.mint,
            amount: world.dai.units(1000),
        }
    }

    #[test]
    fn test_scan_finds_scenario_route() {
        let world = World::scenario_a();
        let monitor = ArbitrageMonitor::new(&world.engine, MonitorConfig::default());
        let opportunity = monitor.scan(&world.ledger, &trade(&world)).unwrap();
        assert_eq!(opportunity.plan.params.venue_a, world.venue_a);
        assert_eq!(opportunity.plan.params.venue_b, world.venue_b);
        assert_eq!(opportunity.decision.expected_profit_bps, 15);
        assert_eq!(opportunity.premium, world.dai.units(1) / 2);
        assert!(opportunity.decision.proceed);
    }

    #[tokio::test]
    async fn test_run_executes_and_counts() {
        let mut world = World::scenario_a();
        let t = trade(&world);
        let config = MonitorConfig {
            interval_ms: 1,
            max_rounds: Some(2),
            auto_execute: true,
        };
        let monitor = ArbitrageMonitor::new(&world.engine, config);
        let stats = monitor.run(&mut world.ledger, &world.owner, t).await;

        // Fixed-rate venues do not move, so both rounds trade
        assert_eq!(stats.rounds, 2);
        assert_eq!(stats.trades_executed, 2);
        assert_eq!(stats.total_profit, world.dai.units(3));
        assert!(world.ledger.events().is_empty());
    }

    #[tokio::test]
    async fn test_run_without_auto_execute_only_observes() {
        let mut world = World::scenario_a();
        let t = trade(&world);
        let config = MonitorConfig {
            interval_ms: 1,
            max_rounds: Some(3),
            auto_execute: false,
        };
        let snapshot = world.snapshot();
        let monitor = ArbitrageMonitor::new(&world.engine, config);
        let stats = monitor.run(&mut world.ledger, &world.owner, t).await;
        assert_eq!(stats.opportunities_found, 3);
        assert_eq!(stats.trades_executed, 0);
        assert_eq!(world.snapshot(), snapshot);
    }
}
