// src/app.rs
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tracing::{error, info, warn};

use flashloan_arb::application::{ArbitrageMonitor, MonitorConfig, MonitorStats, WatchedTrade};
use flashloan_arb::domain::dex::{ConstantProductVenue, Quote, StableSwapVenue, Venue, VenueRegistry, WeightedPoolVenue};
use flashloan_arb::domain::execution::LendingPool;
use flashloan_arb::shared::config::{Settings, VenueCfg, VenueKind};
use flashloan_arb::shared::types::{Amount, EngineEvent, Token};
use flashloan_arb::shared::utils::{generate_id, parse_call_data, short_address};
use flashloan_arb::{EngineConfig, FlashLoanArbitrage, Ledger, SimulatedLendingPool};

use crate::report::{ArbitrageReport, LoanDetails, RouteDetails};

/// In-memory market built from the config: tokens, pool, venues and the engine
pub struct Market {
    pub ledger: Ledger,
    pub engine: FlashLoanArbitrage,
    pub owner: Pubkey,
    pub pool: Arc<SimulatedLendingPool>,
    tokens: HashMap<String, Token>,
}

/// Opaque router payloads for the two legs, hex-decoded from the CLI
#[derive(Debug, Clone, Default)]
pub struct LegCallData {
    pub venue_a: Vec<u8>,
    pub venue_b: Vec<u8>,
}

impl LegCallData {
    pub fn parse(venue_a: Option<&str>, venue_b: Option<&str>) -> Result<Self> {
        let decode = |raw: Option<&str>, leg: &str| -> Result<Vec<u8>> {
            match raw {
                Some(s) => parse_call_data(s).with_context(|| format!("call data for {} is not hex", leg)),
                None => Ok(Vec::new()),
            }
        };
        Ok(Self {
            venue_a: decode(venue_a, "venue A")?,
            venue_b: decode(venue_b, "venue B")?,
        })
    }
}

/// Trade resolved against the market's tokens
#[derive(Debug, Clone)]
pub struct Trade {
    pub asset: Token,
    pub counter_asset: Token,
    pub amount: u128,
}

impl Market {
    pub fn build(settings: &Settings) -> Result<Self> {
        let mut ledger = Ledger::new();
        let mut tokens = HashMap::new();
        for cfg in &settings.tokens {
            let token = Token::new(Pubkey::new_unique(), cfg.symbol.clone(), cfg.decimals);
            ledger.register_token(token.clone())?;
            tokens.insert(cfg.symbol.to_ascii_uppercase(), token);
        }
        let lookup = |symbol: &str| -> Result<Token> {
            tokens
                .get(&symbol.to_ascii_uppercase())
                .cloned()
                .ok_or_else(|| anyhow!("unknown token {}", symbol))
        };

        let pool = Arc::new(SimulatedLendingPool::new(Pubkey::new_unique(), settings.pool.premium_bps));
        for liquidity in &settings.pool.liquidity {
            let token = lookup(&liquidity.symbol)?;
            ledger.mint_to(&token.mint, &pool.address(), raw_units(&token, liquidity.amount)?)?;
        }
        info!("🏦 Pool {} with premium {} bps", short_address(&pool.address()), settings.pool.premium_bps);

        let mut registry = VenueRegistry::new();
        let mut trusted = Vec::new();
        for cfg in &settings.venues {
            let a = lookup(&cfg.token_a)?;
            let b = lookup(&cfg.token_b)?;
            let address = Pubkey::new_unique();
            let venue = build_venue(cfg, address, &a, &b)?;
            ledger.mint_to(&a.mint, &address, raw_units(&a, cfg.reserve_a)?)?;
            ledger.mint_to(&b.mint, &address, raw_units(&b, cfg.reserve_b)?)?;
            if cfg.trusted {
                trusted.push(address);
            }
            info!(
                "📋 {} ({}) {}/{} reserves {}/{}",
                cfg.name, venue.label(), a.symbol, b.symbol, cfg.reserve_a, cfg.reserve_b
            );
            registry.register(venue)?;
        }

        let owner = Pubkey::new_unique();
        let config = EngineConfig::new(owner, pool.address())
            .with_thresholds(settings.engine.min_profit_bps, settings.engine.max_slippage_bps)
            .with_venue_fee_budget(settings.engine.venue_fee_budget_bps)
            .trust(trusted);
        let engine = FlashLoanArbitrage::new(Pubkey::new_unique(), config, pool.clone(), registry)?;

        if let Some(trade) = &settings.trade {
            if trade.prefund > 0 {
                let token = lookup(&trade.asset)?;
                ledger.mint_to(&token.mint, &engine.address(), raw_units(&token, trade.prefund)?)?;
                info!("💰 Pre-funded engine with {} {}", trade.prefund, token.symbol);
            }
        }

        Ok(Self {
            ledger,
            engine,
            owner,
            pool,
            tokens,
        })
    }

    pub fn token(&self, symbol: &str) -> Result<&Token> {
        self.tokens
            .get(&symbol.to_ascii_uppercase())
            .ok_or_else(|| anyhow!("unknown token {}", symbol))
    }

    fn token_by_mint(&self, mint: &Pubkey) -> Option<&Token> {
        self.tokens.values().find(|t| t.mint == *mint)
    }

    /// Trade from `[trade]` with optional CLI overrides
    pub fn trade(&self, settings: &Settings, asset: Option<&str>, amount: Option<u64>) -> Result<Trade> {
        let cfg = settings.trade.as_ref().context("config has no [trade] section")?;
        let asset = self.token(asset.unwrap_or(&cfg.asset))?.clone();
        let counter_asset = self.token(&cfg.counter_asset)?.clone();
        let amount = raw_units(&asset, amount.unwrap_or(cfg.amount))?;
        Ok(Trade {
            asset,
            counter_asset,
            amount,
        })
    }

    fn route_details(&self, quote: &Quote, call_data: &[u8]) -> Option<RouteDetails> {
        let Quote {
            venue,
            token_in,
            token_out,
            amount_in,
            amount_out,
        } = quote;
        let v = self.engine.venues().get(venue)?;
        Some(RouteDetails::new(
            v.name(),
            venue.to_string(),
            v.label().as_str(),
            v.fee_bps(),
            self.token_by_mint(token_in)?,
            self.token_by_mint(token_out)?,
            *amount_in,
            *amount_out,
            call_data,
        ))
    }

    fn loan_details(&self, trade: &Trade) -> Result<LoanDetails> {
        let premium = self.pool.premium_for(trade.amount)?;
        Ok(LoanDetails {
            asset: (&trade.asset).into(),
            amount: Amount::new(trade.amount, trade.asset.decimals).to_string(),
            premium_bps: self.pool.premium_bps(),
            premium: Amount::new(premium, trade.asset.decimals).to_string(),
        })
    }
}

/// Whole units from config or CLI into raw units, refusing overflow
fn raw_units(token: &Token, whole: u64) -> Result<u128> {
    token
        .checked_units(whole as u128)
        .with_context(|| format!("{} {} overflows raw units", whole, token.symbol))
}

fn build_venue(cfg: &VenueCfg, address: Pubkey, a: &Token, b: &Token) -> Result<Box<dyn Venue>> {
    let venue: Box<dyn Venue> = match cfg.kind {
        VenueKind::ConstantProduct => Box::new(ConstantProductVenue::new(&cfg.name, address, a.mint, b.mint, cfg.fee_bps)),
        VenueKind::WeightedPool => {
            let weight_a = cfg.weight_a.with_context(|| format!("{} needs weight_a", cfg.name))?;
            let weight_b = cfg.weight_b.with_context(|| format!("{} needs weight_b", cfg.name))?;
            Box::new(WeightedPoolVenue::new(
                &cfg.name,
                address,
                (a.mint, weight_a),
                (b.mint, weight_b),
                cfg.fee_bps,
            ))
        }
        VenueKind::StableSwap => {
            let amplification = cfg.amplification.with_context(|| format!("{} needs amplification", cfg.name))?;
            Box::new(StableSwapVenue::new(&cfg.name, address, a.mint, b.mint, amplification, cfg.fee_bps))
        }
    };
    Ok(venue)
}

pub fn simulate(market: &mut Market, trade: &Trade, call_data: &LegCallData, dry_run: bool) -> Result<ArbitrageReport> {
    let operation_id = generate_id();
    info!(
        "🔍 [{}] Looking for a round trip {} -> {} -> {} of {}",
        operation_id,
        trade.asset.symbol,
        trade.counter_asset.symbol,
        trade.asset.symbol,
        Amount::new(trade.amount, trade.asset.decimals)
    );
    let mut report = ArbitrageReport::new(operation_id.clone(), market.loan_details(trade)?);

    let watched = WatchedTrade {
        asset: trade.asset.mint,
        counter_asset: trade.counter_asset.mint,
        amount: trade.amount,
    };
    let opportunity = {
        let monitor = ArbitrageMonitor::new(&market.engine, MonitorConfig::default());
        monitor.scan(&market.ledger, &watched)
    };
    let opportunity = match opportunity {
        Some(o) => o,
        None => {
            warn!("❌ [{}] No pair of trusted venues quotes this route", operation_id);
            report.error = Some("no route".to_string());
            return Ok(report);
        }
    };

    let plan = &opportunity.plan;
    let mut params = plan.params.clone();
    params.venue_call_data_a = call_data.venue_a.clone();
    params.venue_call_data_b = call_data.venue_b.clone();
    report.profitable = opportunity.decision.proceed;
    report.spread_bps = opportunity.decision.spread_bps;
    report.expected_profit_bps = opportunity.decision.expected_profit_bps;
    report.min_amount_out = Amount::new(opportunity.decision.min_amount_out, trade.asset.decimals).to_string();
    report.route_a = market.route_details(&plan.quote_buy, &params.venue_call_data_a);
    report.route_b = market.route_details(&plan.quote_sell, &params.venue_call_data_b);

    if dry_run {
        info!("🧪 [{}] Dry run: gate says {}", operation_id, opportunity.decision.proceed);
        return Ok(report);
    }

    // Submit even when the gate rejects: the engine re-checks and reverts
    let before = market.engine.balance(&market.ledger, &trade.asset.mint);
    let owner = market.owner;
    match market.engine.execute_arbitrage_flash_loan(
        &mut market.ledger,
        &owner,
        &trade.asset.mint,
        trade.amount,
        &params,
    ) {
        Ok(()) => {
            let profit = market.engine.balance(&market.ledger, &trade.asset.mint).saturating_sub(before);
            report.executed = true;
            report.profit = Some(Amount::new(profit, trade.asset.decimals).to_string());
            info!("✅ [{}] Profit {} {}", operation_id, Amount::new(profit, trade.asset.decimals), trade.asset.symbol);
        }
        Err(e) => {
            error!("❌ [{}] Reverted: {}", operation_id, e);
            report.error = Some(e.to_string());
        }
    }
    Ok(report.with_events(&market.ledger.drain_events()))
}

pub fn flash_loan(market: &mut Market, trade: &Trade) -> Result<ArbitrageReport> {
    let operation_id = generate_id();
    let mut report = ArbitrageReport::new(operation_id.clone(), market.loan_details(trade)?);
    let owner = market.owner;
    match market
        .engine
        .execute_flash_loan(&mut market.ledger, &owner, &trade.asset.mint, trade.amount)
    {
        Ok(()) => {
            report.executed = true;
            info!("✅ [{}] Flash loan of {} {} repaid", operation_id, Amount::new(trade.amount, trade.asset.decimals), trade.asset.symbol);
        }
        Err(e) => {
            error!("❌ [{}] Flash loan reverted: {}", operation_id, e);
            report.error = Some(e.to_string());
        }
    }
    let events = market.ledger.drain_events();
    if let Some(EngineEvent::FlashLoanExecuted(settlement)) = events.first().map(|e| &e.event) {
        report.profit = Some(Amount::new(settlement.profit, trade.asset.decimals).to_string());
    }
    Ok(report.with_events(&events))
}

#[derive(Debug, Serialize)]
pub struct QuoteLine {
    pub venue: String,
    pub kind: String,
    pub address: String,
    pub amount_in: String,
    pub amount_out: String,
}

pub fn quote(market: &Market, token_in: &str, token_out: &str, amount: u64) -> Result<Vec<QuoteLine>> {
    let token_in = market.token(token_in)?;
    let token_out = market.token(token_out)?;
    let amount_in = raw_units(token_in, amount)?;
    let quotes = market
        .engine
        .quote_all(&market.ledger, &token_in.mint, &token_out.mint, amount_in);
    if quotes.is_empty() {
        warn!("❌ No venue lists {}/{}", token_in.symbol, token_out.symbol);
    }
    Ok(quotes
        .into_iter()
        .filter_map(|q| {
            let venue = market.engine.venues().get(&q.venue)?;
            Some(QuoteLine {
                venue: venue.name().to_string(),
                kind: venue.label().to_string(),
                address: q.venue.to_string(),
                amount_in: Amount::new(q.amount_in, token_in.decimals).to_string(),
                amount_out: Amount::new(q.amount_out, token_out.decimals).to_string(),
            })
        })
        .collect())
}

pub async fn monitor(
    market: &mut Market,
    trade: &Trade,
    interval_ms: u64,
    rounds: Option<u64>,
    execute: bool,
) -> Result<MonitorStats> {
    let config = MonitorConfig {
        interval_ms,
        max_rounds: rounds,
        auto_execute: execute,
    };
    let watched = WatchedTrade {
        asset: trade.asset.mint,
        counter_asset: trade.counter_asset.mint,
        amount: trade.amount,
    };
    let owner = market.owner;
    let monitor = ArbitrageMonitor::new(&market.engine, config);
    let stats = monitor.run(&mut market.ledger, &owner, watched).await;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashloan_arb::domain::dex::RouterCall;
    use flashloan_arb::shared::utils::format_call_data;

    const CONFIG: &str = r#"
        [engine]
        min_profit_bps = 10
        max_slippage_bps = 50

        [pool]
        premium_bps = 5
        liquidity = [{ symbol = "DAI", amount = 10000000 }]

        [[tokens]]
        symbol = "DAI"
        decimals = 18

        [[tokens]]
        symbol = "USDC"
        decimals = 6

        [[venues]]
        name = "sushiswap"
        kind = "constant_product"
        token_a = "DAI"
        token_b = "USDC"
        reserve_a = 1000000
        reserve_b = 1030000
        fee_bps = 30

        [[venues]]
        name = "curve"
        kind = "stable_swap"
        token_a = "DAI"
        token_b = "USDC"
        reserve_a = 5000000
        reserve_b = 5000000
        fee_bps = 4
        amplification = 200

        [trade]
        asset = "DAI"
        counter_asset = "USDC"
        amount = 10000
        prefund = 10
    "#;

    fn market() -> (Settings, Market) {
        let settings = Settings::from_toml(CONFIG).unwrap();
        let market = Market::build(&settings).unwrap();
        (settings, market)
    }

    #[test]
    fn test_build_market_from_config() {
        let (settings, market) = market();
        let dai = market.token("dai").unwrap().clone();
        assert_eq!(market.engine.venues().len(), 2);
        assert_eq!(market.engine.balance(&market.ledger, &dai.mint), dai.units(10));
        assert_eq!(market.ledger.balance(&dai.mint, &market.pool.address()), dai.units(10_000_000));
        let trade = market.trade(&settings, None, Some(500)).unwrap();
        assert_eq!(trade.amount, dai.units(500));
    }

    #[test]
    fn test_quote_lists_both_venues() {
        let (_, market) = market();
        let lines = quote(&market, "DAI", "USDC", 1000).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(quote(&market, "DAI", "WBTC", 1).is_err());
    }

    #[test]
    fn test_simulate_executes_depeg_round_trip() {
        // USDC is cheap on sushiswap: buy it there, sell on curve
        let (settings, mut market) = market();
        let trade = market.trade(&settings, None, None).unwrap();
        let report = simulate(&mut market, &trade, &LegCallData::default(), false).unwrap();
        assert!(report.profitable, "{:?}", report);
        assert!(report.executed, "{:?}", report.error);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.route_a.as_ref().unwrap().venue, "sushiswap");
    }

    #[test]
    fn test_simulate_forwards_router_call_data() {
        let (settings, mut market) = market();
        let trade = market.trade(&settings, None, None).unwrap();
        let expired = RouterCall::with_deadline(0).encode().unwrap();
        let hex = format_call_data(&expired);
        let call_data = LegCallData::parse(Some(&hex), None).unwrap();
        let report = simulate(&mut market, &trade, &call_data, false).unwrap();
        assert!(!report.executed);
        assert!(report.error.as_deref().unwrap().contains("deadline"), "{:?}", report.error);
        assert_eq!(report.route_a.as_ref().unwrap().call_data, hex);
        assert!(report.events.is_empty());

        assert!(LegCallData::parse(Some("0xzz"), None).is_err());
    }

    #[test]
    fn test_build_refuses_reserves_beyond_raw_range() {
        let wide = CONFIG.replacen("decimals = 18", "decimals = 36", 1);
        let settings = Settings::from_toml(&wide).unwrap();
        assert!(Market::build(&settings).is_err());
    }

    #[test]
    fn test_flash_loan_uses_prefund_for_premium() {
        let (settings, mut market) = market();
        let trade = market.trade(&settings, None, None).unwrap();
        let report = flash_loan(&mut market, &trade).unwrap();
        assert!(report.executed);
        let dai = market.token("DAI").unwrap();
        // 10 DAI prefund minus 5 DAI premium on 10_000
        assert_eq!(market.engine.balance(&market.ledger, &dai.mint), dai.units(5));
    }
}
