//! Engine and market configuration loaded from `Config.toml`

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::dex::MAX_WEIGHT_EXPONENT;
use crate::shared::errors::AppError;
use crate::shared::types::MAX_DECIMALS;

pub const DEFAULT_CONFIG_PATH: &str = "Config.toml";

/// Profitability and slippage thresholds of the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineCfg {
    pub min_profit_bps: u32,
    pub max_slippage_bps: u32,
    #[serde(default)]
    pub venue_fee_budget_bps: u32,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            min_profit_bps: 10,
            max_slippage_bps: 50,
            venue_fee_budget_bps: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityCfg {
    pub symbol: String,
    pub amount: u64,
}

/// Simulated lending pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolCfg {
    pub premium_bps: u32,
    #[serde(default)]
    pub liquidity: Vec<LiquidityCfg>,
}

impl Default for PoolCfg {
    fn default() -> Self {
        Self {
            premium_bps: 5,
            liquidity: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCfg {
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueKind {
    ConstantProduct,
    WeightedPool,
    StableSwap,
}

/// One venue of the simulated market; reserves are in whole token units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueCfg {
    pub name: String,
    pub kind: VenueKind,
    pub token_a: String,
    pub token_b: String,
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub fee_bps: u32,
    pub weight_a: Option<u32>,
    pub weight_b: Option<u32>,
    pub amplification: Option<u64>,
    #[serde(default = "default_trusted")]
    pub trusted: bool,
}

fn default_trusted() -> bool {
    true
}

/// Trade the operator wants to attempt; amount in whole units of `asset`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeCfg {
    pub asset: String,
    pub counter_asset: String,
    pub amount: u64,
    /// Extra balance of `asset` pre-funded into the engine to cover fees
    #[serde(default)]
    pub prefund: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineCfg,
    #[serde(default)]
    pub pool: PoolCfg,
    #[serde(default)]
    pub tokens: Vec<TokenCfg>,
    #[serde(default)]
    pub venues: Vec<VenueCfg>,
    pub trade: Option<TradeCfg>,
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self, AppError> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    pub fn token(&self, symbol: &str) -> Option<&TokenCfg> {
        self.tokens.iter().find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for (name, bps) in [
            ("min_profit_bps", self.engine.min_profit_bps),
            ("max_slippage_bps", self.engine.max_slippage_bps),
            ("venue_fee_budget_bps", self.engine.venue_fee_budget_bps),
            ("premium_bps", self.pool.premium_bps),
        ] {
            if bps > crate::math::BPS_DENOMINATOR as u32 {
                return Err(AppError::ConfigError(format!("{} must be <= 10000, got {}", name, bps)));
            }
        }

        for token in &self.tokens {
            if token.decimals > MAX_DECIMALS {
                return Err(AppError::ConfigError(format!(
                    "Token {} declares {} decimals, at most {} supported",
                    token.symbol, token.decimals, MAX_DECIMALS
                )));
            }
        }

        for venue in &self.venues {
            for symbol in [&venue.token_a, &venue.token_b] {
                if self.token(symbol).is_none() {
                    return Err(AppError::ConfigError(format!(
                        "Venue {} references unknown token {}",
                        venue.name, symbol
                    )));
                }
            }
            if venue.token_a.eq_ignore_ascii_case(&venue.token_b) {
                return Err(AppError::ConfigError(format!("Venue {} trades a token against itself", venue.name)));
            }
            match venue.kind {
                VenueKind::WeightedPool if venue.weight_a.is_none() || venue.weight_b.is_none() => {
                    return Err(AppError::ConfigError(format!("Weighted venue {} needs weight_a and weight_b", venue.name)));
                }
                VenueKind::WeightedPool
                    if [venue.weight_a, venue.weight_b]
                        .iter()
                        .flatten()
                        .any(|w| *w == 0 || *w > MAX_WEIGHT_EXPONENT) =>
                {
                    return Err(AppError::ConfigError(format!(
                        "Weighted venue {} weights must be within 1..={}",
                        venue.name, MAX_WEIGHT_EXPONENT
                    )));
                }
                VenueKind::StableSwap if venue.amplification.is_none() => {
                    return Err(AppError::ConfigError(format!("Stable venue {} needs amplification", venue.name)));
                }
                _ => {}
            }
        }

        for liquidity in &self.pool.liquidity {
            if self.token(&liquidity.symbol).is_none() {
                return Err(AppError::ConfigError(format!("Pool liquidity for unknown token {}", liquidity.symbol)));
            }
        }

        if let Some(trade) = &self.trade {
            for symbol in [&trade.asset, &trade.counter_asset] {
                if self.token(symbol).is_none() {
                    return Err(AppError::ConfigError(format!("Trade references unknown token {}", symbol)));
                }
            }
        }

        Ok(())
    }
}
