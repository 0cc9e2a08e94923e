//! Arbitrage domain - strategy parameters and the profitability gate

mod profit_gate;
mod strategy_params;

pub use profit_gate::{GateDecision, ProfitabilityGate};
pub use strategy_params::StrategyParams;
