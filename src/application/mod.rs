//! Application layer - the flash-loan arbitrage engine and its use cases

pub mod arbitrage_monitor;
mod callback;
mod flash_loan_arbitrage;
mod treasury;

#[cfg(test)]
pub(crate) mod fixtures;

pub use arbitrage_monitor::{ArbitrageMonitor, MonitorConfig, MonitorStats, Opportunity, WatchedTrade};
pub use flash_loan_arbitrage::{EngineConfig, FlashLoanArbitrage};
