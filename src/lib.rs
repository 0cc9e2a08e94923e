//! Flashloan-arb - flash-loan funded two-venue arbitrage engine
//! Built with Domain-Driven Design principles

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod math;
pub mod shared;

// Re-export main types for convenience
pub use application::{EngineConfig, FlashLoanArbitrage};
pub use domain::arbitrage::{ProfitabilityGate, StrategyParams};
pub use domain::dex::{PriceOracle, Venue, VenueRegistry};
pub use domain::execution::{FlashLoanReceiver, LendingPool};
pub use infrastructure::{Ledger, SimulatedLendingPool};
pub use shared::errors::ArbitrageError;
