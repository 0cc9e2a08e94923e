//! Domain layer - core business logic and entities

pub mod arbitrage;
pub mod dex;
pub mod execution;
