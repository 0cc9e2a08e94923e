//! Infrastructure layer - ledger state and the simulated lending pool

pub mod ledger;
pub mod lending_pool;

pub use ledger::Ledger;
pub use lending_pool::SimulatedLendingPool;
