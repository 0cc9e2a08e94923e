//! Execution domain - flash-loan interfaces and swap execution

mod flash_loan;
mod swap_executor;

pub use flash_loan::{CallContext, FlashLoanReceiver, LendingPool, LoanContext};
pub use swap_executor::{LegOrder, SwapExecutor};
