//! Error handling for the engine

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Errors raised by the in-process ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unknown token: {0}")]
    UnknownToken(Pubkey),

    #[error("Token already registered: {0}")]
    DuplicateToken(Pubkey),

    #[error("Token {mint} declares {decimals} decimals, at most {max} supported")]
    UnsupportedDecimals { mint: Pubkey, decimals: u8, max: u8 },

    #[error("Insufficient balance of {token} for {holder}: have {available}, need {required}")]
    InsufficientBalance {
        token: Pubkey,
        holder: Pubkey,
        available: u128,
        required: u128,
    },

    #[error("Insufficient allowance of {token} from {owner} to {spender}: have {available}, need {required}")]
    InsufficientAllowance {
        token: Pubkey,
        owner: Pubkey,
        spender: Pubkey,
        available: u128,
        required: u128,
    },

    #[error("Insufficient native balance for {holder}: have {available}, need {required}")]
    InsufficientNative {
        holder: Pubkey,
        available: u64,
        required: u64,
    },

    #[error("Balance overflow for {0}")]
    Overflow(Pubkey),
}

/// DEX-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DexError {
    #[error("Pair {token_in} -> {token_out} not supported by venue")]
    UnsupportedPair { token_in: Pubkey, token_out: Pubkey },

    #[error("Venue has zero reserves")]
    ZeroReserves,

    #[error("Insufficient liquidity: {0}")]
    InsufficientLiquidity(String),

    #[error("Math overflow in {0}")]
    MathOverflow(&'static str),

    #[error("Slippage tolerance exceeded: got {amount_out}, minimum {min_amount_out}")]
    SlippageExceeded { amount_out: u128, min_amount_out: u128 },

    #[error("Router deadline {deadline} passed at {now}")]
    DeadlineExpired { deadline: i64, now: i64 },

    #[error("Invalid router call data: {0}")]
    InvalidCallData(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Errors of a flash-loan operation or an admin call.
///
/// Every variant is fatal to the call that raised it: the enclosing
/// operation is rolled back as a whole.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbitrageError {
    #[error("Not owner")]
    NotOwner,

    #[error("Untrusted lender: {caller}")]
    UntrustedLender { caller: Pubkey },

    #[error("Untrusted initiator: {initiator}")]
    UntrustedInitiator { initiator: Pubkey },

    #[error("Unprofitable arbitrage: expected {expected_profit_bps} bps, required {required_bps} bps")]
    UnprofitableArbitrage {
        expected_profit_bps: i64,
        required_bps: u32,
    },

    #[error("Slippage exceeded on {venue}: got {amount_out}, minimum {min_amount_out}")]
    SlippageExceeded {
        venue: Pubkey,
        amount_out: u128,
        min_amount_out: u128,
    },

    #[error("Insufficient funds to repay: balance {balance}, owed {owed}")]
    InsufficientFundsToRepay { balance: u128, owed: u128 },

    #[error("Invalid strategy params: {0}")]
    InvalidParams(String),

    #[error("Invalid loan context: {0}")]
    InvalidLoan(String),

    #[error("Venue not trusted: {0}")]
    UntrustedVenue(Pubkey),

    #[error("Venue not registered: {0}")]
    UnknownVenue(Pubkey),

    #[error("Flash loan rejected by pool: {0}")]
    FlashLoanRejected(String),

    #[error("Nothing to withdraw for {0}")]
    NothingToWithdraw(Pubkey),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Params codec error: {0}")]
    Codec(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("DEX error: {0}")]
    Dex(#[from] DexError),
}

impl From<bincode::Error> for ArbitrageError {
    fn from(err: bincode::Error) -> Self {
        ArbitrageError::Codec(err.to_string())
    }
}

/// Configuration and operator-surface errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
