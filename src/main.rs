mod app;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flashloan_arb::shared::config::{Settings, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(version, about = "Flash-loan funded two-venue arbitrage over a simulated market")]
struct Args {
    /// Path to the market and engine config
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Minimum expected profit in basis points (overrides config)
    #[arg(long)]
    min_profit_bps: Option<u32>,

    /// Slippage tolerance in basis points (overrides config)
    #[arg(long)]
    max_slippage_bps: Option<u32>,

    /// Round-trip venue fee budget in basis points (overrides config)
    #[arg(long)]
    venue_fee_budget_bps: Option<u32>,

    /// Flash-loan premium of the simulated pool (overrides config)
    #[arg(long)]
    premium_bps: Option<u32>,

    /// Write the JSON report here instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the best round trip for the configured trade and execute it
    Simulate {
        /// Loan size in whole units of the asset (overrides config)
        #[arg(long)]
        amount: Option<u64>,
        /// Only evaluate the gate, do not borrow
        #[arg(long)]
        dry_run: bool,
        /// Hex router payload for the buy leg, e.g. a bincode `RouterCall`
        #[arg(long)]
        call_data_a: Option<String>,
        /// Hex router payload for the sell leg
        #[arg(long)]
        call_data_b: Option<String>,
    },
    /// Borrow and repay without trading
    FlashLoan {
        #[arg(long)]
        asset: Option<String>,
        #[arg(long)]
        amount: Option<u64>,
    },
    /// Quote every venue for a pair
    Quote {
        #[arg(long)]
        token_in: String,
        #[arg(long)]
        token_out: String,
        /// Whole units of token_in
        #[arg(long)]
        amount: u64,
    },
    /// Poll the market and report (or execute) opportunities
    Monitor {
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
        /// Stop after this many rounds
        #[arg(long)]
        rounds: Option<u64>,
        /// Execute profitable opportunities as they appear
        #[arg(long)]
        execute: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = Settings::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    // CLI args > config file > defaults
    if let Some(bps) = args.min_profit_bps {
        settings.engine.min_profit_bps = bps;
    }
    if let Some(bps) = args.max_slippage_bps {
        settings.engine.max_slippage_bps = bps;
    }
    if let Some(bps) = args.venue_fee_budget_bps {
        settings.engine.venue_fee_budget_bps = bps;
    }
    if let Some(bps) = args.premium_bps {
        settings.pool.premium_bps = bps;
    }
    settings.validate().context("invalid configuration after CLI overrides")?;

    let mut market = app::Market::build(&settings)?;

    let output = match args.command {
        Command::Simulate {
            amount,
            dry_run,
            call_data_a,
            call_data_b,
        } => {
            let trade = market.trade(&settings, None, amount)?;
            let call_data = app::LegCallData::parse(call_data_a.as_deref(), call_data_b.as_deref())?;
            let report = app::simulate(&mut market, &trade, &call_data, dry_run)?;
            report.to_json()?
        }
        Command::FlashLoan { asset, amount } => {
            let trade = market.trade(&settings, asset.as_deref(), amount)?;
            let report = app::flash_loan(&mut market, &trade)?;
            report.to_json()?
        }
        Command::Quote {
            token_in,
            token_out,
            amount,
        } => {
            let quotes = app::quote(&market, &token_in, &token_out, amount)?;
            serde_json::to_string_pretty(&quotes)?
        }
        Command::Monitor {
            interval_ms,
            rounds,
            execute,
        } => {
            let trade = market.trade(&settings, None, None)?;
            let stats = app::monitor(&mut market, &trade, interval_ms, rounds, execute).await?;
            serde_json::to_string_pretty(&stats)?
        }
    };

    match args.report {
        Some(path) => {
            std::fs::write(&path, output).with_context(|| format!("writing report to {}", path.display()))?;
            tracing::info!("📝 Report written to {}", path.display());
        }
        None => println!("{}", output),
    }
    Ok(())
}
