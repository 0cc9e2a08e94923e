//! Repayment callback run by the lending pool while the loan is outstanding

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info, warn};

use super::FlashLoanArbitrage;
use crate::domain::arbitrage::StrategyParams;
use crate::domain::dex::{Quote, Venue};
use crate::domain::execution::{CallContext, FlashLoanReceiver, LegOrder, LoanContext};
use crate::infrastructure::ledger::Ledger;
use crate::math::calculate_min_out;
use crate::shared::errors::ArbitrageError;
use crate::shared::types::{EngineEvent, LoanSettlement};

impl FlashLoanReceiver for FlashLoanArbitrage {
    fn receiver_address(&self) -> Pubkey {
        self.address
    }

    fn execute_operation(
        &self,
        ledger: &mut Ledger,
        call: &CallContext,
        loan: &LoanContext,
    ) -> Result<bool, ArbitrageError> {
        // Authenticate before touching anything
        if call.caller != self.config.pool {
            warn!("🛑 Callback from untrusted lender {}", call.caller);
            return Err(ArbitrageError::UntrustedLender { caller: call.caller });
        }
        if loan.initiator != self.address {
            warn!("🛑 Loan initiated by {}", loan.initiator);
            return Err(ArbitrageError::UntrustedInitiator {
                initiator: loan.initiator,
            });
        }
        if !loan.is_well_formed() {
            return Err(ArbitrageError::InvalidLoan(format!(
                "{} assets, {} amounts, {} premiums",
                loan.assets.len(),
                loan.amounts.len(),
                loan.premiums.len()
            )));
        }

        if loan.params.is_empty() {
            self.settle_plain(ledger, loan)?;
        } else {
            let params = StrategyParams::decode(&loan.params)?;
            self.run_arbitrage(ledger, loan, &params)?;
        }
        Ok(true)
    }
}

impl FlashLoanArbitrage {
    fn settle_plain(&self, ledger: &mut Ledger, loan: &LoanContext) -> Result<(), ArbitrageError> {
        for ((asset, amount), premium) in loan.assets.iter().zip(&loan.amounts).zip(&loan.premiums) {
            let owed = amount
                .checked_add(*premium)
                .ok_or_else(|| ArbitrageError::InvalidLoan("owed amount overflows".to_string()))?;
            let balance = ledger.balance(asset, &self.address);
            if balance < owed {
                return Err(ArbitrageError::InsufficientFundsToRepay { balance, owed });
            }
            ledger.approve(asset, &self.address, &self.config.pool, owed)?;
            ledger.emit(EngineEvent::FlashLoanExecuted(LoanSettlement {
                asset: *asset,
                amount_borrowed: *amount,
                fee: *premium,
                amount_repaid: owed,
                profit: 0,
            }));
            debug!("🔁 Plain loan of {} {} authorised for repayment of {}", amount, asset, owed);
        }
        Ok(())
    }

    fn trusted_venue(&self, address: &Pubkey) -> Result<&dyn Venue, ArbitrageError> {
        if !self.is_trusted(address) {
            return Err(ArbitrageError::UntrustedVenue(*address));
        }
        self.venues.get(address).ok_or(ArbitrageError::UnknownVenue(*address))
    }

    fn run_arbitrage(
        &self,
        ledger: &mut Ledger,
        loan: &LoanContext,
        params: &StrategyParams,
    ) -> Result<(), ArbitrageError> {
        if loan.assets.len() != 1 || loan.assets[0] != params.token_in {
            return Err(ArbitrageError::InvalidLoan(
                "arbitrage needs exactly one borrowed asset equal to token_in".to_string(),
            ));
        }
        params.validate()?;
        let asset = loan.assets[0];
        let amount = loan.amounts[0];
        let premium = loan.premiums[0];
        if params.amount_in > amount {
            return Err(ArbitrageError::InvalidParams(format!(
                "amount_in {} exceeds loan {}",
                params.amount_in, amount
            )));
        }
        let venue_a = self.trusted_venue(&params.venue_a)?;
        let venue_b = self.trusted_venue(&params.venue_b)?;

        let owed = amount
            .checked_add(premium)
            .ok_or_else(|| ArbitrageError::InvalidLoan("owed amount overflows".to_string()))?;
        // Holdings before the principal arrived
        let initial = ledger.balance(&asset, &self.address).saturating_sub(amount);

        let quote_a = venue_a.quote_full(ledger, &params.token_in, &params.token_out, params.amount_in);
        let quote_b = venue_b.quote_full(ledger, &params.token_out, &params.token_in, quote_a.amount_out);
        let decision = self.gate().evaluate(
            &quote_a,
            &quote_b,
            params.amount_in,
            premium,
            self.config.min_profit_bps,
            self.config.max_slippage_bps,
        );
        if !decision.proceed {
            info!(
                "📉 Rejected: expected {} bps, required {} bps",
                decision.expected_profit_bps, self.config.min_profit_bps
            );
            return Err(ArbitrageError::UnprofitableArbitrage {
                expected_profit_bps: decision.expected_profit_bps,
                required_bps: self.config.min_profit_bps,
            });
        }

        let leg_a = LegOrder {
            token_in: params.token_in,
            token_out: params.token_out,
            amount_in: params.amount_in,
            min_amount_out: params
                .min_amount_out
                .max(calculate_min_out(quote_a.amount_out, self.config.max_slippage_bps)),
            call_data: params.venue_call_data_a.clone(),
        };
        let received_a = self.executor.execute_leg(ledger, &self.address, venue_a, &leg_a)?;

        let leg_b = LegOrder {
            token_in: params.token_out,
            token_out: params.token_in,
            amount_in: received_a,
            min_amount_out: decision.min_amount_out,
            call_data: params.venue_call_data_b.clone(),
        };
        self.executor.execute_leg(ledger, &self.address, venue_b, &leg_b)?;

        let balance = ledger.balance(&asset, &self.address);
        if balance < owed {
            warn!("🛑 Balance {} cannot cover owed {}", balance, owed);
            return Err(ArbitrageError::InsufficientFundsToRepay { balance, owed });
        }
        let remaining = balance - owed;
        if remaining < initial {
            return Err(ArbitrageError::UnprofitableArbitrage {
                expected_profit_bps: decision.expected_profit_bps,
                required_bps: self.config.min_profit_bps,
            });
        }

        ledger.approve(&asset, &self.address, &self.config.pool, owed)?;
        let profit = remaining - initial;
        ledger.emit(EngineEvent::ArbitrageExecuted {
            settlement: LoanSettlement {
                asset,
                amount_borrowed: amount,
                fee: premium,
                amount_repaid: owed,
                profit,
            },
            venue_a: params.venue_a,
            venue_b: params.venue_b,
            token_out: params.token_out,
        });
        info!("💰 Round trip {} -> {} cleared, profit {}", venue_a.name(), venue_b.name(), profit);
        Ok(())
    }

    /// Expected outcome of `params` against current reserves, without trading
    pub fn preview(&self, ledger: &Ledger, params: &StrategyParams) -> (Quote, Quote) {
        let quote_a = self.quote_full(ledger, &params.venue_a, &params.token_in, &params.token_out, params.amount_in);
        let quote_b = self.quote_full(ledger, &params.venue_b, &params.token_out, &params.token_in, quote_a.amount_out);
        (quote_a, quote_b)
    }

    fn quote_full(&self, ledger: &Ledger, venue: &Pubkey, token_in: &Pubkey, token_out: &Pubkey, amount_in: u128) -> Quote {
        crate::domain::dex::PriceOracle::new(&self.venues).quote(ledger, venue, token_in, token_out, amount_in)
    }
}
