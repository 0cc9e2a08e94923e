//! Owner-only administration: withdrawals and configuration setters

use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

use super::flash_loan_arbitrage::check_bps;
use super::FlashLoanArbitrage;
use crate::infrastructure::ledger::Ledger;
use crate::shared::errors::ArbitrageError;
use crate::shared::types::EngineEvent;

impl FlashLoanArbitrage {
    /// Send the whole balance of `asset` to the owner
    pub fn withdraw_profits(&self, ledger: &mut Ledger, caller: &Pubkey, asset: &Pubkey) -> Result<u128, ArbitrageError> {
        self.only_owner(caller)?;
        let amount = ledger.balance(asset, &self.address);
        if amount == 0 {
            return Err(ArbitrageError::NothingToWithdraw(*asset));
        }
        let owner = self.config.owner;
        ledger.atomic(|ledger| {
            ledger.transfer(asset, &self.address, &owner, amount)?;
            ledger.emit(EngineEvent::ProfitsWithdrawn {
                asset: *asset,
                to: owner,
                amount,
            });
            Ok::<_, ArbitrageError>(())
        })?;
        info!("💸 Withdrew {} of {} to owner", amount, asset);
        Ok(amount)
    }

    pub fn emergency_withdraw(
        &self,
        ledger: &mut Ledger,
        caller: &Pubkey,
        asset: &Pubkey,
        amount: u128,
    ) -> Result<(), ArbitrageError> {
        self.only_owner(caller)?;
        let owner = self.config.owner;
        ledger.atomic(|ledger| {
            ledger.transfer(asset, &self.address, &owner, amount)?;
            ledger.emit(EngineEvent::EmergencyWithdrawal {
                asset: *asset,
                to: owner,
                amount,
            });
            Ok::<_, ArbitrageError>(())
        })?;
        warn!("🚨 Emergency withdrawal of {} {}", amount, asset);
        Ok(())
    }

    /// Send every lamport the engine holds to the owner
    pub fn emergency_withdraw_native(&self, ledger: &mut Ledger, caller: &Pubkey) -> Result<u64, ArbitrageError> {
        self.only_owner(caller)?;
        let lamports = ledger.native_balance(&self.address);
        let owner = self.config.owner;
        ledger.atomic(|ledger| {
            ledger.transfer_native(&self.address, &owner, lamports)?;
            ledger.emit(EngineEvent::NativeWithdrawal { to: owner, lamports });
            Ok::<_, ArbitrageError>(())
        })?;
        warn!("🚨 Emergency withdrawal of {} lamports", lamports);
        Ok(lamports)
    }

    /// Anyone may send lamports to the engine
    pub fn receive_native(&self, ledger: &mut Ledger, from: &Pubkey, lamports: u64) -> Result<(), ArbitrageError> {
        ledger.transfer_native(from, &self.address, lamports)?;
        Ok(())
    }

    pub fn set_min_profit_bps(&mut self, caller: &Pubkey, bps: u32) -> Result<(), ArbitrageError> {
        self.only_owner(caller)?;
        check_bps("min_profit_bps", bps)?;
        self.config.min_profit_bps = bps;
        info!("⚙️  min_profit_bps = {}", bps);
        Ok(())
    }

    pub fn set_max_slippage_bps(&mut self, caller: &Pubkey, bps: u32) -> Result<(), ArbitrageError> {
        self.only_owner(caller)?;
        check_bps("max_slippage_bps", bps)?;
        self.config.max_slippage_bps = bps;
        info!("⚙️  max_slippage_bps = {}", bps);
        Ok(())
    }

    pub fn set_venue_fee_budget_bps(&mut self, caller: &Pubkey, bps: u32) -> Result<(), ArbitrageError> {
        self.only_owner(caller)?;
        check_bps("venue_fee_budget_bps", bps)?;
        self.config.venue_fee_budget_bps = bps;
        info!("⚙️  venue_fee_budget_bps = {}", bps);
        Ok(())
    }

    pub fn set_venue_trusted(&mut self, caller: &Pubkey, venue: &Pubkey, trusted: bool) -> Result<(), ArbitrageError> {
        self.only_owner(caller)?;
        if *venue == Pubkey::default() {
            return Err(ArbitrageError::InvalidConfig("venue is the zero address".to_string()));
        }
        if trusted {
            self.config.trusted_venues.insert(*venue);
        } else {
            self.config.trusted_venues.remove(venue);
        }
        info!("⚙️  venue {} trusted = {}", venue, trusted);
        Ok(())
    }
}
