//! Simulated Aave-style lending pool holding its liquidity on the ledger

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info, warn};

use crate::domain::execution::{CallContext, FlashLoanReceiver, LendingPool, LoanContext};
use crate::infrastructure::ledger::Ledger;
use crate::shared::errors::ArbitrageError;

/// Aave V3 default flash-loan premium
pub const DEFAULT_PREMIUM_BPS: u32 = 5;

#[derive(Debug, Clone)]
pub struct SimulatedLendingPool {
    address: Pubkey,
    premium_bps: u32,
}

impl SimulatedLendingPool {
    pub fn new(address: Pubkey, premium_bps: u32) -> Self {
        Self { address, premium_bps }
    }

    pub fn with_default_premium(address: Pubkey) -> Self {
        Self::new(address, DEFAULT_PREMIUM_BPS)
    }
}

impl LendingPool for SimulatedLendingPool {
    fn address(&self) -> Pubkey {
        self.address
    }

    fn premium_bps(&self) -> u32 {
        self.premium_bps
    }

    fn flash_loan(
        &self,
        ledger: &mut Ledger,
        initiator: &Pubkey,
        receiver: &dyn FlashLoanReceiver,
        assets: &[Pubkey],
        amounts: &[u128],
        params: Vec<u8>,
    ) -> Result<(), ArbitrageError> {
        if assets.is_empty() || assets.len() != amounts.len() {
            return Err(ArbitrageError::FlashLoanRejected(
                "assets and amounts must be non-empty and of equal length".to_string(),
            ));
        }
        let receiver_address = receiver.receiver_address();

        ledger.atomic(|ledger| {
            let mut premiums = Vec::with_capacity(assets.len());
            for (asset, amount) in assets.iter().zip(amounts) {
                if *amount == 0 {
                    return Err(ArbitrageError::FlashLoanRejected("zero amount".to_string()));
                }
                let liquidity = ledger.balance(asset, &self.address);
                if liquidity < *amount {
                    warn!("🏦 Pool liquidity {} below requested {}", liquidity, amount);
                    return Err(ArbitrageError::FlashLoanRejected(format!(
                        "insufficient pool liquidity for {}: {} < {}",
                        asset, liquidity, amount
                    )));
                }
                ledger.transfer(asset, &self.address, &receiver_address, *amount)?;
                premiums.push(self.premium_for(*amount)?);
            }

            let loan = LoanContext {
                assets: assets.to_vec(),
                amounts: amounts.to_vec(),
                premiums,
                initiator: *initiator,
                params,
            };
            debug!("🏦 Pool {} lent {:?}, premiums {:?}", self.address, loan.amounts, loan.premiums);

            let call = CallContext { caller: self.address };
            if !receiver.execute_operation(ledger, &call, &loan)? {
                return Err(ArbitrageError::FlashLoanRejected(
                    "receiver returned false".to_string(),
                ));
            }

            for ((asset, amount), premium) in loan.assets.iter().zip(&loan.amounts).zip(&loan.premiums) {
                let owed = amount + premium;
                ledger
                    .transfer_from(asset, &self.address, &receiver_address, &self.address, owed)
                    .map_err(|e| ArbitrageError::FlashLoanRejected(format!("repayment failed: {}", e)))?;
            }

            info!("🏦 Flash loan settled for {}", receiver_address);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::Token;
    use std::cell::RefCell;

    /// Receiver that repays with a fixed allowance and records what it saw
    struct RecordingReceiver {
        address: Pubkey,
        approve_extra: bool,
        seen: RefCell<Option<(CallContext, LoanContext)>>,
    }

    impl FlashLoanReceiver for RecordingReceiver {
        fn receiver_address(&self) -> Pubkey {
            self.address
        }

        fn execute_operation(
            &self,
            ledger: &mut Ledger,
            call: &CallContext,
            loan: &LoanContext,
        ) -> Result<bool, ArbitrageError> {
            *self.seen.borrow_mut() = Some((*call, loan.clone()));
            if self.approve_extra {
                let owed = loan.amounts[0] + loan.premiums[0];
                ledger.approve(&loan.assets[0], &self.address, &call.caller, owed)?;
            }
            Ok(true)
        }
    }

    fn setup() -> (Ledger, SimulatedLendingPool, Pubkey) {
        let mut ledger = Ledger::new();
        let mint = Pubkey::new_unique();
        ledger.register_token(Token::new(mint, "DAI", 18)).unwrap();
        let pool = SimulatedLendingPool::with_default_premium(Pubkey::new_unique());
        ledger.mint_to(&mint, &pool.address(), 1_000_000).unwrap();
        (ledger, pool, mint)
    }

    #[test]
    fn test_flash_loan_round_trip_charges_premium() {
        let (mut ledger, pool, mint) = setup();
        let receiver = RecordingReceiver {
            address: Pubkey::new_unique(),
            approve_extra: true,
            seen: RefCell::new(None),
        };
        ledger.mint_to(&mint, &receiver.address, 5).unwrap();

        pool.flash_loan(&mut ledger, &receiver.address, &receiver, &[mint], &[10_000], vec![]).unwrap();

        let (call, loan) = receiver.seen.borrow().clone().unwrap();
        assert_eq!(call.caller, pool.address());
        assert_eq!(loan.premiums, vec![5]);
        assert_eq!(loan.initiator, receiver.address);
        assert_eq!(ledger.balance(&mint, &pool.address()), 1_000_005);
        assert_eq!(ledger.balance(&mint, &receiver.address), 0);
    }

    #[test]
    fn test_missing_allowance_voids_loan() {
        let (mut ledger, pool, mint) = setup();
        let receiver = RecordingReceiver {
            address: Pubkey::new_unique(),
            approve_extra: false,
            seen: RefCell::new(None),
        };

        let err = pool
            .flash_loan(&mut ledger, &receiver.address, &receiver, &[mint], &[10_000], vec![])
            .unwrap_err();
        assert!(matches!(err, ArbitrageError::FlashLoanRejected(_)));
        assert_eq!(ledger.balance(&mint, &pool.address()), 1_000_000);
        assert_eq!(ledger.balance(&mint, &receiver.address), 0);
    }

    #[test]
    fn test_rejects_loan_above_liquidity() {
        let (mut ledger, pool, mint) = setup();
        let receiver = RecordingReceiver {
            address: Pubkey::new_unique(),
            approve_extra: true,
            seen: RefCell::new(None),
        };
        let err = pool
            .flash_loan(&mut ledger, &receiver.address, &receiver, &[mint], &[2_000_000], vec![])
            .unwrap_err();
        assert!(matches!(err, ArbitrageError::FlashLoanRejected(_)));
        assert!(receiver.seen.borrow().is_none());
    }
}
