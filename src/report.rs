// src/report.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flashloan_arb::shared::types::{Amount, EngineEvent, RecordedEvent, Token};
use flashloan_arb::shared::utils::format_call_data;

#[derive(Debug, Serialize, Deserialize)]
pub struct ArbitrageReport {
    pub operation_id: String,
    // Основные результаты
    pub profitable: bool,
    pub executed: bool,
    pub spread_bps: u128,
    pub expected_profit_bps: i64,
    pub min_amount_out: String,
    pub profit: Option<String>,
    pub error: Option<String>,

    // Детали арбитража
    pub loan: LoanDetails,
    pub route_a: Option<RouteDetails>,
    pub route_b: Option<RouteDetails>,
    pub events: Vec<EventDetails>,

    // Метаданные
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoanDetails {
    pub asset: TokenDetails,
    pub amount: String,
    pub premium_bps: u32,
    pub premium: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteDetails {
    pub venue: String,
    pub address: String,
    pub kind: String,
    pub fee_bps: u32,
    pub token_in: TokenDetails,
    pub token_out: TokenDetails,
    pub amount_in: String,
    pub amount_out: String,
    pub call_data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenDetails {
    pub mint: String,
    pub symbol: String,
    pub decimals: u8,
}

impl From<&Token> for TokenDetails {
    fn from(token: &Token) -> Self {
        Self {
            mint: token.mint.to_string(),
            symbol: token.symbol.clone(),
            decimals: token.decimals,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventDetails {
    pub timestamp: DateTime<Utc>,
    pub kind: String,
    pub detail: String,
}

impl From<&RecordedEvent> for EventDetails {
    fn from(recorded: &RecordedEvent) -> Self {
        let (kind, detail) = match &recorded.event {
            EngineEvent::FlashLoanExecuted(s) => (
                "FlashLoanExecuted",
                format!("asset={} borrowed={} fee={} repaid={}", s.asset, s.amount_borrowed, s.fee, s.amount_repaid),
            ),
            EngineEvent::ArbitrageExecuted {
                settlement,
                venue_a,
                venue_b,
                token_out,
            } => (
                "ArbitrageExecuted",
                format!(
                    "asset={} via {} -> {} ({}) borrowed={} fee={} profit={}",
                    settlement.asset,
                    venue_a,
                    venue_b,
                    token_out,
                    settlement.amount_borrowed,
                    settlement.fee,
                    settlement.profit
                ),
            ),
            EngineEvent::ProfitsWithdrawn { asset, to, amount } => {
                ("ProfitsWithdrawn", format!("asset={} to={} amount={}", asset, to, amount))
            }
            EngineEvent::EmergencyWithdrawal { asset, to, amount } => {
                ("EmergencyWithdrawal", format!("asset={} to={} amount={}", asset, to, amount))
            }
            EngineEvent::NativeWithdrawal { to, lamports } => {
                ("NativeWithdrawal", format!("to={} lamports={}", to, lamports))
            }
        };
        Self {
            timestamp: recorded.timestamp,
            kind: kind.to_string(),
            detail,
        }
    }
}

impl RouteDetails {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        venue: &str,
        address: String,
        kind: &str,
        fee_bps: u32,
        token_in: &Token,
        token_out: &Token,
        amount_in: u128,
        amount_out: u128,
        call_data: &[u8],
    ) -> Self {
        Self {
            venue: venue.to_string(),
            address,
            kind: kind.to_string(),
            fee_bps,
            token_in: token_in.into(),
            token_out: token_out.into(),
            amount_in: Amount::new(amount_in, token_in.decimals).to_string(),
            amount_out: Amount::new(amount_out, token_out.decimals).to_string(),
            call_data: format_call_data(call_data),
        }
    }
}

impl ArbitrageReport {
    pub fn new(operation_id: String, loan: LoanDetails) -> Self {
        Self {
            operation_id,
            profitable: false,
            executed: false,
            spread_bps: 0,
            expected_profit_bps: 0,
            min_amount_out: "0".to_string(),
            profit: None,
            error: None,
            loan,
            route_a: None,
            route_b: None,
            events: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_events(mut self, events: &[RecordedEvent]) -> Self {
        self.events = events.iter().map(EventDetails::from).collect();
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashloan_arb::shared::types::LoanSettlement;
    use solana_sdk::pubkey::Pubkey;

    #[test]
    fn test_arbitrage_report_creation() {
        let dai = Token::new(Pubkey::new_unique(), "DAI", 18);
        let usdc = Token::new(Pubkey::new_unique(), "USDC", 6);
        let loan = LoanDetails {
            asset: (&dai).into(),
            amount: Amount::new(dai.units(1000), 18).to_string(),
            premium_bps: 5,
            premium: Amount::new(dai.units(1) / 2, 18).to_string(),
        };
        let mut report = ArbitrageReport::new("op-1".to_string(), loan);
        report.route_a = Some(RouteDetails::new(
            "sushiswap",
            Pubkey::new_unique().to_string(),
            "Constant Product",
            30,
            &dai,
            &usdc,
            dai.units(1000),
            usdc.units(995),
            &[],
        ));
        let events = vec![RecordedEvent {
            timestamp: Utc::now(),
            event: EngineEvent::FlashLoanExecuted(LoanSettlement {
                asset: dai.mint,
                amount_borrowed: 10,
                fee: 1,
                amount_repaid: 11,
                profit: 0,
            }),
        }];
        let report = report.with_events(&events);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"op-1\""));
        assert!(json.contains("995.000000"));
        assert!(json.contains("FlashLoanExecuted"));
        assert!(json.contains("\"call_data\": \"0x\""));
    }
}
