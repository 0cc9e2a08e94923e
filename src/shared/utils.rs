//! Utility functions and helpers

use solana_sdk::pubkey::Pubkey;

/// Shortened address for log lines
pub fn short_address(address: &Pubkey) -> String {
    let s = address.to_string();
    if s.len() <= 16 {
        return s;
    }
    format!("{}...{}", &s[..8], &s[s.len() - 8..])
}

/// Generate unique operation id
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Hex rendering of opaque call data, `0x` for empty
pub fn format_call_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Parse `0x`-prefixed (or bare) hex call data
pub fn parse_call_data(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.trim().trim_start_matches("0x"))
}
