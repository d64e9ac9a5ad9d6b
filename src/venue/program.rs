//! PumpSwap program constants and PDAs
//!
//! # WARNING: These constants may change without notice
//! The program has been redeployed before. If transactions start failing,
//! these values may need to be updated.
//!
//! # How discriminators are calculated
//! Anchor uses the first 8 bytes of SHA-256("global:<instruction_name>")
//! as the instruction discriminator.

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// PumpSwap AMM program ID
pub const PUMPSWAP_PROGRAM_ID_STR: &str = "pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA";

lazy_static::lazy_static! {
    /// PumpSwap AMM program ID as Pubkey
    pub static ref PUMPSWAP_PROGRAM_ID: Pubkey =
        Pubkey::from_str(PUMPSWAP_PROGRAM_ID_STR).expect("Invalid PumpSwap program ID");
}

/// Instruction discriminators (first 8 bytes of instruction data)
/// Calculated as: SHA-256("global:<instruction_name>")[0..8]
#[allow(non_snake_case)]
pub mod DISCRIMINATORS {
    /// Buy instruction discriminator
    /// SHA-256("global:buy")[0..8]
    pub const BUY: [u8; 8] = [102, 6, 61, 18, 1, 218, 235, 234];

    /// Sell instruction discriminator
    /// SHA-256("global:sell")[0..8]
    pub const SELL: [u8; 8] = [51, 230, 133, 164, 1, 127, 131, 173];
}

/// Derive the pool's base token vault PDA
pub fn derive_base_vault(pool: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[b"base_token_account", pool.as_ref()],
        &PUMPSWAP_PROGRAM_ID,
    )
}

/// Derive the pool's quote token vault PDA
pub fn derive_quote_vault(pool: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[b"quote_token_account", pool.as_ref()],
        &PUMPSWAP_PROGRAM_ID,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_id_parses() {
        assert_eq!(PUMPSWAP_PROGRAM_ID.to_string(), PUMPSWAP_PROGRAM_ID_STR);
    }

    #[test]
    fn test_vault_derivation_deterministic() {
        let pool = Pubkey::new_unique();
        assert_eq!(derive_base_vault(&pool), derive_base_vault(&pool));
        // Base and quote vaults never collide for the same pool
        assert_ne!(derive_base_vault(&pool).0, derive_quote_vault(&pool).0);
    }
}
