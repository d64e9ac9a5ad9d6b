//! Unit conversion and slippage helpers

/// SOL decimals (lamports)
pub const SOL_DECIMALS: u8 = 9;

/// Convert lamports to SOL
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 10f64.powi(SOL_DECIMALS as i32)
}

/// Convert SOL to lamports
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * 10f64.powi(SOL_DECIMALS as i32)) as u64
}

/// Calculate minimum amount out for a swap with slippage
pub fn min_out_with_slippage(expected_out: u64, slippage_bps: u32) -> u64 {
    // slippage_bps is in basis points (100 bps = 1%)
    let slippage_factor = 10000 - slippage_bps as u128;
    ((expected_out as u128 * slippage_factor) / 10000) as u64
}

/// Calculate maximum amount in for a swap with slippage
pub fn max_in_with_slippage(expected_in: u64, slippage_bps: u32) -> u64 {
    let slippage_factor = 10000 + slippage_bps as u128;
    ((expected_in as u128 * slippage_factor) / 10000) as u64
}
