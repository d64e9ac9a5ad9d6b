//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rpc: RpcConfig,
    pub trading: TradingConfig,
    #[serde(default)]
    pub entry: EntryConfig,
    #[serde(default)]
    pub exit: ExitConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Token pair and sizing for the single traded position
#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Token mint address
    #[serde(default)]
    pub mint: String,
    /// PumpSwap pool address
    #[serde(default)]
    pub pool: String,
    /// Quote-asset size per buy, in SOL
    #[serde(default = "default_buy_amount_sol")]
    pub buy_amount_sol: f64,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,
    /// True for venue families that keep the quote asset in the first vault,
    /// flipping which vault ratio gives the token price
    #[serde(default)]
    pub inverted_price_venue: bool,
}

/// Entry monitoring band and polling discipline
#[derive(Debug, Clone, Deserialize)]
pub struct EntryConfig {
    /// Band width below the reference market cap, percent
    #[serde(default = "default_lower_interval_pct")]
    pub lower_interval_pct: f64,
    /// Band width above the reference market cap, percent
    #[serde(default = "default_upper_interval_pct")]
    pub upper_interval_pct: f64,
    /// Minimum viable market cap in SOL; below this the cycle aborts
    #[serde(default = "default_absolute_floor_mc")]
    pub absolute_floor_mc: f64,
    #[serde(default = "default_mc_poll_interval_ms")]
    pub mc_poll_interval_ms: u64,
    /// Poll budget before the cycle aborts with no entry
    #[serde(default = "default_max_polls")]
    pub max_polls: u64,
    /// Consecutive in-band polls required before entering
    #[serde(default = "default_hold_ticks")]
    pub hold_ticks: u32,
}

/// Trailing take-profit, stop-loss and holding-time limits
#[derive(Debug, Clone, Deserialize)]
pub struct ExitConfig {
    /// Initial profit floor, percent PNL
    #[serde(default = "default_initial_floor_pct")]
    pub initial_floor_pct: f64,
    /// Distance above the floor that ratchets it up
    #[serde(default = "default_raise_margin_pct")]
    pub raise_margin_pct: f64,
    /// Distance below the floor that triggers the trailing sell
    #[serde(default = "default_drop_margin_pct")]
    pub drop_margin_pct: f64,
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,
    /// Enforce the stop-loss as a hard exit rather than advisory
    #[serde(default = "default_true")]
    pub enforce_stop_loss: bool,
    /// Maximum holding duration before a forced sell
    #[serde(default = "default_sell_timer_ms")]
    pub sell_timer_ms: u64,
    #[serde(default = "default_pnl_poll_interval_ms")]
    pub pnl_poll_interval_ms: u64,
}

/// Account-confirmation retry discipline
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_account_max_attempts")]
    pub account_max_attempts: u32,
    /// Fixed delay between attempts; confirmation lag is deterministic,
    /// so there is no backoff
    #[serde(default = "default_account_delay_ms")]
    pub account_delay_ms: u64,
}

// Default value functions
fn default_rpc_endpoint() -> String {
    std::env::var("RPC_ENDPOINT").unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".into())
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_buy_amount_sol() -> f64 {
    0.05
}

fn default_slippage_bps() -> u32 {
    2500
}

fn default_lower_interval_pct() -> f64 {
    10.0
}

fn default_upper_interval_pct() -> f64 {
    10.0
}

fn default_absolute_floor_mc() -> f64 {
    35.0
}

fn default_mc_poll_interval_ms() -> u64 {
    200
}

fn default_max_polls() -> u64 {
    100_000
}

fn default_hold_ticks() -> u32 {
    5
}

fn default_initial_floor_pct() -> f64 {
    1.5
}

fn default_raise_margin_pct() -> f64 {
    0.5
}

fn default_drop_margin_pct() -> f64 {
    0.5
}

fn default_stop_loss_pct() -> f64 {
    30.0
}

fn default_sell_timer_ms() -> u64 {
    60_000
}

fn default_pnl_poll_interval_ms() -> u64 {
    200
}

fn default_account_max_attempts() -> u32 {
    50
}

fn default_account_delay_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            mint: String::new(),
            pool: String::new(),
            buy_amount_sol: default_buy_amount_sol(),
            slippage_bps: default_slippage_bps(),
            inverted_price_venue: false,
        }
    }
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            lower_interval_pct: default_lower_interval_pct(),
            upper_interval_pct: default_upper_interval_pct(),
            absolute_floor_mc: default_absolute_floor_mc(),
            mc_poll_interval_ms: default_mc_poll_interval_ms(),
            max_polls: default_max_polls(),
            hold_ticks: default_hold_ticks(),
        }
    }
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            initial_floor_pct: default_initial_floor_pct(),
            raise_margin_pct: default_raise_margin_pct(),
            drop_margin_pct: default_drop_margin_pct(),
            stop_loss_pct: default_stop_loss_pct(),
            enforce_stop_loss: true,
            sell_timer_ms: default_sell_timer_ms(),
            pnl_poll_interval_ms: default_pnl_poll_interval_ms(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            account_max_attempts: default_account_max_attempts(),
            account_delay_ms: default_account_delay_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            trading: TradingConfig::default(),
            entry: EntryConfig::default(),
            exit: ExitConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("rpc.endpoint", default_rpc_endpoint())?
            .set_default("rpc.timeout_ms", default_timeout_ms() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix TRADER_)
            .add_source(
                config::Environment::with_prefix("TRADER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        // Pair addresses must be present and parseable
        if self.trading.mint.is_empty() {
            anyhow::bail!("trading.mint is required");
        }
        Pubkey::from_str(&self.trading.mint)
            .with_context(|| format!("Invalid mint address: {}", self.trading.mint))?;

        if self.trading.pool.is_empty() {
            anyhow::bail!("trading.pool is required");
        }
        Pubkey::from_str(&self.trading.pool)
            .with_context(|| format!("Invalid pool address: {}", self.trading.pool))?;

        if self.trading.buy_amount_sol <= 0.0 {
            anyhow::bail!("buy_amount_sol must be positive");
        }

        if self.trading.slippage_bps > 10000 {
            anyhow::bail!("slippage_bps cannot exceed 10000 (100%)");
        }

        // Band intervals must stay meaningful percentages
        if self.entry.lower_interval_pct <= 0.0 || self.entry.lower_interval_pct >= 100.0 {
            anyhow::bail!("lower_interval_pct must be between 0 and 100");
        }
        if self.entry.upper_interval_pct <= 0.0 || self.entry.upper_interval_pct >= 100.0 {
            anyhow::bail!("upper_interval_pct must be between 0 and 100");
        }
        if self.entry.absolute_floor_mc < 0.0 {
            anyhow::bail!("absolute_floor_mc cannot be negative");
        }
        if self.entry.mc_poll_interval_ms == 0 {
            anyhow::bail!("mc_poll_interval_ms must be positive");
        }
        if self.entry.max_polls == 0 {
            anyhow::bail!("max_polls must be positive");
        }
        if self.entry.hold_ticks == 0 {
            anyhow::bail!("hold_ticks must be positive");
        }

        if self.exit.raise_margin_pct <= 0.0 {
            anyhow::bail!("raise_margin_pct must be positive");
        }
        if self.exit.drop_margin_pct <= 0.0 {
            anyhow::bail!("drop_margin_pct must be positive");
        }
        if self.exit.enforce_stop_loss
            && (self.exit.stop_loss_pct <= 0.0 || self.exit.stop_loss_pct >= 100.0)
        {
            anyhow::bail!("stop_loss_pct must be between 0 and 100");
        }
        if self.exit.pnl_poll_interval_ms == 0 {
            anyhow::bail!("pnl_poll_interval_ms must be positive");
        }
        if self.exit.sell_timer_ms < self.exit.pnl_poll_interval_ms {
            anyhow::bail!("sell_timer_ms must be at least one pnl poll interval");
        }

        if self.retry.account_max_attempts == 0 {
            anyhow::bail!("account_max_attempts must be positive");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  RPC:
    endpoint: {}
    timeout: {}ms
  Trading:
    mint: {}
    pool: {}
    buy_amount: {} SOL
    slippage: {}bps
    inverted_price_venue: {}
  Entry:
    band: -{}% / +{}%
    absolute_floor: {} SOL
    poll_interval: {}ms
    max_polls: {}
    hold_ticks: {}
  Exit:
    initial_floor: {}%
    raise_margin: {}%
    drop_margin: {}%
    stop_loss: {}% (enforced: {})
    sell_timer: {}ms
    pnl_poll_interval: {}ms
  Retry:
    account_max_attempts: {}
    account_delay: {}ms
"#,
            mask_url(&self.rpc.endpoint),
            self.rpc.timeout_ms,
            self.trading.mint,
            self.trading.pool,
            self.trading.buy_amount_sol,
            self.trading.slippage_bps,
            self.trading.inverted_price_venue,
            self.entry.lower_interval_pct,
            self.entry.upper_interval_pct,
            self.entry.absolute_floor_mc,
            self.entry.mc_poll_interval_ms,
            self.entry.max_polls,
            self.entry.hold_ticks,
            self.exit.initial_floor_pct,
            self.exit.raise_margin_pct,
            self.exit.drop_margin_pct,
            self.exit.stop_loss_pct,
            self.exit.enforce_stop_loss,
            self.exit.sell_timer_ms,
            self.exit.pnl_poll_interval_ms,
            self.retry.account_max_attempts,
            self.retry.account_delay_ms,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> Config {
        Config {
            trading: TradingConfig {
                mint: Pubkey::new_unique().to_string(),
                pool: Pubkey::new_unique().to_string(),
                ..TradingConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.trading.slippage_bps, 2500);
        assert_eq!(config.entry.absolute_floor_mc, 35.0);
        assert_eq!(config.entry.mc_poll_interval_ms, 200);
        assert_eq!(config.retry.account_max_attempts, 50);
        assert!(config.exit.enforce_stop_loss);
    }

    #[test]
    fn test_validation_requires_pair() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let config = valid_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_intervals() {
        let mut config = valid_config();
        config.entry.lower_interval_pct = 100.0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.exit.drop_margin_pct = 0.0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.trading.slippage_bps = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mint = Pubkey::new_unique();
        let pool = Pubkey::new_unique();

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[trading]
mint = "{mint}"
pool = "{pool}"
buy_amount_sol = 0.1

[entry]
absolute_floor_mc = 50.0
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.trading.mint, mint.to_string());
        assert_eq!(config.trading.buy_amount_sol, 0.1);
        assert_eq!(config.entry.absolute_floor_mc, 50.0);
        // Untouched sections keep defaults
        assert_eq!(config.exit.initial_floor_pct, 1.5);
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("https://api.example.com?key=secret"),
            "https://api.example.com?***"
        );
        assert_eq!(
            mask_url("https://api.example.com"),
            "https://api.example.com"
        );
    }
}
