//! CLI command implementations

use anyhow::Result;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::str::FromStr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::chain::{ChainReader, RpcChainReader};
use crate::cli::menu::{recovery_menu, RecoveryChoice};
use crate::clock::TokioClock;
use crate::config::Config;
use crate::error::Error;
use crate::market::oracle::PriceOracle;
use crate::market::units::{lamports_to_sol, sol_to_lamports};
use crate::monitor::{CycleOutcome, TradeLifecycle};
use crate::trading::{ExecutionGateway, RetryBudget};
use crate::venue::PumpSwapVenue;
use crate::wallet::load_keypair;

fn rpc_client(config: &Config) -> Arc<solana_client::nonblocking::rpc_client::RpcClient> {
    Arc::new(
        solana_client::nonblocking::rpc_client::RpcClient::new_with_timeout(
            config.rpc.endpoint.clone(),
            std::time::Duration::from_millis(config.rpc.timeout_ms),
        ),
    )
}

/// Run the trading loop until the operator quits
pub async fn run(config: &Config) -> Result<()> {
    warn!("This bot trades with real funds. Only use what you can afford to lose.");
    info!(
        "Pair: mint={} pool={}, buy size {} SOL, slippage {}bps",
        config.trading.mint,
        config.trading.pool,
        config.trading.buy_amount_sol,
        config.trading.slippage_bps
    );

    let mint = Pubkey::from_str(&config.trading.mint)?;
    let pool = Pubkey::from_str(&config.trading.pool)?;

    let rpc = rpc_client(config);
    let keypair = Arc::new(load_keypair()?);
    info!("Wallet: {}", keypair.pubkey());

    let chain: Arc<dyn ChainReader> = Arc::new(RpcChainReader::new(rpc.clone()));
    let clock = Arc::new(TokioClock);

    let venue = Arc::new(PumpSwapVenue::new(
        rpc.clone(),
        chain.clone(),
        keypair.clone(),
        pool,
        mint,
        config.trading.slippage_bps,
    ));
    let gateway = Arc::new(ExecutionGateway::new(
        venue.clone(),
        chain.clone(),
        clock.clone(),
        RetryBudget::new(config.retry.account_max_attempts, config.retry.account_delay_ms),
    ));
    let oracle = Arc::new(PriceOracle::new(
        chain.clone(),
        venue.quote_vault(),
        venue.base_vault(),
        mint,
        config.trading.inverted_price_venue,
    ));

    preflight(&chain, &keypair, config).await?;

    match oracle.snapshot().await {
        Ok(snapshot) => info!(
            "Initial market cap: {:.2} SOL (price {:.9})",
            snapshot.market_cap, snapshot.price
        ),
        Err(e) => warn!("Initial market snapshot unavailable: {e}"),
    }

    // Fund the wrapped quote account once, sized for two buys so a retry
    // never stalls on wrapping
    let wrap_lamports = sol_to_lamports(config.trading.buy_amount_sol * 2.0);
    venue.wrap_native(wrap_lamports).await?;

    let lifecycle = TradeLifecycle::new(
        oracle,
        chain,
        venue,
        gateway,
        clock,
        config.clone(),
        keypair.pubkey(),
        mint,
        pool,
    );

    loop {
        let context = match lifecycle.run_cycle().await {
            Ok(CycleOutcome::Completed(outcome)) => {
                info!(
                    "Cycle complete: {:?} at {:.2}% PnL, signature {}",
                    outcome.trigger, outcome.pnl_pct, outcome.signature
                );
                info!("View on Solscan: https://solscan.io/tx/{}", outcome.signature);
                format!("position closed at {:.2}% PnL", outcome.pnl_pct)
            }
            Ok(CycleOutcome::Aborted(reason)) => {
                warn!("Cycle aborted: {reason}");
                format!("entry aborted: {reason}")
            }
            Err(e) if e.is_cycle_fatal() => {
                error!("Cycle failed: {e}");
                format!("cycle failed: {e}")
            }
            Err(e) => return Err(e.into()),
        };

        match recovery_menu(config, &context)? {
            RecoveryChoice::Resume => info!("Resuming monitoring"),
            RecoveryChoice::ForceEntry => {
                lifecycle.entry_signal().store(true, Ordering::SeqCst);
                info!("Resuming with forced entry on the next observation");
            }
            RecoveryChoice::Quit => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}

/// Refuse to start without enough SOL for the session: two buys worth of
/// quote plus headroom for fees and rent
async fn preflight(
    chain: &Arc<dyn ChainReader>,
    keypair: &Arc<Keypair>,
    config: &Config,
) -> Result<()> {
    let available = lamports_to_sol(chain.get_native_balance(&keypair.pubkey()).await?);
    let required = config.trading.buy_amount_sol * 2.0 + 0.01;

    if available < required {
        return Err(Error::InsufficientBalance {
            available,
            required,
        }
        .into());
    }

    info!("Balance check passed: {available:.4} SOL available");
    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// Check system health
pub async fn health(config: &Config) -> Result<()> {
    println!("\n=== SYSTEM HEALTH CHECK ===\n");

    let mut all_healthy = true;

    print!("RPC Endpoint... ");
    let rpc = rpc_client(config);
    let start = std::time::Instant::now();
    match rpc.get_slot().await {
        Ok(slot) => println!("OK (slot {}, {}ms)", slot, start.elapsed().as_millis()),
        Err(e) => {
            println!("FAILED: {e}");
            all_healthy = false;
        }
    }

    print!("Pool account... ");
    match Pubkey::from_str(&config.trading.pool) {
        Ok(pool) => {
            let chain = RpcChainReader::new(rpc.clone());
            match chain.account_exists(&pool).await {
                Ok(true) => println!("OK"),
                Ok(false) => {
                    println!("NOT FOUND");
                    all_healthy = false;
                }
                Err(e) => {
                    println!("FAILED: {e}");
                    all_healthy = false;
                }
            }
        }
        Err(e) => {
            println!("INVALID ADDRESS: {e}");
            all_healthy = false;
        }
    }

    print!("Keypair... ");
    match load_keypair() {
        Ok(keypair) => {
            let chain = RpcChainReader::new(rpc);
            match chain.get_native_balance(&keypair.pubkey()).await {
                Ok(lamports) => {
                    println!("OK (balance: {:.4} SOL)", lamports_to_sol(lamports))
                }
                Err(e) => {
                    println!("OK, balance fetch failed: {e}");
                }
            }
        }
        Err(e) => {
            println!("FAILED: {e}");
            all_healthy = false;
        }
    }

    println!();
    if all_healthy {
        println!("All systems healthy!");
    } else {
        println!("Some systems are unhealthy. Check the errors above.");
    }

    Ok(())
}
