//! One full trade cycle: wait for entry, buy, confirm, track, sell

use chrono::Utc;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::chain::ChainReader;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{AbortReason, Error, Result};
use crate::market::oracle::PriceOracle;
use crate::market::units::sol_to_lamports;
use crate::monitor::entry::{EntryDecision, EntryMonitor};
use crate::monitor::tracker::{ExitOutcome, Position, PositionTracker};
use crate::strategy::ExitStrategy;
use crate::trading::ExecutionGateway;
use crate::venue::{Direction, TxResult, VenueAdapter};

/// How one trade cycle ended
#[derive(Debug)]
pub enum CycleOutcome {
    /// Position was opened and later closed
    Completed(ExitOutcome),
    /// No position was opened
    Aborted(AbortReason),
}

/// Drives trade cycles end to end. Each call to [`run_cycle`] uses fresh
/// entry and exit state; the chain-facing components are shared.
///
/// [`run_cycle`]: TradeLifecycle::run_cycle
pub struct TradeLifecycle {
    oracle: Arc<PriceOracle>,
    chain: Arc<dyn ChainReader>,
    venue: Arc<dyn VenueAdapter>,
    gateway: Arc<ExecutionGateway>,
    clock: Arc<dyn Clock>,
    config: Config,
    wallet: Pubkey,
    mint: Pubkey,
    pool: Pubkey,
    entry_signal: Arc<AtomicBool>,
}

impl TradeLifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        oracle: Arc<PriceOracle>,
        chain: Arc<dyn ChainReader>,
        venue: Arc<dyn VenueAdapter>,
        gateway: Arc<ExecutionGateway>,
        clock: Arc<dyn Clock>,
        config: Config,
        wallet: Pubkey,
        mint: Pubkey,
        pool: Pubkey,
    ) -> Self {
        Self {
            oracle,
            chain,
            venue,
            gateway,
            clock,
            config,
            wallet,
            mint,
            pool,
            entry_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle the operator surface stores into to force the next entry
    pub fn entry_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.entry_signal)
    }

    /// Poll market caps until an entry lands a buy or the monitor aborts.
    ///
    /// A failed buy does not end the cycle: the monitor is reset and the
    /// waiting period starts over. Only cycle-fatal errors propagate.
    async fn await_entry(&self, monitor: &mut EntryMonitor) -> Result<TxResult> {
        let poll_interval = Duration::from_millis(self.config.entry.mc_poll_interval_ms);
        let buy_lamports = sol_to_lamports(self.config.trading.buy_amount_sol);

        loop {
            match self.oracle.snapshot().await {
                Ok(snapshot) => match monitor.observe(snapshot.market_cap) {
                    EntryDecision::Enter => {
                        match self
                            .gateway
                            .execute_swap(Direction::QuoteToBase, buy_lamports)
                            .await
                        {
                            Ok(buy) => return Ok(buy),
                            Err(e) if e.is_cycle_fatal() => return Err(e),
                            Err(e) => {
                                warn!("buy failed, returning to waiting: {e}");
                                monitor.resume_waiting();
                            }
                        }
                    }
                    EntryDecision::Abort(reason) => {
                        return Err(Error::AbortedEntry(reason));
                    }
                    EntryDecision::Wait | EntryDecision::Recentered { .. } => {}
                },
                Err(e) if e.is_tick_skippable() => {
                    debug!("market snapshot unavailable, skipping poll: {e}");
                }
                Err(e) => return Err(e),
            }
            self.clock.sleep(poll_interval).await;
        }
    }

    /// Run one cycle to completion or abort
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let mut monitor =
            EntryMonitor::new(self.config.entry.clone(), Arc::clone(&self.entry_signal));

        info!(mint = %self.mint, pool = %self.pool, "starting trade cycle");

        let buy = match self.await_entry(&mut monitor).await {
            Ok(buy) => buy,
            Err(Error::AbortedEntry(reason)) => {
                return Ok(CycleOutcome::Aborted(reason));
            }
            Err(e) => return Err(e),
        };
        info!(signature = %buy.signature, "position opened");

        // The bought tokens land in the wallet's associated token account;
        // wait for it to become visible before quoting against it
        let token_account = get_associated_token_address(&self.wallet, &self.mint);
        self.gateway.await_account_ready(&token_account).await?;

        let balance = self
            .chain
            .get_token_balance(&token_account)
            .await?
            .ok_or_else(|| {
                Error::DataUnavailable("token account vanished after confirmation".into())
            })?;

        // Let the trade settle before the first PnL quote
        self.clock.sleep(Duration::from_secs(1)).await;

        let position = Position {
            mint: self.mint,
            pool: self.pool,
            entry_cost_sol: self.config.trading.buy_amount_sol,
            token_amount: balance.amount,
            acquired_at: Utc::now(),
        };

        let mut tracker = PositionTracker::new(
            Arc::clone(&self.venue),
            Arc::clone(&self.gateway),
            Arc::clone(&self.clock),
            ExitStrategy::new(&self.config.exit),
            self.config.exit.pnl_poll_interval_ms,
        );

        let outcome = tracker.track(&position).await?;

        // Settle before the next cycle re-seeds its reference off the pool
        self.clock.sleep(Duration::from_secs(1)).await;
        Ok(CycleOutcome::Completed(outcome))
    }
}
