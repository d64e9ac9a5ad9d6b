//! Open-position tracking - polls PnL and executes the exit
//!
//! A failed sell never drops the trigger: it is parked as a pending exit
//! and retried on every subsequent tick until a sell lands.

use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::market::units::lamports_to_sol;
use crate::strategy::{ExitStrategy, ExitTrigger};
use crate::trading::ExecutionGateway;
use crate::venue::{Direction, VenueAdapter};

/// One open position
#[derive(Debug, Clone)]
pub struct Position {
    pub mint: Pubkey,
    pub pool: Pubkey,
    /// What the buy cost, in SOL
    pub entry_cost_sol: f64,
    /// Token balance held, in base units
    pub token_amount: u64,
    pub acquired_at: DateTime<Utc>,
}

/// A closed position
#[derive(Debug, Clone)]
pub struct ExitOutcome {
    pub trigger: ExitTrigger,
    /// PnL at the last quote before the sell landed, percent
    pub pnl_pct: f64,
    pub signature: Signature,
}

/// Polls position value against the pool and sells on an exit trigger
pub struct PositionTracker {
    venue: Arc<dyn VenueAdapter>,
    gateway: Arc<ExecutionGateway>,
    clock: Arc<dyn Clock>,
    strategy: ExitStrategy,
    poll_interval: Duration,
    pending_exit: Option<ExitTrigger>,
    last_pnl_pct: f64,
}

impl PositionTracker {
    pub fn new(
        venue: Arc<dyn VenueAdapter>,
        gateway: Arc<ExecutionGateway>,
        clock: Arc<dyn Clock>,
        strategy: ExitStrategy,
        poll_interval_ms: u64,
    ) -> Self {
        Self {
            venue,
            gateway,
            clock,
            strategy,
            poll_interval: Duration::from_millis(poll_interval_ms),
            pending_exit: None,
            last_pnl_pct: 0.0,
        }
    }

    /// Track the position until an exit sell lands
    pub async fn track(&mut self, position: &Position) -> Result<ExitOutcome> {
        info!(
            mint = %position.mint,
            cost_sol = position.entry_cost_sol,
            tokens = position.token_amount,
            "tracking position"
        );

        loop {
            self.clock.sleep(self.poll_interval).await;

            // A sell that failed on an earlier tick takes priority
            if let Some(trigger) = self.pending_exit {
                match self.try_sell(position, trigger).await {
                    Ok(outcome) => return Ok(outcome),
                    Err(e) => {
                        warn!("exit sell retry failed: {e}");
                        self.strategy.record_skipped_tick();
                        continue;
                    }
                }
            }

            let quote_lamports = match self
                .venue
                .quote(Direction::BaseToQuote, position.token_amount)
                .await
            {
                Ok(lamports) => lamports,
                Err(e) if e.is_tick_skippable() => {
                    debug!("pnl quote unavailable, skipping tick: {e}");
                    self.strategy.record_skipped_tick();
                    continue;
                }
                Err(e) => return Err(e),
            };

            let value_sol = lamports_to_sol(quote_lamports);
            let pnl_pct =
                (value_sol - position.entry_cost_sol) / position.entry_cost_sol * 100.0;
            self.last_pnl_pct = pnl_pct;
            debug!(value_sol, pnl_pct, "position tick");

            if let Some(trigger) = self.strategy.on_tick(pnl_pct) {
                info!(?trigger, pnl_pct, "exit triggered");
                match self.try_sell(position, trigger).await {
                    Ok(outcome) => return Ok(outcome),
                    Err(e) => {
                        warn!("exit sell failed, will retry: {e}");
                        self.pending_exit = Some(trigger);
                    }
                }
            }
        }
    }

    async fn try_sell(&self, position: &Position, trigger: ExitTrigger) -> Result<ExitOutcome> {
        let result = self
            .gateway
            .execute_swap(Direction::BaseToQuote, position.token_amount)
            .await?;

        info!(
            signature = %result.signature,
            pnl_pct = self.last_pnl_pct,
            ?trigger,
            "position closed"
        );

        Ok(ExitOutcome {
            trigger,
            pnl_pct: self.last_pnl_pct,
            signature: result.signature,
        })
    }
}
