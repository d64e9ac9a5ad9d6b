//! Trailing take-profit, stop-loss and hold-timeout logic
//!
//! PnL is evaluated once per poll tick. The trailing floor arms when PnL
//! first reaches it; afterwards the floor only ratchets upward, and a drop
//! strictly below the lower trigger closes the position. A PnL that lands
//! exactly on the lower trigger holds.

use tracing::{debug, info};

use crate::config::ExitConfig;

/// Why a position was closed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitTrigger {
    /// PnL fell strictly below the trailing lower trigger after the
    /// profit floor had been reached
    TrailingStop { pnl_pct: f64, floor: f64 },
    /// PnL fell to or below the hard loss limit
    StopLoss { pnl_pct: f64 },
    /// The hold timer expired
    MaxHoldTime { ticks: u64 },
}

/// Ratcheting profit floor with margins on either side
#[derive(Debug, Clone, Copy)]
pub struct TrailingExitState {
    profit_floor: f64,
    raise_margin: f64,
    drop_margin: f64,
    floor_reached: bool,
}

impl TrailingExitState {
    pub fn new(initial_floor: f64, raise_margin: f64, drop_margin: f64) -> Self {
        Self {
            profit_floor: initial_floor,
            raise_margin,
            drop_margin,
            floor_reached: false,
        }
    }

    /// PnL above this ratchets the floor up to the observed PnL
    pub fn upper_trigger(&self) -> f64 {
        self.profit_floor + self.raise_margin
    }

    /// PnL strictly below this closes the position, once armed
    pub fn lower_trigger(&self) -> f64 {
        self.profit_floor - self.drop_margin
    }

    pub fn floor_reached(&self) -> bool {
        self.floor_reached
    }

    pub fn profit_floor(&self) -> f64 {
        self.profit_floor
    }

    /// Feed one PnL observation through the trailing state machine
    pub fn observe(&mut self, pnl_pct: f64) -> Option<ExitTrigger> {
        if !self.floor_reached && pnl_pct > self.profit_floor {
            self.floor_reached = true;
            info!(pnl_pct, floor = self.profit_floor, "profit floor reached, trailing armed");
        }

        if !self.floor_reached {
            return None;
        }

        if pnl_pct > self.upper_trigger() {
            debug!(
                old_floor = self.profit_floor,
                new_floor = pnl_pct,
                "ratcheting profit floor"
            );
            self.profit_floor = pnl_pct;
        } else if pnl_pct < self.lower_trigger() {
            return Some(ExitTrigger::TrailingStop {
                pnl_pct,
                floor: self.profit_floor,
            });
        }

        None
    }
}

/// Full exit decision stack: hold timeout, hard stop-loss, trailing stop
pub struct ExitStrategy {
    trailing: TrailingExitState,
    stop_loss_pct: f64,
    enforce_stop_loss: bool,
    max_hold_ticks: u64,
    ticks: u64,
    timeout_fired: bool,
}

impl ExitStrategy {
    pub fn new(exit: &ExitConfig) -> Self {
        let max_hold_ticks = (exit.sell_timer_ms / exit.pnl_poll_interval_ms).max(1);

        Self {
            trailing: TrailingExitState::new(
                exit.initial_floor_pct,
                exit.raise_margin_pct,
                exit.drop_margin_pct,
            ),
            stop_loss_pct: exit.stop_loss_pct,
            enforce_stop_loss: exit.enforce_stop_loss,
            max_hold_ticks,
            ticks: 0,
            timeout_fired: false,
        }
    }

    /// Ticks where the PnL quote failed still count toward the hold timer
    pub fn record_skipped_tick(&mut self) {
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Evaluate one PnL observation. The hold timeout fires exactly once;
    /// if the resulting sell fails, the caller owns the retry.
    pub fn on_tick(&mut self, pnl_pct: f64) -> Option<ExitTrigger> {
        self.ticks += 1;

        if !self.timeout_fired && self.ticks >= self.max_hold_ticks {
            self.timeout_fired = true;
            info!(ticks = self.ticks, "hold timer expired");
            return Some(ExitTrigger::MaxHoldTime { ticks: self.ticks });
        }

        if self.enforce_stop_loss && pnl_pct <= -self.stop_loss_pct {
            return Some(ExitTrigger::StopLoss { pnl_pct });
        }

        self.trailing.observe(pnl_pct)
    }
}
