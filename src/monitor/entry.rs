//! Entry monitoring - waits for the market cap to settle inside a band
//!
//! The band is anchored on the whole-unit floor of an observed market cap
//! and only ever recenters downward: a pump above the band keeps the old
//! anchor so the entry does not chase the move up, while a dump below it
//! re-anchors at the lower level.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::EntryConfig;
use crate::error::AbortReason;

/// Market-cap acceptance band around a whole-unit reference
#[derive(Debug, Clone, Copy)]
pub struct EntryBand {
    reference: f64,
    lower: f64,
    upper: f64,
}

impl EntryBand {
    /// Anchor a band on `market_cap`, truncated to whole quote units
    pub fn new(market_cap: f64, lower_interval_pct: f64, upper_interval_pct: f64) -> Self {
        let reference = market_cap.floor();
        Self {
            reference,
            lower: reference * (1.0 - lower_interval_pct / 100.0),
            upper: reference * (1.0 + upper_interval_pct / 100.0),
        }
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn contains(&self, market_cap: f64) -> bool {
        market_cap >= self.lower && market_cap <= self.upper
    }
}

/// Where the entry monitor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// No band anchored yet
    Seeding,
    /// Band anchored, polling for a stable in-band market cap
    Waiting,
    /// Entry condition met
    Entering,
    /// Cycle abandoned without a buy
    Aborted,
}

/// Outcome of feeding one market-cap observation to the monitor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryDecision {
    Wait,
    /// Band re-anchored at a new reference
    Recentered { reference: f64 },
    Enter,
    Abort(AbortReason),
}

/// Consumes market-cap observations until one of: stable in-band streak
/// (enter), operator signal (enter), floor breach or exhausted poll
/// budget (abort).
pub struct EntryMonitor {
    config: EntryConfig,
    band: Option<EntryBand>,
    state: EntryState,
    polls: u64,
    in_band_streak: u32,
    entry_signal: Arc<AtomicBool>,
}

impl EntryMonitor {
    /// `entry_signal` is shared with the operator surface; setting it forces
    /// the next observation to enter regardless of the band
    pub fn new(config: EntryConfig, entry_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            band: None,
            state: EntryState::Seeding,
            polls: 0,
            in_band_streak: 0,
            entry_signal,
        }
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    /// Reset for a fresh waiting period after an abort was acknowledged
    pub fn resume_waiting(&mut self) {
        self.band = None;
        self.state = EntryState::Seeding;
        self.polls = 0;
        self.in_band_streak = 0;
        info!("entry monitor reset, waiting for a fresh band");
    }

    /// Feed one market-cap observation
    pub fn observe(&mut self, market_cap: f64) -> EntryDecision {
        self.polls += 1;

        if market_cap < self.config.absolute_floor_mc {
            warn!(
                market_cap,
                floor = self.config.absolute_floor_mc,
                "market cap below viability floor"
            );
            self.state = EntryState::Aborted;
            return EntryDecision::Abort(AbortReason::BelowFloor {
                market_cap,
                floor: self.config.absolute_floor_mc,
            });
        }

        if self.polls > self.config.max_polls {
            warn!(polls = self.polls, "entry poll budget exhausted");
            self.state = EntryState::Aborted;
            return EntryDecision::Abort(AbortReason::PollBudgetExhausted { polls: self.polls });
        }

        if self.entry_signal.swap(false, Ordering::SeqCst) {
            info!(market_cap, "entry forced by operator signal");
            self.state = EntryState::Entering;
            return EntryDecision::Enter;
        }

        let band = match self.band {
            None => {
                let band = EntryBand::new(
                    market_cap,
                    self.config.lower_interval_pct,
                    self.config.upper_interval_pct,
                );
                info!(
                    reference = band.reference(),
                    lower = band.lower(),
                    upper = band.upper(),
                    "entry band anchored"
                );
                self.state = EntryState::Waiting;
                self.band = Some(band);
                return EntryDecision::Recentered {
                    reference: band.reference(),
                };
            }
            Some(band) => band,
        };

        // Downward moves re-anchor; upward moves never do
        if market_cap < band.lower() {
            let band = EntryBand::new(
                market_cap,
                self.config.lower_interval_pct,
                self.config.upper_interval_pct,
            );
            info!(
                reference = band.reference(),
                lower = band.lower(),
                upper = band.upper(),
                "market cap dropped out of band, re-anchoring lower"
            );
            self.band = Some(band);
            self.in_band_streak = 0;
            return EntryDecision::Recentered {
                reference: band.reference(),
            };
        }

        if band.contains(market_cap) {
            self.in_band_streak += 1;
            debug!(
                market_cap,
                streak = self.in_band_streak,
                needed = self.config.hold_ticks,
                "market cap in band"
            );
            if self.in_band_streak >= self.config.hold_ticks {
                info!(market_cap, "entry band held, entering");
                self.state = EntryState::Entering;
                return EntryDecision::Enter;
            }
        } else {
            // Above the band: hold the anchor, reset the streak
            debug!(market_cap, upper = band.upper(), "market cap above band");
            self.in_band_streak = 0;
        }

        EntryDecision::Wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(config: EntryConfig) -> EntryMonitor {
        EntryMonitor::new(config, Arc::new(AtomicBool::new(false)))
    }

    fn entry_config() -> EntryConfig {
        EntryConfig {
            lower_interval_pct: 10.0,
            upper_interval_pct: 10.0,
            absolute_floor_mc: 35.0,
            mc_poll_interval_ms: 200,
            max_polls: 100_000,
            hold_ticks: 3,
        }
    }

    #[test]
    fn test_band_anchors_on_whole_units() {
        let band = EntryBand::new(100.7, 10.0, 10.0);
        assert_eq!(band.reference(), 100.0);
        assert!((band.lower() - 90.0).abs() < 1e-9);
        assert!((band.upper() - 110.0).abs() < 1e-9);
        assert!(band.contains(90.0));
        assert!(band.contains(110.0));
        assert!(!band.contains(89.9));
        assert!(!band.contains(110.1));
    }

    #[test]
    fn test_first_observation_seeds_band() {
        let mut monitor = monitor(entry_config());
        assert_eq!(monitor.state(), EntryState::Seeding);
        assert_eq!(
            monitor.observe(100.5),
            EntryDecision::Recentered { reference: 100.0 }
        );
        assert_eq!(monitor.state(), EntryState::Waiting);
    }

    #[test]
    fn test_streak_must_be_consecutive() {
        let mut monitor = monitor(entry_config());
        monitor.observe(100.0);
        assert_eq!(monitor.observe(100.0), EntryDecision::Wait);
        assert_eq!(monitor.observe(101.0), EntryDecision::Wait);
        // Pump above the band resets the streak without re-anchoring
        assert_eq!(monitor.observe(115.0), EntryDecision::Wait);
        assert_eq!(monitor.observe(100.0), EntryDecision::Wait);
        assert_eq!(monitor.observe(100.0), EntryDecision::Wait);
        assert_eq!(monitor.observe(100.0), EntryDecision::Enter);
        assert_eq!(monitor.state(), EntryState::Entering);
    }

    #[test]
    fn test_recenters_downward_only() {
        let mut monitor = monitor(entry_config());
        monitor.observe(100.0); // band [90, 110]
        assert_eq!(
            monitor.observe(80.4),
            EntryDecision::Recentered { reference: 80.0 }
        );
        // New band [72, 88]: the old reference is gone
        assert_eq!(monitor.observe(87.0), EntryDecision::Wait);
        assert_eq!(monitor.observe(87.0), EntryDecision::Wait);
        assert_eq!(monitor.observe(87.0), EntryDecision::Enter);
    }

    #[test]
    fn test_floor_breach_aborts() {
        let mut monitor = monitor(entry_config());
        monitor.observe(100.0);
        assert_eq!(
            monitor.observe(34.9),
            EntryDecision::Abort(AbortReason::BelowFloor {
                market_cap: 34.9,
                floor: 35.0
            })
        );
        assert_eq!(monitor.state(), EntryState::Aborted);
    }

    #[test]
    fn test_poll_budget_exhaustion_aborts() {
        let mut config = entry_config();
        config.max_polls = 5;
        config.hold_ticks = 100; // never enters
        let mut monitor = monitor(config);

        for _ in 0..5 {
            assert_ne!(
                monitor.observe(100.0),
                EntryDecision::Abort(AbortReason::PollBudgetExhausted { polls: 6 })
            );
        }
        assert_eq!(
            monitor.observe(100.0),
            EntryDecision::Abort(AbortReason::PollBudgetExhausted { polls: 6 })
        );
    }

    #[test]
    fn test_operator_signal_forces_entry() {
        let signal = Arc::new(AtomicBool::new(false));
        let mut monitor = EntryMonitor::new(entry_config(), signal.clone());
        monitor.observe(100.0);
        signal.store(true, Ordering::SeqCst);
        // 200.0 is far outside the band anchored at 100
        assert_eq!(monitor.observe(200.0), EntryDecision::Enter);
        assert_eq!(monitor.state(), EntryState::Entering);
    }

    #[test]
    fn test_resume_waiting_resets_budget() {
        let mut config = entry_config();
        config.max_polls = 3;
        let mut monitor = monitor(config);

        monitor.observe(100.0);
        monitor.observe(120.0);
        monitor.observe(120.0);
        assert!(matches!(
            monitor.observe(120.0),
            EntryDecision::Abort(AbortReason::PollBudgetExhausted { .. })
        ));

        monitor.resume_waiting();
        assert_eq!(monitor.state(), EntryState::Seeding);
        assert_eq!(
            monitor.observe(100.0),
            EntryDecision::Recentered { reference: 100.0 }
        );
    }
}
