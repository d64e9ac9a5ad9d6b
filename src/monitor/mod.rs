//! Trade cycle monitoring: entry band, open-position tracking, lifecycle

pub mod entry;
pub mod lifecycle;
pub mod tracker;

pub use entry::{EntryBand, EntryDecision, EntryMonitor, EntryState};
pub use lifecycle::{CycleOutcome, TradeLifecycle};
pub use tracker::{ExitOutcome, Position, PositionTracker};
