//! Exit strategy - decides when an open position should be closed

pub mod trailing;

pub use trailing::{ExitStrategy, ExitTrigger, TrailingExitState};
