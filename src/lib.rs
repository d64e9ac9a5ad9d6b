//! Automated single-pair trading loop for a PumpSwap pool
//!
//! Waits for the pair's market cap to settle inside a configurable band,
//! buys a fixed amount, then trails the position with a ratcheting profit
//! floor, a hard stop-loss and a hold timer until a sell lands.

pub mod chain;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod market;
pub mod monitor;
pub mod strategy;
pub mod trading;
pub mod venue;
pub mod wallet;

pub use config::Config;
pub use error::{Error, Result};
