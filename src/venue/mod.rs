//! Venue adapter - swap quoting and execution against the exchange pool
//!
//! The trait is the seam between the monitoring loops and the concrete
//! PumpSwap protocol plumbing, so strategy code can be tested against a
//! scripted venue.

pub mod program;
pub mod pumpswap;

use async_trait::async_trait;
use solana_sdk::signature::Signature;

use crate::error::Result;

pub use pumpswap::PumpSwapVenue;

/// Swap direction relative to the pool's base/quote orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Spend quote asset, receive base tokens (buy)
    QuoteToBase,
    /// Spend base tokens, receive quote asset (sell)
    BaseToQuote,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::QuoteToBase => write!(f, "buy"),
            Direction::BaseToQuote => write!(f, "sell"),
        }
    }
}

/// A confirmed swap
#[derive(Debug, Clone)]
pub struct TxResult {
    pub signature: Signature,
    pub direction: Direction,
    /// Amount spent, in input-side base units
    pub amount_in: u64,
}

/// Quoting and swap execution for one pool
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    /// Expected output for `amount_in`, in output-side base units
    async fn quote(&self, direction: Direction, amount_in: u64) -> Result<u64>;

    /// Build, simulate and submit a swap. Submission only happens when
    /// simulation reports no error.
    async fn swap(&self, direction: Direction, amount_in: u64) -> Result<TxResult>;
}
