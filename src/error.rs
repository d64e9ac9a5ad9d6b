//! Error types for the trading loop

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Why entry monitoring gave up on the current cycle
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum AbortReason {
    #[error("market cap {market_cap:.2} SOL fell below viability floor {floor:.2} SOL")]
    BelowFloor { market_cap: f64, floor: f64 },

    #[error("no entry after {polls} polls, budget exhausted")]
    PollBudgetExhausted { polls: u64 },
}

/// Main error type for the trading loop
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("Insecure keypair permissions: {0}")]
    InsecureKeypair(String),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    // Oracle errors
    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),

    // Venue errors
    #[error("Quote failed: {0}")]
    Quote(String),

    #[error("Transaction simulation failed: {0}")]
    SimulationFailed(String),

    #[error("Transaction submission failed: {0}")]
    SubmissionFailed(String),

    // Gateway errors
    #[error("Token account not ready after {attempts} attempts")]
    AccountNotReady { attempts: u32 },

    // Entry monitoring errors
    #[error("Entry aborted: {0}")]
    AbortedEntry(AbortReason),

    #[error("Insufficient balance: {available}SOL available, {required}SOL required")]
    InsufficientBalance { available: f64, required: f64 },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error only invalidates the current poll tick.
    /// The loop skips the tick and retries on the next one. Transport
    /// errors land here too: the read path polls, so one flaky RPC
    /// response must never end the loop.
    pub fn is_tick_skippable(&self) -> bool {
        matches!(
            self,
            Error::DataUnavailable(_) | Error::Quote(_) | Error::Rpc(_)
        )
    }

    /// Check if this error ends the current trading cycle.
    /// These are routed to the operator recovery menu, never retried silently.
    pub fn is_cycle_fatal(&self) -> bool {
        matches!(
            self,
            Error::AccountNotReady { .. }
                | Error::AbortedEntry(_)
                | Error::InsufficientBalance { .. }
        )
    }
}

// Conversion from solana_client errors
impl From<solana_client::client_error::ClientError> for Error {
    fn from(e: solana_client::client_error::ClientError) -> Self {
        Error::Rpc(e.to_string())
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_skippable_classification() {
        assert!(Error::DataUnavailable("vault".into()).is_tick_skippable());
        assert!(Error::Quote("pool drained".into()).is_tick_skippable());
        assert!(Error::Rpc("connection reset".into()).is_tick_skippable());
        assert!(!Error::SubmissionFailed("timeout".into()).is_tick_skippable());
    }

    #[test]
    fn test_cycle_fatal_classification() {
        assert!(Error::AccountNotReady { attempts: 50 }.is_cycle_fatal());
        assert!(Error::AbortedEntry(AbortReason::PollBudgetExhausted { polls: 100_001 })
            .is_cycle_fatal());
        assert!(!Error::SimulationFailed("slippage".into()).is_cycle_fatal());
        assert!(!Error::Quote("transient".into()).is_cycle_fatal());
    }
}
