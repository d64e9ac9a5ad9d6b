//! Execution gateway - classifies swap failures and waits out account
//! propagation after a buy.
//!
//! Token accounts created by a swap are not always visible immediately at
//! processed commitment, so the post-buy wait polls on a fixed cadence with
//! a bounded attempt budget instead of assuming same-slot visibility.

use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::chain::ChainReader;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::venue::{Direction, TxResult, VenueAdapter};

/// Bounded linear retry: fixed delay, fixed attempt cap
#[derive(Debug, Clone, Copy)]
pub struct RetryBudget {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryBudget {
    pub fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// Routes swaps to the venue and polls for account readiness afterwards
pub struct ExecutionGateway {
    venue: Arc<dyn VenueAdapter>,
    chain: Arc<dyn ChainReader>,
    clock: Arc<dyn Clock>,
    account_retry: RetryBudget,
}

impl ExecutionGateway {
    pub fn new(
        venue: Arc<dyn VenueAdapter>,
        chain: Arc<dyn ChainReader>,
        clock: Arc<dyn Clock>,
        account_retry: RetryBudget,
    ) -> Self {
        Self {
            venue,
            chain,
            clock,
            account_retry,
        }
    }

    /// Execute one swap through the venue, logging the outcome
    pub async fn execute_swap(&self, direction: Direction, amount_in: u64) -> Result<TxResult> {
        info!(%direction, amount_in, "submitting swap");

        match self.venue.swap(direction, amount_in).await {
            Ok(result) => {
                info!(signature = %result.signature, %direction, "swap landed");
                Ok(result)
            }
            Err(e @ Error::SimulationFailed(_)) => {
                // Nothing was submitted, safe to retry from the caller
                warn!(%direction, "swap rejected in simulation: {e}");
                Err(e)
            }
            Err(e) => {
                error!(%direction, "swap failed: {e}");
                Err(e)
            }
        }
    }

    /// Wait for `account` to become visible, polling on a fixed cadence.
    ///
    /// Read errors count as "not ready yet" rather than aborting the wait;
    /// transient RPC trouble right after a buy is common.
    pub async fn await_account_ready(&self, account: &Pubkey) -> Result<()> {
        for attempt in 1..=self.account_retry.max_attempts {
            match self.chain.account_exists(account).await {
                Ok(true) => {
                    info!(%account, attempt, "token account visible");
                    return Ok(());
                }
                Ok(false) => {
                    debug!(%account, attempt, "token account not visible yet");
                }
                Err(e) => {
                    debug!(%account, attempt, "account read failed: {e}");
                }
            }
            self.clock.sleep(self.account_retry.delay).await;
        }

        Err(Error::AccountNotReady {
            attempts: self.account_retry.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingChainReader {
        reads: AtomicU32,
        ready_at: u32,
        fail_first: u32,
    }

    #[async_trait]
    impl ChainReader for CountingChainReader {
        async fn get_token_balance(
            &self,
            _account: &Pubkey,
        ) -> Result<Option<crate::chain::TokenBalance>> {
            unimplemented!()
        }

        async fn get_token_supply(&self, _mint: &Pubkey) -> Result<crate::chain::TokenBalance> {
            unimplemented!()
        }

        async fn get_native_balance(&self, _account: &Pubkey) -> Result<u64> {
            unimplemented!()
        }

        async fn account_exists(&self, _account: &Pubkey) -> Result<bool> {
            let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            if read <= self.fail_first {
                return Err(Error::Rpc("connection reset".into()));
            }
            Ok(read >= self.ready_at)
        }
    }

    fn gateway_with(chain: Arc<dyn ChainReader>, clock: Arc<ManualClock>) -> ExecutionGateway {
        struct NoVenue;

        #[async_trait]
        impl VenueAdapter for NoVenue {
            async fn quote(&self, _direction: Direction, _amount_in: u64) -> Result<u64> {
                unimplemented!()
            }

            async fn swap(&self, _direction: Direction, _amount_in: u64) -> Result<TxResult> {
                unimplemented!()
            }
        }

        ExecutionGateway::new(Arc::new(NoVenue), chain, clock, RetryBudget::new(50, 1000))
    }

    #[tokio::test]
    async fn test_account_ready_after_delay() {
        let chain = Arc::new(CountingChainReader {
            reads: AtomicU32::new(0),
            ready_at: 10,
            fail_first: 0,
        });
        let clock = Arc::new(ManualClock::new());
        let gateway = gateway_with(chain.clone(), clock.clone());

        gateway
            .await_account_ready(&Pubkey::new_unique())
            .await
            .unwrap();

        assert_eq!(chain.reads.load(Ordering::SeqCst), 10);
        // Each miss sleeps the full delay before the next read; the
        // successful read returns without sleeping
        assert_eq!(clock.total_slept(), Duration::from_millis(9_000));
    }

    #[tokio::test]
    async fn test_read_errors_count_as_not_ready() {
        let chain = Arc::new(CountingChainReader {
            reads: AtomicU32::new(0),
            ready_at: 5,
            fail_first: 3,
        });
        let clock = Arc::new(ManualClock::new());
        let gateway = gateway_with(chain, clock);

        gateway
            .await_account_ready(&Pubkey::new_unique())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_account_never_ready_exhausts_budget() {
        let chain = Arc::new(CountingChainReader {
            reads: AtomicU32::new(0),
            ready_at: u32::MAX,
            fail_first: 0,
        });
        let clock = Arc::new(ManualClock::new());
        let gateway = gateway_with(chain.clone(), clock);

        let err = gateway
            .await_account_ready(&Pubkey::new_unique())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AccountNotReady { attempts: 50 }));
        assert_eq!(chain.reads.load(Ordering::SeqCst), 50);
        assert!(err.is_cycle_fatal());
    }
}
