//! Ledger read access
//!
//! All balance, supply and account-existence queries go through the
//! [`ChainReader`] trait so the monitoring loops can run against a mock
//! ledger in tests. The RPC connection is injected at construction,
//! never reached through a global handle.

use async_trait::async_trait;
use solana_account_decoder::parse_token::UiTokenAmount;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Token balance in both raw and UI denominations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBalance {
    /// Raw amount in base units
    pub amount: u64,
    /// Amount adjusted for mint decimals
    pub ui_amount: f64,
}

impl TryFrom<UiTokenAmount> for TokenBalance {
    type Error = Error;

    fn try_from(value: UiTokenAmount) -> Result<Self> {
        let amount = value
            .amount
            .parse::<u64>()
            .map_err(|e| Error::Serialization(format!("bad token amount: {e}")))?;
        let ui_amount = value
            .ui_amount
            .ok_or_else(|| Error::DataUnavailable("token amount missing ui value".into()))?;
        Ok(Self { amount, ui_amount })
    }
}

/// Read-only view of on-chain state
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Balance of a token account, or `None` when the account does not exist yet
    async fn get_token_balance(&self, account: &Pubkey) -> Result<Option<TokenBalance>>;

    /// Circulating supply of a mint
    async fn get_token_supply(&self, mint: &Pubkey) -> Result<TokenBalance>;

    /// Native balance in lamports
    async fn get_native_balance(&self, account: &Pubkey) -> Result<u64>;

    /// Whether an account exists at processed commitment
    async fn account_exists(&self, account: &Pubkey) -> Result<bool>;
}

/// Chain reader backed by a Solana RPC node
pub struct RpcChainReader {
    rpc: Arc<RpcClient>,
}

impl RpcChainReader {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }
}

/// RPC reports missing token accounts as an invalid-param error rather
/// than a typed variant, so match on the message
fn is_missing_account(e: &ClientError) -> bool {
    e.to_string().contains("could not find account")
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn get_token_balance(&self, account: &Pubkey) -> Result<Option<TokenBalance>> {
        match self.rpc.get_token_account_balance(account).await {
            Ok(balance) => Ok(Some(TokenBalance::try_from(balance)?)),
            Err(e) if is_missing_account(&e) => Ok(None),
            Err(e) => Err(Error::Rpc(format!("token balance query failed: {e}"))),
        }
    }

    async fn get_token_supply(&self, mint: &Pubkey) -> Result<TokenBalance> {
        let supply = self
            .rpc
            .get_token_supply(mint)
            .await
            .map_err(|e| Error::Rpc(format!("token supply query failed: {e}")))?;
        TokenBalance::try_from(supply)
    }

    async fn get_native_balance(&self, account: &Pubkey) -> Result<u64> {
        self.rpc
            .get_balance(account)
            .await
            .map_err(|e| Error::Rpc(format!("balance query failed: {e}")))
    }

    async fn account_exists(&self, account: &Pubkey) -> Result<bool> {
        let response = self
            .rpc
            .get_account_with_commitment(account, CommitmentConfig::processed())
            .await
            .map_err(|e| Error::Rpc(format!("account query failed: {e}")))?;
        Ok(response.value.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui_amount(amount: &str, ui: Option<f64>) -> UiTokenAmount {
        UiTokenAmount {
            ui_amount: ui,
            decimals: 6,
            amount: amount.to_string(),
            ui_amount_string: ui.map(|v| v.to_string()).unwrap_or_default(),
        }
    }

    #[test]
    fn test_token_balance_conversion() {
        let balance = TokenBalance::try_from(ui_amount("1500000", Some(1.5))).unwrap();
        assert_eq!(balance.amount, 1_500_000);
        assert_eq!(balance.ui_amount, 1.5);
    }

    #[test]
    fn test_token_balance_missing_ui_value() {
        let err = TokenBalance::try_from(ui_amount("1500000", None)).unwrap_err();
        assert!(matches!(err, Error::DataUnavailable(_)));
    }

    #[test]
    fn test_token_balance_bad_amount() {
        let err = TokenBalance::try_from(ui_amount("not-a-number", Some(1.0))).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
