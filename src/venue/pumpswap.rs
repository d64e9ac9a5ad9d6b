//! PumpSwap venue adapter
//!
//! Builds swap transactions (idempotent account creation plus native
//! wrapping on the quote side), simulates them, and submits only when
//! simulation reports no error.

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    system_instruction, system_program,
    transaction::Transaction,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chain::ChainReader;
use crate::error::{Error, Result};
use crate::market::units::{max_in_with_slippage, min_out_with_slippage};
use crate::venue::program::{derive_base_vault, derive_quote_vault, DISCRIMINATORS, PUMPSWAP_PROGRAM_ID};
use crate::venue::{Direction, TxResult, VenueAdapter};

/// Venue adapter for one PumpSwap pool
pub struct PumpSwapVenue {
    rpc: Arc<RpcClient>,
    chain: Arc<dyn ChainReader>,
    keypair: Arc<Keypair>,
    pool: Pubkey,
    mint: Pubkey,
    base_vault: Pubkey,
    quote_vault: Pubkey,
    slippage_bps: u32,
}

impl PumpSwapVenue {
    pub fn new(
        rpc: Arc<RpcClient>,
        chain: Arc<dyn ChainReader>,
        keypair: Arc<Keypair>,
        pool: Pubkey,
        mint: Pubkey,
        slippage_bps: u32,
    ) -> Self {
        let (base_vault, _) = derive_base_vault(&pool);
        let (quote_vault, _) = derive_quote_vault(&pool);

        Self {
            rpc,
            chain,
            keypair,
            pool,
            mint,
            base_vault,
            quote_vault,
            slippage_bps,
        }
    }

    /// Pool base token vault, for the price oracle
    pub fn base_vault(&self) -> Pubkey {
        self.base_vault
    }

    /// Pool quote token vault, for the price oracle
    pub fn quote_vault(&self) -> Pubkey {
        self.quote_vault
    }

    fn user_base_ata(&self) -> Pubkey {
        spl_associated_token_account::get_associated_token_address(
            &self.keypair.pubkey(),
            &self.mint,
        )
    }

    fn user_quote_ata(&self) -> Pubkey {
        spl_associated_token_account::get_associated_token_address(
            &self.keypair.pubkey(),
            &spl_token::native_mint::ID,
        )
    }

    /// Pool reserves in base units: (base, quote)
    async fn reserves(&self) -> Result<(u64, u64)> {
        let base = self
            .chain
            .get_token_balance(&self.base_vault)
            .await
            .map_err(|e| Error::Quote(format!("base vault read failed: {e}")))?
            .ok_or_else(|| Error::Quote("base vault account missing".into()))?;
        let quote = self
            .chain
            .get_token_balance(&self.quote_vault)
            .await
            .map_err(|e| Error::Quote(format!("quote vault read failed: {e}")))?
            .ok_or_else(|| Error::Quote("quote vault account missing".into()))?;
        Ok((base.amount, quote.amount))
    }

    /// Wrap native SOL into the user's wSOL account so buys have a funded
    /// quote side. Done once up front for the whole session.
    pub async fn wrap_native(&self, lamports: u64) -> Result<Signature> {
        let user = self.keypair.pubkey();
        let quote_ata = self.user_quote_ata();

        let instructions = vec![
            spl_associated_token_account::instruction::create_associated_token_account_idempotent(
                &user,
                &user,
                &spl_token::native_mint::ID,
                &spl_token::ID,
            ),
            system_instruction::transfer(&user, &quote_ata, lamports),
            spl_token::instruction::sync_native(&spl_token::ID, &quote_ata)
                .map_err(|e| Error::SubmissionFailed(format!("sync_native build failed: {e}")))?,
        ];

        let signature = self.simulate_then_send(instructions).await?;
        info!(%signature, lamports, "wrapped native SOL");
        Ok(signature)
    }

    fn build_swap_instruction(
        &self,
        direction: Direction,
        amount_in: u64,
        expected_out: u64,
    ) -> Instruction {
        let mut data = Vec::with_capacity(24);
        match direction {
            Direction::QuoteToBase => {
                // buy: (base_amount_out, max_quote_amount_in)
                data.extend_from_slice(&DISCRIMINATORS::BUY);
                data.extend_from_slice(&expected_out.to_le_bytes());
                data.extend_from_slice(
                    &max_in_with_slippage(amount_in, self.slippage_bps).to_le_bytes(),
                );
            }
            Direction::BaseToQuote => {
                // sell: (base_amount_in, min_quote_amount_out)
                data.extend_from_slice(&DISCRIMINATORS::SELL);
                data.extend_from_slice(&amount_in.to_le_bytes());
                data.extend_from_slice(
                    &min_out_with_slippage(expected_out, self.slippage_bps).to_le_bytes(),
                );
            }
        }

        // Order matters! Must match the PumpSwap program expectations
        let accounts = vec![
            AccountMeta::new(self.pool, false),                        // pool
            AccountMeta::new(self.keypair.pubkey(), true),             // user (signer)
            AccountMeta::new_readonly(self.mint, false),               // base_mint
            AccountMeta::new_readonly(spl_token::native_mint::ID, false), // quote_mint
            AccountMeta::new(self.user_base_ata(), false),             // user_base_token_account
            AccountMeta::new(self.user_quote_ata(), false),            // user_quote_token_account
            AccountMeta::new(self.base_vault, false),                  // pool_base_token_account
            AccountMeta::new(self.quote_vault, false),                 // pool_quote_token_account
            AccountMeta::new_readonly(spl_token::ID, false),           // token_program
            AccountMeta::new_readonly(spl_associated_token_account::ID, false), // associated_token_program
            AccountMeta::new_readonly(system_program::ID, false),      // system_program
            AccountMeta::new_readonly(*PUMPSWAP_PROGRAM_ID, false),    // program
        ];

        Instruction {
            program_id: *PUMPSWAP_PROGRAM_ID,
            accounts,
            data,
        }
    }

    /// Simulate the transaction and submit only on a clean simulation
    async fn simulate_then_send(&self, instructions: Vec<Instruction>) -> Result<Signature> {
        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| Error::SubmissionFailed(format!("blockhash fetch failed: {e}")))?;

        let transaction = Transaction::new_signed_with_payer(
            &instructions,
            Some(&self.keypair.pubkey()),
            &[self.keypair.as_ref()],
            blockhash,
        );

        let simulation = self
            .rpc
            .simulate_transaction(&transaction)
            .await
            .map_err(|e| Error::SimulationFailed(e.to_string()))?;

        if let Some(err) = simulation.value.err {
            for log in simulation.value.logs.unwrap_or_default() {
                debug!("  sim log: {}", log);
            }
            return Err(Error::SimulationFailed(err.to_string()));
        }
        debug!(
            compute_units = ?simulation.value.units_consumed,
            "simulation succeeded"
        );

        self.rpc
            .send_and_confirm_transaction(&transaction)
            .await
            .map_err(|e| Error::SubmissionFailed(e.to_string()))
    }
}

/// Constant product output amount: out = reserve_out * in / (reserve_in + in),
/// floored. The program floors the taker's output, so the quote must too;
/// rounding up would also inflate the slippage limit sent on-chain.
fn constant_product_out(reserve_in: u64, reserve_out: u64, amount_in: u64) -> Result<u64> {
    if reserve_in == 0 || reserve_out == 0 {
        return Err(Error::Quote("pool reserves exhausted".into()));
    }

    let new_reserve_in = (reserve_in as u128)
        .checked_add(amount_in as u128)
        .ok_or_else(|| Error::Quote("reserve overflow".into()))?;

    let amount_out = (reserve_out as u128)
        .checked_mul(amount_in as u128)
        .ok_or_else(|| Error::Quote("reserve overflow".into()))?
        / new_reserve_in;

    Ok(amount_out as u64)
}

#[async_trait::async_trait]
impl VenueAdapter for PumpSwapVenue {
    async fn quote(&self, direction: Direction, amount_in: u64) -> Result<u64> {
        let (base_reserve, quote_reserve) = self.reserves().await?;

        match direction {
            Direction::QuoteToBase => constant_product_out(quote_reserve, base_reserve, amount_in),
            Direction::BaseToQuote => constant_product_out(base_reserve, quote_reserve, amount_in),
        }
    }

    async fn swap(&self, direction: Direction, amount_in: u64) -> Result<TxResult> {
        let expected_out = self.quote(direction, amount_in).await?;

        let user = self.keypair.pubkey();
        let mut instructions = vec![
            spl_associated_token_account::instruction::create_associated_token_account_idempotent(
                &user,
                &user,
                &self.mint,
                &spl_token::ID,
            ),
            spl_associated_token_account::instruction::create_associated_token_account_idempotent(
                &user,
                &user,
                &spl_token::native_mint::ID,
                &spl_token::ID,
            ),
        ];

        // Buys spend wSOL: top up the wrapped account from native balance
        if direction == Direction::QuoteToBase {
            let quote_ata = self.user_quote_ata();
            instructions.push(system_instruction::transfer(&user, &quote_ata, amount_in));
            instructions.push(
                spl_token::instruction::sync_native(&spl_token::ID, &quote_ata).map_err(|e| {
                    Error::SubmissionFailed(format!("sync_native build failed: {e}"))
                })?,
            );
        }

        instructions.push(self.build_swap_instruction(direction, amount_in, expected_out));

        match self.simulate_then_send(instructions).await {
            Ok(signature) => {
                info!(%signature, %direction, amount_in, expected_out, "swap confirmed");
                Ok(TxResult {
                    signature,
                    direction,
                    amount_in,
                })
            }
            Err(e) => {
                warn!(%direction, amount_in, "swap failed: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_product_out() {
        // 1000 in-reserve, 1000 out-reserve, 100 in => floor(1000*100/1100) = 90
        assert_eq!(constant_product_out(1000, 1000, 100).unwrap(), 90);
    }

    #[test]
    fn test_constant_product_rounds_down() {
        // 1000*1/1001 = 0.999...; the taker gets the floored amount
        assert_eq!(constant_product_out(1000, 1000, 1).unwrap(), 0);
        // Dust input against a deep pool must not conjure a unit of output
        assert_eq!(constant_product_out(1_000_000_000, 10, 1).unwrap(), 0);
    }

    #[test]
    fn test_constant_product_empty_pool() {
        let err = constant_product_out(0, 1000, 100).unwrap_err();
        assert!(matches!(err, Error::Quote(_)));
    }

    fn venue_for_test() -> PumpSwapVenue {
        struct NoChain;

        #[async_trait::async_trait]
        impl ChainReader for NoChain {
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
                unimplemented!()
            }
        }

        PumpSwapVenue::new(
            Arc::new(RpcClient::new("http://localhost:8899".to_string())),
            Arc::new(NoChain),
            Arc::new(Keypair::new()),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            2500,
        )
    }

    #[test]
    fn test_buy_instruction_arguments() {
        let venue = venue_for_test();
        let ix = venue.build_swap_instruction(Direction::QuoteToBase, 1_000_000_000, 500_000);

        assert_eq!(&ix.data[0..8], &DISCRIMINATORS::BUY);
        // base_amount_out is the quoted output; max_quote_amount_in carries
        // the slippage allowance (25% over the budgeted input)
        assert_eq!(ix.data[8..16], 500_000u64.to_le_bytes());
        assert_eq!(ix.data[16..24], 1_250_000_000u64.to_le_bytes());
    }

    #[test]
    fn test_sell_instruction_arguments() {
        let venue = venue_for_test();
        let ix = venue.build_swap_instruction(Direction::BaseToQuote, 500_000, 1_000_000_000);

        assert_eq!(&ix.data[0..8], &DISCRIMINATORS::SELL);
        // base_amount_in is the full position; min_quote_amount_out takes
        // the slippage haircut (25% under the quote)
        assert_eq!(ix.data[8..16], 500_000u64.to_le_bytes());
        assert_eq!(ix.data[16..24], 750_000_000u64.to_le_bytes());
    }

    #[test]
    fn test_constant_product_price_impact() {
        // Larger trades get worse effective prices
        let small = constant_product_out(1_000_000, 1_000_000, 1_000).unwrap();
        let large = constant_product_out(1_000_000, 1_000_000, 500_000).unwrap();
        let small_rate = small as f64 / 1_000.0;
        let large_rate = large as f64 / 500_000.0;
        assert!(small_rate > large_rate);
    }
}
