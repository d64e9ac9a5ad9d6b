//! Swap execution with retry discipline

pub mod gateway;

pub use gateway::{ExecutionGateway, RetryBudget};
