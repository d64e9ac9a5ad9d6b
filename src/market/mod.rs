//! Market observation - pool price, market cap and unit conversions

pub mod oracle;
pub mod units;

pub use oracle::{compute_market_cap, spot_price, MarketSnapshot, PriceOracle};
