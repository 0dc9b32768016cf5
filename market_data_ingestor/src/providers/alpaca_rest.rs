//! Alpaca market data REST provider (`/v2/stocks/bars`).

pub mod params;
pub mod provider;
pub mod response;

pub use params::{Adjustment, AlpacaBarsParams, Feed, Sort};
pub use provider::AlpacaProvider;
