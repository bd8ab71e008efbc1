//! Merit-order dispatch engine.
//!
//! For every point of a planning horizon, demand is served by price-independent
//! producers first, then by price-competing producers in ascending cost order,
//! and the marginal producer is recorded as price-setting.

/// Exact and chunked calculators.
pub mod calc;
pub mod config;
pub mod cost;
pub mod curve;
pub mod error;
pub mod io;
pub mod order;
/// Producers, storage and users.
pub mod participants;
pub mod profile;
pub mod reserve;
pub mod summary;

pub use calc::{AveragingCalculator, Calculate, Calculator, QuantizingCalculator, Strategy};
pub use error::MeritError;
pub use order::Order;
