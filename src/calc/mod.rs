//! Calculators that allocate demand across the merit order.
//!
//! [`Calculator`] evaluates every point. [`QuantizingCalculator`] and
//! [`AveragingCalculator`] trade temporal resolution for speed by evaluating
//! once per chunk of points.

mod allocation;
pub mod averaging;
pub mod calculator;
pub mod quantizing;

pub use averaging::AveragingCalculator;
pub use calculator::Calculator;
pub use quantizing::QuantizingCalculator;

use crate::error::MeritError;
use crate::order::Order;

/// Default number of points per chunk for the approximate calculators.
pub const DEFAULT_CHUNK_SIZE: usize = 8;

/// Demand or supply below this magnitude is treated as zero.
pub(crate) const TOLERANCE: f64 = 1e-9;

/// A dispatch strategy over an [`Order`].
///
/// Implementations reset every load curve, process points in increasing
/// order, and write loads onto participants and price setters onto the
/// order's price curve. A failed run leaves curves in an undefined state.
pub trait Calculate {
    /// Runs the allocation over the whole horizon.
    ///
    /// # Errors
    ///
    /// Returns [`MeritError::IncorrectProducerOrder`] if producers are not in
    /// ascending cost order and [`MeritError::SubZeroDemand`] if excess supply
    /// cannot be absorbed.
    fn calculate(&self, order: &mut Order) -> Result<(), MeritError>;
}

/// A calculator selected at runtime, e.g. from a scenario file.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    Exact(Calculator),
    Quantizing(QuantizingCalculator),
    Averaging(AveragingCalculator),
}

impl Strategy {
    /// Name used in scenario files and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::Quantizing(_) => "quantizing",
            Self::Averaging(_) => "averaging",
        }
    }
}

impl Calculate for Strategy {
    fn calculate(&self, order: &mut Order) -> Result<(), MeritError> {
        match self {
            Self::Exact(c) => c.calculate(order),
            Self::Quantizing(c) => c.calculate(order),
            Self::Averaging(c) => c.calculate(order),
        }
    }
}

/// Validates the chunk size shared by the approximate calculators.
pub(crate) fn validate_chunk_size(chunk_size: usize) -> Result<usize, MeritError> {
    if chunk_size > 1 {
        Ok(chunk_size)
    } else {
        Err(MeritError::InvalidChunkSize(chunk_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn rejects_small_chunks(#[case] size: usize) {
        assert_eq!(
            validate_chunk_size(size),
            Err(MeritError::InvalidChunkSize(size))
        );
    }

    #[rstest]
    #[case(2)]
    #[case(DEFAULT_CHUNK_SIZE)]
    #[case(24)]
    fn accepts_larger_chunks(#[case] size: usize) {
        assert_eq!(validate_chunk_size(size), Ok(size));
    }

    #[test]
    fn strategy_names() {
        assert_eq!(Strategy::Exact(Calculator::new()).name(), "exact");
        assert_eq!(
            Strategy::Quantizing(QuantizingCalculator::default()).name(),
            "quantizing"
        );
        assert_eq!(
            Strategy::Averaging(AveragingCalculator::default()).name(),
            "averaging"
        );
    }
}
