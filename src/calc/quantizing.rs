//! Chunked calculation that holds each computed point for the rest of its chunk.

use tracing::{debug, error, warn};

use crate::error::MeritError;
use crate::order::Order;
use crate::participants::Participant;

use super::allocation::{check_order, settle_storages};
use super::calculator::{compute_point, record_demand};
use super::{Calculate, DEFAULT_CHUNK_SIZE, validate_chunk_size};

/// Computes the first point of every chunk and repeats it for the others.
///
/// Performs `N / chunk_size` full evaluations instead of `N`. Suitable when
/// demand and cost change slowly relative to the chunk size.
///
/// Storage repeats the held reserve transaction on every point, so a
/// discharge held past the point where the reserve runs dry is reported but
/// not delivered.
#[derive(Debug, Clone, Copy)]
pub struct QuantizingCalculator {
    chunk_size: usize,
}

impl QuantizingCalculator {
    /// Creates a calculator evaluating one point in every `chunk_size`.
    ///
    /// # Errors
    ///
    /// Returns [`MeritError::InvalidChunkSize`] if `chunk_size <= 1`.
    pub fn new(chunk_size: usize) -> Result<Self, MeritError> {
        Ok(Self {
            chunk_size: validate_chunk_size(chunk_size)?,
        })
    }

    /// Points per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for QuantizingCalculator {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Calculate for QuantizingCalculator {
    fn calculate(&self, order: &mut Order) -> Result<(), MeritError> {
        check_order(order.producers())?;
        order.reset();

        let points = order.points();
        debug!(points, chunk_size = self.chunk_size, "calculating quantized merit order");

        let (producers, users, price_curve) = order.parts_mut();
        let mut unmet_chunks = 0_usize;

        for start in (0..points).step_by(self.chunk_size) {
            let outcome = compute_point(producers, users, price_curve, start).inspect_err(|e| {
                error!(point = start, error = %e, "quantized calculation aborted");
            })?;
            if outcome.unmet > 0.0 {
                unmet_chunks += 1;
            }

            let end = (start + self.chunk_size).min(points);
            for point in start + 1..end {
                record_demand(users, point);
                settle_storages(producers, point);
                for producer in producers.iter_mut() {
                    let held = producer.load_at(start);
                    producer.hold_load(point, held);
                }
                price_curve.set(point, outcome.price_setter);
            }
        }

        if unmet_chunks > 0 {
            warn!(unmet_chunks, "demand exceeded available supply");
        }
        Ok(())
    }
}
