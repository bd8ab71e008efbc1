//! Error conditions raised while building participants or running a calculation.

use thiserror::Error;

use crate::participants::ParticipantKey;

/// Errors local to a single participant construction or calculation run.
///
/// None of these are retried internally; the caller decides whether to fix
/// the configuration and run again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeritError {
    /// A required descriptor field was absent.
    #[error("participant `{key}` is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// Key of the offending participant (`"?"` when the key itself is missing).
        key: String,
        /// Name of the absent field.
        attribute: &'static str,
    },

    /// The descriptor names a participant type this crate does not know.
    #[error("participant `{key}` has unknown type `{kind}`")]
    UnknownParticipantType {
        /// Key of the offending participant.
        key: String,
        /// The unrecognised type name.
        kind: String,
    },

    /// Producers were not supplied in non-decreasing base cost order.
    #[error(
        "producer `{producer}` (cost {cost}) follows `{previous}` (cost {previous_cost}); \
         producers must be ordered by ascending marginal cost"
    )]
    IncorrectProducerOrder {
        /// The producer whose cost breaks the ordering.
        producer: ParticipantKey,
        /// Its base marginal cost.
        cost: f64,
        /// The more expensive producer visited before it.
        previous: ParticipantKey,
        /// Base marginal cost of `previous`.
        previous_cost: f64,
    },

    /// Non-curtailable supply exceeded demand and storage could not absorb it.
    #[error("sub-zero demand ({demand}) in point {point}")]
    SubZeroDemand {
        /// Point at which the excess occurred.
        point: usize,
        /// Residual (negative) demand after storage absorption.
        demand: f64,
    },

    /// A chunked calculator was configured with a chunk size of one or less.
    #[error("chunk size must be greater than 1, got {0}")]
    InvalidChunkSize(usize),
}
