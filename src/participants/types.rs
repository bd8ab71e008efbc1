//! Common types and traits for supply and demand participants.

use std::fmt;

use serde::Deserialize;

use crate::cost::CostFunction;
use crate::curve::Curve;

/// Unique identifier of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ParticipantKey(String);

impl ParticipantKey {
    /// Creates a key from anything string-like.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ParticipantKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl PartialEq<&str> for ParticipantKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Installed capacity of a producer.
///
/// `effective = number_of_units * output_capacity_per_unit * availability`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capacity {
    /// Number of installed units (may be fractional).
    pub number_of_units: f64,
    /// Output per unit (MW).
    pub output_capacity_per_unit: f64,
    /// Fraction of the installed capacity that is available (0..=1).
    pub availability: f64,
}

impl Capacity {
    /// Creates a capacity description.
    pub fn new(number_of_units: f64, output_capacity_per_unit: f64, availability: f64) -> Self {
        Self {
            number_of_units,
            output_capacity_per_unit,
            availability,
        }
    }

    /// Constant ceiling on instantaneous output (MW).
    pub fn effective(&self) -> f64 {
        self.number_of_units * self.output_capacity_per_unit * self.availability
    }
}

/// Anything that owns a per-point load curve.
///
/// Load curves are written by calculators only. A run starts by calling
/// [`Participant::reset`], which replaces the curve with a zeroed one of the
/// horizon length.
pub trait Participant {
    /// Unique key of the participant.
    fn key(&self) -> &ParticipantKey;

    /// Recorded load per point (output for producers, draw for users).
    fn load_curve(&self) -> &Curve;

    /// Mutable access to the load curve.
    fn load_curve_mut(&mut self) -> &mut Curve;

    /// Clears all run state for a horizon of `points`.
    fn reset(&mut self, points: usize) {
        *self.load_curve_mut() = Curve::zeros(points);
    }

    /// Load recorded at `point`.
    fn load_at(&self, point: usize) -> f64 {
        self.load_curve().get(point)
    }

    /// Total energy over the horizon (sum of the load curve).
    fn production(&self) -> f64 {
        self.load_curve().sum()
    }
}

/// A participant that supplies energy.
pub trait Supply: Participant {
    /// Marginal cost strategy.
    fn cost(&self) -> &CostFunction;

    /// Effective capacity (MW).
    fn capacity(&self) -> f64;

    /// Highest load that may be assigned at `point`.
    fn max_load_at(&self, point: usize) -> f64;

    /// Records `amount` as the producer's load at `point`.
    fn set_load(&mut self, point: usize, amount: f64) {
        self.load_curve_mut().set(point, amount);
    }

    /// Hours of full-capacity output equivalent to the recorded production.
    fn full_load_hours(&self) -> f64 {
        let capacity = self.capacity();
        if capacity > 0.0 {
            self.production() / capacity
        } else {
            0.0
        }
    }
}
