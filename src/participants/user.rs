use crate::curve::{Curve, LoadProfile};

use super::types::{Participant, ParticipantKey};

/// Where a user's demand comes from.
#[derive(Debug, Clone)]
pub enum Demand {
    /// `total_consumption` distributed over the horizon by a profile.
    Profile {
        /// Total consumption over the horizon.
        total_consumption: f64,
        /// Share of the total falling in each point.
        profile: LoadProfile,
    },
    /// Demand given point by point.
    Curve(Curve),
}

/// A consumer of energy.
///
/// Demand is not price-responsive. The calculator copies each point's demand
/// into the user's load curve.
#[derive(Debug, Clone)]
pub struct User {
    key: ParticipantKey,
    demand: Demand,
    load_curve: Curve,
}

impl User {
    /// Creates a user whose demand is `total_consumption * profile`.
    pub fn with_profile(
        key: impl Into<ParticipantKey>,
        total_consumption: f64,
        profile: LoadProfile,
    ) -> Self {
        Self {
            key: key.into(),
            demand: Demand::Profile {
                total_consumption,
                profile,
            },
            load_curve: Curve::default(),
        }
    }

    /// Creates a user with an explicit demand curve.
    pub fn with_curve(key: impl Into<ParticipantKey>, demand: Curve) -> Self {
        Self {
            key: key.into(),
            demand: Demand::Curve(demand),
            load_curve: Curve::default(),
        }
    }

    /// Demand at `point`.
    pub fn demand_at(&self, point: usize) -> f64 {
        match &self.demand {
            Demand::Profile {
                total_consumption,
                profile,
            } => total_consumption * profile.at(point),
            Demand::Curve(curve) => curve.get(point),
        }
    }

    /// Records the demand served at `point`.
    pub(crate) fn record(&mut self, point: usize, amount: f64) {
        self.load_curve.set(point, amount);
    }
}

impl Participant for User {
    fn key(&self) -> &ParticipantKey {
        &self.key
    }

    fn load_curve(&self) -> &Curve {
        &self.load_curve
    }

    fn load_curve_mut(&mut self) -> &mut Curve {
        &mut self.load_curve
    }
}
