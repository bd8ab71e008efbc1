use crate::cost::CostFunction;
use crate::curve::{Curve, LoadProfile};

use super::types::{Capacity, Participant, ParticipantKey, Supply};

/// A producer whose output is fixed by external conditions.
///
/// Must-run plants (e.g. heat-led CHP) always produce `capacity * profile` and
/// are never curtailed for economic reasons.
#[derive(Debug, Clone)]
pub struct MustRun {
    key: ParticipantKey,
    capacity: Capacity,
    cost: CostFunction,
    profile: LoadProfile,
    load_curve: Curve,
}

impl MustRun {
    /// Creates a must-run producer.
    ///
    /// # Arguments
    ///
    /// * `key` - Unique participant key
    /// * `capacity` - Installed capacity
    /// * `marginal_costs` - Marginal cost per MWh
    /// * `profile` - Capacity factor per point (0..=1)
    pub fn new(
        key: impl Into<ParticipantKey>,
        capacity: Capacity,
        marginal_costs: f64,
        profile: LoadProfile,
    ) -> Self {
        Self {
            key: key.into(),
            capacity,
            cost: CostFunction::Constant(marginal_costs),
            profile,
            load_curve: Curve::default(),
        }
    }
}

impl Participant for MustRun {
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

impl Supply for MustRun {
    fn cost(&self) -> &CostFunction {
        &self.cost
    }

    fn capacity(&self) -> f64 {
        self.capacity.effective()
    }

    fn max_load_at(&self, point: usize) -> f64 {
        self.capacity.effective() * self.profile.at(point)
    }
}
