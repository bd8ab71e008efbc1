use crate::cost::CostFunction;
use crate::curve::Curve;

use super::types::{Capacity, Participant, ParticipantKey, Supply};

/// A producer whose output the allocator may set anywhere in `[0, capacity]`.
///
/// With a `cost_spread` the marginal cost rises linearly with utilisation
/// around `marginal_costs`; such a producer may stop short of its capacity
/// when a cheaper alternative becomes available.
#[derive(Debug, Clone)]
pub struct Dispatchable {
    key: ParticipantKey,
    capacity: Capacity,
    cost: CostFunction,
    load_curve: Curve,
}

impl Dispatchable {
    /// Creates a flat-cost dispatchable producer.
    pub fn new(key: impl Into<ParticipantKey>, capacity: Capacity, marginal_costs: f64) -> Self {
        Self {
            key: key.into(),
            capacity,
            cost: CostFunction::Constant(marginal_costs),
            load_curve: Curve::default(),
        }
    }

    /// Creates a dispatchable producer whose cost rises with output.
    ///
    /// A `cost_spread` of zero is equivalent to [`Dispatchable::new`].
    pub fn with_cost_spread(
        key: impl Into<ParticipantKey>,
        capacity: Capacity,
        marginal_costs: f64,
        cost_spread: f64,
    ) -> Self {
        let cost = if cost_spread > 0.0 {
            CostFunction::Linear {
                mean: marginal_costs,
                spread: cost_spread,
            }
        } else {
            CostFunction::Constant(marginal_costs)
        };
        Self {
            key: key.into(),
            capacity,
            cost,
            load_curve: Curve::default(),
        }
    }
}

impl Participant for Dispatchable {
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

impl Supply for Dispatchable {
    fn cost(&self) -> &CostFunction {
        &self.cost
    }

    fn capacity(&self) -> f64 {
        self.capacity.effective()
    }

    fn max_load_at(&self, _point: usize) -> f64 {
        self.capacity.effective()
    }
}
