use crate::cost::CostFunction;
use crate::curve::Curve;

use super::types::{Capacity, Participant, ParticipantKey, Supply};

/// Import capacity priced by an external market.
///
/// The marginal cost is supplied per point, so the interconnect's position in
/// the merit order may change from one point to the next.
#[derive(Debug, Clone)]
pub struct SupplyInterconnect {
    key: ParticipantKey,
    capacity: Capacity,
    cost: CostFunction,
    load_curve: Curve,
}

impl SupplyInterconnect {
    /// Creates an interconnect with a per-point cost curve.
    pub fn new(key: impl Into<ParticipantKey>, capacity: Capacity, cost_curve: Curve) -> Self {
        Self {
            key: key.into(),
            capacity,
            cost: CostFunction::Curve(cost_curve),
            load_curve: Curve::default(),
        }
    }
}

impl Participant for SupplyInterconnect {
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

impl Supply for SupplyInterconnect {
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
