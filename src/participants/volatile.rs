use crate::cost::CostFunction;
use crate::curve::{Curve, LoadProfile};

use super::types::{Capacity, Participant, ParticipantKey, Supply};

/// A weather-driven producer (wind, solar) following an availability profile.
///
/// Output is whatever the weather allows; it is not curtailed by the
/// allocation.
#[derive(Debug, Clone)]
pub struct Volatile {
    key: ParticipantKey,
    capacity: Capacity,
    cost: CostFunction,
    profile: LoadProfile,
    load_curve: Curve,
}

impl Volatile {
    /// Creates a volatile producer.
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

impl Participant for Volatile {
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

impl Supply for Volatile {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_profile_means_no_output() {
        let wind = Volatile::new(
            "wind",
            Capacity::new(1.0, 0.1, 0.95),
            19.99,
            LoadProfile::flat(0.0),
        );
        assert_eq!(wind.max_load_at(12), 0.0);
        assert!((wind.capacity() - 0.095).abs() < 1e-12);
    }
}
