use crate::cost::CostFunction;
use crate::curve::Curve;
use crate::reserve::{Decay, Reserve};

use super::types::{Capacity, Participant, ParticipantKey, Supply};

/// A storage technology that retains excess energy for later use.
///
/// `Storage` absorbs surplus from price-independent producers into its
/// [`Reserve`] and later competes in the merit order like a dispatchable
/// producer, limited by what the reserve can deliver.
///
/// # Load Convention
/// - Positive load: discharging (supplying the grid)
/// - Negative load: absorbing excess (net injection after storage)
///
/// Round-trip losses are modelled as two multiplicative efficiencies: energy
/// entering the reserve is scaled by `input_efficiency`, energy leaving it by
/// `output_efficiency`.
#[derive(Debug, Clone)]
pub struct Storage {
    key: ParticipantKey,
    capacity: Capacity,
    cost: CostFunction,
    reserve: Reserve,
    input_efficiency: f64,
    output_efficiency: f64,
    load_curve: Curve,
}

impl Storage {
    /// Creates a lossless storage participant with an empty reserve.
    ///
    /// # Arguments
    ///
    /// * `key` - Unique participant key
    /// * `capacity` - Charge/discharge capacity; also scales the reserve volume
    /// * `marginal_costs` - Cost of discharging, used for merit ordering
    /// * `volume_per_unit` - Energy volume of one unit (MWh)
    pub fn new(
        key: impl Into<ParticipantKey>,
        capacity: Capacity,
        marginal_costs: f64,
        volume_per_unit: f64,
    ) -> Self {
        let volume = volume_per_unit * capacity.number_of_units * capacity.availability;
        Self {
            key: key.into(),
            capacity,
            cost: CostFunction::Constant(marginal_costs),
            reserve: Reserve::new(volume.max(0.0)),
            input_efficiency: 1.0,
            output_efficiency: 1.0,
            load_curve: Curve::default(),
        }
    }

    /// Sets charging and discharging efficiencies.
    ///
    /// # Panics
    ///
    /// Panics if either efficiency is outside `(0.0, 1.0]`.
    pub fn with_efficiencies(mut self, input_efficiency: f64, output_efficiency: f64) -> Self {
        assert!(input_efficiency > 0.0 && input_efficiency <= 1.0);
        assert!(output_efficiency > 0.0 && output_efficiency <= 1.0);
        self.input_efficiency = input_efficiency;
        self.output_efficiency = output_efficiency;
        self
    }

    /// Replaces the reserve's decay function.
    pub fn with_decay(mut self, decay: Decay) -> Self {
        self.reserve = Reserve::with_decay(self.reserve.volume(), decay);
        self
    }

    /// The backing reserve.
    pub fn reserve(&self) -> &Reserve {
        &self.reserve
    }

    /// Charging efficiency.
    pub fn input_efficiency(&self) -> f64 {
        self.input_efficiency
    }

    /// Discharging efficiency.
    pub fn output_efficiency(&self) -> f64 {
        self.output_efficiency
    }

    /// Absorbs up to `amount` of excess supply at `point`.
    ///
    /// The amount is capped at the charging capacity and scaled by the input
    /// efficiency before entering the reserve. Whatever does not fit is lost.
    /// Returns the grid-side energy removed from circulation, which is also
    /// subtracted from the load curve.
    pub fn assign_excess(&mut self, point: usize, amount: f64) -> f64 {
        let offered = amount.min(self.capacity.effective()).max(0.0) * self.input_efficiency;
        let stored = self.reserve.add(point, offered) / self.input_efficiency;

        self.load_curve.subtract_at(point, stored);
        stored
    }

    /// Applies reserve decay for every point up to `point`.
    pub(crate) fn settle(&mut self, point: usize) {
        self.reserve.settle(point);
    }

    /// Records a held load at `point` and repeats the matching reserve
    /// transaction so the state of charge keeps evolving.
    pub(crate) fn replay_load(&mut self, point: usize, amount: f64) {
        self.load_curve.set(point, amount);
        if amount > 0.0 {
            self.reserve.take(point, amount / self.output_efficiency);
        } else if amount < 0.0 {
            self.reserve.add(point, -amount * self.input_efficiency);
        }
    }
}

impl Participant for Storage {
    fn key(&self) -> &ParticipantKey {
        &self.key
    }

    fn load_curve(&self) -> &Curve {
        &self.load_curve
    }

    fn load_curve_mut(&mut self) -> &mut Curve {
        &mut self.load_curve
    }

    fn reset(&mut self, points: usize) {
        self.load_curve = Curve::zeros(points);
        self.reserve.clear();
    }
}

impl Supply for Storage {
    fn cost(&self) -> &CostFunction {
        &self.cost
    }

    fn capacity(&self) -> f64 {
        self.capacity.effective()
    }

    fn max_load_at(&self, point: usize) -> f64 {
        let in_reserve = self.reserve.at(point) * self.output_efficiency;
        in_reserve.min(self.capacity.effective())
    }

    /// Records the discharge and debits the reserve by the energy needed to
    /// deliver it.
    fn set_load(&mut self, point: usize, amount: f64) {
        self.load_curve.set(point, amount);
        if amount != 0.0 {
            self.reserve.take(point, amount / self.output_efficiency);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn battery(input: f64, output: f64) -> Storage {
        let mut storage = Storage::new("battery", Capacity::new(1.0, 5.0, 1.0), 1.0, 10.0)
            .with_efficiencies(input, output);
        storage.reset(8);
        storage
    }

    #[test]
    fn reserve_volume_scales_with_units() {
        let storage = Storage::new("battery", Capacity::new(2.0, 1.0, 0.5), 0.0, 10.0);
        assert_eq!(storage.reserve().volume(), 10.0);
    }

    #[test]
    fn empty_storage_cannot_discharge() {
        let storage = battery(1.0, 1.0);
        assert_eq!(storage.max_load_at(0), 0.0);
    }

    #[test]
    fn excess_is_capped_at_capacity() {
        let mut storage = battery(1.0, 1.0);
        let stored = storage.assign_excess(0, 8.0);
        assert_eq!(stored, 5.0);
        assert_eq!(storage.load_at(0), -5.0);
        assert_eq!(storage.reserve().state(), 5.0);
    }

    #[test]
    fn excess_beyond_volume_is_lost() {
        let mut storage = battery(1.0, 1.0);
        storage.assign_excess(0, 5.0);
        storage.assign_excess(1, 5.0);
        assert_eq!(storage.assign_excess(2, 5.0), 0.0);
        assert_eq!(storage.load_at(2), 0.0);
    }

    #[test]
    fn input_efficiency_reduces_stored_energy() {
        let mut storage = battery(0.8, 1.0);
        let removed = storage.assign_excess(0, 5.0);
        // 5.0 * 0.8 = 4.0 enters the reserve; 5.0 grid-side is removed
        assert_abs_diff_eq!(storage.reserve().state(), 4.0);
        assert_abs_diff_eq!(removed, 5.0);
    }

    #[test]
    fn max_load_is_limited_by_reserve_and_output_efficiency() {
        let mut storage = battery(1.0, 0.5);
        storage.assign_excess(0, 4.0);
        assert_abs_diff_eq!(storage.max_load_at(1), 2.0);
    }

    #[test]
    fn max_load_is_limited_by_capacity() {
        let mut storage = battery(1.0, 1.0);
        storage.assign_excess(0, 5.0);
        storage.assign_excess(1, 5.0);
        assert_eq!(storage.max_load_at(2), 5.0);
    }

    #[test]
    fn set_load_debits_pre_efficiency_energy() {
        let mut storage = battery(1.0, 0.8);
        storage.assign_excess(0, 5.0);
        storage.set_load(1, 2.0);
        // delivering 2.0 needs 2.0 / 0.8 = 2.5 from the reserve
        assert_abs_diff_eq!(storage.reserve().state(), 2.5);
        assert_eq!(storage.load_at(1), 2.0);
    }

    #[test]
    fn decay_reduces_available_output() {
        let mut storage = battery(1.0, 1.0).with_decay(Decay::proportional(0.5));
        storage.reset(8);
        storage.assign_excess(0, 4.0);
        assert_abs_diff_eq!(storage.max_load_at(1), 2.0);
    }

    #[test]
    fn idle_storage_keeps_decaying() {
        let mut storage = battery(1.0, 1.0).with_decay(Decay::proportional(0.5));
        storage.reset(8);
        storage.assign_excess(0, 4.0);
        storage.settle(2);
        assert_abs_diff_eq!(storage.reserve().state(), 1.0);
        assert_abs_diff_eq!(storage.max_load_at(4), 0.25);
    }

    #[test]
    fn replay_tracks_reserve_both_ways() {
        let mut storage = battery(1.0, 1.0);
        storage.replay_load(0, -3.0);
        assert_eq!(storage.reserve().state(), 3.0);
        storage.replay_load(1, 1.0);
        assert_eq!(storage.reserve().state(), 2.0);
        assert_eq!(storage.load_at(1), 1.0);
    }

    #[test]
    fn reset_empties_reserve() {
        let mut storage = battery(1.0, 1.0);
        storage.assign_excess(0, 3.0);
        storage.reset(8);
        assert_eq!(storage.reserve().state(), 0.0);
        assert_eq!(storage.load_at(0), 0.0);
    }

    #[test]
    #[should_panic]
    fn invalid_efficiency_panics() {
        battery(0.0, 1.0);
    }
}
