//! Supply and demand participants of the merit order.

/// Price-competing producers with flat or rising cost.
pub mod dispatchable;
/// Externally priced import capacity.
pub mod interconnect;
pub mod must_run;
/// Storage backed by a reserve.
pub mod storage;
pub mod types;
pub mod user;
/// Weather-driven producers.
pub mod volatile;

pub use dispatchable::Dispatchable;
pub use interconnect::SupplyInterconnect;
pub use must_run::MustRun;
pub use storage::Storage;
pub use types::{Capacity, Participant, ParticipantKey, Supply};
pub use user::{Demand, User};
pub use volatile::Volatile;

use crate::cost::CostFunction;
use crate::curve::Curve;

/// Any supply participant.
///
/// A closed set of variants; calculators dispatch on it without caring which
/// concrete producer they hold, except where a variant's role in the
/// allocation differs (price-independent output, storage absorption).
#[derive(Debug, Clone)]
pub enum Producer {
    MustRun(MustRun),
    Volatile(Volatile),
    Dispatchable(Dispatchable),
    Interconnect(SupplyInterconnect),
    Storage(Storage),
}

impl Producer {
    fn supply(&self) -> &dyn Supply {
        match self {
            Self::MustRun(p) => p,
            Self::Volatile(p) => p,
            Self::Dispatchable(p) => p,
            Self::Interconnect(p) => p,
            Self::Storage(p) => p,
        }
    }

    fn supply_mut(&mut self) -> &mut dyn Supply {
        match self {
            Self::MustRun(p) => p,
            Self::Volatile(p) => p,
            Self::Dispatchable(p) => p,
            Self::Interconnect(p) => p,
            Self::Storage(p) => p,
        }
    }

    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MustRun(_) => "must_run",
            Self::Volatile(_) => "volatile",
            Self::Dispatchable(_) => "dispatchable",
            Self::Interconnect(_) => "interconnect",
            Self::Storage(_) => "storage",
        }
    }

    /// `true` for producers whose output is not set by the allocation.
    pub fn is_always_on(&self) -> bool {
        matches!(self, Self::MustRun(_) | Self::Volatile(_))
    }

    /// Merit-order ranking cost.
    pub fn base_cost(&self) -> f64 {
        self.cost().base_cost()
    }

    /// The storage variant, if this is one.
    pub fn as_storage(&self) -> Option<&Storage> {
        match self {
            Self::Storage(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable access to the storage variant, if this is one.
    pub fn as_storage_mut(&mut self) -> Option<&mut Storage> {
        match self {
            Self::Storage(s) => Some(s),
            _ => None,
        }
    }

    /// Records a load copied from another point.
    ///
    /// Storage repeats the matching reserve transaction.
    pub(crate) fn hold_load(&mut self, point: usize, amount: f64) {
        match self {
            Self::Storage(s) => s.replay_load(point, amount),
            other => other.set_load(point, amount),
        }
    }
}

impl Participant for Producer {
    fn key(&self) -> &ParticipantKey {
        self.supply().key()
    }

    fn load_curve(&self) -> &Curve {
        self.supply().load_curve()
    }

    fn load_curve_mut(&mut self) -> &mut Curve {
        self.supply_mut().load_curve_mut()
    }

    fn reset(&mut self, points: usize) {
        self.supply_mut().reset(points);
    }
}

impl Supply for Producer {
    fn cost(&self) -> &CostFunction {
        self.supply().cost()
    }

    fn capacity(&self) -> f64 {
        self.supply().capacity()
    }

    fn max_load_at(&self, point: usize) -> f64 {
        self.supply().max_load_at(point)
    }

    fn set_load(&mut self, point: usize, amount: f64) {
        self.supply_mut().set_load(point, amount);
    }
}

impl From<MustRun> for Producer {
    fn from(p: MustRun) -> Self {
        Self::MustRun(p)
    }
}

impl From<Volatile> for Producer {
    fn from(p: Volatile) -> Self {
        Self::Volatile(p)
    }
}

impl From<Dispatchable> for Producer {
    fn from(p: Dispatchable) -> Self {
        Self::Dispatchable(p)
    }
}

impl From<SupplyInterconnect> for Producer {
    fn from(p: SupplyInterconnect) -> Self {
        Self::Interconnect(p)
    }
}

impl From<Storage> for Producer {
    fn from(p: Storage) -> Self {
        Self::Storage(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::LoadProfile;

    #[test]
    fn enum_delegates_to_variant() {
        let mut producer: Producer =
            Dispatchable::new("gas", Capacity::new(1.0, 2.0, 1.0), 40.0).into();
        producer.reset(2);
        producer.set_load(1, 1.5);
        assert_eq!(producer.key(), &ParticipantKey::new("gas"));
        assert_eq!(producer.base_cost(), 40.0);
        assert_eq!(producer.load_at(1), 1.5);
        assert_eq!(producer.kind(), "dispatchable");
        assert!(!producer.is_always_on());
    }

    #[test]
    fn must_run_and_volatile_are_always_on() {
        let chp: Producer =
            MustRun::new("chp", Capacity::new(1.0, 1.0, 1.0), 0.0, LoadProfile::flat(1.0)).into();
        let pv: Producer =
            Volatile::new("pv", Capacity::new(1.0, 1.0, 1.0), 0.0, LoadProfile::flat(0.5)).into();
        assert!(chp.is_always_on());
        assert!(pv.is_always_on());
        assert!(chp.as_storage().is_none());
    }

    #[test]
    fn storage_reset_goes_through_enum() {
        let mut producer: Producer =
            Storage::new("battery", Capacity::new(1.0, 1.0, 1.0), 0.0, 4.0).into();
        producer.reset(3);
        if let Some(storage) = producer.as_storage_mut() {
            storage.assign_excess(0, 1.0);
        }
        producer.reset(3);
        assert_eq!(producer.as_storage().map(|s| s.reserve().state()), Some(0.0));
    }
}
