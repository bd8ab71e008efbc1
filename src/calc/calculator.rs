//! Exact per-point merit order calculation.

use tracing::{debug, error, trace, warn};

use crate::error::MeritError;
use crate::order::{Order, PriceCurve};
use crate::participants::{Participant, Producer, Supply, User};

use super::allocation::{
    Candidate, absorb_excess, allocate, check_order, merit_sequence, run_always_on, settle_storages,
};
use super::{Calculate, TOLERANCE};

/// Outcome of allocating a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PointOutcome {
    /// Producer index of the marginal unit.
    pub price_setter: Option<usize>,
    /// Demand no producer could serve.
    pub unmet: f64,
}

/// Runs the full allocation for every point of the horizon.
///
/// For each point: sum user demand, assign must-run and volatile output,
/// hand any excess to storage, then walk the remaining producers in merit
/// order until demand is met.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calculator;

impl Calculator {
    /// Creates an exact calculator.
    pub fn new() -> Self {
        Self
    }
}

impl Calculate for Calculator {
    fn calculate(&self, order: &mut Order) -> Result<(), MeritError> {
        check_order(order.producers())?;
        order.reset();

        let points = order.points();
        debug!(points, producers = order.producers().len(), "calculating merit order");

        let (producers, users, price_curve) = order.parts_mut();
        let mut unmet_points = 0_usize;

        for point in 0..points {
            let outcome = compute_point(producers, users, price_curve, point).inspect_err(|e| {
                error!(point, error = %e, "merit order calculation aborted");
            })?;
            if outcome.unmet > 0.0 {
                unmet_points += 1;
            }
        }

        if unmet_points > 0 {
            warn!(unmet_points, "demand exceeded available supply");
        }
        debug!("merit order calculation complete");
        Ok(())
    }
}

/// Allocates `point` and records loads and the price setter.
pub(crate) fn compute_point(
    producers: &mut [Producer],
    users: &mut [User],
    price_curve: &mut PriceCurve,
    point: usize,
) -> Result<PointOutcome, MeritError> {
    settle_storages(producers, point);
    let mut demand = record_demand(users, point);
    demand -= run_always_on(producers, point);

    if demand < 0.0 {
        let left = absorb_excess(producers, point, -demand);
        if left > TOLERANCE {
            return Err(MeritError::SubZeroDemand {
                point,
                demand: -left,
            });
        }
        demand = 0.0;
    }

    let outcome = if demand > TOLERANCE {
        let allocation = {
            let candidates: Vec<Candidate<'_>> = merit_sequence(producers, point)
                .into_iter()
                .map(|i| Candidate::new(i, &producers[i], producers[i].max_load_at(point)))
                .collect();
            allocate(point, demand, &candidates)
        };

        for &(index, load) in &allocation.loads {
            if load > 0.0 {
                producers[index].set_load(point, load);
            }
        }
        PointOutcome {
            price_setter: allocation.price_setter,
            unmet: allocation.unmet,
        }
    } else {
        PointOutcome {
            price_setter: None,
            unmet: 0.0,
        }
    };

    trace!(
        point,
        demand,
        price_setter = ?outcome.price_setter.map(|i| producers[i].key().to_string()),
        "point allocated"
    );
    price_curve.set(point, outcome.price_setter);
    Ok(outcome)
}

/// Copies each user's demand at `point` into its load curve and returns the total.
pub(crate) fn record_demand(users: &mut [User], point: usize) -> f64 {
    users
        .iter_mut()
        .map(|user| {
            let demand = user.demand_at(point);
            user.record(point, demand);
            demand
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Curve, LoadProfile};
    use crate::participants::{Capacity, Dispatchable, MustRun, Storage, Volatile};
    use approx::assert_abs_diff_eq;

    fn gas(key: &str, capacity: f64, cost: f64) -> Dispatchable {
        Dispatchable::new(key, Capacity::new(1.0, capacity, 1.0), cost)
    }

    #[test]
    fn cheapest_dispatchable_sets_price_under_low_demand() {
        let mut order = Order::with_points(3);
        order
            .add_producer(MustRun::new(
                "chp",
                Capacity::new(1.0, 1.0, 1.0),
                0.0,
                LoadProfile::flat(1.0),
            ))
            .add_producer(gas("coal", 2.0, 14.0))
            .add_producer(gas("gas", 2.0, 16.0))
            .add_user(User::with_curve("city", Curve::filled(2.5, 3)));

        Calculator::new().calculate(&mut order).unwrap();

        for point in 0..3 {
            assert_eq!(order.price_setting_at(point).unwrap(), &"coal");
            assert_abs_diff_eq!(order.producer("coal").unwrap().load_at(point), 1.5);
            assert_eq!(order.producer("gas").unwrap().load_at(point), 0.0);
        }
    }

    #[test]
    fn second_dispatchable_sets_price_when_first_saturates() {
        let mut order = Order::with_points(1);
        order
            .add_producer(gas("coal", 1.0, 14.0))
            .add_producer(gas("gas", 1.0, 16.0))
            .add_user(User::with_curve("city", Curve::filled(1.4, 1)));

        Calculator::new().calculate(&mut order).unwrap();

        assert_eq!(order.producer("coal").unwrap().load_at(0), 1.0);
        assert_abs_diff_eq!(order.producer("gas").unwrap().load_at(0), 0.4);
        assert_eq!(order.price_setting_at(0).unwrap(), &"gas");
        assert_abs_diff_eq!(order.price_at(0).unwrap(), 16.0);
    }

    #[test]
    fn excess_demand_has_no_price_setter() {
        let mut order = Order::with_points(1);
        order
            .add_producer(gas("coal", 1.0, 14.0))
            .add_user(User::with_curve("city", Curve::filled(3.0, 1)));

        Calculator::new().calculate(&mut order).unwrap();

        assert_eq!(order.producer("coal").unwrap().load_at(0), 1.0);
        assert_eq!(order.price_setting_at(0), None);
        assert_eq!(order.price_at(0), None);
    }

    #[test]
    fn negative_demand_without_storage_fails_at_point() {
        let mut order = Order::with_points(4);
        order
            .add_producer(gas("coal", 1.0, 14.0))
            .add_user(User::with_curve("city", Curve::new(vec![0.0, 0.0, -1.0, 3.0])));

        let err = Calculator::new().calculate(&mut order).unwrap_err();
        assert!(matches!(err, MeritError::SubZeroDemand { point: 2, .. }));
    }

    #[test]
    fn storage_absorbs_excess_and_discharges_later() {
        let mut order = Order::with_points(2);
        order
            .add_producer(Volatile::new(
                "wind",
                Capacity::new(1.0, 3.0, 1.0),
                0.0,
                LoadProfile::new(vec![1.0, 0.0]),
            ))
            .add_producer(Storage::new("battery", Capacity::new(1.0, 2.0, 1.0), 5.0, 10.0))
            .add_producer(gas("gas", 5.0, 40.0))
            .add_user(User::with_curve("city", Curve::new(vec![1.0, 3.0])));

        Calculator::new().calculate(&mut order).unwrap();

        let battery = order.producer("battery").unwrap();
        assert_abs_diff_eq!(battery.load_at(0), -2.0);
        assert_abs_diff_eq!(battery.load_at(1), 2.0);
        assert_abs_diff_eq!(order.producer("gas").unwrap().load_at(1), 1.0);
        assert_eq!(order.price_setting_at(0), None);
        assert_eq!(order.price_setting_at(1).unwrap(), &"gas");
    }

    #[test]
    fn unordered_producers_are_rejected() {
        let mut order = Order::with_points(1);
        order
            .add_producer(gas("gas", 1.0, 16.0))
            .add_producer(gas("coal", 1.0, 14.0))
            .add_user(User::with_curve("city", Curve::filled(1.0, 1)));

        let err = Calculator::new().calculate(&mut order).unwrap_err();
        assert!(matches!(err, MeritError::IncorrectProducerOrder { .. }));
    }

    #[test]
    fn rerun_overwrites_previous_results() {
        let mut order = Order::with_points(2);
        order
            .add_producer(Storage::new("battery", Capacity::new(1.0, 1.0, 1.0), 0.0, 1.0))
            .add_producer(MustRun::new(
                "chp",
                Capacity::new(1.0, 1.0, 1.0),
                0.0,
                LoadProfile::new(vec![1.0, 0.0]),
            ))
            .add_user(User::with_curve("city", Curve::new(vec![0.5, 0.5])));

        Calculator::new().calculate(&mut order).unwrap();
        let first: Vec<f64> = order.producer("battery").unwrap().load_curve().values().to_vec();
        Calculator::new().calculate(&mut order).unwrap();
        assert_eq!(order.producer("battery").unwrap().load_curve().values(), &first[..]);
    }

    #[test]
    fn users_record_their_demand() {
        let mut order = Order::with_points(2);
        order
            .add_producer(gas("gas", 5.0, 40.0))
            .add_user(User::with_curve("city", Curve::new(vec![1.0, 2.0])));

        Calculator::new().calculate(&mut order).unwrap();
        assert_eq!(order.user("city").unwrap().load_curve().values(), &[1.0, 2.0]);
    }
}
