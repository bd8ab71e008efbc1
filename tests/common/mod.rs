//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use merit_order::curve::{Curve, LoadProfile};
use merit_order::order::Order;
use merit_order::participants::{
    Capacity, Dispatchable, MustRun, Participant, Storage, User, Volatile,
};

/// Single-unit, fully available capacity.
pub fn unit(capacity: f64) -> Capacity {
    Capacity::new(1.0, capacity, 1.0)
}

/// Flat-cost dispatchable.
pub fn dispatchable(key: &str, capacity: f64, cost: f64) -> Dispatchable {
    Dispatchable::new(key, unit(capacity), cost)
}

/// User with the same demand at every point.
pub fn flat_user(key: &str, demand: f64, points: usize) -> User {
    User::with_curve(key, Curve::filled(demand, points))
}

/// Reference fleet over `points` hourly points.
///
/// Must-run CHP (1.0), wind cycling through `[0.2, 1.0, 0.5, 0.0]` of 3.0, a
/// lossy battery (2.0 MW, 6.0 MWh), coal (2.0 at 14), gas (3.0 at 16) and a
/// user whose demand cycles through `[1.5, 5.0, 2.0, 4.5, 0.8, 3.0]`.
pub fn reference_order(points: usize) -> Order {
    let mut order = Order::with_points(points);
    order
        .add_producer(MustRun::new("chp", unit(1.0), 0.0, LoadProfile::flat(1.0)))
        .add_producer(Volatile::new(
            "wind",
            unit(3.0),
            0.0,
            LoadProfile::new(vec![0.2, 1.0, 0.5, 0.0]),
        ))
        .add_producer(Storage::new("battery", unit(2.0), 5.0, 6.0).with_efficiencies(0.9, 0.9))
        .add_producer(dispatchable("coal", 2.0, 14.0))
        .add_producer(dispatchable("gas", 3.0, 16.0))
        .add_user(User::with_curve(
            "city",
            Curve::new(
                (0..points)
                    .map(|t| [1.5, 5.0, 2.0, 4.5, 0.8, 3.0][t % 6])
                    .collect(),
            ),
        ));
    order
}

/// Sum of all producer loads at `point`; storage charging counts negative.
pub fn supplied_at(order: &Order, point: usize) -> f64 {
    order.producers().iter().map(|p| p.load_at(point)).sum()
}
