//! The merit order: producers in cost order, users, and the resulting price curve.

use std::cmp::Ordering;

use crate::calc::Calculate;
use crate::curve::{Curve, POINTS};
use crate::error::MeritError;
use crate::participants::{Participant, ParticipantKey, Producer, Supply, User};

/// The price-setting producer for every point.
///
/// Entries are indices into [`Order::producers`]; `None` means no marginal
/// unit (demand was unmet, or there was nothing to dispatch).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceCurve {
    setters: Vec<Option<usize>>,
}

impl PriceCurve {
    pub(crate) fn new(points: usize) -> Self {
        Self {
            setters: vec![None; points],
        }
    }

    pub(crate) fn set(&mut self, point: usize, producer: Option<usize>) {
        self.setters[point] = producer;
    }

    /// Index of the price-setting producer at `point`.
    pub fn index_at(&self, point: usize) -> Option<usize> {
        self.setters.get(point).copied().flatten()
    }

    /// Number of points in the curve.
    pub fn len(&self) -> usize {
        self.setters.len()
    }

    /// Returns `true` when no calculation has populated the curve.
    pub fn is_empty(&self) -> bool {
        self.setters.is_empty()
    }

    /// Number of points without a price-setting producer.
    pub fn unset_points(&self) -> usize {
        self.setters.iter().filter(|s| s.is_none()).count()
    }
}

/// Participants arranged for dispatch.
///
/// Producers are kept in the order they are added; callers must add them by
/// ascending base cost (see [`Order::sort_producers`]). The ordering is
/// checked when a calculation runs, not here.
///
/// # Examples
///
/// ```
/// use merit_order::calc::Calculator;
/// use merit_order::curve::Curve;
/// use merit_order::order::Order;
/// use merit_order::participants::{Capacity, Dispatchable, User};
///
/// let mut order = Order::with_points(2);
/// order.add_producer(Dispatchable::new("gas", Capacity::new(1.0, 10.0, 1.0), 40.0));
/// order.add_user(User::with_curve("city", Curve::new(vec![4.0, 6.0])));
/// order.calculate(&Calculator::new()).unwrap();
///
/// assert_eq!(order.price_setting_at(0).map(|p| p.to_string()), Some("gas".into()));
/// ```
#[derive(Debug, Clone)]
pub struct Order {
    points: usize,
    producers: Vec<Producer>,
    users: Vec<User>,
    price_curve: PriceCurve,
}

impl Default for Order {
    fn default() -> Self {
        Self::new()
    }
}

impl Order {
    /// Creates an empty order over a year of hourly points.
    pub fn new() -> Self {
        Self::with_points(POINTS)
    }

    /// Creates an empty order over `points` points.
    pub fn with_points(points: usize) -> Self {
        Self {
            points,
            producers: Vec::new(),
            users: Vec::new(),
            price_curve: PriceCurve::default(),
        }
    }

    /// Horizon length.
    pub fn points(&self) -> usize {
        self.points
    }

    /// Appends a producer to the end of the merit order.
    pub fn add_producer(&mut self, producer: impl Into<Producer>) -> &mut Self {
        self.producers.push(producer.into());
        self
    }

    /// Adds a demand participant.
    pub fn add_user(&mut self, user: User) -> &mut Self {
        self.users.push(user);
        self
    }

    /// Stable-sorts producers by ascending base cost.
    pub fn sort_producers(&mut self) {
        self.producers.sort_by(|a, b| {
            a.base_cost()
                .partial_cmp(&b.base_cost())
                .unwrap_or(Ordering::Equal)
        });
    }

    /// Producers in merit order.
    pub fn producers(&self) -> &[Producer] {
        &self.producers
    }

    /// Demand participants.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Looks up a producer by key.
    pub fn producer(&self, key: &str) -> Option<&Producer> {
        self.producers.iter().find(|p| p.key() == &key)
    }

    /// Looks up a user by key.
    pub fn user(&self, key: &str) -> Option<&User> {
        self.users.iter().find(|u| u.key() == &key)
    }

    /// Total user demand at `point`.
    pub fn demand_at(&self, point: usize) -> f64 {
        self.users.iter().map(|u| u.demand_at(point)).sum()
    }

    /// Total user demand for every point of the horizon.
    pub fn demand_curve(&self) -> Curve {
        Curve::new((0..self.points).map(|p| self.demand_at(p)).collect())
    }

    /// Price-setting producers from the last calculation.
    pub fn price_curve(&self) -> &PriceCurve {
        &self.price_curve
    }

    /// Key of the price-setting producer at `point`, if any.
    pub fn price_setting_at(&self, point: usize) -> Option<&ParticipantKey> {
        self.price_setter(point).map(Participant::key)
    }

    /// Marginal cost of the price-setting producer at its assigned output.
    pub fn price_at(&self, point: usize) -> Option<f64> {
        self.price_setter(point).map(|p| {
            let capacity = p.capacity();
            let utilization = if capacity > 0.0 {
                p.load_at(point) / capacity
            } else {
                0.0
            };
            p.cost().cost_at(point, utilization)
        })
    }

    /// Runs `calculator` over this order.
    ///
    /// # Errors
    ///
    /// Propagates the calculator's [`MeritError`].
    pub fn calculate(&mut self, calculator: &impl Calculate) -> Result<(), MeritError> {
        calculator.calculate(self)
    }

    fn price_setter(&self, point: usize) -> Option<&Producer> {
        self.price_curve
            .index_at(point)
            .and_then(|i| self.producers.get(i))
    }

    /// Zeroes every load curve and the price curve for a fresh run.
    pub(crate) fn reset(&mut self) {
        let points = self.points;
        for producer in &mut self.producers {
            producer.reset(points);
        }
        for user in &mut self.users {
            user.reset(points);
        }
        self.price_curve = PriceCurve::new(points);
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [Producer], &mut [User], &mut PriceCurve) {
        (&mut self.producers, &mut self.users, &mut self.price_curve)
    }
}
