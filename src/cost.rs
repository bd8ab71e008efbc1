//! Marginal cost strategies and the cost-curve equilibrium search.

use crate::curve::Curve;

/// Iterations of the bisection in [`equilibrium_utilization`].
const SEARCH_ITERATIONS: usize = 60;

/// How a producer's marginal cost is determined.
#[derive(Debug, Clone, PartialEq)]
pub enum CostFunction {
    /// A single marginal cost regardless of time or output.
    Constant(f64),
    /// Cost rising linearly with utilisation around a mean.
    ///
    /// At zero output the cost is `mean * (1 - spread / 2)`, at full output
    /// `mean * (1 + spread / 2)`.
    Linear {
        /// Mean marginal cost, used for merit ordering.
        mean: f64,
        /// Relative width of the cost range.
        spread: f64,
    },
    /// A cost per time point, flat within the point.
    Curve(Curve),
}

impl CostFunction {
    /// Cost used to rank the producer in the merit order.
    ///
    /// For a time-varying curve this is the mean over the horizon.
    pub fn base_cost(&self) -> f64 {
        match self {
            Self::Constant(cost) => *cost,
            Self::Linear { mean, .. } => *mean,
            Self::Curve(curve) => curve.mean(),
        }
    }

    /// Marginal cost at `point` when running at `utilization` (0..=1) of capacity.
    pub fn cost_at(&self, point: usize, utilization: f64) -> f64 {
        match self {
            Self::Constant(cost) => *cost,
            Self::Linear { mean, spread } => {
                let x = utilization.clamp(0.0, 1.0);
                mean * (1.0 - spread / 2.0) + mean * spread * x
            }
            Self::Curve(curve) => curve.get(point),
        }
    }

    /// Cost at `point` before any output is assigned.
    pub fn entry_cost_at(&self, point: usize) -> f64 {
        self.cost_at(point, 0.0)
    }

    /// Cost a preceding cost-curve producer may rise to before yielding.
    ///
    /// This is the base cost, except for a time-varying curve where the cost
    /// at `point` applies.
    pub fn competing_cost_at(&self, point: usize) -> f64 {
        match self {
            Self::Curve(curve) => curve.get(point),
            other => other.base_cost(),
        }
    }

    /// Whether the cost depends on the utilisation of the producer.
    pub fn varies_with_output(&self) -> bool {
        matches!(self, Self::Linear { spread, .. } if *spread > 0.0)
    }

    /// Whether the cost depends on the time point.
    pub fn varies_with_time(&self) -> bool {
        matches!(self, Self::Curve(_))
    }
}

/// Finds the utilisation at which `cost(x)` reaches `target_cost`.
///
/// `cost` must be non-decreasing on `[0, 1]`. Returns `0.0` if the producer is
/// already at or above the target when idle and `1.0` if it stays below the
/// target at full output.
///
/// # Examples
///
/// ```
/// use merit_order::cost::equilibrium_utilization;
///
/// let x = equilibrium_utilization(|x| 10.0 + 10.0 * x, 15.0);
/// assert!((x - 0.5).abs() < 1e-9);
/// ```
pub fn equilibrium_utilization(cost: impl Fn(f64) -> f64, target_cost: f64) -> f64 {
    if cost(0.0) >= target_cost {
        return 0.0;
    }
    if cost(1.0) <= target_cost {
        return 1.0;
    }

    let (mut low, mut high) = (0.0_f64, 1.0_f64);
    for _ in 0..SEARCH_ITERATIONS {
        let mid = (low + high) / 2.0;
        if cost(mid) < target_cost {
            low = mid;
        } else {
            high = mid;
        }
    }
    low
}
