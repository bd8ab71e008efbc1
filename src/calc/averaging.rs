//! Chunked calculation against the mean demand of each chunk.

use std::ops::Range;

use tracing::{debug, error, trace, warn};

use crate::error::MeritError;
use crate::order::{Order, PriceCurve};
use crate::participants::{Producer, Supply, User};

use super::allocation::{
    Candidate, absorb_excess, allocate, check_order, merit_sequence, run_always_on, settle_storages,
};
use super::calculator::record_demand;
use super::{Calculate, DEFAULT_CHUNK_SIZE, TOLERANCE, validate_chunk_size};

/// Allocates the mean demand of each chunk once and spreads it evenly.
///
/// Must-run and volatile producers keep their real per-point output. The
/// remaining mean demand is dispatched with each producer limited to what it
/// can deliver at every point of the chunk, and the result is applied
/// uniformly. Chunks without demand are skipped.
#[derive(Debug, Clone, Copy)]
pub struct AveragingCalculator {
    chunk_size: usize,
}

impl AveragingCalculator {
    /// Creates a calculator averaging over `chunk_size` points.
    ///
    /// # Errors
    ///
    /// Returns [`MeritError::InvalidChunkSize`] if `chunk_size <= 1`.
    pub fn new(chunk_size: usize) -> Result<Self, MeritError> {
        Ok(Self {
            chunk_size: validate_chunk_size(chunk_size)?,
        })
    }

    /// Points per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for AveragingCalculator {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Calculate for AveragingCalculator {
    fn calculate(&self, order: &mut Order) -> Result<(), MeritError> {
        check_order(order.producers())?;
        order.reset();

        let points = order.points();
        debug!(points, chunk_size = self.chunk_size, "calculating averaged merit order");

        let (producers, users, price_curve) = order.parts_mut();
        let mut unmet_chunks = 0_usize;

        for start in (0..points).step_by(self.chunk_size) {
            let chunk = start..(start + self.chunk_size).min(points);
            let unmet = compute_chunk(producers, users, price_curve, chunk).inspect_err(|e| {
                error!(chunk_start = start, error = %e, "averaged calculation aborted");
            })?;
            if unmet > 0.0 {
                unmet_chunks += 1;
            }
        }

        if unmet_chunks > 0 {
            warn!(unmet_chunks, "demand exceeded available supply");
        }
        Ok(())
    }
}

/// Allocates one chunk; returns the mean demand left unmet.
fn compute_chunk(
    producers: &mut [Producer],
    users: &mut [User],
    price_curve: &mut PriceCurve,
    chunk: Range<usize>,
) -> Result<f64, MeritError> {
    let len = chunk.len() as f64;
    settle_storages(producers, chunk.start);
    let total_demand: f64 = chunk.clone().map(|point| record_demand(users, point)).sum();

    if total_demand.abs() <= TOLERANCE {
        trace!(chunk_start = chunk.start, "skipping chunk without demand");
        return Ok(0.0);
    }

    let always_on: f64 = chunk
        .clone()
        .map(|point| run_always_on(producers, point))
        .sum();
    let residual = (total_demand - always_on) / len;

    if residual < 0.0 {
        for point in chunk.clone() {
            let left = absorb_excess(producers, point, -residual);
            if left > TOLERANCE {
                return Err(MeritError::SubZeroDemand {
                    point,
                    demand: -left,
                });
            }
        }
        return Ok(0.0);
    }

    if residual <= TOLERANCE {
        return Ok(0.0);
    }

    let allocation = {
        let candidates: Vec<Candidate<'_>> = merit_sequence(producers, chunk.start)
            .into_iter()
            .map(|i| Candidate::new(i, &producers[i], chunk_capacity(&producers[i], &chunk)))
            .collect();
        allocate(chunk.start, residual, &candidates)
    };

    for &(index, load) in &allocation.loads {
        if load > 0.0 {
            for point in chunk.clone() {
                producers[index].set_load(point, load);
            }
        }
    }
    for point in chunk {
        price_curve.set(point, allocation.price_setter);
    }
    Ok(allocation.unmet)
}

/// Load a producer can sustain at every point of `chunk`.
///
/// Storage is limited to the uniform discharge its reserve can keep up
/// through the decay of every point in the chunk.
fn chunk_capacity(producer: &Producer, chunk: &Range<usize>) -> f64 {
    match producer {
        Producer::Storage(storage) => {
            let sustained = storage.reserve().sustainable_take(chunk.clone());
            (sustained * storage.output_efficiency()).min(storage.capacity())
        }
        other => chunk
            .clone()
            .map(|point| other.max_load_at(point))
            .fold(f64::INFINITY, f64::min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Curve, LoadProfile};
    use crate::participants::{Capacity, Dispatchable, Participant, Storage, Volatile};
    use crate::reserve::Decay;
    use approx::assert_abs_diff_eq;

    fn gas(key: &str, capacity: f64, cost: f64) -> Dispatchable {
        Dispatchable::new(key, Capacity::new(1.0, capacity, 1.0), cost)
    }

    #[test]
    fn chunk_size_one_is_invalid() {
        assert!(matches!(
            AveragingCalculator::new(1),
            Err(MeritError::InvalidChunkSize(1))
        ));
    }

    #[test]
    fn spreads_mean_demand_over_chunk() {
        let mut order = Order::with_points(4);
        order
            .add_producer(gas("gas", 10.0, 40.0))
            .add_user(User::with_curve("city", Curve::new(vec![1.0, 3.0, 2.0, 2.0])));

        AveragingCalculator::new(2).unwrap().calculate(&mut order).unwrap();

        let gas = order.producer("gas").unwrap();
        assert_eq!(gas.load_curve().values(), &[2.0, 2.0, 2.0, 2.0]);
        assert_eq!(order.price_setting_at(3).unwrap(), &"gas");
    }

    #[test]
    fn zero_demand_chunk_is_skipped() {
        let mut order = Order::with_points(4);
        order
            .add_producer(Volatile::new(
                "wind",
                Capacity::new(1.0, 1.0, 1.0),
                0.0,
                LoadProfile::flat(1.0),
            ))
            .add_producer(gas("gas", 10.0, 40.0))
            .add_user(User::with_curve("city", Curve::new(vec![0.0, 0.0, 2.0, 2.0])));

        AveragingCalculator::new(2).unwrap().calculate(&mut order).unwrap();

        let wind = order.producer("wind").unwrap();
        let gas = order.producer("gas").unwrap();
        assert_eq!(wind.load_at(0), 0.0);
        assert_eq!(gas.load_at(1), 0.0);
        assert_eq!(order.price_setting_at(0), None);
        assert_eq!(wind.load_at(2), 1.0);
        assert_eq!(gas.load_at(2), 1.0);
    }

    #[test]
    fn never_over_assigns_chunk_demand() {
        let mut order = Order::with_points(8);
        order
            .add_producer(Volatile::new(
                "pv",
                Capacity::new(1.0, 2.0, 1.0),
                0.0,
                LoadProfile::new(vec![0.0, 0.5, 1.0, 0.5]),
            ))
            .add_producer(gas("coal", 1.5, 14.0))
            .add_producer(gas("gas", 5.0, 16.0))
            .add_user(User::with_curve(
                "city",
                Curve::new(vec![2.0, 2.5, 3.0, 1.5, 0.5, 1.0, 4.0, 2.0]),
            ));

        AveragingCalculator::new(4).unwrap().calculate(&mut order).unwrap();

        for start in [0, 4] {
            let supplied: f64 = order
                .producers()
                .iter()
                .map(|p| (start..start + 4).map(|t| p.load_at(t)).sum::<f64>())
                .sum();
            let demand: f64 = (start..start + 4).map(|t| order.demand_at(t)).sum();
            assert!(supplied <= demand + 1e-9);
            assert_abs_diff_eq!(supplied, demand, epsilon = 1e-9);
        }
    }

    #[test]
    fn capacity_is_limited_by_weakest_point() {
        let producer: Producer = Volatile::new(
            "pv",
            Capacity::new(1.0, 2.0, 1.0),
            0.0,
            LoadProfile::new(vec![1.0, 0.25]),
        )
        .into();
        assert_eq!(chunk_capacity(&producer, &(0..2)), 0.5);
    }

    #[test]
    fn storage_capacity_spreads_reserve_over_chunk() {
        let mut storage = Storage::new("battery", Capacity::new(1.0, 4.0, 1.0), 0.0, 8.0);
        storage.reset(4);
        storage.assign_excess(0, 4.0);
        let producer: Producer = storage.into();
        assert_eq!(chunk_capacity(&producer, &(1..5)), 1.0);
    }

    #[test]
    fn storage_capacity_allows_for_decay() {
        let mut storage = Storage::new("battery", Capacity::new(1.0, 4.0, 1.0), 0.0, 8.0)
            .with_decay(Decay::proportional(0.5));
        storage.reset(4);
        storage.assign_excess(0, 4.0);
        let producer: Producer = storage.into();
        // 4 -> 2 at point 1, then (2 - w) / 2 >= w at point 2
        assert_abs_diff_eq!(chunk_capacity(&producer, &(1..3)), 2.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn decaying_storage_delivers_what_it_records() {
        let mut order = Order::with_points(4);
        order
            .add_producer(Volatile::new(
                "wind",
                Capacity::new(1.0, 5.0, 1.0),
                0.0,
                LoadProfile::new(vec![1.0, 1.0, 0.0, 0.0]),
            ))
            .add_producer(
                Storage::new("battery", Capacity::new(1.0, 4.0, 1.0), 5.0, 8.0)
                    .with_decay(Decay::proportional(0.5)),
            )
            .add_producer(gas("gas", 10.0, 20.0))
            .add_user(User::with_curve("city", Curve::new(vec![1.0, 1.0, 4.0, 4.0])));

        AveragingCalculator::new(2).unwrap().calculate(&mut order).unwrap();

        // charged 4 at point 0 and 4 at point 1 (after halving): 6, then 3 at point 2
        let battery = order.producer("battery").unwrap();
        assert_abs_diff_eq!(battery.load_at(2), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(battery.load_at(3), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(order.producer("gas").unwrap().load_at(3), 3.0, epsilon = 1e-9);
        let reserve = battery.as_storage().unwrap().reserve();
        assert_abs_diff_eq!(reserve.state(), 0.0, epsilon = 1e-9);
        assert_eq!(order.price_setting_at(2).unwrap(), &"gas");
    }

    #[test]
    fn negative_mean_without_storage_fails() {
        let mut order = Order::with_points(2);
        order
            .add_producer(Volatile::new(
                "wind",
                Capacity::new(1.0, 5.0, 1.0),
                0.0,
                LoadProfile::flat(1.0),
            ))
            .add_user(User::with_curve("city", Curve::filled(1.0, 2)));

        let err = AveragingCalculator::new(2).unwrap().calculate(&mut order);
        assert!(matches!(err, Err(MeritError::SubZeroDemand { point: 0, .. })));
    }
}
