//! Building blocks shared by all calculators.

use std::cmp::Ordering;

use crate::cost::{CostFunction, equilibrium_utilization};
use crate::error::MeritError;
use crate::participants::{Participant, Producer, Supply};

use super::TOLERANCE;

/// Checks that producers appear in non-decreasing base cost order.
///
/// Interconnects are exempt: their cost changes per point and
/// [`merit_sequence`] positions them separately.
pub(crate) fn check_order(producers: &[Producer]) -> Result<(), MeritError> {
    let mut previous: Option<&Producer> = None;

    for producer in producers.iter().filter(|p| !p.cost().varies_with_time()) {
        if let Some(prev) = previous {
            if producer.base_cost() < prev.base_cost() {
                return Err(MeritError::IncorrectProducerOrder {
                    producer: producer.key().clone(),
                    cost: producer.base_cost(),
                    previous: prev.key().clone(),
                    previous_cost: prev.base_cost(),
                });
            }
        }
        previous = Some(producer);
    }
    Ok(())
}

/// Indices of the price-competing producers in dispatch order for `point`.
///
/// List order is kept; producers with a per-point cost are slotted in by their
/// cost at `point`, ties keeping list order.
pub(crate) fn merit_sequence(producers: &[Producer], point: usize) -> Vec<usize> {
    let mut sequence: Vec<usize> = producers
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.is_always_on())
        .map(|(i, _)| i)
        .collect();

    if producers.iter().any(|p| p.cost().varies_with_time()) {
        let rank = |i: usize| {
            let cost = producers[i].cost();
            if cost.varies_with_time() {
                cost.entry_cost_at(point)
            } else {
                cost.base_cost()
            }
        };
        sequence.sort_by(|&a, &b| rank(a).partial_cmp(&rank(b)).unwrap_or(Ordering::Equal));
    }
    sequence
}

/// Assigns every always-on producer its full output at `point`.
///
/// Returns the total assigned.
pub(crate) fn run_always_on(producers: &mut [Producer], point: usize) -> f64 {
    let mut total = 0.0;
    for producer in producers.iter_mut().filter(|p| p.is_always_on()) {
        let output = producer.max_load_at(point);
        producer.set_load(point, output);
        total += output;
    }
    total
}

/// Brings every storage reserve up to date with the decay of `point`.
pub(crate) fn settle_storages(producers: &mut [Producer], point: usize) {
    for storage in producers.iter_mut().filter_map(Producer::as_storage_mut) {
        storage.settle(point);
    }
}

/// Offers `excess` to storages in list order.
///
/// Returns whatever could not be absorbed.
pub(crate) fn absorb_excess(producers: &mut [Producer], point: usize, mut excess: f64) -> f64 {
    for storage in producers.iter_mut().filter_map(Producer::as_storage_mut) {
        if excess <= TOLERANCE {
            break;
        }
        excess -= storage.assign_excess(point, excess);
    }
    excess.max(0.0)
}

/// A producer offered to [`allocate`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate<'a> {
    /// Index into the order's producers.
    pub index: usize,
    /// Most that may be assigned.
    pub capacity: f64,
    pub cost: &'a CostFunction,
}

impl<'a> Candidate<'a> {
    pub fn new(index: usize, producer: &'a Producer, capacity: f64) -> Self {
        Self {
            index,
            capacity: capacity.max(0.0),
            cost: producer.cost(),
        }
    }
}

/// Result of walking the merit order once.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Allocation {
    /// `(producer index, load)` for every candidate, in candidate order.
    pub loads: Vec<(usize, f64)>,
    /// Producer index of the marginal unit.
    pub price_setter: Option<usize>,
    /// Demand left when every candidate was exhausted.
    pub unmet: f64,
}

/// Distributes `demand` over `candidates` in the given order.
///
/// Flat-cost candidates take as much as they can. A candidate whose cost
/// rises with output stops at the utilisation where it reaches the base cost
/// of the next candidate with spare capacity (its cost at `point` if that
/// varies over time); it is revisited if demand is still unmet once the walk
/// is complete.
///
/// The price setter is the last candidate touched whose load ended up
/// strictly between zero and its capacity.
pub(crate) fn allocate(point: usize, demand: f64, candidates: &[Candidate<'_>]) -> Allocation {
    let mut loads = vec![0.0_f64; candidates.len()];
    let mut touched = Vec::with_capacity(candidates.len());
    let mut remaining = demand.max(0.0);

    for (pos, candidate) in candidates.iter().enumerate() {
        if remaining <= TOLERANCE {
            break;
        }
        if candidate.capacity <= 0.0 {
            continue;
        }

        let limit = if candidate.cost.varies_with_output() {
            match candidates[pos + 1..].iter().find(|c| c.capacity > 0.0) {
                Some(next) => {
                    let target = next.cost.competing_cost_at(point);
                    candidate.capacity
                        * equilibrium_utilization(|x| candidate.cost.cost_at(point, x), target)
                }
                None => candidate.capacity,
            }
        } else {
            candidate.capacity
        };

        let amount = remaining.min(limit);
        if amount > 0.0 {
            loads[pos] = amount;
            remaining -= amount;
            touched.push(pos);
        }
    }

    // Producers that stopped at their equilibrium pick up what is left.
    if remaining > TOLERANCE {
        for (pos, candidate) in candidates.iter().enumerate() {
            let headroom = candidate.capacity - loads[pos];
            if headroom <= 0.0 {
                continue;
            }
            if remaining >= headroom {
                loads[pos] = candidate.capacity;
                remaining -= headroom;
            } else {
                loads[pos] += remaining;
                remaining = 0.0;
            }
            touched.push(pos);
            if remaining <= TOLERANCE {
                break;
            }
        }
    }

    let price_setter = touched
        .iter()
        .rev()
        .find(|&&pos| loads[pos] > 0.0 && loads[pos] < candidates[pos].capacity)
        .map(|&pos| candidates[pos].index);

    Allocation {
        loads: candidates
            .iter()
            .zip(loads)
            .map(|(c, load)| (c.index, load))
            .collect(),
        price_setter,
        unmet: if remaining > TOLERANCE { remaining } else { 0.0 },
    }
}
