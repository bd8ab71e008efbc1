//! Post-hoc summary of a calculated order.

use std::fmt;

use crate::order::Order;
use crate::participants::{Participant, Supply};

/// Supply shortfall below this is ignored when counting unmet points.
const UNMET_TOLERANCE: f64 = 1e-6;

/// Per-producer results of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerSummary {
    /// Participant key.
    pub key: String,
    /// Producer variant name.
    pub kind: &'static str,
    /// Energy delivered over the horizon (MWh); negative for net charging.
    pub production: f64,
    /// Production divided by effective capacity.
    pub full_load_hours: f64,
    /// Points at which this producer set the price.
    pub price_setting_points: usize,
}

/// Aggregate results derived from a calculated [`Order`].
///
/// Computed from the load curves so that the summary always agrees with what
/// the calculator wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Horizon length.
    pub points: usize,
    /// Total user demand (MWh).
    pub total_demand: f64,
    /// Highest demand at any point (MW).
    pub peak_demand: f64,
    /// Mean price over points that have a price setter.
    pub mean_price: Option<f64>,
    /// Points where supply fell short of demand.
    pub unmet_points: usize,
    /// Points without a price-setting producer.
    pub unpriced_points: usize,
    /// One entry per producer, in merit order.
    pub producers: Vec<ProducerSummary>,
}

impl RunSummary {
    /// Summarises the last calculation of `order`.
    pub fn from_order(order: &Order) -> Self {
        let points = order.points();
        let demand = order.demand_curve();

        let producers = order
            .producers()
            .iter()
            .enumerate()
            .map(|(index, p)| ProducerSummary {
                key: p.key().to_string(),
                kind: p.kind(),
                production: p.production(),
                full_load_hours: p.full_load_hours(),
                price_setting_points: (0..points)
                    .filter(|&t| order.price_curve().index_at(t) == Some(index))
                    .count(),
            })
            .collect();

        let mut unmet_points = 0_usize;
        let mut price_sum = 0.0_f64;
        let mut priced = 0_usize;

        for t in 0..points {
            let supplied: f64 = order.producers().iter().map(|p| p.load_at(t)).sum();
            if demand.get(t) - supplied > UNMET_TOLERANCE {
                unmet_points += 1;
            }
            if let Some(price) = order.price_at(t) {
                price_sum += price;
                priced += 1;
            }
        }

        Self {
            points,
            total_demand: demand.sum(),
            peak_demand: demand.values().iter().copied().fold(0.0, f64::max),
            mean_price: (priced > 0).then(|| price_sum / priced as f64),
            unmet_points,
            unpriced_points: points - priced,
            producers,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Merit Order Summary ---")?;
        writeln!(f, "Points:              {}", self.points)?;
        writeln!(f, "Total demand:        {:.1} MWh", self.total_demand)?;
        writeln!(f, "Peak demand:         {:.1} MW", self.peak_demand)?;
        match self.mean_price {
            Some(price) => writeln!(f, "Mean price:          {price:.2} /MWh")?,
            None => writeln!(f, "Mean price:          n/a")?,
        }
        writeln!(f, "Unmet points:        {}", self.unmet_points)?;
        writeln!(f, "Unpriced points:     {}", self.unpriced_points)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<16} {:<13} {:>14} {:>10} {:>8}",
            "producer", "type", "production", "FLH", "setter"
        )?;
        for p in &self.producers {
            writeln!(
                f,
                "{:<16} {:<13} {:>14.1} {:>10.1} {:>8}",
                p.key, p.kind, p.production, p.full_load_hours, p.price_setting_points
            )?;
        }
        Ok(())
    }
}
