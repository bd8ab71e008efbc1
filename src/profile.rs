//! Seeded generators for capacity-factor and demand profiles.
//!
//! Generated shapes repeat daily. Producers read the values as capacity
//! factors in `[0, 1]`; demand shapes are normalised with [`normalized`] so
//! they distribute a user's total consumption over the horizon.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Points per generated day.
pub const STEPS_PER_DAY: usize = 24;

/// Draws Gaussian noise using the Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// A sample from a Gaussian with mean 0 and the given standard deviation,
/// or 0.0 when `std_dev <= 0`.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Fraction of peak solar output at `point`: a half-sine between sunrise
/// (inclusive) and sunset (exclusive), zero at night.
pub fn daylight_fraction(point: usize, sunrise: usize, sunset: usize) -> f64 {
    let hour = point % STEPS_PER_DAY;
    if hour < sunrise || hour >= sunset {
        return 0.0;
    }
    let span = (sunset - sunrise) as f64;
    let pos = (hour - sunrise) as f64 + 0.5;
    (std::f64::consts::PI * pos / span).sin()
}

/// Generates a solar capacity-factor profile.
///
/// # Arguments
///
/// * `points` - Length of the profile
/// * `sunrise` - Hour of sunrise (inclusive)
/// * `sunset` - Hour of sunset (exclusive)
/// * `noise_std` - Multiplicative noise, e.g. 0.1 for +/-10% variation
/// * `seed` - Random seed for reproducible noise
///
/// # Panics
///
/// Panics if `sunrise >= sunset` or `sunset > STEPS_PER_DAY`.
pub fn solar(points: usize, sunrise: usize, sunset: usize, noise_std: f64, seed: u64) -> Vec<f64> {
    assert!(sunrise < sunset && sunset <= STEPS_PER_DAY);
    let mut rng = StdRng::seed_from_u64(seed);

    (0..points)
        .map(|point| {
            let frac = daylight_fraction(point, sunrise, sunset);
            if frac <= 0.0 {
                return 0.0;
            }
            let noise_mult = 1.0 + gaussian_noise(&mut rng, noise_std);
            (frac * noise_mult).clamp(0.0, 1.0)
        })
        .collect()
}

/// Generates a daily sinusoidal demand shape around 1.0.
///
/// Values are relative and never negative; pass them through
/// [`normalized`] to obtain shares of total consumption.
///
/// # Arguments
///
/// * `points` - Length of the profile
/// * `amplitude` - Relative daily swing (0.3 = +/-30%)
/// * `phase_rad` - Phase offset in radians
/// * `noise_std` - Gaussian noise standard deviation
/// * `seed` - Random seed for reproducible noise
pub fn demand(points: usize, amplitude: f64, phase_rad: f64, noise_std: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..points)
        .map(|point| {
            let day_pos = (point % STEPS_PER_DAY) as f64 / STEPS_PER_DAY as f64;
            let angle = 2.0 * std::f64::consts::PI * day_pos + phase_rad;
            let value = 1.0 + amplitude * angle.sin() + gaussian_noise(&mut rng, noise_std);
            value.max(0.0)
        })
        .collect()
}

/// Scales `values` so they sum to 1.0. An all-zero input is returned as is.
pub fn normalized(mut values: Vec<f64>) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for v in &mut values {
            *v /= total;
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn noise_is_zero_without_spread() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(gaussian_noise(&mut rng, 0.0), 0.0);
    }

    #[test]
    fn solar_is_dark_at_night() {
        let profile = solar(48, 6, 18, 0.0, 42);
        for hour in [0, 5, 18, 23, 24, 29, 47] {
            assert_eq!(profile[hour], 0.0, "hour {hour} should be dark");
        }
        assert!(profile[12] > 0.9);
    }

    #[test]
    fn solar_stays_within_unit_interval() {
        let profile = solar(24 * 30, 5, 19, 0.5, 7);
        assert!(profile.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn same_seed_same_profile() {
        assert_eq!(demand(96, 0.3, 1.2, 0.05, 9), demand(96, 0.3, 1.2, 0.05, 9));
        assert_ne!(demand(96, 0.3, 1.2, 0.05, 9), demand(96, 0.3, 1.2, 0.05, 10));
    }

    #[test]
    fn demand_never_negative() {
        let profile = demand(240, 1.5, 0.0, 0.2, 3);
        assert!(profile.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn normalized_sums_to_one() {
        let shares = normalized(demand(48, 0.4, 0.0, 0.0, 1));
        assert_abs_diff_eq!(shares.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_eq!(normalized(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }
}
