//! Per-point value series shared by demand, load, and cost data.

/// Number of points in a default horizon (one per hour of a year).
pub const POINTS: usize = 8760;

/// A fixed-length series of values indexed by time point.
///
/// Reads outside the curve return `0.0`, matching the "unset means zero"
/// convention. Writes outside the curve are a programming error and panic.
///
/// # Examples
///
/// ```
/// use merit_order::curve::Curve;
///
/// let mut curve = Curve::zeros(3);
/// curve.set(1, 2.5);
/// assert_eq!(curve.get(1), 2.5);
/// assert_eq!(curve.subtract_at(1, 1.0), 1.5);
/// assert_eq!(curve.get(7), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Curve {
    values: Vec<f64>,
}

impl Curve {
    /// Creates a curve from literal values.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Creates a curve of `len` points all holding `value`.
    pub fn filled(value: f64, len: usize) -> Self {
        Self {
            values: vec![value; len],
        }
    }

    /// Creates a curve of `len` zeroes.
    pub fn zeros(len: usize) -> Self {
        Self::filled(0.0, len)
    }

    /// Number of points in the curve.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when the curve holds no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `point`, or `0.0` if the point is beyond the curve.
    pub fn get(&self, point: usize) -> f64 {
        self.values.get(point).copied().unwrap_or(0.0)
    }

    /// Sets the value at `point`.
    ///
    /// # Panics
    ///
    /// Panics if `point >= self.len()`.
    pub fn set(&mut self, point: usize, value: f64) {
        self.values[point] = value;
    }

    /// Subtracts `amount` at `point` and returns the new value.
    pub fn subtract_at(&mut self, point: usize, amount: f64) -> f64 {
        let value = self.get(point) - amount;
        self.set(point, value);
        value
    }

    /// Sum of all values.
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Arithmetic mean, or `0.0` for an empty curve.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum() / self.values.len() as f64
        }
    }

    /// Values taken every `stride` points starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `stride` is zero.
    pub fn stride(&self, offset: usize, stride: usize) -> Vec<f64> {
        assert!(stride > 0, "stride must be > 0");
        self.values.iter().skip(offset).step_by(stride).copied().collect()
    }

    /// Contiguous slices of at most `size` points; the last may be shorter.
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(size.max(1))
    }

    /// Borrow the underlying values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for Curve {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// A normalised shape repeated cyclically across the horizon.
///
/// Producers read it as a capacity factor, users as the share of their total
/// consumption falling in each point. A profile shorter than the horizon is
/// repeated, so a single value describes a flat profile.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProfile {
    values: Vec<f64>,
}

impl LoadProfile {
    /// Creates a profile from its values.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "load profile needs at least one value");
        Self { values }
    }

    /// A profile holding `value` at every point.
    pub fn flat(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Profile value at `point`, wrapping around the profile length.
    pub fn at(&self, point: usize) -> f64 {
        self.values[point % self.values.len()]
    }

    /// Number of values before the profile repeats.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; profiles are never empty.
    pub fn is_empty(&self) -> bool {
        false
    }
}
