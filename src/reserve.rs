//! Stateful energy buffer backing storage participants.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Bisection steps in [`Reserve::sustainable_take`].
const SEARCH_ITERATIONS: usize = 60;
const SUSTAIN_TOLERANCE: f64 = 1e-12;

/// Loss of stored energy over time.
///
/// Wraps a pure function `(state, point) -> decayed_state`. The reserve calls
/// it exactly once for every point it passes through, including points where
/// nothing is stored or withdrawn. Decay can only remove energy.
#[derive(Clone)]
pub struct Decay(Arc<dyn Fn(f64, usize) -> f64 + Send + Sync>);

impl Decay {
    /// Wraps an arbitrary decay function.
    pub fn new(f: impl Fn(f64, usize) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// No loss: the state is returned unchanged.
    pub fn none() -> Self {
        Self::new(|state, _| state)
    }

    /// Loses `rate` of the stored energy every point.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is outside `[0.0, 1.0]`.
    pub fn proportional(rate: f64) -> Self {
        assert!((0.0..=1.0).contains(&rate), "decay rate must be in [0, 1]");
        Self::new(move |state, _| state * (1.0 - rate))
    }

    fn apply(&self, state: f64, point: usize) -> f64 {
        (self.0)(state, point).clamp(0.0, state.max(0.0))
    }
}

impl Default for Decay {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Decay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decay(..)")
    }
}

/// Energy accumulator with a volume bound and per-point decay.
///
/// # Examples
///
/// ```
/// use merit_order::reserve::Reserve;
///
/// let mut reserve = Reserve::new(10.0);
/// assert_eq!(reserve.add(0, 4.0), 4.0);
/// assert_eq!(reserve.take(1, 6.0), 4.0);
/// assert_eq!(reserve.at(2), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Reserve {
    volume: f64,
    state: f64,
    decay: Decay,
    /// Last point for which decay has been applied.
    decayed_at: Option<usize>,
}

impl Reserve {
    /// Creates an empty reserve without decay.
    ///
    /// # Panics
    ///
    /// Panics if `volume` is negative.
    pub fn new(volume: f64) -> Self {
        Self::with_decay(volume, Decay::none())
    }

    /// Creates an empty reserve with the given decay.
    ///
    /// # Panics
    ///
    /// Panics if `volume` is negative.
    pub fn with_decay(volume: f64, decay: Decay) -> Self {
        assert!(volume >= 0.0, "reserve volume must be >= 0");
        Self {
            volume,
            state: 0.0,
            decay,
            decayed_at: None,
        }
    }

    /// Maximum energy the reserve can hold.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Stored energy as of the last transaction, before any pending decay.
    pub fn state(&self) -> f64 {
        self.state
    }

    /// Energy obtainable by a `take` at `point`, accounting for pending decay.
    pub fn at(&self, point: usize) -> f64 {
        self.decayed_state(point)
    }

    /// Largest amount that can be taken at every point of `points`, after
    /// the decay of each point.
    pub fn sustainable_take(&self, points: Range<usize>) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        let sustains = |amount: f64| {
            let mut trial = self.clone();
            points
                .clone()
                .all(|point| trial.take(point, amount) + SUSTAIN_TOLERANCE >= amount)
        };

        let upper = self.at(points.start) / points.len() as f64;
        if sustains(upper) {
            return upper;
        }
        let (mut low, mut high) = (0.0_f64, upper);
        for _ in 0..SEARCH_ITERATIONS {
            let mid = (low + high) / 2.0;
            if sustains(mid) {
                low = mid;
            } else {
                high = mid;
            }
        }
        low
    }

    /// Applies the decay of every point up to and including `point`.
    pub fn settle(&mut self, point: usize) {
        self.state = self.decayed_state(point).min(self.volume);
        if self.decayed_at.is_none_or(|last| last < point) {
            self.decayed_at = Some(point);
        }
    }

    /// Stores up to `amount` at `point` and returns what was retained.
    ///
    /// Anything above the free volume is lost.
    pub fn add(&mut self, point: usize, amount: f64) -> f64 {
        self.settle(point);
        let stored = amount.max(0.0).min(self.volume - self.state);
        self.state += stored;
        stored
    }

    /// Withdraws up to `amount` at `point` and returns what was withdrawn.
    pub fn take(&mut self, point: usize, amount: f64) -> f64 {
        self.settle(point);
        let taken = amount.max(0.0).min(self.state);
        self.state -= taken;
        taken
    }

    /// Empties the reserve and forgets decay history.
    pub fn clear(&mut self) {
        self.state = 0.0;
        self.decayed_at = None;
    }

    /// State after the decay of every point in `(decayed_at, point]`.
    ///
    /// A reserve that has never been settled starts decaying at `point`.
    fn decayed_state(&self, point: usize) -> f64 {
        let first = match self.decayed_at {
            Some(last) if last >= point => return self.state,
            Some(last) => last + 1,
            None => point,
        };
        let mut state = self.state;
        for p in first..=point {
            if state <= 0.0 {
                break;
            }
            state = self.decay.apply(state, p);
        }
        state
    }
}
