//! Event and maxima search.
//!
//! Signals are wrapped before use, see the `wrap` module.  Both searches
//! sample the interval on a coarse grid, find brackets in it, and refine
//! those brackets until they are no wider than `epsilon`.
//!
//! # Examples
//! Finding the moments a step signal changes value:
//!
//! ```
//! use eventfind::search::{find_discrete, SearchOptions};
//! use eventfind::wrap::Pointwise;
//!
//! // steps up by one at t=0.25 and t=0.75
//! let in_f = |t: f64| (t >= 0.25) as i32 + (t >= 0.75) as i32;
//! let f = Pointwise::new(&in_f, 1.0);
//!
//! let opts = SearchOptions::default().with_epsilon(1e-9);
//! let events = find_discrete(0.0, 1.0, &f, &opts).expect("valid search");
//!
//! assert_eq!(events.values, vec![1, 2]);
//! assert!((events.times[0] - 0.25).abs() < 1e-9);
//! assert!((events.times[1] - 0.75).abs() < 1e-9);
//! ```
//!
//! Finding the peaks of a smooth signal:
//!
//! ```
//! use eventfind::search::{find_maxima, SearchOptions};
//! use eventfind::wrap::Pointwise;
//!
//! // peaks at t=0.25 and t=1.25
//! let in_f = |t: f64| (std::f64::consts::TAU * t).sin();
//! let f = Pointwise::new(&in_f, 1.0);
//!
//! let opts = SearchOptions::default().with_epsilon(1e-6);
//! let maxima = find_maxima(0.0, 1.5, &f, &opts).expect("valid search");
//!
//! assert_eq!(maxima.len(), 2);
//! assert!((maxima.times[0] - 0.25).abs() < 1e-6);
//! assert!((maxima.values[1] - 1.0).abs() < 1e-9);
//! ```

mod driver;

use thiserror::Error;

use crate::bracket::{peak_brackets, value_changes, Bounds};
use crate::convergence::{
    collapse_highest, collapse_last, max_depth, BracketWidth, CLUSTER_EPSILONS,
};
use crate::sampler::{initial_count, linspace, Grid, MAX_INITIAL_SAMPLES};
use crate::wrap::Signal;

/// Fewest points a peak bracket can be refined with and still shrink.
const MIN_PEAK_FANOUT: usize = 5;

/// Search error conditions.
///
/// All of these are caller mistakes and are reported before the signal is
/// evaluated, except `SignalLength` which flags a misbehaving signal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// Interval is empty, reversed, or not finite.
    #[error("start time {t0} is not earlier than end time {t1}")]
    InvalidInterval { t0: f64, t1: f64 },

    /// Epsilon must be positive and finite.
    #[error("epsilon must be positive and finite, got {epsilon}")]
    InvalidEpsilon { epsilon: f64 },

    /// Epsilon is too small to separate neighbouring float values near the
    /// interval, so brackets could never shrink below it.
    #[error("epsilon {epsilon:e} is below the time resolution {resolution:e} of the interval")]
    EpsilonBelowResolution { epsilon: f64, resolution: f64 },

    /// At least two samples are needed per refinement round.
    #[error("sample count must be at least 2, got {num}")]
    InvalidSampleCount { num: usize },

    /// The signal's rough period must be positive and finite.
    #[error("signal rough period must be positive and finite, got {period}")]
    InvalidRoughPeriod { period: f64 },

    /// The interval spans so many rough periods that the initial grid would
    /// not fit in memory.
    #[error("initial grid of {count} samples exceeds the limit of {limit}")]
    TooManySamples { count: usize, limit: usize },

    /// The signal returned the wrong number of values for a batch.
    #[error("signal returned {found} values for {expected} times")]
    SignalLength { expected: usize, found: usize },
}

/// Tuning for `find_discrete` and `find_maxima`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Smallest time separation worth resolving.
    pub epsilon: f64,
    /// Samples taken per bracket on each refinement round, and per rough
    /// period of the signal on the initial grid.
    pub num: usize,
}

impl SearchOptions {
    /// One millisecond, expressed in days.
    pub const DEFAULT_EPSILON: f64 = 0.001 / 86_400.0;
    pub const DEFAULT_NUM: usize = 12;

    pub fn new(epsilon: f64, num: usize) -> Self {
        Self { epsilon, num }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_num(mut self, num: usize) -> Self {
        self.num = num;
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(SearchError::InvalidEpsilon {
                epsilon: self.epsilon,
            });
        }
        if self.num < 2 {
            return Err(SearchError::InvalidSampleCount { num: self.num });
        }
        Ok(())
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EPSILON, Self::DEFAULT_NUM)
    }
}

/// Times at which a signal changed value, and the value it took on.
#[derive(Debug, Clone, PartialEq)]
pub struct Events<Y> {
    pub times: Vec<f64>,
    pub values: Vec<Y>,
}

impl<Y> Events<Y> {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &Y)> + '_ {
        self.times.iter().copied().zip(self.values.iter())
    }
}

/// Times of local maxima and the signal's value there.
#[derive(Debug, Clone, PartialEq)]
pub struct Maxima {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl Maxima {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }
}

/// Checks everything about a search that can be checked without evaluating
/// the signal.  `fanout` is the number of samples taken per rough period.
fn validate<S, Y>(
    t0: f64,
    t1: f64,
    signal: &S,
    opts: &SearchOptions,
    fanout: usize,
) -> Result<(), SearchError>
where
    S: Signal<Y> + ?Sized,
{
    if !(t0.is_finite() && t1.is_finite() && t0 < t1) {
        return Err(SearchError::InvalidInterval { t0, t1 });
    }
    opts.validate()?;

    let period = signal.rough_period();
    if !(period > 0.0 && period.is_finite()) {
        return Err(SearchError::InvalidRoughPeriod { period });
    }

    let resolution = 4.0 * f64::EPSILON * t0.abs().max(t1.abs());
    if opts.epsilon <= resolution {
        return Err(SearchError::EpsilonBelowResolution {
            epsilon: opts.epsilon,
            resolution,
        });
    }

    let count = initial_count(t1 - t0, period, fanout);
    if count > MAX_INITIAL_SAMPLES {
        return Err(SearchError::TooManySamples {
            count,
            limit: MAX_INITIAL_SAMPLES,
        });
    }
    Ok(())
}

/// Finds the times within [t0,t1] at which a step signal changes value.
///
/// Returns each transition time to within `epsilon` along with the value the
/// signal holds right after it.  Transitions within two epsilon of each other
/// are reported once, at the last of them, so that the value reflects the
/// state the signal settles into.
///
/// Both ends of the interval are sample points, so transitions right next to
/// either end are found.  A signal that changes faster than the initial grid
/// can resolve (see `Signal::rough_period`) may have transitions missed.
pub fn find_discrete<S, Y>(
    t0: f64,
    t1: f64,
    signal: &S,
    opts: &SearchOptions,
) -> Result<Events<Y>, SearchError>
where
    S: Signal<Y> + ?Sized,
    Y: PartialEq + Clone,
{
    validate::<S, Y>(t0, t1, signal, opts, opts.num)?;

    let width = t1 - t0;
    let count = initial_count(width, signal.rough_period(), opts.num);
    let shrink = 1.0 / (opts.num - 1) as f64;
    let depth = if opts.num > 2 {
        max_depth(width, opts.epsilon, shrink)
    } else {
        // a two point refinement makes no progress
        0
    };

    let brackets = driver::refine(
        signal,
        Grid::single(linspace(t0, t1, count)),
        &value_changes::<Y>,
        &BracketWidth::new(opts.epsilon),
        opts.num,
        depth,
    )?;

    // the right end of each bracket is the first sample after the change
    let (times, values): (Vec<f64>, Vec<Y>) = brackets
        .into_iter()
        .filter_map(|b| b.times.last().copied().zip(b.values.last().cloned()))
        .unzip();

    let (times, values) = collapse_last(times, values, CLUSTER_EPSILONS * opts.epsilon);
    Ok(Events { times, values })
}

/// Index of the highest value, taking the middle one of a run of ties.
fn peak_index(values: &[f64]) -> usize {
    let top = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<usize> = (0..values.len()).filter(|&i| values[i] == top).collect();
    match tied.len() {
        0 => values.len() / 2,
        n => tied[n / 2],
    }
}

/// Finds the local maxima of a smooth signal within [t0,t1].
///
/// Each maximum is located to within `epsilon`, and reported with the highest
/// value sampled in its final bracket.  The initial grid reaches one step past
/// each end of the interval so that peaks hugging an end are still bracketed,
/// but any maximum that resolves outside [t0,t1] is dropped.  A peak within
/// `epsilon` of either end may resolve to either side of it, so whether it is
/// reported depends on where the refined samples fall.
///
/// Refinement uses at least five points per bracket whatever `opts.num` is.
pub fn find_maxima<S>(
    t0: f64,
    t1: f64,
    signal: &S,
    opts: &SearchOptions,
) -> Result<Maxima, SearchError>
where
    S: Signal<f64> + ?Sized,
{
    let num = opts.num.max(MIN_PEAK_FANOUT);
    validate::<S, f64>(t0, t1, signal, opts, num)?;

    let width = t1 - t0;
    let count = initial_count(width, signal.rough_period(), num);
    let step = width / (count - 1) as f64;

    let mut start = Vec::with_capacity(count + 2);
    start.push(t0 - step);
    start.extend(linspace(t0, t1, count));
    start.push(t1 + step);

    // a tie at the top widens a bracket to three steps
    let shrink = 3.0 / (num - 1) as f64;
    let depth = max_depth(width + 2.0 * step, opts.epsilon, shrink);

    let brackets = driver::refine(
        signal,
        Grid::single(start),
        &peak_brackets,
        &BracketWidth::new(opts.epsilon),
        num,
        depth,
    )?;

    let window = Bounds::new(t0, t1);
    let mut times = Vec::with_capacity(brackets.len());
    let mut values = Vec::with_capacity(brackets.len());
    for b in &brackets {
        let i = peak_index(&b.values);
        if window.contains(b.times[i]) {
            times.push(b.times[i]);
            values.push(b.values[i]);
        }
    }

    let (times, values) = collapse_highest(times, values, CLUSTER_EPSILONS * opts.epsilon);
    Ok(Maxima { times, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrap::{Batched, Pointwise};
    use approx::assert_abs_diff_eq;

    const EPSILON: f64 = 1e-10;

    fn opts() -> SearchOptions {
        SearchOptions::default().with_epsilon(EPSILON)
    }

    #[test]
    fn test_default_options() {
        let o = SearchOptions::default();
        assert_eq!(o.num, 12);
        assert_abs_diff_eq!(o.epsilon, 1.157_407_407e-8, epsilon = 1e-17);
        assert!(o.validate().is_ok());
    }

    #[test]
    fn test_options_validation() {
        assert_eq!(
            SearchOptions::new(0.0, 12).validate(),
            Err(SearchError::InvalidEpsilon { epsilon: 0.0 })
        );
        assert_eq!(
            SearchOptions::new(-1.0, 12).validate(),
            Err(SearchError::InvalidEpsilon { epsilon: -1.0 })
        );
        assert!(SearchOptions::new(f64::NAN, 12).validate().is_err());
        assert!(SearchOptions::new(f64::INFINITY, 12).validate().is_err());
        assert_eq!(
            SearchOptions::new(1e-9, 1).validate(),
            Err(SearchError::InvalidSampleCount { num: 1 })
        );
    }

    #[test]
    fn test_invalid_interval_before_sampling() {
        let in_f = |_: f64| -> i32 { panic!("signal must not be evaluated") };
        let f = Pointwise::new(&in_f, 1.0);

        let err = find_discrete(1.0, 1.0, &f, &opts()).expect_err("empty interval");
        assert_eq!(err, SearchError::InvalidInterval { t0: 1.0, t1: 1.0 });

        let err = find_discrete(2.0, 1.0, &f, &opts()).expect_err("reversed interval");
        assert_eq!(err, SearchError::InvalidInterval { t0: 2.0, t1: 1.0 });

        assert!(find_discrete(0.0, f64::NAN, &f, &opts()).is_err());
    }

    #[test]
    fn test_invalid_rough_period() {
        let in_f = |t: f64| t;
        let f = Pointwise::new(&in_f, 0.0);
        let err = find_maxima(0.0, 1.0, &f, &opts()).expect_err("zero period");
        assert_eq!(err, SearchError::InvalidRoughPeriod { period: 0.0 });
    }

    #[test]
    fn test_epsilon_below_resolution() {
        let in_f = |t: f64| (t > 2.4e6) as i32;
        let f = Pointwise::new(&in_f, 1.0);

        // julian-date sized times cannot resolve 1e-10 days
        match find_discrete(2.4e6, 2.4e6 + 1.0, &f, &opts()) {
            Err(SearchError::EpsilonBelowResolution { .. }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_too_many_samples() {
        let in_f = |_: f64| -> i32 { panic!("signal must not be evaluated") };
        let f = Pointwise::new(&in_f, 1.0 / 1024.0);
        let o = opts().with_epsilon(1e-3);

        let err = find_discrete(0.0, 1e9, &f, &o).expect_err("huge grid");
        assert_eq!(
            err,
            SearchError::TooManySamples {
                count: 12_288_000_000_000,
                limit: MAX_INITIAL_SAMPLES
            }
        );

        let in_g = |_: f64| -> f64 { panic!("signal must not be evaluated") };
        let g = Pointwise::new(&in_g, 1.0 / 1024.0);
        match find_maxima(0.0, 1e9, &g, &o) {
            Err(SearchError::TooManySamples { .. }) => {}
            other => panic!("unexpected result {:?}", other),
        }

        // just inside the limit is still a valid search
        let h = Pointwise::new(&in_f, 1.0);
        let o = SearchOptions::new(1e-3, 2);
        let t1 = (MAX_INITIAL_SAMPLES / 2) as f64;
        assert!(validate::<_, i32>(0.0, t1, &h, &o, o.num).is_ok());
    }

    #[test]
    fn test_bad_signal_length() {
        let in_f = |t: &[f64]| vec![0u8; t.len() - 1];
        let f = Batched::new(&in_f, 1.0);
        match find_discrete(0.0, 1.0, &f, &opts()) {
            Err(SearchError::SignalLength { expected: 12, found: 11 }) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_discrete_constant_signal() {
        let in_f = |_: f64| 3u8;
        let f = Pointwise::new(&in_f, 1.0);
        let events = find_discrete(0.0, 1.0, &f, &opts()).expect("valid search");
        assert!(events.is_empty());
        assert!(events.values.is_empty());
    }

    #[test]
    fn test_discrete_values_need_not_be_numbers() {
        let in_f = |t: f64| if t < 0.3 { "night" } else if t < 0.8 { "day" } else { "night" };
        let f = Pointwise::new(&in_f, 1.0);
        let events = find_discrete(0.0, 1.0, &f, &opts()).expect("valid search");

        let found: Vec<(f64, &&str)> = events.iter().collect();
        assert_eq!(found.len(), 2);
        assert_abs_diff_eq!(found[0].0, 0.3, epsilon = EPSILON);
        assert_eq!(*found[0].1, "day");
        assert_abs_diff_eq!(found[1].0, 0.8, epsilon = EPSILON);
        assert_eq!(*found[1].1, "night");
    }

    #[test]
    fn test_discrete_short_rough_period() {
        // a pulse narrower than the default grid spacing of 1/11
        let in_f = |t: f64| (0.40..0.42).contains(&t) as i32;

        let coarse = Pointwise::new(&in_f, 1.0);
        let missed = find_discrete(0.0, 1.0, &coarse, &opts()).expect("valid search");
        assert!(missed.is_empty());

        let fine = Pointwise::new(&in_f, 0.01);
        let found = find_discrete(0.0, 1.0, &fine, &opts()).expect("valid search");
        assert_eq!(found.values, vec![1, 0]);
        assert_abs_diff_eq!(found.times[0], 0.40, epsilon = EPSILON);
        assert_abs_diff_eq!(found.times[1], 0.42, epsilon = EPSILON);
    }

    #[test]
    fn test_discrete_two_point_fanout() {
        // no refinement possible, transitions land on the coarse grid
        let in_f = |t: f64| (t >= 0.5) as i32;
        let f = Pointwise::new(&in_f, 0.25);
        let o = SearchOptions::new(1.0, 2);
        let events = find_discrete(0.0, 1.0, &f, &o).expect("valid search");
        assert_eq!(events.values, vec![1]);
        assert_abs_diff_eq!(events.times[0], 4.0 / 7.0, epsilon = 1e-15);
    }

    #[test]
    fn test_peak_index() {
        assert_eq!(peak_index(&[0.0, 2.0, 1.0]), 1);
        assert_eq!(peak_index(&[0.0, 2.0, 2.0, 2.0, 1.0]), 2);
        assert_eq!(peak_index(&[0.0, 3.0, 3.0, 1.0]), 2);
    }

    #[test]
    fn test_maxima_monotone_signal() {
        let in_f = |t: f64| t * t;
        let f = Pointwise::new(&in_f, 1.0);
        let maxima = find_maxima(0.0, 1.0, &f, &opts()).expect("valid search");
        assert!(maxima.is_empty());
    }

    #[test]
    fn test_maxima_parabola() {
        let in_f = |t: f64| 2.0 - (t - 0.37) * (t - 0.37);
        let f = Pointwise::new(&in_f, 1.0);
        let o = opts().with_epsilon(1e-7).with_num(3);
        let maxima = find_maxima(0.0, 1.0, &f, &o).expect("valid search");
        assert_eq!(maxima.len(), 1);
        assert_abs_diff_eq!(maxima.times[0], 0.37, epsilon = 1e-7);
        assert_abs_diff_eq!(maxima.values[0], 2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_maxima_peaks_on_the_edges() {
        let in_f = |t: f64| {
            -[0.0, 0.5, 1.0]
                .iter()
                .map(|p| (t - p).abs())
                .fold(f64::INFINITY, f64::min)
        };
        let f = Pointwise::new(&in_f, 1.0);

        // the inner peak is always found, edge peaks only ever within the window
        for num in [3, 5, 12, 20] {
            let maxima = find_maxima(0.0, 1.0, &f, &opts().with_num(num)).expect("valid search");
            assert!(maxima.times.iter().all(|&t| (0.0..=1.0).contains(&t)), "num={}", num);
            let inner: Vec<f64> =
                maxima.times.iter().copied().filter(|t| (t - 0.5).abs() <= EPSILON).collect();
            assert_eq!(inner.len(), 1, "num={}", num);
        }
    }

    #[test]
    fn test_maxima_narrow_spike_reported_once() {
        let in_f = |t: f64| if (0.4..=0.4 + 1e-11).contains(&t) { 1.0 } else { -(t - 0.4).abs() };
        let f = Pointwise::new(&in_f, 1.0);
        let maxima = find_maxima(0.0, 1.0, &f, &opts()).expect("valid search");
        assert_eq!(maxima.len(), 1);
        assert_abs_diff_eq!(maxima.times[0], 0.4, epsilon = EPSILON);
    }
}
