//! Evenly spaced sampling of signals.
//!
//! Refinement rounds subdivide many brackets at once.  The brackets of one
//! round are kept as separate segments of a `Grid`, but the whole grid is
//! handed to the signal as a single batch.

use std::ops::{Range, RangeInclusive};

use crate::bracket::Bounds;
use crate::search::SearchError;
use crate::wrap::Signal;

/// Paired times and signal values.
#[derive(Clone, Debug, PartialEq)]
pub struct Samples<Y> {
    pub times: Vec<f64>,
    pub values: Vec<Y>,
}

impl<Y> Samples<Y> {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Interval from the first to the last sample time.
    ///
    /// Panics if there are no samples.
    pub fn bounds(&self) -> Bounds {
        assert!(!self.is_empty());
        Bounds::new(self.times[0], self.times[self.len() - 1])
    }

    /// Copies out the samples at `range`.
    pub fn slice(&self, range: RangeInclusive<usize>) -> Samples<Y>
    where
        Y: Clone,
    {
        Samples {
            times: self.times[range.clone()].to_vec(),
            values: self.values[range].to_vec(),
        }
    }
}

/// `n` evenly spaced values from `a` to `b`, both ends included exactly.
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    assert!(n >= 2);
    assert!(a.is_finite() && b.is_finite());

    let step = (b - a) / (n - 1) as f64;
    let mut out: Vec<f64> = (0..n).map(|i| a + step * i as f64).collect();
    out[n - 1] = b;
    out
}

/// Largest initial grid a search will evaluate.
pub const MAX_INITIAL_SAMPLES: usize = 1 << 24;

/// Number of initial samples across an interval of `width`, taking `num`
/// samples per rough period of the signal.  Never fewer than `num`, nor
/// fewer than 2.
///
/// Saturates at `usize::MAX` for huge intervals rather than overflowing.
pub fn initial_count(width: f64, rough_period: f64, num: usize) -> usize {
    assert!(rough_period > 0.0);
    let periods = (width / rough_period).max(1.0);
    ((periods * num as f64) as usize).max(num).max(2)
}

/// Evaluates the signal once over `times`.
pub fn sample<S, Y>(signal: &S, times: Vec<f64>) -> Result<Samples<Y>, SearchError>
where
    S: Signal<Y> + ?Sized,
{
    let values = signal.sample(&times);
    if values.len() != times.len() {
        return Err(SearchError::SignalLength {
            expected: times.len(),
            found: values.len(),
        });
    }
    Ok(Samples { times, values })
}

/// Ascending runs of sample times, one per bracket under refinement.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    segments: Vec<Vec<f64>>,
}

impl Grid {
    /// A grid holding a single run of times.
    pub fn single(times: Vec<f64>) -> Grid {
        Grid {
            segments: vec![times],
        }
    }

    /// Subdivides each bracket with `num` evenly spaced points.
    pub fn refine(brackets: &[Bounds], num: usize) -> Grid {
        Grid {
            segments: brackets
                .iter()
                .map(|b| linspace(b.a, b.b, num))
                .collect(),
        }
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn sample_count(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    /// Evaluates every segment in one batch and returns the flattened
    /// samples along with the index range each segment occupies.
    pub fn sample<S, Y>(
        &self,
        signal: &S,
    ) -> Result<(Samples<Y>, Vec<Range<usize>>), SearchError>
    where
        S: Signal<Y> + ?Sized,
    {
        let mut ranges = Vec::with_capacity(self.segments.len());
        let mut times = Vec::with_capacity(self.sample_count());
        for seg in &self.segments {
            let start = times.len();
            times.extend_from_slice(seg);
            ranges.push(start..times.len());
        }
        Ok((sample(signal, times)?, ranges))
    }
}
