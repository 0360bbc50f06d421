//! Brackets over sampled signals.
//!
//! A bracket is a closed interval of time known to contain something worth
//! refining: a change of value for step signals, or a peak for smooth ones.
//! The scanners here work on one ascending run of samples and report index
//! pairs into it.

/// Bounds represents the closed interval [a,b].
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds {
    pub a: f64,
    pub b: f64,
}

impl Bounds {
    pub fn new(a: f64, b: f64) -> Bounds {
        assert!(a <= b);
        assert!(a.is_finite() && b.is_finite());
        Bounds { a, b }
    }

    pub fn size(&self) -> f64 {
        self.b - self.a
    }

    pub fn contains(&self, x: f64) -> bool {
        self.a <= x && x <= self.b
    }
}

/// Direction of travel from `lhs` to `rhs`: 1 rising, -1 falling, 0 flat.
///
/// Note that `f64::signum` cannot be used here since it maps 0.0 to 1.0.
/// Unordered values (NaN) count as flat.
pub fn slope_sign(lhs: f64, rhs: f64) -> i8 {
    if rhs > lhs {
        1
    } else if rhs < lhs {
        -1
    } else {
        0
    }
}

/// Scans adjacent samples and emits the index pair `(i, i + 1)` for every
/// pair whose values differ.  For a step signal each such pair brackets at
/// least one transition.
pub fn value_changes<Y>(values: &[Y]) -> Vec<(usize, usize)>
where
    Y: PartialEq,
{
    values
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] != w[1])
        .map(|(i, _)| (i, i + 1))
        .collect()
}

/// Scans adjacent samples and emits an index pair `(r, f)` for every peak:
/// `r` is the last sample before the signal rises to the top, `f` the first
/// sample after it falls away again.  Flat runs at the top stay inside one
/// bracket, so neighbouring brackets never overlap.
///
/// Rises that never fall back, or falls with no rise before them, are not
/// peaks of this run of samples.
pub fn peak_brackets(values: &[f64]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut rise: Option<usize> = None;

    for (j, w) in values.windows(2).enumerate() {
        match slope_sign(w[0], w[1]) {
            1 => rise = Some(j),
            -1 => {
                if let Some(r) = rise.take() {
                    out.push((r, j + 1));
                }
            }
            _ => {}
        }
    }
    out
}
