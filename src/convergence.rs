use crate::bracket::Bounds;

/// Extra refinement rounds allowed beyond the analytic depth.
pub const SPARE_ROUNDS: usize = 2;

/// Resolved times no further apart than this many epsilons form one cluster.
///
/// A resolved time trails the true one by less than one final bracket, so
/// a resolved gap is within one epsilon of the true gap.
pub const CLUSTER_EPSILONS: f64 = 2.0;

pub trait IsConverged {
    fn is_converged(&self, bracket: &Bounds) -> bool;
}

/// Converged once a bracket is no wider than `epsilon`.
#[derive(Clone, Debug, PartialEq)]
pub struct BracketWidth {
    epsilon: f64,
}

impl BracketWidth {
    pub fn new(epsilon: f64) -> BracketWidth {
        assert!(epsilon > 0.0);
        assert!(epsilon.is_finite());
        BracketWidth { epsilon }
    }
}

impl IsConverged for BracketWidth {
    fn is_converged(&self, bracket: &Bounds) -> bool {
        bracket.size() <= self.epsilon
    }
}

/// Refinement rounds needed to shrink a bracket of `width` below `epsilon`
/// when each round multiplies its width by `shrink`, plus `SPARE_ROUNDS`.
pub fn max_depth(width: f64, epsilon: f64, shrink: f64) -> usize {
    assert!(shrink > 0.0 && shrink < 1.0);
    assert!(epsilon > 0.0);
    if width <= epsilon {
        return SPARE_ROUNDS;
    }
    let rounds = ((width / epsilon).ln() / shrink.recip().ln()).ceil();
    rounds as usize + SPARE_ROUNDS
}

/// Thins ascending `times` so that no two survivors are within `tolerance`,
/// keeping the last member of every cluster.
pub fn collapse_last<Y>(
    times: Vec<f64>,
    values: Vec<Y>,
    tolerance: f64,
) -> (Vec<f64>, Vec<Y>) {
    assert_eq!(times.len(), values.len());
    let next: Vec<Option<f64>> = times
        .iter()
        .skip(1)
        .map(|&t| Some(t))
        .chain(Some(None))
        .collect();

    times
        .into_iter()
        .zip(values)
        .zip(next)
        .filter(|((t, _), n)| match n {
            Some(n) => n - t > tolerance,
            None => true,
        })
        .map(|(pair, _)| pair)
        .unzip()
}

/// Thins ascending `times` so that no two survivors are within `tolerance`,
/// keeping the highest member of every cluster.  On ties the earlier wins.
pub fn collapse_highest(
    times: Vec<f64>,
    values: Vec<f64>,
    tolerance: f64,
) -> (Vec<f64>, Vec<f64>) {
    assert_eq!(times.len(), values.len());
    let mut out_t: Vec<f64> = Vec::with_capacity(times.len());
    let mut out_y: Vec<f64> = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for (t, y) in times.into_iter().zip(values) {
        let joins = match prev {
            Some(p) => t - p <= tolerance,
            None => false,
        };
        prev = Some(t);

        if !joins {
            out_t.push(t);
            out_y.push(y);
            continue;
        }
        if let Some(last) = out_y.last_mut() {
            if y > *last {
                *last = y;
                if let Some(lt) = out_t.last_mut() {
                    *lt = t;
                }
            }
        }
    }
    (out_t, out_y)
}
