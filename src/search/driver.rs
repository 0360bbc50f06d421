use log::{debug, trace, warn};

use super::SearchError;
use crate::bracket::Bounds;
use crate::convergence::IsConverged;
use crate::sampler::{Grid, Samples};
use crate::wrap::Signal;

/// Driver for bracket refinement.
///
/// Each round evaluates the whole grid in one batch, lets `detect` find
/// brackets inside every segment, and re-samples those brackets with `num`
/// points.  Stops once every bracket satisfies `finish`, once nothing is
/// bracketed, or after `max_depth` refinements.
///
/// Returns the samples spanning each final bracket, ordered by time.  A
/// bracket whose refinement no longer shows what `detect` looks for (a peak
/// flattened out by float precision, say) is kept as it was before that
/// refinement.
pub fn refine<S, Y, D, C>(
    signal: &S,
    start: Grid,
    detect: &D,
    finish: &C,
    num: usize,
    max_depth: usize,
) -> Result<Vec<Samples<Y>>, SearchError>
where
    S: Signal<Y> + ?Sized,
    Y: Clone,
    D: Fn(&[Y]) -> Vec<(usize, usize)>,
    C: IsConverged,
{
    let mut grid = start;
    let mut parents: Vec<Option<Samples<Y>>> = Vec::new();
    let mut settled: Vec<Samples<Y>> = Vec::new();
    let mut depth = 0;

    loop {
        let (samples, ranges) = grid.sample(signal)?;

        let mut brackets: Vec<Samples<Y>> = Vec::new();
        for (k, r) in ranges.iter().enumerate() {
            let found = detect(&samples.values[r.clone()]);
            if found.is_empty() {
                if let Some(parent) = parents.get_mut(k).and_then(Option::take) {
                    trace!("bracket at {} stalled, keeping previous round", parent.times[0]);
                    settled.push(parent);
                }
                continue;
            }
            for (lo, hi) in found {
                brackets.push(samples.slice(r.start + lo..=r.start + hi));
            }
        }
        trace!(
            "round {}: {} samples in {} segments, {} brackets",
            depth,
            samples.len(),
            grid.segment_count(),
            brackets.len()
        );

        let bounds: Vec<Bounds> = brackets.iter().map(Samples::bounds).collect();
        let converged = bounds.iter().all(|b| finish.is_converged(b));

        if converged || depth >= max_depth {
            if converged {
                debug!("converged after {} refinements with {} brackets", depth, brackets.len());
            } else {
                let widest = bounds.iter().map(Bounds::size).fold(0.0, f64::max);
                warn!(
                    "refinement budget of {} rounds exhausted, widest bracket {:e}",
                    max_depth, widest
                );
            }
            brackets.append(&mut settled);
            brackets.sort_by(|a, b| a.times[0].total_cmp(&b.times[0]));
            return Ok(brackets);
        }

        grid = Grid::refine(&bounds, num);
        parents = brackets.into_iter().map(Some).collect();
        depth += 1;
    }
}
