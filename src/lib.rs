//! Discrete-event and local-maximum search over sampled signals.
//!
//! Given a signal of time on a closed interval, `find_discrete` locates every
//! moment a step-valued signal changes value and `find_maxima` locates every
//! local maximum of a smooth one.  Both work by sampling the interval on a
//! coarse grid and repeatedly subdividing the brackets that hold something,
//! until each is no wider than a requested `epsilon`.
//!
//! Time is a plain `f64` in whatever unit the caller works in.  Signals are
//! wrapped with the types in `wrap`, which also carry a rough period used to
//! size the initial grid.
//!
//! # Examples
//!
//! ```
//! use eventfind::{find_discrete, Pointwise, SearchOptions};
//!
//! // which quarter of the interval are we in?
//! let in_f = |t: f64| (4.0 * t).floor() as i64;
//! let f = Pointwise::new(&in_f, 0.25);
//!
//! let opts = SearchOptions::default().with_epsilon(1e-9);
//! let events = find_discrete(0.0, 0.99, &f, &opts).expect("valid search");
//!
//! assert_eq!(events.values, vec![1, 2, 3]);
//! for (t, want) in events.times.iter().zip([0.25, 0.5, 0.75]) {
//!     assert!((t - want).abs() < 1e-9);
//! }
//! ```

pub mod bracket;
pub mod convergence;
pub mod sampler;
pub mod search;
pub mod wrap;

pub use search::{find_discrete, find_maxima, Events, Maxima, SearchError, SearchOptions};
pub use wrap::{Batched, Pointwise, Signal};
