/// Trait evaluating a signal y(t) over a batch of times.
///
/// Implementations must return exactly one value per time, in order.
pub trait Signal<Y> {
    fn sample(&self, times: &[f64]) -> Vec<Y>;

    /// Advisory spacing below which features of the signal may be missed.
    /// Only used to size the initial sampling grid.
    fn rough_period(&self) -> f64 {
        1.0
    }
}

/// Wraps a batched function to implement Signal.
pub struct Batched<'a, F> {
    pub f: &'a F,
    pub rough_period: f64,
}

impl<'a, F, Y> Batched<'a, F>
where
    F: 'a + Fn(&[f64]) -> Vec<Y>,
{
    pub fn new(f: &'a F, rough_period: f64) -> Batched<'a, F> {
        Batched { f, rough_period }
    }
}

impl<'a, F, Y> Signal<Y> for Batched<'a, F>
where
    F: 'a + Fn(&[f64]) -> Vec<Y>,
{
    fn sample(&self, times: &[f64]) -> Vec<Y> {
        (self.f)(times)
    }

    fn rough_period(&self) -> f64 {
        self.rough_period
    }
}

/// Wraps a scalar function to implement Signal.  Each batch is evaluated one
/// time at a time.
pub struct Pointwise<'a, F> {
    pub f: &'a F,
    pub rough_period: f64,
}

impl<'a, F, Y> Pointwise<'a, F>
where
    F: 'a + Fn(f64) -> Y,
{
    pub fn new(f: &'a F, rough_period: f64) -> Pointwise<'a, F> {
        Pointwise { f, rough_period }
    }
}

impl<'a, F, Y> Signal<Y> for Pointwise<'a, F>
where
    F: 'a + Fn(f64) -> Y,
{
    fn sample(&self, times: &[f64]) -> Vec<Y> {
        times.iter().map(|&t| (self.f)(t)).collect()
    }

    fn rough_period(&self) -> f64 {
        self.rough_period
    }
}
