//! Sources of step directions for the walk.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::walk::Step;

/// Supplies the direction of each step.
pub trait StepSource {
    /// Returns the next step direction.
    fn next_step(&mut self) -> Step;
}

/// Uniform random steps drawn from any [`RngCore`].
///
/// ```rust
/// use shift_bug::traits::{RandomSteps, StepSource};
///
/// let mut steps = RandomSteps::seeded(42);
/// let _ = steps.next_step();
/// ```
#[derive(Clone, Debug)]
pub struct RandomSteps<R = SmallRng> {
    rng: R,
}

impl<R: RngCore> RandomSteps<R> {
    /// Wraps an existing generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomSteps<SmallRng> {
    /// Deterministic steps from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }

    /// Steps seeded from the operating system's entropy source.
    #[cfg(feature = "std")]
    pub fn from_entropy() -> Self {
        Self::new(SmallRng::from_entropy())
    }
}

impl<R: RngCore> StepSource for RandomSteps<R> {
    fn next_step(&mut self) -> Step {
        Step::random(&mut self.rng)
    }
}

impl<S: StepSource + ?Sized> StepSource for &mut S {
    fn next_step(&mut self) -> Step {
        (**self).next_step()
    }
}
