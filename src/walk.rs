//! Position and step arithmetic for the random walk.
//!
//! The bug lives on an 8-output bar. Each step moves it one place left or
//! right; at the ends it either wraps around (ring) or clamps (bounded line).
//!
//! ```rust
//! use shift_bug::walk::{Position, Step};
//!
//! let edge = Position::new(7);
//! assert_eq!(edge.advance(Step::Forward, false), Position::new(7)); // clamped
//! assert_eq!(edge.advance(Step::Forward, true), Position::new(0));  // wrapped
//! assert_eq!(Position::new(3).mask(), 0b0000_1000);
//! ```

use rand::{Rng, RngCore};

/// Number of outputs on the LED bar.
pub const BAR_LEN: u8 = 8;

/// Highest valid position.
pub const MAX_POSITION: u8 = BAR_LEN - 1;

/// One step of the walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Move towards position 0.
    Back,
    /// Move towards position 7.
    Forward,
}

impl Step {
    /// Signed offset applied to the position.
    #[inline]
    pub const fn delta(self) -> i8 {
        match self {
            Step::Back => -1,
            Step::Forward => 1,
        }
    }

    /// Picks a direction uniformly at random.
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Step::Forward
        } else {
            Step::Back
        }
    }
}

/// Position of the lit LED, always within `0..=7`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position(u8);

impl Position {
    /// Creates a position, clamping out-of-range values to the last output.
    #[inline]
    pub const fn new(index: u8) -> Self {
        if index > MAX_POSITION {
            Position(MAX_POSITION)
        } else {
            Position(index)
        }
    }

    /// Returns the output index.
    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Byte with only this position's bit set.
    #[inline]
    pub const fn mask(self) -> u8 {
        1 << self.0
    }

    /// Applies one step.
    ///
    /// With `wrap` the bar is a ring: stepping past 7 lands on 0 and stepping
    /// below 0 lands on 7. Without it the result is clamped and the step is
    /// simply lost, so the walk may sit at an edge for several steps.
    pub fn advance(self, step: Step, wrap: bool) -> Self {
        let next = self.0 as i8 + step.delta();
        let bar = BAR_LEN as i8;
        if wrap {
            Position(((next + bar) % bar) as u8)
        } else {
            Position(next.clamp(0, MAX_POSITION as i8) as u8)
        }
    }
}

impl From<Position> for u8 {
    fn from(p: Position) -> u8 {
        p.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn new_clamps_out_of_range() {
        assert_eq!(Position::new(0).index(), 0);
        assert_eq!(Position::new(7).index(), 7);
        assert_eq!(Position::new(8).index(), 7);
        assert_eq!(Position::new(255).index(), 7);
    }

    #[test]
    fn mask_has_single_bit() {
        for i in 0..BAR_LEN {
            let mask = Position::new(i).mask();
            assert_eq!(mask.count_ones(), 1);
            assert_eq!(mask.trailing_zeros(), i as u32);
        }
    }

    #[test]
    fn clamped_edges() {
        assert_eq!(Position::new(0).advance(Step::Back, false), Position::new(0));
        assert_eq!(Position::new(7).advance(Step::Forward, false), Position::new(7));
        assert_eq!(Position::new(0).advance(Step::Forward, false), Position::new(1));
        assert_eq!(Position::new(7).advance(Step::Back, false), Position::new(6));
    }

    #[test]
    fn wrapped_edges() {
        assert_eq!(Position::new(7).advance(Step::Forward, true), Position::new(0));
        assert_eq!(Position::new(0).advance(Step::Back, true), Position::new(7));
        assert_eq!(Position::new(3).advance(Step::Forward, true), Position::new(4));
        assert_eq!(Position::new(3).advance(Step::Back, true), Position::new(2));
    }

    #[test]
    fn long_walk_stays_in_range() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        for wrap in [false, true] {
            let mut pos = Position::new(3);
            for _ in 0..10_000 {
                let before = pos.index() as i16;
                pos = pos.advance(Step::random(&mut rng), wrap);
                assert!(pos.index() <= MAX_POSITION);

                let moved = (pos.index() as i16 - before).abs();
                if wrap {
                    assert!(moved == 1 || moved == 7);
                } else {
                    assert!(moved <= 1);
                }
            }
        }
    }

    #[test]
    fn random_steps_take_both_directions() {
        let mut rng = SmallRng::seed_from_u64(7);
        let forward = (0..1000)
            .filter(|_| Step::random(&mut rng) == Step::Forward)
            .count();
        assert!(forward > 400 && forward < 600, "forward = {forward}");
    }
}
