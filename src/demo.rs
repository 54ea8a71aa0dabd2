//! Bench patterns for checking the wiring without the engine.
//!
//! Both patterns leave the outputs cleared when they finish, including when
//! a pin fails part way through (as far as the link still works).

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info};

use crate::poller::pause;
use crate::shifter::SerialLink;
use crate::traits::StepSource;
use crate::walk::{Position, BAR_LEN};

/// Lights each output in turn, then all of them, then clears.
///
/// Renders `1, 2, 4, ... 128, 255, 0` with no delay between frames.
///
/// ```rust
/// use shift_bug::{demo, SerialLink};
/// use shift_bug::hal::Hc595;
///
/// let chip = Hc595::new();
/// let [data, clock, latch] = chip.lines();
/// let mut link = SerialLink::new(data, clock, latch).unwrap();
///
/// demo::sweep(&mut link).unwrap();
/// assert_eq!(chip.frames(), vec![1, 2, 4, 8, 16, 32, 64, 128, 255, 0]);
/// ```
pub fn sweep<P: OutputPin>(link: &mut SerialLink<P>) -> Result<(), P::Error> {
    let lit = sweep_frames(link);
    let cleared = link.clear();
    info!("sweep finished");
    lit.and(cleared)
}

fn sweep_frames<P: OutputPin>(link: &mut SerialLink<P>) -> Result<(), P::Error> {
    for bit in 0..BAR_LEN {
        link.transmit(1 << bit)?;
    }
    link.all_on()
}

/// Runs `count` clamped steps from `start`, one every `interval`.
///
/// Wrap mode never applies here. Returns the final position; the outputs
/// are cleared afterwards.
pub fn clamped_walk<P, S, D>(
    link: &mut SerialLink<P>,
    start: Position,
    steps: &mut S,
    count: usize,
    delay: &mut D,
    interval: Duration,
) -> Result<Position, P::Error>
where
    P: OutputPin,
    S: StepSource + ?Sized,
    D: DelayNs,
{
    let walked = walk_frames(link, start, steps, count, delay, interval);
    let cleared = link.clear();
    let end = walked?;
    cleared?;
    debug!("walk demo ended at {}", end.index());
    Ok(end)
}

fn walk_frames<P, S, D>(
    link: &mut SerialLink<P>,
    start: Position,
    steps: &mut S,
    count: usize,
    delay: &mut D,
    interval: Duration,
) -> Result<Position, P::Error>
where
    P: OutputPin,
    S: StepSource + ?Sized,
    D: DelayNs,
{
    let mut position = start;
    link.transmit(position.mask())?;
    for _ in 0..count {
        position = position.advance(steps.next_step(), false);
        link.transmit(position.mask())?;
        pause(delay, interval);
    }
    Ok(position)
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::hal::{Hc595, MockDelay, ScriptedSteps};
    use crate::walk::Step;

    fn link() -> (Hc595, SerialLink<crate::hal::SimLine>) {
        let chip = Hc595::new();
        let [data, clock, latch] = chip.lines();
        (chip.clone(), SerialLink::new(data, clock, latch).unwrap())
    }

    #[test]
    fn sweep_lights_each_output_then_all() {
        let (chip, mut link) = link();
        sweep(&mut link).unwrap();
        assert_eq!(chip.frames(), vec![1, 2, 4, 8, 16, 32, 64, 128, 255, 0]);
    }

    #[test]
    fn sweep_fault_propagates() {
        let (chip, mut link) = link();
        chip.inject_fault();
        assert!(sweep(&mut link).is_err());
    }

    #[test]
    fn clamped_walk_holds_at_edge() {
        let (chip, mut link) = link();
        let mut steps = ScriptedSteps::always(Step::Back);
        let mut delay = MockDelay::default();
        let end = clamped_walk(
            &mut link,
            Position::new(2),
            &mut steps,
            5,
            &mut delay,
            Duration::from_millis(50),
        )
        .unwrap();

        assert_eq!(end, Position::new(0));
        assert_eq!(chip.frames(), vec![0x04, 0x02, 0x01, 0x01, 0x01, 0x01, 0]);
        assert_eq!(delay.total(), Duration::from_millis(250));
    }

    #[test]
    fn clamped_walk_with_no_steps_shows_start() {
        let (chip, mut link) = link();
        let end = clamped_walk(
            &mut link,
            Position::new(5),
            &mut ScriptedSteps::new(&[]),
            0,
            &mut MockDelay::default(),
            Duration::from_millis(50),
        )
        .unwrap();
        assert_eq!(end, Position::new(5));
        assert_eq!(chip.frames(), vec![0x20, 0]);
    }
}
