//! Mock implementations for testing without hardware or wall-clock time.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockClock`] | - | Shared, manually advanced time source |
//! | [`MockDelay`] | [`DelayNs`] | Advances a [`MockClock`] instead of sleeping |
//! | [`ScriptedSwitch`] | [`InputPin`] | Level follows a timeline on a [`MockClock`] |
//! | [`ScriptedSteps`] | [`StepSource`] | Repeats a fixed sequence of steps |
//! | [`MockWalkControl`] | [`WalkControl`] | Records engine commands |
//!
//! # Example
//!
//! ```rust
//! use shift_bug::hal::{MockClock, MockDelay, ScriptedSwitch};
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::InputPin;
//!
//! let clock = MockClock::new();
//! let mut delay = MockDelay::new(clock.clone());
//! let mut switch = ScriptedSwitch::new(clock.clone(), false, &[(30, true)]);
//!
//! assert!(switch.is_low().unwrap());
//! delay.delay_ms(30);
//! assert_eq!(clock.now_ms(), 30);
//! assert!(switch.is_high().unwrap());
//! ```
//!
//! [`DelayNs`]: embedded_hal::delay::DelayNs
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`StepSource`]: crate::traits::StepSource
//! [`WalkControl`]: crate::traits::WalkControl

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin};

use crate::traits::{StepSource, WalkControl};
use crate::walk::Step;

// ============================================================================
// Time
// ============================================================================

/// Shared mock clock counting nanoseconds from zero.
///
/// Clones observe and advance the same time.
#[derive(Clone, Debug, Default)]
pub struct MockClock {
    now_ns: Arc<AtomicU64>,
}

impl MockClock {
    /// Creates a clock at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst) / 1_000_000
    }

    /// Current time in nanoseconds.
    pub fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }

    /// Sets the current time in milliseconds.
    pub fn set_ms(&self, ms: u64) {
        self.now_ns.store(ms * 1_000_000, Ordering::SeqCst);
    }

    /// Advances the clock by `ns` nanoseconds.
    pub fn advance_ns(&self, ns: u64) {
        self.now_ns.fetch_add(ns, Ordering::SeqCst);
    }

    /// Advances the clock by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance_ns(ms * 1_000_000);
    }
}

/// Delay that advances a [`MockClock`] and returns immediately.
#[derive(Clone, Debug, Default)]
pub struct MockDelay {
    clock: MockClock,
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl MockDelay {
    /// Creates a delay driving `clock`.
    pub fn new(clock: MockClock) -> Self {
        Self {
            clock,
            calls: Arc::default(),
        }
    }

    /// Every delay requested so far, in order.
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }

    /// Total time spent in delays.
    pub fn total(&self) -> Duration {
        self.calls.lock().unwrap().iter().sum()
    }

    fn record(&mut self, ns: u64) {
        self.clock.advance_ns(ns);
        self.calls.lock().unwrap().push(Duration::from_nanos(ns));
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.record(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.record(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.record(u64::from(ms) * 1_000_000);
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Switch whose level is a function of [`MockClock`] time.
///
/// Useful for reproducing contact bounce: each `(ms, level)` entry takes
/// effect once the clock reaches `ms`.
#[derive(Clone, Debug)]
pub struct ScriptedSwitch {
    clock: MockClock,
    initial: bool,
    timeline: Vec<(u64, bool)>,
    reads: Arc<AtomicU64>,
}

impl ScriptedSwitch {
    /// Creates a switch at `initial` that follows `timeline`.
    pub fn new(clock: MockClock, initial: bool, timeline: &[(u64, bool)]) -> Self {
        let mut timeline = timeline.to_vec();
        timeline.sort_by_key(|&(at, _)| at);
        Self {
            clock,
            initial,
            timeline,
            reads: Arc::default(),
        }
    }

    /// A switch that never changes level.
    pub fn steady(level: bool) -> Self {
        Self::new(MockClock::new(), level, &[])
    }

    /// Level at the clock's current time.
    pub fn level(&self) -> bool {
        let now = self.clock.now_ms();
        self.timeline
            .iter()
            .take_while(|&&(at, _)| at <= now)
            .last()
            .map_or(self.initial, |&(_, level)| level)
    }

    /// Number of times the pin has been read.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ErrorType for ScriptedSwitch {
    type Error = Infallible;
}

impl InputPin for ScriptedSwitch {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

// ============================================================================
// Steps
// ============================================================================

/// Step source that cycles through a fixed sequence.
///
/// ```rust
/// use shift_bug::hal::ScriptedSteps;
/// use shift_bug::traits::StepSource;
/// use shift_bug::walk::Step;
///
/// let mut steps = ScriptedSteps::new(&[Step::Forward, Step::Back]);
/// assert_eq!(steps.next_step(), Step::Forward);
/// assert_eq!(steps.next_step(), Step::Back);
/// assert_eq!(steps.next_step(), Step::Forward);
/// ```
#[derive(Clone, Debug)]
pub struct ScriptedSteps {
    steps: Vec<Step>,
    next: usize,
}

impl ScriptedSteps {
    /// Creates a source repeating `steps`. An empty script always steps forward.
    pub fn new(steps: &[Step]) -> Self {
        Self {
            steps: steps.to_vec(),
            next: 0,
        }
    }

    /// A source that always takes the same step.
    pub fn always(step: Step) -> Self {
        Self::new(&[step])
    }
}

impl StepSource for ScriptedSteps {
    fn next_step(&mut self) -> Step {
        if self.steps.is_empty() {
            return Step::Forward;
        }
        let step = self.steps[self.next % self.steps.len()];
        self.next = self.next.wrapping_add(1);
        step
    }
}

// ============================================================================
// Engine control
// ============================================================================

/// A command received by [`MockWalkControl`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCall {
    /// `start()`
    Start,
    /// `stop()`
    Stop,
    /// `set_interval(..)`
    SetInterval(Duration),
    /// `set_wrap(..)`
    SetWrap(bool),
}

/// Walk controller that only records what it is told.
///
/// `set_interval` calls that do not change the interval are not recorded,
/// so tests can assert on actual changes.
#[derive(Debug)]
pub struct MockWalkControl {
    running: AtomicBool,
    wrap: AtomicBool,
    interval_ns: AtomicU64,
    calls: Mutex<Vec<ControlCall>>,
}

impl MockWalkControl {
    /// Creates a stopped controller with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            running: AtomicBool::new(false),
            wrap: AtomicBool::new(false),
            interval_ns: AtomicU64::new(u64::try_from(interval.as_nanos()).unwrap_or(u64::MAX)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every recorded command, in order.
    pub fn calls(&self) -> Vec<ControlCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Drains the recorded commands.
    pub fn take_calls(&self) -> Vec<ControlCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// Number of wrap toggles received.
    pub fn wrap_toggles(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, ControlCall::SetWrap(_)))
            .count()
    }

    fn record(&self, call: ControlCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for MockWalkControl {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl WalkControl for MockWalkControl {
    type Error = Infallible;

    fn start(&self) -> Result<(), Infallible> {
        self.record(ControlCall::Start);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), Infallible> {
        self.record(ControlCall::Stop);
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_interval(&self, interval: Duration) -> Result<(), Infallible> {
        let ns = u64::try_from(interval.as_nanos()).unwrap_or(u64::MAX);
        if self.interval_ns.swap(ns, Ordering::SeqCst) != ns {
            self.record(ControlCall::SetInterval(interval));
        }
        Ok(())
    }

    fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_ns.load(Ordering::SeqCst))
    }

    fn set_wrap(&self, wrap: bool) {
        self.record(ControlCall::SetWrap(wrap));
        self.wrap.store(wrap, Ordering::SeqCst);
    }

    fn wrap_enabled(&self) -> bool {
        self.wrap.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_delay_advances_shared_clock() {
        let clock = MockClock::new();
        let mut delay = MockDelay::new(clock.clone());
        delay.delay_ms(50);
        delay.delay_us(1_500);
        assert_eq!(clock.now_ns(), 51_500_000);
        assert_eq!(delay.total(), Duration::from_micros(51_500));
        assert_eq!(delay.calls().len(), 2);
    }

    #[test]
    fn scripted_switch_follows_timeline() {
        let clock = MockClock::new();
        let mut switch = ScriptedSwitch::new(clock.clone(), false, &[(20, false), (10, true)]);
        assert!(!switch.is_high().unwrap());
        clock.set_ms(10);
        assert!(switch.is_high().unwrap());
        clock.set_ms(25);
        assert!(switch.is_low().unwrap());
        assert_eq!(switch.reads(), 3);
    }

    #[test]
    fn steady_switch() {
        let mut switch = ScriptedSwitch::steady(true);
        assert!(switch.is_high().unwrap());
    }

    #[test]
    fn scripted_steps_cycle() {
        let mut steps = ScriptedSteps::new(&[Step::Back, Step::Back, Step::Forward]);
        let taken: Vec<_> = (0..6).map(|_| steps.next_step()).collect();
        assert_eq!(
            taken,
            vec![Step::Back, Step::Back, Step::Forward, Step::Back, Step::Back, Step::Forward]
        );
        assert_eq!(ScriptedSteps::new(&[]).next_step(), Step::Forward);
    }

    #[test]
    fn mock_control_records_changes_only() {
        let control = MockWalkControl::new(Duration::from_millis(100));
        control.set_interval(Duration::from_millis(100)).unwrap();
        control.set_interval(Duration::from_millis(50)).unwrap();
        control.start().unwrap();
        assert!(control.toggle_wrap());
        assert_eq!(
            control.take_calls(),
            vec![
                ControlCall::SetInterval(Duration::from_millis(50)),
                ControlCall::Start,
                ControlCall::SetWrap(true),
            ]
        );
        assert!(control.calls().is_empty());
        assert!(control.is_running());
    }

    #[test]
    fn mock_control_saturates_huge_intervals() {
        let control = MockWalkControl::new(Duration::MAX);
        assert_eq!(control.interval(), Duration::from_nanos(u64::MAX));

        // 2^64 ns would wrap to zero if truncated.
        let huge = Duration::from_nanos(u64::MAX) + Duration::from_nanos(1);
        control.set_interval(Duration::from_millis(100)).unwrap();
        control.set_interval(huge).unwrap();
        assert_eq!(control.interval(), Duration::from_nanos(u64::MAX));
        assert_ne!(control.interval(), Duration::ZERO);
    }
}
