//! The random-walk animation engine.
//!
//! [`WalkEngine`] owns a [`SerialLink`] and animates a single lit output on
//! its own thread. Each step picks a direction, moves the position (wrapping
//! or clamping at the ends), renders it, and sleeps for the current interval.
//!
//! # Threading
//!
//! | State | Storage | Writers |
//! |-------|---------|---------|
//! | position | `AtomicU8` | animation thread (and construction) |
//! | interval, wrap | atomics | any thread via setters |
//! | running | `Mutex<bool>` + `Condvar` | `start`/`stop`, and the thread on exit |
//! | task handle | `Mutex<Option<JoinHandle>>` | `start`/`stop` |
//!
//! `start` and `stop` serialize on the task-handle lock, so concurrent calls
//! never spawn a second thread. `stop` wakes the sleeping thread through the
//! condvar and joins it before returning, so the link is idle afterwards.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use shift_bug::{SerialLink, WalkConfig, WalkEngine};
//! use shift_bug::hal::Hc595;
//!
//! let chip = Hc595::new();
//! let [data, clock, latch] = chip.lines();
//! let link = SerialLink::new(data, clock, latch).unwrap();
//!
//! let engine = WalkEngine::new(link, &WalkConfig::default()).unwrap();
//! assert_eq!(chip.output(), 0b0000_1000); // lit before start()
//!
//! engine.start().unwrap();
//! std::thread::sleep(Duration::from_millis(250));
//! engine.stop().unwrap();
//! assert_eq!(chip.output(), 0);
//! ```

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{debug, error, trace};

use crate::config::{validate_interval, ConfigError, WalkConfig};
use crate::shifter::SerialLink;
use crate::traits::{RandomSteps, StepSource, WalkControl};
use crate::walk::{Position, Step};

/// Name given to the animation thread.
pub const ANIMATION_THREAD: &str = "walk-animation";

/// Errors from the walk engine.
#[derive(Debug)]
pub enum EngineError<E> {
    /// The serial link reported a pin error.
    Link(E),
    /// A configuration value was rejected.
    Config(ConfigError),
    /// The animation thread could not be spawned.
    Spawn(io::Error),
    /// The animation thread panicked.
    TaskPanicked,
}

impl<E: fmt::Debug> fmt::Display for EngineError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Link(e) => write!(f, "shift register link failed: {e:?}"),
            EngineError::Config(e) => write!(f, "invalid walk configuration: {e}"),
            EngineError::Spawn(e) => write!(f, "failed to spawn animation thread: {e}"),
            EngineError::TaskPanicked => f.write_str("animation thread panicked"),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for EngineError<E> {}

impl<E> From<ConfigError> for EngineError<E> {
    fn from(e: ConfigError) -> Self {
        EngineError::Config(e)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn to_nanos(interval: Duration) -> u64 {
    u64::try_from(interval.as_nanos()).unwrap_or(u64::MAX)
}

/// State shared between the engine handle and its animation thread.
struct Shared<P: OutputPin, S> {
    link: Mutex<SerialLink<P>>,
    steps: Mutex<S>,
    position: AtomicU8,
    interval_ns: AtomicU64,
    wrap: AtomicBool,
    running: Mutex<bool>,
    wake: Condvar,
}

impl<P: OutputPin, S: StepSource> Shared<P, S> {
    fn render(&self, value: u8) -> Result<(), P::Error> {
        lock(&self.link).transmit(value)
    }

    fn is_running(&self) -> bool {
        *lock(&self.running)
    }

    fn set_running(&self, running: bool) {
        *lock(&self.running) = running;
        self.wake.notify_all();
    }

    fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_ns.load(Ordering::Relaxed))
    }

    fn step(&self) -> Position {
        let step: Step = lock(&self.steps).next_step();
        let wrap = self.wrap.load(Ordering::Relaxed);
        let current = Position::new(self.position.load(Ordering::Relaxed));
        let next = current.advance(step, wrap);
        self.position.store(next.index(), Ordering::Relaxed);
        next
    }

    /// Sleeps for `interval` unless stopped first. Returns whether still running.
    fn pause(&self, interval: Duration) -> bool {
        let running = lock(&self.running);
        let (running, _) = self
            .wake
            .wait_timeout_while(running, interval, |running| *running)
            .unwrap_or_else(PoisonError::into_inner);
        *running
    }

    fn animate(&self) -> Result<(), P::Error> {
        while self.is_running() {
            let position = self.step();
            trace!("step -> {}", position.index());
            self.render(position.mask())?;
            if !self.pause(self.interval()) {
                break;
            }
        }
        Ok(())
    }
}

/// Random-walk animation over an 8-output shift register.
///
/// Generic over the link's pin type `P` and the step source `S`
/// (uniform random by default).
pub struct WalkEngine<P: OutputPin, S = RandomSteps> {
    shared: Arc<Shared<P, S>>,
    task: Mutex<Option<JoinHandle<Result<(), P::Error>>>>,
}

impl<P> WalkEngine<P, RandomSteps>
where
    P: OutputPin + Send + 'static,
    P::Error: Send + 'static,
{
    /// Creates an engine with entropy-seeded random steps.
    ///
    /// Renders the starting position before returning.
    ///
    /// # Errors
    ///
    /// Rejects a zero or oversized interval; propagates a pin error from the
    /// first render.
    pub fn new(link: SerialLink<P>, config: &WalkConfig) -> Result<Self, EngineError<P::Error>> {
        Self::with_steps(link, config, RandomSteps::from_entropy())
    }
}

impl<P, S> WalkEngine<P, S>
where
    P: OutputPin + Send + 'static,
    P::Error: Send + 'static,
    S: StepSource + Send + 'static,
{
    /// Creates an engine drawing directions from `steps`.
    ///
    /// The starting position is clamped into `0..=7` and rendered before
    /// returning, so the LED is lit even before [`start`](Self::start).
    pub fn with_steps(
        mut link: SerialLink<P>,
        config: &WalkConfig,
        steps: S,
    ) -> Result<Self, EngineError<P::Error>> {
        config.validate()?;
        let position = config.position();
        link.transmit(position.mask()).map_err(EngineError::Link)?;

        debug!(
            "walk engine ready: position={} interval={:?} wrap={}",
            position.index(),
            config.interval,
            config.wrap
        );

        Ok(Self {
            shared: Arc::new(Shared {
                link: Mutex::new(link),
                steps: Mutex::new(steps),
                position: AtomicU8::new(position.index()),
                interval_ns: AtomicU64::new(to_nanos(config.interval)),
                wrap: AtomicBool::new(config.wrap),
                running: Mutex::new(false),
                wake: Condvar::new(),
            }),
            task: Mutex::new(None),
        })
    }

    /// Launches the animation thread. Does nothing if it is already running.
    ///
    /// # Errors
    ///
    /// If a previous animation thread ended on its own because of a link
    /// fault, that fault is returned here and nothing is started.
    pub fn start(&self) -> Result<(), EngineError<P::Error>> {
        let mut task = lock(&self.task);
        if self.shared.is_running() {
            return Ok(());
        }
        if let Some(finished) = task.take() {
            Self::join(finished)?;
        }

        self.shared.set_running(true);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(ANIMATION_THREAD.into())
            .spawn(move || {
                let outcome = shared.animate();
                if let Err(e) = &outcome {
                    error!("animation stopped by link fault: {e:?}");
                }
                shared.set_running(false);
                // Always leave the bar dark, even after a fault.
                let cleared = shared.render(0);
                debug!("animation thread exited");
                outcome.and(cleared)
            });

        match spawned {
            Ok(handle) => {
                *task = Some(handle);
                debug!("walk started");
                Ok(())
            }
            Err(e) => {
                self.shared.set_running(false);
                Err(EngineError::Spawn(e))
            }
        }
    }

    /// Stops the animation and turns every output off.
    ///
    /// Blocks until the animation thread has exited. When nothing is running
    /// the outputs are still cleared, exactly once.
    ///
    /// # Errors
    ///
    /// Returns a link fault raised by the animation thread or by the final
    /// clear. The outputs are cleared in either case when possible.
    pub fn stop(&self) -> Result<(), EngineError<P::Error>> {
        let mut task = lock(&self.task);
        self.shared.set_running(false);

        let joined = match task.take() {
            Some(handle) => {
                debug!("walk stopping");
                Self::join(handle)
            }
            None => Ok(()),
        };
        let cleared = self.shared.render(0).map_err(EngineError::Link);
        joined.and(cleared)
    }

    /// Stops the animation, clears the outputs and drives every line low.
    ///
    /// Call before releasing the hardware. Safe to call more than once.
    pub fn shutdown(&self) -> Result<(), EngineError<P::Error>> {
        let stopped = self.stop();
        let powered_down = lock(&self.shared.link)
            .power_down()
            .map_err(EngineError::Link);
        debug!("walk engine shut down");
        stopped.and(powered_down)
    }

    fn join(handle: JoinHandle<Result<(), P::Error>>) -> Result<(), EngineError<P::Error>> {
        match handle.join() {
            Ok(outcome) => outcome.map_err(EngineError::Link),
            Err(_) => Err(EngineError::TaskPanicked),
        }
    }
}

impl<P: OutputPin, S> WalkEngine<P, S> {
    /// Current position of the lit output.
    pub fn position(&self) -> Position {
        Position::new(self.shared.position.load(Ordering::Relaxed))
    }

    /// Current time between steps.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.shared.interval_ns.load(Ordering::Relaxed))
    }

    /// Sets the time between steps.
    ///
    /// Takes effect from the next sleep of the animation thread.
    pub fn set_interval(&self, interval: Duration) -> Result<(), ConfigError> {
        validate_interval(interval)?;
        self.shared
            .interval_ns
            .store(to_nanos(interval), Ordering::Relaxed);
        Ok(())
    }

    /// Whether the walk wraps around at the ends.
    pub fn wrap_enabled(&self) -> bool {
        self.shared.wrap.load(Ordering::Relaxed)
    }

    /// Enables or disables wrap mode.
    pub fn set_wrap(&self, wrap: bool) {
        self.shared.wrap.store(wrap, Ordering::Relaxed);
    }

    /// Flips wrap mode and returns the new setting.
    pub fn toggle_wrap(&self) -> bool {
        !self.shared.wrap.fetch_xor(true, Ordering::Relaxed)
    }

    /// Whether the animation thread is live.
    pub fn is_running(&self) -> bool {
        *lock(&self.shared.running)
    }
}

impl<P, S> WalkControl for WalkEngine<P, S>
where
    P: OutputPin + Send + 'static,
    P::Error: Send + 'static,
    S: StepSource + Send + 'static,
{
    type Error = EngineError<P::Error>;

    fn start(&self) -> Result<(), Self::Error> {
        WalkEngine::start(self)
    }

    fn stop(&self) -> Result<(), Self::Error> {
        WalkEngine::stop(self)
    }

    fn is_running(&self) -> bool {
        WalkEngine::is_running(self)
    }

    fn set_interval(&self, interval: Duration) -> Result<(), Self::Error> {
        WalkEngine::set_interval(self, interval).map_err(EngineError::Config)
    }

    fn interval(&self) -> Duration {
        WalkEngine::interval(self)
    }

    fn set_wrap(&self, wrap: bool) {
        WalkEngine::set_wrap(self, wrap)
    }

    fn wrap_enabled(&self) -> bool {
        WalkEngine::wrap_enabled(self)
    }

    fn toggle_wrap(&self) -> bool {
        WalkEngine::toggle_wrap(self)
    }
}

impl<P: OutputPin, S> fmt::Debug for WalkEngine<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkEngine")
            .field("position", &self.position().index())
            .field("interval", &self.interval())
            .field("wrap", &self.wrap_enabled())
            .field("running", &self.is_running())
            .finish()
    }
}

impl<P: OutputPin, S> Drop for WalkEngine<P, S> {
    fn drop(&mut self) {
        *lock(&self.shared.running) = false;
        self.shared.wake.notify_all();
        if let Some(handle) = lock(&self.task).take() {
            let _ = handle.join();
        }
        let _ = lock(&self.shared.link).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{Hc595, ScriptedSteps, SimLine};

    fn engine_with(
        config: &WalkConfig,
        steps: ScriptedSteps,
    ) -> (Hc595, WalkEngine<SimLine, ScriptedSteps>) {
        let chip = Hc595::new();
        let [data, clock, latch] = chip.lines();
        let link = SerialLink::new(data, clock, latch).unwrap();
        let engine = WalkEngine::with_steps(link, config, steps).unwrap();
        (chip, engine)
    }

    fn fast() -> WalkConfig {
        WalkConfig::default().with_interval(Duration::from_millis(5))
    }

    #[test]
    fn renders_start_position_on_construction() {
        let (chip, engine) = engine_with(&WalkConfig::default(), ScriptedSteps::always(Step::Forward));
        assert_eq!(chip.output(), 0b0000_1000);
        assert_eq!(chip.latch_count(), 1);
        assert_eq!(engine.position(), Position::new(3));
        assert!(!engine.is_running());
    }

    #[test]
    fn start_position_clamped() {
        let config = WalkConfig {
            start_position: 200,
            ..WalkConfig::default()
        };
        let (chip, engine) = engine_with(&config, ScriptedSteps::always(Step::Forward));
        assert_eq!(engine.position(), Position::new(7));
        assert_eq!(chip.output(), 0b1000_0000);
    }

    #[test]
    fn zero_interval_rejected_at_construction() {
        let chip = Hc595::new();
        let [data, clock, latch] = chip.lines();
        let link = SerialLink::new(data, clock, latch).unwrap();
        let config = WalkConfig::default().with_interval(Duration::ZERO);
        let result = WalkEngine::with_steps(link, &config, ScriptedSteps::always(Step::Back));
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::ZeroInterval))
        ));
        assert_eq!(chip.latch_count(), 0);
    }

    #[test]
    fn stop_when_idle_clears_once() {
        let (chip, engine) = engine_with(&WalkConfig::default(), ScriptedSteps::always(Step::Forward));
        engine.stop().unwrap();
        assert_eq!(chip.frames(), vec![0b0000_1000, 0]);
    }

    #[test]
    fn clamped_walk_sticks_at_edge() {
        let (chip, engine) = engine_with(&fast(), ScriptedSteps::always(Step::Forward));
        engine.start().unwrap();
        thread::sleep(Duration::from_millis(100));
        engine.stop().unwrap();

        assert_eq!(engine.position(), Position::new(7));
        let frames = chip.frames();
        assert_eq!(&frames[..5], &[0x08, 0x10, 0x20, 0x40, 0x80]);
        assert_eq!(frames.last(), Some(&0));
    }

    #[test]
    fn wrapped_walk_goes_round() {
        let config = fast().with_start_position(6).with_wrap(true);
        let (chip, engine) = engine_with(&config, ScriptedSteps::always(Step::Forward));
        engine.start().unwrap();
        thread::sleep(Duration::from_millis(100));
        engine.stop().unwrap();
        assert_eq!(&chip.frames()[..4], &[0x40, 0x80, 0x01, 0x02]);
    }

    #[test]
    fn stop_interrupts_long_sleep() {
        let config = WalkConfig::default().with_interval(Duration::from_secs(30));
        let (_chip, engine) = engine_with(&config, ScriptedSteps::always(Step::Back));
        engine.start().unwrap();
        thread::sleep(Duration::from_millis(20));

        let began = std::time::Instant::now();
        engine.stop().unwrap();
        assert!(began.elapsed() < Duration::from_secs(5));
        assert!(!engine.is_running());
    }

    #[test]
    fn toggle_and_set_wrap() {
        let (_chip, engine) = engine_with(&WalkConfig::default(), ScriptedSteps::always(Step::Back));
        assert!(!engine.wrap_enabled());
        assert!(engine.toggle_wrap());
        assert!(engine.wrap_enabled());
        engine.set_wrap(false);
        assert!(!engine.wrap_enabled());
    }

    #[test]
    fn set_interval_validates() {
        let (_chip, engine) = engine_with(&WalkConfig::default(), ScriptedSteps::always(Step::Back));
        assert_eq!(engine.set_interval(Duration::ZERO), Err(ConfigError::ZeroInterval));
        assert_eq!(engine.interval(), Duration::from_millis(100));
        engine.set_interval(Duration::from_millis(33)).unwrap();
        assert_eq!(engine.interval(), Duration::from_millis(33));
    }

    #[test]
    fn link_fault_ends_task_and_is_reported() {
        let (chip, engine) = engine_with(&fast(), ScriptedSteps::always(Step::Back));
        engine.start().unwrap();
        chip.inject_fault();
        thread::sleep(Duration::from_millis(50));
        assert!(!engine.is_running());

        // The fault surfaces on the next start (reaping the dead task).
        assert!(matches!(engine.start(), Err(EngineError::Link(_))));
        chip.clear_fault();
        engine.start().unwrap();
        engine.stop().unwrap();
    }

    #[test]
    fn drop_stops_running_task() {
        let (chip, engine) = engine_with(&fast(), ScriptedSteps::always(Step::Back));
        engine.start().unwrap();
        thread::sleep(Duration::from_millis(20));
        drop(engine);
        assert_eq!(chip.output(), 0);
    }

    #[test]
    fn error_display() {
        let e: EngineError<()> = EngineError::Config(ConfigError::ZeroInterval);
        assert_eq!(
            e.to_string(),
            "invalid walk configuration: step interval must be greater than zero"
        );
        let e: EngineError<()> = EngineError::TaskPanicked;
        assert_eq!(e.to_string(), "animation thread panicked");
    }
}
