//! Switch poller that steers the walk.
//!
//! [`InputPoller`] samples the three switches at a fixed period and turns
//! their levels into [`WalkControl`] commands:
//!
//! 1. **Run** high and not active starts the walk; low and active stops it.
//!    A walk that ended on its own while Run stays high is started again,
//!    which surfaces a link fault as [`PollError::Control`].
//! 2. **WrapToggle** at a new level flips wrap mode, then the poller holds
//!    for the debounce delay so contact bounce cannot flip it again.
//! 3. **Speed** selects the fast or base interval, re-applied every cycle.
//!
//! The debounce hold blocks the whole cycle: Run and Speed are not
//! re-sampled until it ends, and Speed is applied from the sample taken at
//! the start of the cycle.
//!
//! # Usage
//!
//! ```rust
//! use std::time::Duration;
//! use shift_bug::config::PollConfig;
//! use shift_bug::hal::{ControlCall, MockClock, MockDelay, MockWalkControl, SimSwitch};
//! use shift_bug::poller::InputPoller;
//! use shift_bug::switches::Switches;
//!
//! let run = SimSwitch::new(false);
//! let switches = Switches::new(run.clone(), SimSwitch::new(false), SimSwitch::new(false));
//! let control = MockWalkControl::new(Duration::from_millis(100));
//! let delay = MockDelay::new(MockClock::new());
//!
//! let mut poller = InputPoller::new(
//!     switches, &control, delay, &PollConfig::default(), Duration::from_millis(100),
//! ).unwrap();
//!
//! run.set(true);
//! poller.poll_once().unwrap();
//! assert_eq!(control.calls(), vec![ControlCall::Start]);
//! ```

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::{debug, info, warn};

use crate::config::{validate_interval, ConfigError, PollConfig};
use crate::switches::{SwitchLevels, Switches};
use crate::traits::WalkControl;

/// Errors from the poll loop.
#[derive(Debug)]
pub enum PollError<I, C> {
    /// A switch input could not be read.
    Input(I),
    /// The walk rejected a command.
    Control(C),
    /// The poll configuration is invalid.
    Config(ConfigError),
}

impl<I: fmt::Debug, C: fmt::Display> fmt::Display for PollError<I, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::Input(e) => write!(f, "failed to read switch: {e:?}"),
            PollError::Control(e) => write!(f, "walk command failed: {e}"),
            PollError::Config(e) => write!(f, "invalid poll configuration: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl<I: fmt::Debug, C: fmt::Debug + fmt::Display> std::error::Error for PollError<I, C> {}

/// What a single poll cycle did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Levels sampled at the start of the cycle.
    pub levels: SwitchLevels,
    /// `Some(true)` if the walk was started, `Some(false)` if stopped.
    pub run_change: Option<bool>,
    /// New wrap setting if the wrap switch flipped it.
    pub wrap_toggled: Option<bool>,
    /// Interval in force after the cycle.
    pub interval: Duration,
}

/// Waits `duration` on any [`DelayNs`], at microsecond resolution.
pub fn pause<D: DelayNs>(delay: &mut D, duration: Duration) {
    let us = u32::try_from(duration.as_micros()).unwrap_or(u32::MAX);
    if us > 0 {
        delay.delay_us(us);
    }
}

/// Polls the control switches and drives a [`WalkControl`].
///
/// Generic over the switch pin type `I`, the controlled walk `C` and the
/// delay provider `D`.
pub struct InputPoller<I, C, D> {
    switches: Switches<I>,
    control: C,
    delay: D,
    config: PollConfig,
    base_interval: Duration,
    last_wrap_level: bool,
    active: bool,
}

impl<I, C, D> InputPoller<I, C, D>
where
    I: InputPin,
    C: WalkControl,
    D: DelayNs,
{
    /// Creates a poller, reading the wrap switch's starting level.
    ///
    /// The walk is considered inactive until the first cycle sees Run high.
    ///
    /// # Errors
    ///
    /// Rejects an invalid poll config or base interval; propagates a pin
    /// read error.
    pub fn new(
        mut switches: Switches<I>,
        control: C,
        delay: D,
        config: &PollConfig,
        base_interval: Duration,
    ) -> Result<Self, PollError<I::Error, C::Error>> {
        config.validate().map_err(PollError::Config)?;
        validate_interval(base_interval).map_err(PollError::Config)?;
        validate_interval(config.fast_interval(base_interval)).map_err(PollError::Config)?;

        let last_wrap_level = switches.wrap_toggle.is_high().map_err(PollError::Input)?;
        Ok(Self {
            switches,
            control,
            delay,
            config: config.clone(),
            base_interval,
            last_wrap_level,
            active: false,
        })
    }

    /// Runs one poll cycle, including any debounce hold.
    pub fn poll_once(&mut self) -> Result<PollReport, PollError<I::Error, C::Error>> {
        let levels = self.switches.sample().map_err(PollError::Input)?;
        let mut report = PollReport {
            levels,
            ..PollReport::default()
        };

        if levels.run && !self.active {
            self.control.start().map_err(PollError::Control)?;
            self.active = true;
            report.run_change = Some(true);
            info!("run switch on: walk started");
        } else if levels.run && !self.control.is_running() {
            // The walk ended on its own; restarting reaps and reports its fault.
            warn!("walk stopped while the run switch is on, restarting");
            self.control.start().map_err(PollError::Control)?;
            report.run_change = Some(true);
        } else if !levels.run && self.active {
            self.control.stop().map_err(PollError::Control)?;
            self.active = false;
            report.run_change = Some(false);
            info!("run switch off: walk stopped");
        }

        if levels.wrap_toggle != self.last_wrap_level {
            let wrap = self.control.toggle_wrap();
            self.last_wrap_level = levels.wrap_toggle;
            report.wrap_toggled = Some(wrap);
            info!("wrap switch flipped: wrap {}", if wrap { "on" } else { "off" });
            pause(&mut self.delay, self.config.debounce);
        }

        let interval = self.interval_for(levels.speed);
        if interval != self.control.interval() {
            info!("speed switch {}: interval {:?}", if levels.speed { "on" } else { "off" }, interval);
        }
        self.control
            .set_interval(interval)
            .map_err(PollError::Control)?;
        report.interval = interval;

        Ok(report)
    }

    /// Polls until `shutdown` is raised, waiting one period between cycles.
    ///
    /// Returns on the first error; the caller is expected to shut the walk
    /// down in either case.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<(), PollError<I::Error, C::Error>> {
        debug!("polling switches every {:?}", self.config.period);
        while !shutdown.load(Ordering::SeqCst) {
            self.poll_once()?;
            pause(&mut self.delay, self.config.period);
        }
        debug!("switch polling stopped");
        Ok(())
    }

    /// Interval for the given speed switch level.
    pub fn interval_for(&self, fast: bool) -> Duration {
        if fast {
            self.config.fast_interval(self.base_interval)
        } else {
            self.base_interval
        }
    }

    /// Whether the poller believes the walk is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Last level seen on the wrap switch.
    pub fn last_wrap_level(&self) -> bool {
        self.last_wrap_level
    }

    /// The controlled walk.
    pub fn control(&self) -> &C {
        &self.control
    }

    /// Gives back the switches, walk and delay.
    pub fn into_parts(self) -> (Switches<I>, C, D) {
        (self.switches, self.control, self.delay)
    }
}

impl<I, C: fmt::Debug, D> fmt::Debug for InputPoller<I, C, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPoller")
            .field("control", &self.control)
            .field("config", &self.config)
            .field("base_interval", &self.base_interval)
            .field("last_wrap_level", &self.last_wrap_level)
            .field("active", &self.active)
            .finish()
    }
}
