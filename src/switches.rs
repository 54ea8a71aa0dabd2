//! The three control switches and a change monitor for them.
//!
//! | Role | Trigger | Effect |
//! |------|---------|--------|
//! | [`Run`](SwitchRole::Run) | level | high = walk running |
//! | [`WrapToggle`](SwitchRole::WrapToggle) | edge | any change flips wrap mode |
//! | [`Speed`](SwitchRole::Speed) | level | high = faster steps |
//!
//! All inputs are expected to use pull-down resistors, so an open switch
//! reads low.

use embedded_hal::digital::InputPin;
use heapless::Vec as HVec;

/// Role of a control switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SwitchRole {
    /// Run/stop switch.
    Run,
    /// Wrap-mode toggle switch.
    WrapToggle,
    /// Speed-up switch.
    Speed,
}

impl SwitchRole {
    /// All roles in sampling order.
    pub const ALL: [SwitchRole; 3] = [SwitchRole::Run, SwitchRole::WrapToggle, SwitchRole::Speed];

    /// Short label used in logs.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SwitchRole::Run => "run",
            SwitchRole::WrapToggle => "wrap",
            SwitchRole::Speed => "speed",
        }
    }
}

/// One sample of all three switch levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwitchLevels {
    /// Run switch level.
    pub run: bool,
    /// Wrap-toggle switch level.
    pub wrap_toggle: bool,
    /// Speed switch level.
    pub speed: bool,
}

impl SwitchLevels {
    /// Level of one role.
    pub fn get(&self, role: SwitchRole) -> bool {
        match role {
            SwitchRole::Run => self.run,
            SwitchRole::WrapToggle => self.wrap_toggle,
            SwitchRole::Speed => self.speed,
        }
    }
}

/// The three switch inputs.
#[derive(Debug)]
pub struct Switches<I> {
    /// Run/stop input.
    pub run: I,
    /// Wrap-toggle input.
    pub wrap_toggle: I,
    /// Speed input.
    pub speed: I,
}

impl<I: InputPin> Switches<I> {
    /// Bundles the inputs.
    pub fn new(run: I, wrap_toggle: I, speed: I) -> Self {
        Self {
            run,
            wrap_toggle,
            speed,
        }
    }

    /// Reads all three inputs.
    pub fn sample(&mut self) -> Result<SwitchLevels, I::Error> {
        Ok(SwitchLevels {
            run: self.run.is_high()?,
            wrap_toggle: self.wrap_toggle.is_high()?,
            speed: self.speed.is_high()?,
        })
    }
}

/// A switch that changed level between two samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwitchChange {
    /// Which switch changed.
    pub role: SwitchRole,
    /// Its new level.
    pub level: bool,
}

/// Reports every level change on the three switches.
///
/// Handy for checking the wiring: flip each switch and watch the changes.
///
/// ```rust
/// use shift_bug::hal::SimSwitch;
/// use shift_bug::switches::{SwitchChange, SwitchMonitor, SwitchRole, Switches};
///
/// let (run, wrap, speed) = (SimSwitch::new(false), SimSwitch::new(false), SimSwitch::new(false));
/// let mut monitor =
///     SwitchMonitor::new(Switches::new(run.clone(), wrap.clone(), speed.clone())).unwrap();
///
/// speed.set(true);
/// let changes = monitor.poll().unwrap();
/// assert_eq!(changes.as_slice(), &[SwitchChange { role: SwitchRole::Speed, level: true }]);
/// assert!(monitor.poll().unwrap().is_empty());
/// ```
#[derive(Debug)]
pub struct SwitchMonitor<I> {
    switches: Switches<I>,
    last: SwitchLevels,
}

impl<I: InputPin> SwitchMonitor<I> {
    /// Takes an initial sample of every switch.
    pub fn new(mut switches: Switches<I>) -> Result<Self, I::Error> {
        let last = switches.sample()?;
        Ok(Self { switches, last })
    }

    /// Levels seen at the last poll.
    pub fn levels(&self) -> SwitchLevels {
        self.last
    }

    /// Samples every switch and returns those whose level changed.
    pub fn poll(&mut self) -> Result<HVec<SwitchChange, 3>, I::Error> {
        let now = self.switches.sample()?;
        let mut changes = HVec::new();
        for role in SwitchRole::ALL {
            let level = now.get(role);
            if level != self.last.get(role) {
                // Capacity matches the number of roles.
                let _ = changes.push(SwitchChange { role, level });
            }
        }
        self.last = now;
        Ok(changes)
    }

    /// Gives the inputs back.
    pub fn into_switches(self) -> Switches<I> {
        self.switches
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::hal::SimSwitch;

    fn bank() -> (SimSwitch, SimSwitch, SimSwitch, Switches<SimSwitch>) {
        let run = SimSwitch::new(false);
        let wrap = SimSwitch::new(false);
        let speed = SimSwitch::new(false);
        let switches = Switches::new(run.clone(), wrap.clone(), speed.clone());
        (run, wrap, speed, switches)
    }

    #[test]
    fn sample_reads_each_input() {
        let (run, _wrap, speed, mut switches) = bank();
        run.set(true);
        speed.set(true);
        assert_eq!(
            switches.sample().unwrap(),
            SwitchLevels {
                run: true,
                wrap_toggle: false,
                speed: true
            }
        );
    }

    #[test]
    fn monitor_reports_only_changes() {
        let (run, wrap, speed, switches) = bank();
        let mut monitor = SwitchMonitor::new(switches).unwrap();
        assert!(monitor.poll().unwrap().is_empty());

        run.set(true);
        wrap.set(true);
        let changes = monitor.poll().unwrap();
        assert_eq!(
            changes.as_slice(),
            &[
                SwitchChange {
                    role: SwitchRole::Run,
                    level: true
                },
                SwitchChange {
                    role: SwitchRole::WrapToggle,
                    level: true
                },
            ]
        );

        run.set(false);
        wrap.set(false);
        speed.set(true);
        assert_eq!(monitor.poll().unwrap().len(), 3);
        assert!(monitor.levels().speed);
    }

    #[test]
    fn monitor_starts_from_current_levels() {
        let (run, _wrap, _speed, switches) = bank();
        run.set(true);
        let mut monitor = SwitchMonitor::new(switches).unwrap();
        assert!(monitor.poll().unwrap().is_empty());
    }

    #[test]
    fn role_labels() {
        let labels: Vec<_> = SwitchRole::ALL.iter().map(SwitchRole::as_str).collect();
        assert_eq!(labels, vec!["run", "wrap", "speed"]);
    }
}
