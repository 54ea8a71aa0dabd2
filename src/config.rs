//! Shared configuration for the simulator and the ESP32 firmware.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use shift_bug::config::{Config, PollConfig, WalkConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = Config::default()
//!     .with_walk(WalkConfig::default().with_interval(Duration::from_millis(50)).with_wrap(true))
//!     .with_poll(PollConfig::default().with_speed_divisor(4));
//! assert_eq!(config.poll.fast_interval(config.walk.interval), Duration::from_micros(12_500));
//! ```

use core::fmt;
use core::time::Duration;

use heapless::String as HString;

use crate::walk::{Position, MAX_POSITION};

/// Maximum length for short config strings (device names)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Longest accepted step interval or poll period.
///
/// Keeps every duration representable in the engine's nanosecond counter.
pub const MAX_DURATION: Duration = Duration::from_secs(3600);

/// Create a ShortString from a &str, truncating on a character boundary
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    for c in s.chars() {
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

// ============================================================================
// Errors
// ============================================================================

/// Rejected configuration values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The step interval is zero.
    ZeroInterval,
    /// A duration exceeds [`MAX_DURATION`].
    DurationTooLong,
    /// The poll period is zero.
    ZeroPollPeriod,
    /// The speed divisor is zero.
    ZeroSpeedDivisor,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroInterval => f.write_str("step interval must be greater than zero"),
            ConfigError::DurationTooLong => {
                write!(f, "duration exceeds the {}s limit", MAX_DURATION.as_secs())
            }
            ConfigError::ZeroPollPeriod => f.write_str("poll period must be greater than zero"),
            ConfigError::ZeroSpeedDivisor => f.write_str("speed divisor must be at least 1"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Checks a step interval.
pub fn validate_interval(interval: Duration) -> Result<(), ConfigError> {
    if interval.is_zero() {
        Err(ConfigError::ZeroInterval)
    } else if interval > MAX_DURATION {
        Err(ConfigError::DurationTooLong)
    } else {
        Ok(())
    }
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Device identification
    pub device: DeviceConfig,
    /// Random walk parameters
    pub walk: WalkConfig,
    /// Switch polling parameters
    pub poll: PollConfig,
}

impl Config {
    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set walk configuration
    pub fn with_walk(mut self, walk: WalkConfig) -> Self {
        self.walk = walk;
        self
    }

    /// Set poll configuration
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Returns the first invalid setting, if any.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.walk.validate()?;
        self.poll.validate()?;
        // The fast interval must stay a valid step interval too.
        validate_interval(self.poll.fast_interval(self.walk.interval))
    }
}

// ============================================================================
// Walk Config
// ============================================================================

/// Random walk configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WalkConfig {
    /// Time between steps (the base interval the speed switch divides)
    pub interval: Duration,
    /// Starting position, clamped into `0..=7`
    pub start_position: u8,
    /// Whether the walk wraps around at the ends
    pub wrap: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            start_position: 3,
            wrap: false,
        }
    }
}

impl WalkConfig {
    /// Set the step interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the starting position (clamped into `0..=7`)
    pub fn with_start_position(mut self, position: u8) -> Self {
        self.start_position = position.min(MAX_POSITION);
        self
    }

    /// Set wrap mode
    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Starting position as a [`Position`]
    pub fn position(&self) -> Position {
        Position::new(self.start_position)
    }

    /// Checks the step interval
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_interval(self.interval)
    }
}

// ============================================================================
// Poll Config
// ============================================================================

/// Switch polling configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PollConfig {
    /// Time between poll cycles
    pub period: Duration,
    /// Hold after a wrap-toggle edge, suppressing contact bounce
    pub debounce: Duration,
    /// Interval divisor applied while the speed switch is on
    pub speed_divisor: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(50),
            debounce: Duration::from_millis(100),
            speed_divisor: 3,
        }
    }
}

impl PollConfig {
    /// Set the poll period
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Set the debounce hold
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the speed divisor
    pub fn with_speed_divisor(mut self, divisor: u32) -> Self {
        self.speed_divisor = divisor;
        self
    }

    /// Interval used while the speed switch is on
    pub fn fast_interval(&self, base: Duration) -> Duration {
        base / self.speed_divisor.max(1)
    }

    /// Checks period, debounce and divisor
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period.is_zero() {
            return Err(ConfigError::ZeroPollPeriod);
        }
        if self.speed_divisor == 0 {
            return Err(ConfigError::ZeroSpeedDivisor);
        }
        if self.period > MAX_DURATION || self.debounce > MAX_DURATION {
            return Err(ConfigError::DurationTooLong);
        }
        Ok(())
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Human-readable device name, used in log banners
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("shift-bug"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
