//! # shift-bug
//!
//! A single lit LED that wanders at random along an 8-output bar driven by a
//! 74HC595 shift register, steered by three switches.
//!
//! ## Features
//!
//! - **Bit-banged link**: LSB-first shifting with a single latch pulse per frame
//! - **Random walk**: wrapping or clamped edges, live interval and wrap changes
//! - **Switch control**: run/stop, debounced wrap toggle, speed-up
//! - **Portable**: everything below the engine is `no_std` over `embedded-hal`
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `shifter` - Three-wire 74HC595 driver
//! - `walk` - Position and step arithmetic
//! - `engine` - Threaded animation with start/stop and live settings
//! - `poller` - Switch sampling that drives the engine
//! - `hal` - Concrete implementations (simulated chip, mocks, esp32)
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use shift_bug::{hal::Hc595, SerialLink, WalkConfig, WalkEngine};
//!
//! let chip = Hc595::new();
//! let [data, clock, latch] = chip.lines();
//! let link = SerialLink::new(data, clock, latch).unwrap();
//!
//! let config = WalkConfig::default().with_interval(Duration::from_millis(20));
//! let engine = WalkEngine::new(link, &config).unwrap();
//! assert_eq!(chip.output(), 0b0000_1000);
//!
//! engine.start().unwrap();
//! std::thread::sleep(Duration::from_millis(100));
//! engine.stop().unwrap();
//! assert_eq!(chip.output(), 0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

/// Shared configuration for the simulator and the ESP32 firmware.
pub mod config;
/// Wiring self-test patterns.
pub mod demo;
/// Threaded random-walk animation.
#[cfg(feature = "std")]
pub mod engine;
/// Hardware abstraction layer: simulated, mock and ESP32 pins.
pub mod hal;
/// Switch poller that turns switch levels into walk commands.
pub mod poller;
/// 74HC595 serial link.
pub mod shifter;
/// Switch inputs and change monitoring.
pub mod switches;
/// Trait seams for control and step generation.
pub mod traits;
/// Position and step arithmetic.
pub mod walk;

// Re-exports for convenience
pub use config::{Config, ConfigError, DeviceConfig, PollConfig, WalkConfig};
#[cfg(feature = "std")]
pub use engine::{EngineError, WalkEngine};
pub use poller::{InputPoller, PollError, PollReport};
pub use shifter::SerialLink;
pub use switches::{SwitchChange, SwitchLevels, SwitchMonitor, SwitchRole, Switches};
pub use traits::{RandomSteps, StepSource, WalkControl};
pub use walk::{Position, Step};
