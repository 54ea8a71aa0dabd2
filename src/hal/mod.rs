//! Hardware Abstraction Layer implementations.
//!
//! The core modules only depend on `embedded-hal` traits; this module
//! provides concrete pins and delays for each platform.
//!
//! # Available Implementations
//!
//! - `sim`: simulated 74HC595 and switches for the desktop simulator
//! - `mock`: test doubles driven by a manual clock
//! - `esp32`: ESP32-C3 GPIO wiring (requires `esp32` feature)

#[cfg(feature = "std")]
pub mod mock;
#[cfg(feature = "std")]
pub mod sim;

#[cfg(feature = "esp32")]
pub mod esp32;

#[cfg(feature = "std")]
pub use mock::*;
#[cfg(feature = "std")]
pub use sim::*;

/// [`DelayNs`](embedded_hal::delay::DelayNs) backed by `std::thread::sleep`.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl embedded_hal::delay::DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
