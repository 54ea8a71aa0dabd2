//! Bit-banged driver for a 74HC595 serial-in/parallel-out shift register.
//!
//! The register is driven through three output lines:
//!
//! | Line  | 74HC595 pin | Role |
//! |-------|-------------|------|
//! | data  | SER (14)    | Bit to shift in |
//! | clock | SRCLK (11)  | Rising edge shifts `data` into the internal buffer |
//! | latch | RCLK (12)   | Rising edge copies the buffer to the outputs |
//!
//! A frame is sent least-significant bit first, one clock pulse per bit,
//! followed by a single latch pulse. The outputs only change on that final
//! pulse, so the previous frame stays visible while the next one is shifted.
//!
//! # Example
//!
//! ```rust
//! use shift_bug::hal::Hc595;
//! use shift_bug::SerialLink;
//!
//! let chip = Hc595::new();
//! let [data, clock, latch] = chip.lines();
//! let mut link = SerialLink::new(data, clock, latch).unwrap();
//!
//! link.transmit(0b0000_1000).unwrap();
//! assert_eq!(chip.output(), 0b0000_1000);
//!
//! link.clear().unwrap();
//! assert_eq!(chip.output(), 0);
//! ```

use embedded_hal::digital::{OutputPin, PinState};

/// Three-wire link to a 74HC595.
///
/// Owns its lines exclusively for as long as it lives. Holds no state besides
/// the lines themselves.
#[derive(Debug)]
pub struct SerialLink<P: OutputPin> {
    data: P,
    clock: P,
    latch: P,
}

impl<P: OutputPin> SerialLink<P> {
    /// Takes ownership of the lines and drives all three low.
    ///
    /// # Errors
    ///
    /// Returns the pin error if any line cannot be driven. No transmission
    /// happens in that case.
    pub fn new(data: P, clock: P, latch: P) -> Result<Self, P::Error> {
        let mut link = Self { data, clock, latch };
        link.power_down()?;
        Ok(link)
    }

    /// Shifts `value` into the register and latches it onto the outputs.
    pub fn transmit(&mut self, value: u8) -> Result<(), P::Error> {
        for bit in 0..8 {
            self.data.set_state(PinState::from(value & (1 << bit) != 0))?;
            Self::pulse(&mut self.clock)?;
        }
        Self::pulse(&mut self.latch)
    }

    /// Turns every output off.
    #[inline]
    pub fn clear(&mut self) -> Result<(), P::Error> {
        self.transmit(0x00)
    }

    /// Turns every output on.
    #[inline]
    pub fn all_on(&mut self) -> Result<(), P::Error> {
        self.transmit(0xFF)
    }

    /// Drives data, clock and latch low without touching the outputs.
    pub fn power_down(&mut self) -> Result<(), P::Error> {
        self.data.set_low()?;
        self.clock.set_low()?;
        self.latch.set_low()
    }

    /// Drives every line low and hands the lines back as `[data, clock, latch]`.
    pub fn release(mut self) -> Result<[P; 3], P::Error> {
        self.power_down()?;
        Ok([self.data, self.clock, self.latch])
    }

    fn pulse(line: &mut P) -> Result<(), P::Error> {
        line.set_high()?;
        line.set_low()
    }
}
