//! ESP32-C3 SuperMini wiring for the shift-register bug.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Register**: 74HC595 driving an 8-LED bar through series resistors
//! - **Switches**: three SPST switches to 3.3V, read with internal pull-downs
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments matching the SuperMini layout.

use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, GpioError, Input, Output, PinDriver, Pull};
use log::info;

use crate::shifter::SerialLink;
use crate::switches::Switches;

/// An output line driving one of the register inputs.
pub type OutputLine = PinDriver<'static, AnyOutputPin, Output>;

/// A pulled-down switch input.
pub type SwitchInput = PinDriver<'static, AnyIOPin, Input>;

/// Serial link over ESP32 GPIO.
pub type Esp32Link = SerialLink<OutputLine>;

/// Pin assignments for SuperMini ESP32-C3.
///
/// - 74HC595 on GPIO2-4
/// - Switches on GPIO5-7
pub mod pins {
    // =========================================================================
    // Shift register (74HC595)
    // =========================================================================

    /// Serial data (SER, pin 14)
    pub const SER: i32 = 2;

    /// Shift clock (SRCLK, pin 11)
    pub const SRCLK: i32 = 3;

    /// Storage latch (RCLK, pin 12)
    pub const RCLK: i32 = 4;

    // =========================================================================
    // Switches (pull-down, closed = high)
    // =========================================================================

    /// Run/stop switch
    pub const RUN: i32 = 5;

    /// Wrap-mode toggle switch
    pub const WRAP: i32 = 6;

    /// Speed switch
    pub const SPEED: i32 = 7;
}

/// Configures `pin` as a push-pull output, initially low.
pub fn output_line(pin: AnyOutputPin) -> Result<OutputLine, GpioError> {
    let mut driver = PinDriver::output(pin)?;
    driver.set_low()?;
    Ok(driver)
}

/// Configures `pin` as an input with the internal pull-down enabled.
pub fn switch_input(pin: AnyIOPin) -> Result<SwitchInput, GpioError> {
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(Pull::Down)?;
    Ok(driver)
}

/// Builds the serial link from the three register pins.
pub fn serial_link(
    data: AnyOutputPin,
    clock: AnyOutputPin,
    latch: AnyOutputPin,
) -> Result<Esp32Link, GpioError> {
    let link = SerialLink::new(output_line(data)?, output_line(clock)?, output_line(latch)?)?;
    info!(
        "74HC595 link ready (SER=GPIO{}, SRCLK=GPIO{}, RCLK=GPIO{})",
        pins::SER,
        pins::SRCLK,
        pins::RCLK
    );
    Ok(link)
}

/// Builds the switch bank from the three switch pins.
pub fn switches(
    run: AnyIOPin,
    wrap_toggle: AnyIOPin,
    speed: AnyIOPin,
) -> Result<Switches<SwitchInput>, GpioError> {
    let switches = Switches::new(
        switch_input(run)?,
        switch_input(wrap_toggle)?,
        switch_input(speed)?,
    );
    info!(
        "switches ready (run=GPIO{}, wrap=GPIO{}, speed=GPIO{})",
        pins::RUN,
        pins::WRAP,
        pins::SPEED
    );
    Ok(switches)
}
