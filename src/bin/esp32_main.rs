//! ESP32-C3 SuperMini shift-register bug.
//!
//! This is the main entry point for the physical hardware. It:
//! - Drives a 74HC595 on GPIO2/3/4 with the random walk
//! - Polls the run, wrap and speed switches on GPIO5/6/7 every 50ms
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32 --bin esp32_main
//! espflash flash --monitor target/riscv32imc-esp-espidf/release/esp32_main
//! ```

use std::sync::atomic::AtomicBool;

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{IOPin, OutputPin};
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info};
use shift_bug::hal::esp32;
use shift_bug::{Config, InputPoller, WalkEngine};

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    println!();
    println!("================================");
    println!("  shift-bug SuperMini");
    println!("================================");
    println!();

    let config = Config::default();
    config.validate()?;
    info!("{} starting", config.device.name);

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // =========================================================================
    // Shift register (74HC595 on GPIO2/3/4)
    // =========================================================================
    let link = esp32::serial_link(
        pins.gpio2.downgrade_output(),
        pins.gpio3.downgrade_output(),
        pins.gpio4.downgrade_output(),
    )?;
    let engine = WalkEngine::new(link, &config.walk)?;
    println!("[OK] Walk engine ready (GPIO2/3/4)");

    // =========================================================================
    // Switches (GPIO5/6/7, pull-down)
    // =========================================================================
    let switches = esp32::switches(
        pins.gpio5.downgrade(),
        pins.gpio6.downgrade(),
        pins.gpio7.downgrade(),
    )?;
    let mut poller = InputPoller::new(
        switches,
        &engine,
        FreeRtos,
        &config.poll,
        config.walk.interval,
    )?;
    println!("[OK] Switches ready (GPIO5/6/7)");

    // Never raised on hardware: the loop only ends on an error.
    let shutdown = AtomicBool::new(false);
    let outcome = poller.run(&shutdown);
    drop(poller);

    if let Err(e) = &outcome {
        error!("switch polling failed: {e}");
    }
    if let Err(e) = engine.shutdown() {
        error!("shutdown failed: {e}");
    }
    outcome?;
    Ok(())
}
