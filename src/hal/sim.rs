//! Software model of the shift-register hardware.
//!
//! [`Hc595`] behaves like a 74HC595 wired to three GPIO lines: rising edges
//! on the clock line shift the data level into an internal buffer, and a
//! rising edge on the latch line copies that buffer to the visible outputs.
//! [`SimSwitch`] is a switch input whose level can be flipped from another
//! thread.
//!
//! Both power the desktop simulator and double as test fixtures.
//!
//! # Example
//!
//! ```rust
//! use shift_bug::hal::{Hc595, SimSwitch};
//! use embedded_hal::digital::{InputPin, OutputPin};
//!
//! let chip = Hc595::new();
//! let [mut data, mut clock, mut latch] = chip.lines();
//!
//! data.set_high().unwrap();
//! clock.set_high().unwrap();
//! clock.set_low().unwrap();
//! assert_eq!(chip.output(), 0); // not latched yet
//!
//! latch.set_high().unwrap();
//! latch.set_low().unwrap();
//! assert_eq!(chip.output(), 0b1000_0000);
//!
//! let mut switch = SimSwitch::new(false);
//! let remote = switch.clone();
//! remote.set(true);
//! assert!(switch.is_high().unwrap());
//! ```

use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

/// Maximum number of frames kept in the chip's history.
pub const HISTORY_LEN: usize = 4096;

/// Which of the three register lines a [`SimLine`] drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineRole {
    /// Serial data (SER).
    Data,
    /// Shift clock (SRCLK).
    Clock,
    /// Storage latch (RCLK).
    Latch,
}

/// Error returned by a [`SimLine`] after [`Hc595::inject_fault`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimPinError;

impl digital::Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl fmt::Display for SimPinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("simulated pin fault")
    }
}

impl std::error::Error for SimPinError {}

type LatchObserver = Box<dyn FnMut(u8) + Send>;

#[derive(Default)]
struct ChipState {
    data: bool,
    clock: bool,
    latch: bool,
    buffer: u8,
    output: u8,
    clock_count: usize,
    latch_count: usize,
    pending_bits: Vec<bool>,
    last_bits: Vec<bool>,
    frames: VecDeque<u8>,
    visible_during_shift: VecDeque<u8>,
    fault: bool,
    observer: Option<LatchObserver>,
}

fn push_bounded(history: &mut VecDeque<u8>, value: u8) {
    if history.len() == HISTORY_LEN {
        history.pop_front();
    }
    history.push_back(value);
}

/// Simulated 74HC595.
///
/// Cloning yields another handle to the same chip.
#[derive(Clone, Default)]
pub struct Hc595 {
    state: Arc<Mutex<ChipState>>,
}

impl Hc595 {
    /// Creates a chip with all lines low and all outputs off.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ChipState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the three lines as `[data, clock, latch]`.
    pub fn lines(&self) -> [SimLine; 3] {
        [
            self.line(LineRole::Data),
            self.line(LineRole::Clock),
            self.line(LineRole::Latch),
        ]
    }

    /// Returns a single line wired to this chip.
    pub fn line(&self, role: LineRole) -> SimLine {
        SimLine {
            role,
            chip: self.clone(),
        }
    }

    /// Currently latched outputs.
    pub fn output(&self) -> u8 {
        self.state().output
    }

    /// Current level of one line.
    pub fn level(&self, role: LineRole) -> bool {
        let state = self.state();
        match role {
            LineRole::Data => state.data,
            LineRole::Clock => state.clock,
            LineRole::Latch => state.latch,
        }
    }

    /// Number of rising edges seen on the clock line.
    pub fn clock_count(&self) -> usize {
        self.state().clock_count
    }

    /// Number of rising edges seen on the latch line.
    pub fn latch_count(&self) -> usize {
        self.state().latch_count
    }

    /// Every latched frame, oldest first (bounded by [`HISTORY_LEN`]).
    pub fn frames(&self) -> Vec<u8> {
        self.state().frames.iter().copied().collect()
    }

    /// Data bits of the last latched frame in the order they were clocked.
    pub fn shifted_bits(&self) -> Vec<bool> {
        self.state().last_bits.clone()
    }

    /// Drains the outputs observed at each clock edge since the last call.
    pub fn take_visible_during_shift(&self) -> Vec<u8> {
        self.state().visible_during_shift.drain(..).collect()
    }

    /// Makes every subsequent line operation fail.
    pub fn inject_fault(&self) {
        self.state().fault = true;
    }

    /// Clears an injected fault.
    pub fn clear_fault(&self) {
        self.state().fault = false;
    }

    /// Registers a callback run on every latch with the new outputs.
    ///
    /// The callback runs with the chip locked and must not use this chip.
    pub fn on_latch(&self, observer: impl FnMut(u8) + Send + 'static) {
        self.state().observer = Some(Box::new(observer));
    }

    fn drive(&self, role: LineRole, level: bool) -> Result<(), SimPinError> {
        let mut state = self.state();
        if state.fault {
            return Err(SimPinError);
        }

        match role {
            LineRole::Data => state.data = level,
            LineRole::Clock => {
                let rising = level && !state.clock;
                state.clock = level;
                if rising {
                    let bit = state.data;
                    state.buffer = (state.buffer >> 1) | (u8::from(bit) << 7);
                    state.clock_count += 1;
                    state.pending_bits.push(bit);
                    let visible = state.output;
                    push_bounded(&mut state.visible_during_shift, visible);
                }
            }
            LineRole::Latch => {
                let rising = level && !state.latch;
                state.latch = level;
                if rising {
                    let frame = state.buffer;
                    state.output = frame;
                    state.latch_count += 1;
                    state.last_bits = std::mem::take(&mut state.pending_bits);
                    push_bounded(&mut state.frames, frame);
                    if let Some(observer) = state.observer.as_mut() {
                        observer(frame);
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Hc595 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Hc595")
            .field("output", &format_args!("{:#010b}", state.output))
            .field("latch_count", &state.latch_count)
            .field("fault", &state.fault)
            .finish()
    }
}

/// One GPIO line wired to an [`Hc595`].
#[derive(Clone, Debug)]
pub struct SimLine {
    role: LineRole,
    chip: Hc595,
}

impl SimLine {
    /// The register pin this line drives.
    pub fn role(&self) -> LineRole {
        self.role
    }
}

impl ErrorType for SimLine {
    type Error = SimPinError;
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), SimPinError> {
        self.chip.drive(self.role, false)
    }

    fn set_high(&mut self) -> Result<(), SimPinError> {
        self.chip.drive(self.role, true)
    }
}

/// Switch input with a shared, externally settable level.
///
/// Reads low until set, matching a pull-down input with the switch open.
#[derive(Clone, Debug, Default)]
pub struct SimSwitch {
    level: Arc<AtomicBool>,
}

impl SimSwitch {
    /// Creates a switch at the given level.
    pub fn new(level: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(level)),
        }
    }

    /// Sets the level seen by every handle.
    pub fn set(&self, level: bool) {
        self.level.store(level, Ordering::SeqCst);
    }

    /// Flips the level and returns the new one.
    pub fn toggle(&self) -> bool {
        !self.level.fetch_xor(true, Ordering::SeqCst)
    }

    /// Current level.
    pub fn level(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

impl ErrorType for SimSwitch {
    type Error = Infallible;
}

impl InputPin for SimSwitch {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse(line: &mut SimLine) {
        line.set_high().unwrap();
        line.set_low().unwrap();
    }

    #[test]
    fn latch_copies_buffer() {
        let chip = Hc595::new();
        let [mut data, mut clock, mut latch] = chip.lines();

        data.set_high().unwrap();
        pulse(&mut clock);
        data.set_low().unwrap();
        for _ in 0..7 {
            pulse(&mut clock);
        }
        assert_eq!(chip.output(), 0);

        pulse(&mut latch);
        assert_eq!(chip.output(), 0b0000_0001);
        assert_eq!(chip.frames(), vec![1]);
    }

    #[test]
    fn clock_level_held_high_shifts_once() {
        let chip = Hc595::new();
        let [mut data, mut clock, _] = chip.lines();
        data.set_high().unwrap();
        clock.set_high().unwrap();
        clock.set_high().unwrap();
        assert_eq!(chip.clock_count(), 1);
    }

    #[test]
    fn observer_sees_frames() {
        let chip = Hc595::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        chip.on_latch(move |frame| sink.lock().unwrap().push(frame));

        let [_, _, mut latch] = chip.lines();
        pulse(&mut latch);
        pulse(&mut latch);
        assert_eq!(*seen.lock().unwrap(), vec![0, 0]);
    }

    #[test]
    fn fault_can_be_cleared() {
        let chip = Hc595::new();
        let mut data = chip.line(LineRole::Data);
        chip.inject_fault();
        assert_eq!(data.set_high(), Err(SimPinError));
        chip.clear_fault();
        assert_eq!(data.set_high(), Ok(()));
        assert!(chip.level(LineRole::Data));
    }

    #[test]
    fn history_is_bounded() {
        let chip = Hc595::new();
        let mut latch = chip.line(LineRole::Latch);
        for _ in 0..HISTORY_LEN + 10 {
            pulse(&mut latch);
        }
        assert_eq!(chip.frames().len(), HISTORY_LEN);
        assert_eq!(chip.latch_count(), HISTORY_LEN + 10);
    }

    #[test]
    fn switch_handles_share_level() {
        let mut switch = SimSwitch::new(false);
        let other = switch.clone();
        assert!(switch.is_low().unwrap());
        assert!(other.toggle());
        assert!(switch.is_high().unwrap());
        other.set(false);
        assert!(!switch.level());
    }
}
