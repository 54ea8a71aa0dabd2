//! Trait seams between the walk, its controllers and its randomness.
//!
//! # Submodules
//!
//! - `control`: [`WalkControl`], the command surface the switch poller drives
//! - `step`: [`StepSource`], where step directions come from
//!
//! Pins and delays come straight from `embedded-hal` and are not redefined
//! here.

pub mod control;
pub mod step;

pub use control::*;
pub use step::*;
