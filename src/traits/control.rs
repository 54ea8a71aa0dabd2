//! Command surface of the walk engine as seen by its controllers.
//!
//! The switch poller drives the engine only through [`WalkControl`], which
//! lets it run against the real [`WalkEngine`](crate::WalkEngine) or against
//! [`MockWalkControl`](crate::hal::MockWalkControl) in tests.

use core::time::Duration;

/// Live control of a running (or stopped) walk.
///
/// All methods take `&self`: implementations synchronize internally so that a
/// controller thread can issue commands while the animation runs.
pub trait WalkControl {
    /// Error type for failed commands.
    type Error;

    /// Starts the animation. Does nothing when it is already running.
    fn start(&self) -> Result<(), Self::Error>;

    /// Stops the animation and blanks the outputs.
    ///
    /// Blanks the outputs even when nothing was running.
    fn stop(&self) -> Result<(), Self::Error>;

    /// Returns true while the animation task is live.
    fn is_running(&self) -> bool;

    /// Sets the time between steps.
    fn set_interval(&self, interval: Duration) -> Result<(), Self::Error>;

    /// Returns the current time between steps.
    fn interval(&self) -> Duration;

    /// Enables or disables wrap mode.
    fn set_wrap(&self, wrap: bool);

    /// Returns whether wrap mode is on.
    fn wrap_enabled(&self) -> bool;

    /// Flips wrap mode and returns the new setting.
    fn toggle_wrap(&self) -> bool {
        let wrap = !self.wrap_enabled();
        self.set_wrap(wrap);
        wrap
    }
}

#[cfg(feature = "std")]
impl<T: WalkControl + ?Sized> WalkControl for std::sync::Arc<T> {
    type Error = T::Error;

    fn start(&self) -> Result<(), Self::Error> {
        (**self).start()
    }

    fn stop(&self) -> Result<(), Self::Error> {
        (**self).stop()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn set_interval(&self, interval: Duration) -> Result<(), Self::Error> {
        (**self).set_interval(interval)
    }

    fn interval(&self) -> Duration {
        (**self).interval()
    }

    fn set_wrap(&self, wrap: bool) {
        (**self).set_wrap(wrap)
    }

    fn wrap_enabled(&self) -> bool {
        (**self).wrap_enabled()
    }

    fn toggle_wrap(&self) -> bool {
        (**self).toggle_wrap()
    }
}

impl<T: WalkControl + ?Sized> WalkControl for &T {
    type Error = T::Error;

    fn start(&self) -> Result<(), Self::Error> {
        (**self).start()
    }

    fn stop(&self) -> Result<(), Self::Error> {
        (**self).stop()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn set_interval(&self, interval: Duration) -> Result<(), Self::Error> {
        (**self).set_interval(interval)
    }

    fn interval(&self) -> Duration {
        (**self).interval()
    }

    fn set_wrap(&self, wrap: bool) {
        (**self).set_wrap(wrap)
    }

    fn wrap_enabled(&self) -> bool {
        (**self).wrap_enabled()
    }

    fn toggle_wrap(&self) -> bool {
        (**self).toggle_wrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct Toy {
        wrap: Cell<bool>,
        sets: Cell<u32>,
    }

    impl WalkControl for Toy {
        type Error = ();

        fn start(&self) -> Result<(), ()> {
            Ok(())
        }

        fn stop(&self) -> Result<(), ()> {
            Ok(())
        }

        fn is_running(&self) -> bool {
            false
        }

        fn set_interval(&self, _interval: Duration) -> Result<(), ()> {
            Ok(())
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(100)
        }

        fn set_wrap(&self, wrap: bool) {
            self.wrap.set(wrap);
            self.sets.set(self.sets.get() + 1);
        }

        fn wrap_enabled(&self) -> bool {
            self.wrap.get()
        }
    }

    #[test]
    fn toggle_wrap_default_impl() {
        let toy = Toy {
            wrap: Cell::new(false),
            sets: Cell::new(0),
        };
        assert!(toy.toggle_wrap());
        assert!(toy.wrap_enabled());
        assert!(!toy.toggle_wrap());
        assert!(!toy.wrap_enabled());
        assert_eq!(toy.sets.get(), 2);
    }

    #[test]
    fn forwarding_through_reference() {
        let toy = Toy {
            wrap: Cell::new(true),
            sets: Cell::new(0),
        };
        let by_ref = &toy;
        assert!(!by_ref.toggle_wrap());
        assert!(!toy.wrap_enabled());
    }
}
