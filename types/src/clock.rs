//! Clock abstraction.
//!
//! The reward engine reads time only through [`Clock`]. Production code uses
//! [`SystemClock`]; deterministic tests use `NullClock` from
//! `stakeline-nullables`.

use crate::time::Timestamp;
use std::sync::Arc;

/// A synchronous source of the current time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u64);

    impl Clock for Fixed {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0)
        }
    }

    #[test]
    fn shared_clock_delegates() {
        let clock = Arc::new(Fixed(42));
        assert_eq!(clock.now(), Timestamp::new(42));
        assert_eq!((&Fixed(7)).now(), Timestamp::new(7));
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now() > Timestamp::EPOCH);
    }
}
