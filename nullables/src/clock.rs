//! Nullable clock: deterministic time for tests and simulations.

use stakeline_types::{Clock, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};

/// Seconds a mined block moves the clock forward unless configured otherwise.
pub const DEFAULT_BLOCK_TIME_SECS: u64 = 1;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to, either directly in seconds or by
/// mining blocks. Each mined block moves time forward by the block time,
/// mirroring a dev chain that stamps every new block one interval after its
/// parent.
pub struct NullClock {
    current: AtomicU64,
    block_time_secs: u64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self::with_block_time(initial_secs, DEFAULT_BLOCK_TIME_SECS)
    }

    pub fn with_block_time(initial_secs: u64, block_time_secs: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_secs),
            block_time_secs,
        }
    }

    /// Get the current time.
    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.load(Ordering::SeqCst))
    }

    /// Advance time by a number of seconds. Block height is unchanged.
    pub fn advance(&self, secs: u64) {
        self.current.fetch_add(secs, Ordering::SeqCst);
    }

    /// Mine `blocks` blocks, advancing time by `blocks × block_time`.
    pub fn advance_blocks(&self, blocks: u64) {
        self.advance(blocks.saturating_mul(self.block_time_secs));
    }

    /// Set the time to a specific value.
    pub fn set(&self, secs: u64) {
        self.current.store(secs, Ordering::SeqCst);
    }
}

impl Default for NullClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        NullClock::now(self)
    }
}
