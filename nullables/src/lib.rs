//! Nullable infrastructure for deterministic testing and simulation.
//!
//! The reward engine reaches the outside world only through the `Clock` and
//! `TokenLink` traits. This crate provides implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (advance time, mine blocks, inject
//!   transfer failures)
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests and simulations.
//! Nothing here belongs in a production build.

pub mod clock;
pub mod token;

pub use clock::NullClock;
pub use token::NullToken;
