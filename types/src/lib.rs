//! Fundamental types for stakeline.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account and asset identifiers, timestamps, and the clock abstraction.

pub mod account;
pub mod asset;
pub mod clock;
pub mod time;

pub use account::AccountId;
pub use asset::AssetId;
pub use clock::{Clock, SystemClock};
pub use time::Timestamp;
