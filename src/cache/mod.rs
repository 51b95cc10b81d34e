//! Cache Module
//!
//! Key derivation, payload codecs and the cache-aside controller.

mod clock;
mod codec;
mod controller;
mod entry;
mod key;
mod memoize;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::Encoding;
pub use controller::{FailurePolicy, MemoCache};
pub use entry::CacheRecord;
pub use key::{KeyDeriver, MAX_KEY_LENGTH};
pub use memoize::Memoized;
pub use stats::CacheStats;

pub(crate) use stats::StatsRecorder;
