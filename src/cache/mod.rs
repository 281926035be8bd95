//! Per-session response cache
//!
//! An explicitly constructed store owned by the composition root. Values are
//! kept as JSON with an expiry instant taken from an injectable [`Clock`];
//! expired entries read as absent and a background sweeper purges them.

mod clock;
mod keys;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use keys::{CacheKey, TtlClass};
pub use store::{fingerprint, spawn_sweeper, Cache, Cached, Expiring};
