//! Time sources and the per-pass lazy clock snapshot.

mod clock;
mod lazy_now;

pub use clock::{TimeSource, VirtualClock, WallClock};
pub use lazy_now::LazyNow;
