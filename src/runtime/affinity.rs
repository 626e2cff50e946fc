//! Owner-thread check for single-writer structures.
//!
//! A time domain may be built on one thread and handed to the run loop that
//! owns it. [`ThreadAffinity::bind`] pins it to the calling thread; from then
//! on every mutating entry point calls [`ThreadAffinity::assert_owner`], which
//! is a `debug_assert!` and compiles away in release builds.

use std::thread::{self, ThreadId};

/// Records which thread owns a structure.
#[derive(Debug, Clone, Default)]
pub struct ThreadAffinity {
    owner: Option<ThreadId>,
}

impl ThreadAffinity {
    /// An unbound affinity. Any thread may call until [`bind`](Self::bind).
    #[must_use]
    pub const fn unbound() -> Self {
        Self { owner: None }
    }

    /// Binds to the current thread, replacing any previous owner.
    pub fn bind(&mut self) {
        self.owner = Some(thread::current().id());
    }

    /// The bound owner, if any.
    #[must_use]
    pub const fn owner(&self) -> Option<ThreadId> {
        self.owner
    }

    /// Returns true when unbound or called from the owner thread.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.owner.map_or(true, |owner| owner == thread::current().id())
    }

    /// Debug-only check that the caller is the owner thread.
    #[track_caller]
    #[inline]
    pub fn assert_owner(&self, operation: &str) {
        debug_assert!(
            self.is_owner(),
            "{operation} called off the owning thread (owner {:?}, caller {:?})",
            self.owner,
            thread::current().id()
        );
    }
}
