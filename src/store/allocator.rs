use std::sync::atomic::{AtomicI64, Ordering};

/// Issues message ids. The first id handed out is one greater than the
/// starting value, so a fresh allocator yields `1, 2, 3, ...`.
#[derive(Debug, Default)]
pub struct IdAllocator {
    last: AtomicI64,
}

impl IdAllocator {
    /// A fresh allocator whose first id is `1`.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Resume after `last` ids have already been issued.
    pub fn starting_at(last: i64) -> Self {
        Self {
            last: AtomicI64::new(last),
        }
    }

    /// Issue the next id.
    pub fn next(&self) -> i64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently issued id, or the starting value.
    pub fn current(&self) -> i64 {
        self.last.load(Ordering::SeqCst)
    }

    /// Roll the counter back so the next id is `last + 1`.
    ///
    /// Used when an append fails after allocation; callers must hold the
    /// lock that serializes allocation with appends.
    pub fn rewind_to(&self, last: i64) {
        self.last.store(last, Ordering::SeqCst);
    }
}
