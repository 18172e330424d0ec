//! Time source abstraction.
//!
//! Debouncers and caches never read the system clock directly, so tests can
//! drive time by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since an arbitrary, monotonic-enough epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// === Real implementations ===

/// Wall clock in milliseconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

// === Mock implementations for testing ===

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Rc<Cell<u64>>,
}

impl MockClock {
    /// Create a clock reading `start`.
    pub fn at(start: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Move time forward.
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
