//! Process-wide id source for graph nodes.
//!
//! Slots, matches and rankings all draw their ids from one monotonic
//! counter so that a single id space covers both the ranking graph and
//! the elimination graph. The values are opaque and not meaningful
//! across process boundaries.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier for slots, matches and rankings.
pub type NodeId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Returns the next free id.
pub fn next_id() -> NodeId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Resets the id counter to zero.
///
/// Only useful for tests that assert on concrete id values. Never call
/// this while a tournament from the old id space is still alive.
pub fn reset_ids() {
    NEXT_ID.store(0, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    // A single test body: resetting concurrently with other id tests
    // would race them.
    #[test]
    fn test_ids_are_monotonic_and_resettable() {
        let a = next_id();
        let b = next_id();
        assert!(a < b);

        for _ in 0..10_000 {
            next_id();
        }
        let before = next_id();
        reset_ids();
        let after = next_id();
        assert!(after < before);
    }
}
