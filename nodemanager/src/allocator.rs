//! Identifier allocation for nodes created without an explicit id.
//!
//! The allocator is a single counter owned by one node manager. It starts at
//! zero and only moves forward, so every value is handed out at most once.
//! Identifiers of different node managers never collide because each manager
//! allocates in its own namespace index, not because the counters differ.

use std::sync::atomic::{AtomicU64, Ordering};

use liha_model::NodeId;

use crate::error::GraphError;

/// Monotonic identifier counter.
#[derive(Debug, Default)]
pub struct IdentifierAllocator {
    last_used: AtomicU64,
}

impl IdentifierAllocator {
    /// Creates an allocator whose first value is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next value. Atomic, so allocation may happen outside the
    /// activation lock.
    pub fn next(&self) -> u64 {
        self.last_used.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns the next value as a numeric node id in `namespace_index`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::AllocatorExhausted`] once the counter no longer
    /// fits a numeric identifier.
    pub fn next_node_id(&self, namespace_index: u16) -> Result<NodeId, GraphError> {
        let value = self.next();
        u32::try_from(value)
            .map(|id| NodeId::numeric(namespace_index, id))
            .map_err(|_| GraphError::AllocatorExhausted(namespace_index))
    }

    /// The most recently issued value (0 before the first allocation).
    #[must_use]
    pub fn last_used(&self) -> u64 {
        self.last_used.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub(crate) fn starting_after(last_used: u64) -> Self {
        Self {
            last_used: AtomicU64::new(last_used),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn starts_at_one() {
        let alloc = IdentifierAllocator::new();
        assert_eq!(alloc.last_used(), 0);
        assert_eq!(alloc.next(), 1);
        assert_eq!(alloc.next(), 2);
        assert_eq!(alloc.last_used(), 2);
    }

    #[test]
    fn node_ids_use_the_given_namespace() {
        let alloc = IdentifierAllocator::new();
        assert_eq!(alloc.next_node_id(4).ok(), Some(NodeId::numeric(4, 1)));
    }

    #[test]
    fn exhaustion_is_reported() {
        let alloc = IdentifierAllocator::starting_after(u64::from(u32::MAX) - 1);
        assert_eq!(
            alloc.next_node_id(2).ok(),
            Some(NodeId::numeric(2, u32::MAX))
        );
        assert!(matches!(
            alloc.next_node_id(2),
            Err(GraphError::AllocatorExhausted(2))
        ));
    }

    #[test]
    fn concurrent_allocation_never_repeats() {
        let alloc = Arc::new(IdentifierAllocator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let alloc = Arc::clone(&alloc);
                thread::spawn(move || (0..1000).map(|_| alloc.next()).collect::<Vec<_>>())
            })
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "value {value} issued twice");
            }
        }
        assert_eq!(seen.len(), 4000);
        assert_eq!(alloc.last_used(), 4000);
    }

    proptest! {
        #[test]
        fn n_allocations_are_strictly_increasing(n in 1usize..2000) {
            let alloc = IdentifierAllocator::new();
            let values: Vec<u64> = (0..n).map(|_| alloc.next()).collect();
            prop_assert_eq!(values.len(), n);
            prop_assert!(values.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(values[0], 1);
        }
    }
}
