//! Shared best-known candidate for the parallel improvement workers.
//!
//! Workers never share route state. Each one publishes finished candidates
//! here and the slot keeps a deep copy of the best one seen so far.

use std::sync::{Mutex, MutexGuard};

use crate::traits::Ranked;

#[derive(Debug)]
pub struct SharedBest<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for SharedBest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedBest<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // A worker that panicked mid-offer never leaves a half-written slot:
        // the replacement is a single assignment.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn into_inner(self) -> Option<T> {
        self.slot
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Ranked + Clone> SharedBest<T> {
    /// Installs a copy of `candidate` if it ranks strictly better than the
    /// current best. Compare and replace happen under one lock.
    pub fn offer(&self, candidate: &T) -> bool {
        let mut slot = self.lock();
        let better = slot
            .as_ref()
            .is_none_or(|current| candidate.rank() < current.rank());
        if better {
            *slot = Some(candidate.clone());
        }
        better
    }

    pub fn best_rank(&self) -> Option<T::Key> {
        self.lock().as_ref().map(Ranked::rank)
    }

    pub fn snapshot(&self) -> Option<T> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Scored {
        cost: i64,
        tag: &'static str,
    }

    impl Ranked for Scored {
        type Key = i64;

        fn rank(&self) -> i64 {
            self.cost
        }
    }

    #[test]
    fn test_first_offer_installs() {
        let best = SharedBest::new();
        assert!(best.offer(&Scored { cost: 10, tag: "a" }));
        assert_eq!(best.best_rank(), Some(10));
    }

    #[test]
    fn test_only_strictly_better_replaces() {
        let best = SharedBest::new();
        best.offer(&Scored { cost: 10, tag: "a" });
        assert!(!best.offer(&Scored { cost: 10, tag: "b" }));
        assert!(!best.offer(&Scored { cost: 11, tag: "c" }));
        assert!(best.offer(&Scored { cost: 9, tag: "d" }));
        assert_eq!(best.snapshot().map(|s| s.tag), Some("d"));
    }

    #[test]
    fn test_concurrent_offers_keep_minimum() {
        let best = SharedBest::new();
        (0..200i64).into_par_iter().for_each(|i| {
            best.offer(&Scored {
                cost: (i * 7919) % 200,
                tag: "x",
            });
        });
        assert_eq!(best.into_inner().map(|s| s.cost), Some(0));
    }
}
