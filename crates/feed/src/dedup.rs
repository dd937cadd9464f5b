//! Dedup Ring: bounded set of the last N upstream signatures.
//!
//! A `VecDeque` of insertion order paired with a `HashSet` index, not a
//! linear scan — the buffer defaults to 10 000 entries, where a scan would
//! be the wrong default.

use std::collections::{HashSet, VecDeque};

pub struct DedupRing {
    order: VecDeque<String>,
    index: HashSet<String>,
    capacity: usize,
}

impl DedupRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            index: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.index.contains(signature)
    }

    /// Admits `signature`, evicting the oldest entry if at capacity.
    /// Returns `true` if this is a new signature (not already present).
    pub fn add(&mut self, signature: impl Into<String>) -> bool {
        let signature = signature.into();
        if self.index.contains(&signature) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.index.remove(&evicted);
            }
        }
        self.order.push_back(signature.clone());
        self.index.insert(signature);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_new_signature_and_rejects_duplicate() {
        let mut ring = DedupRing::new(10);
        assert!(ring.add("sig1"));
        assert!(ring.contains("sig1"));
        assert!(!ring.add("sig1"));
    }

    #[test]
    fn evicts_oldest_once_at_capacity() {
        let mut ring = DedupRing::new(2);
        ring.add("sig1");
        ring.add("sig2");
        ring.add("sig3");

        assert!(!ring.contains("sig1"));
        assert!(ring.contains("sig2"));
        assert!(ring.contains("sig3"));
    }

    #[test]
    fn evicted_signature_is_readmissible() {
        let mut ring = DedupRing::new(1);
        ring.add("sig1");
        ring.add("sig2");
        assert!(ring.add("sig1"));
    }
}
