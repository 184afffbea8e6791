//! Least Recently Used replacement policy.
//!
//! Maintains a usage stack of resident addresses, most-recently-used at the
//! front. On access, the address is moved to the front; `evict` pops the
//! back (the least recently used entry).
//!
//! - `record_access`/`record_insert`: O(n) in the number of resident
//!   addresses (linear scan to relocate), which is fine at the small L1
//!   capacities this runtime models.
//! - `evict`: O(1).

use super::ReplacementPolicy;

/// LRU policy state: a usage stack, index 0 is most-recently-used.
#[derive(Debug, Default)]
pub struct LruPolicy {
    stack: Vec<u64>,
}

impl LruPolicy {
    /// Creates an empty LRU policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self, addr: u64) {
        if let Some(pos) = self.stack.iter().position(|&a| a == addr) {
            let _ = self.stack.remove(pos);
        }
        self.stack.insert(0, addr);
    }
}

impl ReplacementPolicy for LruPolicy {
    fn record_insert(&mut self, addr: u64) {
        self.touch(addr);
    }

    fn record_access(&mut self, addr: u64) {
        self.touch(addr);
    }

    fn forget(&mut self, addr: u64) {
        if let Some(pos) = self.stack.iter().position(|&a| a == addr) {
            let _ = self.stack.remove(pos);
        }
    }

    fn evict(&mut self) -> Option<u64> {
        self.stack.pop()
    }

    fn clear(&mut self) {
        self.stack.clear();
    }
}
