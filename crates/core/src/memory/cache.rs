//! Per-core private L1 cache.
//!
//! A fixed-capacity, fully-associative, address-keyed store with a pluggable
//! victim policy. Accessed from exactly one core's worker thread at a time
//! (an invariant [`crate::core_unit::Core`] enforces by moving the `Cache`
//! into and out of the thread along with the `Pcb` it's running), so no
//! internal synchronization is needed.

use std::collections::HashMap;

use crate::config::{CacheConfig, CacheReplacementPolicy};
use crate::memory::policies::{FifoPolicy, LruPolicy, ReplacementPolicy};

/// A single cache line: one machine word plus its dirty bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Line {
    data: u64,
    dirty: bool,
}

/// The result of a [`Cache::get`] lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The address was resident; here is its value.
    Hit(u64),
    /// The address was not resident.
    Miss,
}

/// A `{addr, data}` pair for a dirty line, as returned by
/// [`Cache::dirty_entries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyEntry {
    /// The line's address.
    pub addr: u64,
    /// The line's cached value.
    pub data: u64,
}

/// A fixed-capacity, write-through, write-allocate L1 cache.
#[derive(Debug)]
pub struct Cache {
    capacity: usize,
    lines: HashMap<u64, Line>,
    policy: Box<dyn ReplacementPolicy>,
}

impl Cache {
    /// Builds a cache from a [`CacheConfig`].
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let policy: Box<dyn ReplacementPolicy> = match config.policy {
            CacheReplacementPolicy::Fifo => Box::new(FifoPolicy::new()),
            CacheReplacementPolicy::Lru => Box::new(LruPolicy::new()),
        };
        Self {
            capacity: config.capacity.max(1),
            lines: HashMap::with_capacity(config.capacity),
            policy,
        }
    }

    /// Number of words currently resident.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if no words are resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Looks up `addr` without modifying cache contents beyond recency
    /// bookkeeping.
    pub fn get(&mut self, addr: u64) -> Lookup {
        if self.lines.contains_key(&addr) {
            self.policy.record_access(addr);
            Lookup::Hit(self.lines[&addr].data)
        } else {
            Lookup::Miss
        }
    }

    /// Inserts a clean `(addr, data)` line, evicting a victim first if the
    /// cache is already at capacity.
    ///
    /// If `addr` is already resident this overwrites its value and clears
    /// the dirty bit, matching a clean refill after a miss.
    pub fn put(&mut self, addr: u64, data: u64) {
        if self.lines.contains_key(&addr) {
            let _ = self.lines.insert(addr, Line { data, dirty: false });
            self.policy.record_access(addr);
            return;
        }
        if self.lines.len() >= self.capacity {
            if let Some(victim) = self.policy.evict() {
                let _ = self.lines.remove(&victim);
            }
        }
        let _ = self.lines.insert(addr, Line { data, dirty: false });
        self.policy.record_insert(addr);
    }

    /// Overwrites `addr`'s value and marks it dirty. No-op if `addr` is not
    /// resident — write-allocate is the caller's responsibility (see
    /// [`crate::memory::MemoryHierarchy::write`]).
    pub fn update(&mut self, addr: u64, data: u64) {
        if let Some(line) = self.lines.get_mut(&addr) {
            line.data = data;
            line.dirty = true;
            self.policy.record_access(addr);
        }
    }

    /// Clears all entries and replacement-policy bookkeeping.
    pub fn invalidate(&mut self) {
        self.lines.clear();
        self.policy.clear();
    }

    /// Enumerates every dirty line. Unused in the default write-through
    /// configuration (writes already reach the shared store immediately);
    /// kept for a future write-back variant (see `DESIGN.md`).
    pub fn dirty_entries(&self) -> Vec<DirtyEntry> {
        self.lines
            .iter()
            .filter(|(_, line)| line.dirty)
            .map(|(&addr, line)| DirtyEntry {
                addr,
                data: line.data,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fifo_cache(capacity: usize) -> Cache {
        Cache::new(&CacheConfig {
            capacity,
            policy: CacheReplacementPolicy::Fifo,
        })
    }

    fn lru_cache(capacity: usize) -> Cache {
        Cache::new(&CacheConfig {
            capacity,
            policy: CacheReplacementPolicy::Lru,
        })
    }

    #[test]
    fn cold_lookup_is_a_miss() {
        let mut cache = fifo_cache(4);
        assert_eq!(cache.get(0x10), Lookup::Miss);
    }

    #[test]
    fn put_then_get_hits() {
        let mut cache = fifo_cache(4);
        cache.put(0x10, 42);
        assert_eq!(cache.get(0x10), Lookup::Hit(42));
    }

    #[test]
    fn fifo_evicts_oldest_insertion_order() {
        let mut cache = fifo_cache(2);
        cache.put(1, 10);
        cache.put(2, 20);
        cache.put(3, 30); // evicts addr 1
        assert_eq!(cache.get(1), Lookup::Miss);
        assert_eq!(cache.get(2), Lookup::Hit(20));
        assert_eq!(cache.get(3), Lookup::Hit(30));
    }

    #[test]
    fn fifo_ignores_access_recency() {
        let mut cache = fifo_cache(2);
        cache.put(1, 10);
        cache.put(2, 20);
        assert_eq!(cache.get(1), Lookup::Hit(10)); // touch 1, FIFO doesn't care
        cache.put(3, 30); // still evicts 1, the first inserted
        assert_eq!(cache.get(1), Lookup::Miss);
        assert_eq!(cache.get(2), Lookup::Hit(20));
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let mut cache = lru_cache(2);
        cache.put(1, 10);
        cache.put(2, 20);
        assert_eq!(cache.get(1), Lookup::Hit(10)); // 1 is now MRU, 2 is LRU
        cache.put(3, 30); // evicts 2
        assert_eq!(cache.get(2), Lookup::Miss);
        assert_eq!(cache.get(1), Lookup::Hit(10));
        assert_eq!(cache.get(3), Lookup::Hit(30));
    }

    #[test]
    fn update_marks_dirty_and_overwrites() {
        let mut cache = fifo_cache(2);
        cache.put(1, 10);
        cache.update(1, 11);
        assert_eq!(cache.get(1), Lookup::Hit(11));
        let dirty = cache.dirty_entries();
        assert_eq!(dirty, vec![DirtyEntry { addr: 1, data: 11 }]);
    }

    #[test]
    fn update_on_absent_address_is_a_no_op() {
        let mut cache = fifo_cache(2);
        cache.update(1, 99);
        assert_eq!(cache.get(1), Lookup::Miss);
    }

    #[test]
    fn invalidate_clears_everything() {
        let mut cache = fifo_cache(2);
        cache.put(1, 10);
        cache.put(2, 20);
        cache.invalidate();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get(1), Lookup::Miss);
        // Capacity-worth of fresh inserts after invalidate should not
        // immediately evict — bookkeeping was really cleared.
        cache.put(1, 11);
        cache.put(2, 21);
        assert_eq!(cache.get(1), Lookup::Hit(11));
        assert_eq!(cache.get(2), Lookup::Hit(21));
    }
}
