//! The shared main-memory / secondary-storage hierarchy.
//!
//! Unlike the per-core L1 (owned outright by whichever core is currently
//! running a process), main memory and secondary storage are shared by every
//! core and guarded by one [`RwLock`] each — readers (cache-miss fills) run
//! concurrently, writers (stores) take exclusive access. A word's address
//! decides which tier backs it: `0..main_words` lives in main memory,
//! `main_words..main_words+secondary_words` lives in secondary storage.
//!
//! This tier never knows about any core's L1 contents. Two cores racing to
//! read and then write the same address can each cache a stale value in
//! their own L1 — the runtime does not model cache coherence, by design (see
//! `SPEC_FULL.md` §4.2).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::trace;

use crate::common::SimError;
use crate::config::MemoryConfig;
use crate::memory::cache::{Cache, Lookup};
use crate::process::Pcb;

/// Access counters for the shared tiers, updated on every hit/miss.
#[derive(Debug, Default)]
pub struct MemoryCounters {
    /// Reads satisfied without reaching either shared tier (tracked by the
    /// caller's L1, surfaced here only for a unified report).
    pub cache_hits: AtomicU64,
    /// Reads that missed the requesting core's L1.
    pub cache_misses: AtomicU64,
    /// Words read from main memory.
    pub ram_reads: AtomicU64,
    /// Words written to main memory.
    pub ram_writes: AtomicU64,
    /// Words read from secondary storage.
    pub disk_reads: AtomicU64,
    /// Words written to secondary storage.
    pub disk_writes: AtomicU64,
}

impl MemoryCounters {
    fn snapshot(&self) -> MemoryCounterSnapshot {
        MemoryCounterSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            ram_reads: self.ram_reads.load(Ordering::Relaxed),
            ram_writes: self.ram_writes.load(Ordering::Relaxed),
            disk_reads: self.disk_reads.load(Ordering::Relaxed),
            disk_writes: self.disk_writes.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`MemoryCounters`], cheap to pass around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryCounterSnapshot {
    /// See [`MemoryCounters::cache_hits`].
    pub cache_hits: u64,
    /// See [`MemoryCounters::cache_misses`].
    pub cache_misses: u64,
    /// See [`MemoryCounters::ram_reads`].
    pub ram_reads: u64,
    /// See [`MemoryCounters::ram_writes`].
    pub ram_writes: u64,
    /// See [`MemoryCounters::disk_reads`].
    pub disk_reads: u64,
    /// See [`MemoryCounters::disk_writes`].
    pub disk_writes: u64,
}

/// The shared, two-tier backing store behind every core's L1.
#[derive(Debug)]
pub struct MemoryHierarchy {
    main_words: u64,
    secondary_words: u64,
    main: RwLock<Vec<u64>>,
    secondary: RwLock<Vec<u64>>,
    counters: MemoryCounters,
}

impl MemoryHierarchy {
    /// Builds an all-zero hierarchy sized per `config`.
    #[must_use]
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            main_words: config.main_words,
            secondary_words: config.secondary_words,
            main: RwLock::new(vec![0; config.main_words as usize]),
            secondary: RwLock::new(vec![0; config.secondary_words as usize]),
            counters: MemoryCounters::default(),
        }
    }

    /// Total addressable words across both tiers.
    #[must_use]
    pub fn address_space_words(&self) -> u64 {
        self.main_words + self.secondary_words
    }

    /// A consistent snapshot of the shared-tier access counters.
    #[must_use]
    pub fn counters(&self) -> MemoryCounterSnapshot {
        self.counters.snapshot()
    }

    /// The full read access path: consult `l1` first, falling through to
    /// whichever shared tier backs `addr` on a miss, charging `pcb`'s
    /// access counters and weighted cycle cost along the way.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfRange`] if `addr` exceeds
    /// [`Self::address_space_words`]. On error, no counters are charged.
    pub fn read(&self, addr: u64, pcb: &mut Pcb, l1: &mut Cache) -> Result<u64, SimError> {
        if addr >= self.address_space_words() {
            return Err(SimError::AddressOutOfRange {
                addr,
                limit: self.address_space_words(),
            });
        }
        pcb.counters.accesses_total = pcb.counters.accesses_total.saturating_add(1);
        pcb.counters.reads = pcb.counters.reads.saturating_add(1);

        if let Lookup::Hit(data) = l1.get(addr) {
            pcb.counters.cache_hits = pcb.counters.cache_hits.saturating_add(1);
            pcb.counters.memory_cycles = pcb.counters.memory_cycles.saturating_add(pcb.weights.cache);
            self.record_cache_hit();
            return Ok(data);
        }

        pcb.counters.cache_misses = pcb.counters.cache_misses.saturating_add(1);
        self.record_cache_miss();
        let data = self.raw_read(addr)?;
        self.charge_fill(pcb, addr);
        l1.put(addr, data);
        Ok(data)
    }

    /// The full write access path: write-allocate into `l1` on a miss, mark
    /// the line dirty in `l1`, then write through to whichever shared tier
    /// backs `addr`. Charges `pcb`'s access counters and weighted cycle
    /// cost along the way.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfRange`] if `addr` exceeds
    /// [`Self::address_space_words`]. On error, no counters are charged and
    /// `l1` is left untouched.
    pub fn write(&self, addr: u64, data: u64, pcb: &mut Pcb, l1: &mut Cache) -> Result<(), SimError> {
        if addr >= self.address_space_words() {
            return Err(SimError::AddressOutOfRange {
                addr,
                limit: self.address_space_words(),
            });
        }
        pcb.counters.accesses_total = pcb.counters.accesses_total.saturating_add(1);
        pcb.counters.writes = pcb.counters.writes.saturating_add(1);

        if matches!(l1.get(addr), Lookup::Miss) {
            pcb.counters.cache_misses = pcb.counters.cache_misses.saturating_add(1);
            self.record_cache_miss();
            let filler = self.raw_read(addr)?;
            self.charge_fill(pcb, addr);
            l1.put(addr, filler);
        } else {
            pcb.counters.cache_hits = pcb.counters.cache_hits.saturating_add(1);
            self.record_cache_hit();
        }
        l1.update(addr, data);
        self.raw_write(addr, data)
    }

    /// Charges the primary/secondary access counter and weighted cycle cost
    /// for a word that just reached a shared tier (a cache-fill on read, or
    /// a write-allocate fill on write).
    fn charge_fill(&self, pcb: &mut Pcb, addr: u64) {
        if addr < self.main_words {
            pcb.counters.primary_accesses = pcb.counters.primary_accesses.saturating_add(1);
            pcb.counters.memory_cycles = pcb.counters.memory_cycles.saturating_add(pcb.weights.primary);
        } else {
            pcb.counters.secondary_accesses = pcb.counters.secondary_accesses.saturating_add(1);
            pcb.counters.memory_cycles = pcb.counters.memory_cycles.saturating_add(pcb.weights.secondary);
        }
    }

    /// Reads the word at `addr` directly from whichever shared tier backs
    /// it, bypassing any L1. Used internally by [`Self::read`]/
    /// [`Self::write`] on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfRange`] if `addr` exceeds
    /// [`Self::address_space_words`].
    fn raw_read(&self, addr: u64) -> Result<u64, SimError> {
        if addr < self.main_words {
            self.counters.ram_reads.fetch_add(1, Ordering::Relaxed);
            let guard = self.main.read().unwrap_or_else(std::sync::PoisonError::into_inner);
            trace!(addr, "main memory read");
            Ok(guard[addr as usize])
        } else if addr < self.address_space_words() {
            let offset = (addr - self.main_words) as usize;
            self.counters.disk_reads.fetch_add(1, Ordering::Relaxed);
            let guard = self
                .secondary
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            trace!(addr, "secondary storage read");
            Ok(guard[offset])
        } else {
            Err(SimError::AddressOutOfRange {
                addr,
                limit: self.address_space_words(),
            })
        }
    }

    /// Writes `data` to the word at `addr` directly in whichever shared
    /// tier backs it, bypassing any L1. Used internally by [`Self::write`]
    /// for the write-through step, and by [`Self::read`]'s write-allocate
    /// path is not needed since reads never write through.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AddressOutOfRange`] if `addr` exceeds
    /// [`Self::address_space_words`].
    fn raw_write(&self, addr: u64, data: u64) -> Result<(), SimError> {
        if addr < self.main_words {
            self.counters.ram_writes.fetch_add(1, Ordering::Relaxed);
            let mut guard = self
                .main
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            guard[addr as usize] = data;
            trace!(addr, "main memory write");
            Ok(())
        } else if addr < self.address_space_words() {
            let offset = (addr - self.main_words) as usize;
            self.counters.disk_writes.fetch_add(1, Ordering::Relaxed);
            let mut guard = self
                .secondary
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            guard[offset] = data;
            trace!(addr, "secondary storage write");
            Ok(())
        } else {
            Err(SimError::AddressOutOfRange {
                addr,
                limit: self.address_space_words(),
            })
        }
    }

    /// Records an L1 hit against the unified counters (the hierarchy owns
    /// the access tally even though the hit itself never reaches it).
    pub fn record_cache_hit(&self) {
        self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an L1 miss against the unified counters.
    pub fn record_cache_miss(&self) {
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
    }
}
