//! Direct [`Core`]-level scenarios for the memory hierarchy's cache-hit and
//! non-coherence properties, driven without a [`SchedulerCore`] so the test
//! controls exactly which core touches which address and in what order.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use msim_core::config::{CacheConfig, MemoryConfig, MemoryWeights};
use msim_core::engine::{EngineOutcome, InstructionEngine};
use msim_core::memory::{Cache, MemoryHierarchy};
use msim_core::process::{Pcb, RegisterBank};
use msim_core::Core;

fn wait_for_reap(core: &mut Core) -> Pcb {
    for _ in 0..200 {
        if let Some(pcb) = core.reap().unwrap() {
            return pcb;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("worker never finished");
}

fn pcb(pid: u64) -> Pcb {
    let mut p = Pcb::new(pid, format!("p{pid}"), 0, 1, 0, 0, MemoryWeights::default());
    p.quantum = Some(1);
    p
}

/// Reads a fixed address into register 1 once per dispatch, never reaching a
/// terminal condition on its own — the caller's `quantum` decides how many
/// reads one dispatch performs.
struct ReadInto(u64);

impl InstructionEngine for ReadInto {
    fn step(
        &self,
        registers: &mut RegisterBank,
        mem: &MemoryHierarchy,
        l1: &mut Cache,
        pcb: &mut Pcb,
    ) -> EngineOutcome {
        let value = mem.read(self.0, pcb, l1).unwrap();
        registers.write(1, value);
        EngineOutcome::Continued
    }
}

/// Writes a fixed `(addr, value)` pair once per dispatch.
struct WriteOnce(u64, u64);

impl InstructionEngine for WriteOnce {
    fn step(
        &self,
        _registers: &mut RegisterBank,
        mem: &MemoryHierarchy,
        l1: &mut Cache,
        pcb: &mut Pcb,
    ) -> EngineOutcome {
        mem.write(self.0, self.1, pcb, l1).unwrap();
        EngineOutcome::Continued
    }
}

/// E5: reading the same address twice from the same core's L1 is a miss
/// then a hit, and the miss charges `primary_accesses` for an address below
/// `main_words`.
#[test]
fn e5_second_read_of_the_same_address_is_a_cache_hit() {
    let memory = Arc::new(MemoryHierarchy::new(&MemoryConfig {
        main_words: 64,
        secondary_words: 0,
    }));
    let engine: Arc<dyn InstructionEngine> = Arc::new(ReadInto(10));
    let mut core = Core::new(0, Cache::new(&CacheConfig::default()), Arc::clone(&memory), engine);

    let mut p = pcb(1);
    p.quantum = Some(2);
    core.dispatch(p, 0);
    let p = wait_for_reap(&mut core);

    assert_eq!(p.counters.cache_misses, 1);
    assert_eq!(p.counters.cache_hits, 1);
    assert_eq!(p.counters.primary_accesses, 1);
}

/// E6: two cores' L1s are never made coherent with each other. Core 0 reads
/// A and caches it; core 1 writes a new value to A; core 0's next read of A
/// (resumed on the same core, so its L1 is unchanged) still sees the old
/// value, while core 2 — which has never cached A — sees the new one.
#[test]
fn e6_a_stale_l1_read_survives_a_foreign_write() {
    let memory = Arc::new(MemoryHierarchy::new(&MemoryConfig {
        main_words: 64,
        secondary_words: 0,
    }));
    let reader: Arc<dyn InstructionEngine> = Arc::new(ReadInto(10));
    let writer: Arc<dyn InstructionEngine> = Arc::new(WriteOnce(10, 99));

    let mut core0 = Core::new(0, Cache::new(&CacheConfig::default()), Arc::clone(&memory), Arc::clone(&reader));
    let mut core1 = Core::new(1, Cache::new(&CacheConfig::default()), Arc::clone(&memory), writer);
    let mut core2 = Core::new(2, Cache::new(&CacheConfig::default()), Arc::clone(&memory), reader);

    // Core 0 reads A (initially 0) and caches it.
    core0.dispatch(pcb(1), 0);
    let p0 = wait_for_reap(&mut core0);
    assert_eq!(p0.registers.read(1), 0);

    // Core 1 writes A := 99.
    core1.dispatch(pcb(2), 0);
    let _ = wait_for_reap(&mut core1);

    // Core 0 re-reads A. Its L1 still holds the stale value from the first
    // dispatch, so this is a cache hit and the old value, not 99.
    let mut resumed = p0;
    resumed.quantum = Some(1);
    core0.dispatch(resumed, 0);
    let p0 = wait_for_reap(&mut core0);
    assert_eq!(p0.registers.read(1), 0);
    assert_eq!(p0.counters.cache_hits, 1);

    // Core 2 has never cached A, so it observes the write directly.
    core2.dispatch(pcb(3), 0);
    let p2 = wait_for_reap(&mut core2);
    assert_eq!(p2.registers.read(1), 99);
}
