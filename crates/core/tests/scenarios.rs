//! End-to-end scheduling scenarios, driven through the public
//! `SchedulerCore` surface with a small deterministic mock engine standing
//! in for the reference decoder.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use msim_core::config::{CacheConfig, Config, MemoryConfig, MemoryWeights, PolicyKind};
use msim_core::engine::{EngineOutcome, InstructionEngine};
use msim_core::memory::{Cache, MemoryHierarchy};
use msim_core::process::{Pcb, RegisterBank};
use msim_core::scheduler::SchedulerCore;

/// Runs each process for exactly `pcb.estimated_job_size` instructions,
/// using the PCB's own retired-instruction count as the cursor — so one
/// shared engine instance serves every process regardless of length. A
/// short sleep per instruction paces execution against the wall-clock
/// scheduler loop, standing in for real instruction-decode latency.
struct RunsForJobSize {
    per_instruction: Duration,
}

impl InstructionEngine for RunsForJobSize {
    fn step(
        &self,
        _registers: &mut RegisterBank,
        _mem: &MemoryHierarchy,
        _l1: &mut Cache,
        pcb: &mut Pcb,
    ) -> EngineOutcome {
        thread::sleep(self.per_instruction);
        let next_index = pcb.counters.pipeline_cycles;
        if next_index + 1 >= pcb.estimated_job_size {
            EngineOutcome::ProgramEnd
        } else {
            EngineOutcome::Continued
        }
    }
}

/// Like [`RunsForJobSize`] but issues one I/O request at a fixed
/// instruction index before continuing to program end.
struct RunsWithIo {
    total: u64,
    io_at: u64,
    device: u32,
    cost: u64,
    per_instruction: Duration,
}

impl InstructionEngine for RunsWithIo {
    fn step(
        &self,
        _registers: &mut RegisterBank,
        _mem: &MemoryHierarchy,
        _l1: &mut Cache,
        pcb: &mut Pcb,
    ) -> EngineOutcome {
        thread::sleep(self.per_instruction);
        let index = pcb.counters.pipeline_cycles;
        if index == self.io_at && pcb.counters.io_cycles == 0 {
            EngineOutcome::IoRequest {
                device: self.device,
                cost: self.cost,
            }
        } else if index + 1 >= self.total {
            EngineOutcome::ProgramEnd
        } else {
            EngineOutcome::Continued
        }
    }
}

fn pcb(pid: u64, priority: i32, estimated_job_size: u64) -> Pcb {
    Pcb::new(
        pid,
        format!("p{pid}"),
        priority,
        estimated_job_size,
        0,
        0,
        MemoryWeights::default(),
    )
}

fn base_config(cores: usize, policy: PolicyKind, quantum: Option<u32>) -> Config {
    Config {
        cores,
        quantum,
        policy,
        cache: CacheConfig::default(),
        memory: MemoryConfig {
            main_words: 256,
            secondary_words: 0,
        },
        weights: MemoryWeights::default(),
        cycle_budget: None,
    }
}

/// Drives `sched` until `all_finished()` or `max_ticks` is reached,
/// sleeping briefly between ticks so dispatched workers get wall-clock time
/// to make progress between scheduler-loop iterations.
fn run_to_completion(sched: &mut SchedulerCore, max_ticks: u32) {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut ticks = 0;
    while !sched.all_finished() && ticks < max_ticks && Instant::now() < deadline {
        sched.tick().unwrap();
        thread::sleep(Duration::from_millis(2));
        ticks += 1;
    }
    assert!(sched.all_finished(), "scenario did not converge within {max_ticks} ticks");
}

#[test]
fn e1_round_robin_keeps_identical_programs_roughly_fair() {
    let config = base_config(2, PolicyKind::RoundRobin, Some(100));
    let engine: Arc<dyn InstructionEngine> = Arc::new(RunsForJobSize {
        per_instruction: Duration::from_micros(20),
    });
    let mut sched = SchedulerCore::new(&config, engine);

    for pid in 1..=4 {
        sched.admit(pcb(pid, 0, 1000)).unwrap();
    }

    run_to_completion(&mut sched, 20_000);

    let stats = sched.statistics();
    assert_eq!(stats.finished_count, 4);
    assert_eq!(stats.failed_count, 0);
    assert!(stats.context_switches >= 9 * 4 / 2);
}

#[test]
fn e2_sjn_dispatches_shortest_job_first() {
    let config = base_config(1, PolicyKind::Sjn, None);
    let engine: Arc<dyn InstructionEngine> = Arc::new(RunsForJobSize {
        per_instruction: Duration::from_micros(5),
    });
    let mut sched = SchedulerCore::new(&config, engine);

    sched.admit(pcb(1, 0, 200)).unwrap();
    sched.admit(pcb(2, 0, 50)).unwrap();
    sched.admit(pcb(3, 0, 100)).unwrap();

    run_to_completion(&mut sched, 20_000);

    let stats = sched.statistics();
    assert_eq!(stats.finished_count, 3);

    let finish_order: Vec<u64> = sched
        .finished_processes()
        .iter()
        .map(|p| p.estimated_job_size)
        .collect();
    assert_eq!(finish_order, vec![50, 100, 200]);
}

#[test]
fn e3_preemptive_priority_lets_the_urgent_process_finish_first() {
    let config = base_config(1, PolicyKind::PriorityPreempt, Some(25));
    let engine: Arc<dyn InstructionEngine> = Arc::new(RunsForJobSize {
        per_instruction: Duration::from_micros(50),
    });
    let mut sched = SchedulerCore::new(&config, Arc::clone(&engine));

    sched.admit(pcb(1, 1, 500)).unwrap();

    // Let the low-priority process get underway before the urgent one
    // arrives, mirroring the "admit P2 at t=100" scenario.
    for _ in 0..30 {
        sched.tick().unwrap();
        thread::sleep(Duration::from_millis(2));
    }
    sched.admit(pcb(2, 10, 50)).unwrap();

    run_to_completion(&mut sched, 40_000);

    let stats = sched.statistics();
    assert_eq!(stats.finished_count, 2);
    assert_eq!(stats.failed_count, 0);

    // P2 (priority 10) preempts P1 and must finish first; P1 only resumes
    // and finishes afterward.
    let finish_order: Vec<u64> = sched.finished_processes().iter().map(|p| p.pid).collect();
    assert_eq!(finish_order, vec![2, 1]);
}

#[test]
fn e4_io_block_returns_to_ready_then_completes() {
    let config = base_config(1, PolicyKind::Fcfs, None);
    let engine: Arc<dyn InstructionEngine> = Arc::new(RunsWithIo {
        total: 60,
        io_at: 50,
        device: 0,
        cost: 100,
        per_instruction: Duration::from_micros(5),
    });
    let mut sched = SchedulerCore::new(&config, engine);

    sched.admit(pcb(1, 0, 60)).unwrap();

    run_to_completion(&mut sched, 20_000);

    let stats = sched.statistics();
    assert_eq!(stats.finished_count, 1);

    let finished = sched.finished_processes();
    assert_eq!(finished.len(), 1);
    assert!(finished[0].counters.io_cycles >= 100);
}
