//! A single virtual core: one private L1 cache plus one worker thread.
//!
//! A [`Core`] runs at most one [`Pcb`] at a time. The PCB and the core's
//! [`Cache`] are moved into the worker thread for the duration of a dispatch
//! and moved back out when the scheduler reaps it — there is never a second
//! handle to either while a dispatch is in flight, so the "at most one owner"
//! invariant spec.md assigns to a mutex is instead structural.
//!
//! What the worker needs concurrent, read-only visibility into — the
//! running PCB's pid and priority, for the preemptive-priority policy to
//! compare against the ready queue's head — is captured as a small `Copy`
//! snapshot in [`RunningInfo`] behind a per-core mutex, rather than handing
//! out access to the PCB itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::common::SimError;
use crate::engine::{EngineOutcome, InstructionEngine};
use crate::memory::{Cache, MemoryHierarchy};
use crate::process::{Pcb, ProcessState};

/// A core's coarse lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    /// No PCB assigned; ready to accept a dispatch.
    Idle,
    /// A worker thread is running a dispatched PCB.
    Busy,
    /// Shutdown has been requested; the core will not accept new dispatches.
    Stopping,
}

/// The read-only snapshot of a running PCB a worker publishes for other
/// threads to inspect without touching the PCB itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningInfo {
    /// The running process's id.
    pub pid: u64,
    /// The running process's static priority.
    pub priority: i32,
}

/// What a worker thread hands back across its `JoinHandle` when it returns.
struct WorkerResult {
    pcb: Pcb,
    cache: Cache,
    executed: u64,
}

struct RunningWorker {
    info: RunningInfo,
    preempt: Arc<AtomicBool>,
    join: JoinHandle<WorkerResult>,
}

/// One virtual core: a private L1 cache plus a worker thread that runs
/// dispatched processes against a shared [`MemoryHierarchy`] and a shared
/// [`InstructionEngine`].
#[derive(Debug)]
pub struct Core {
    id: usize,
    state: CoreState,
    cache: Option<Cache>,
    handle: Mutex<Option<RunningWorker>>,
    busy_cycles: u64,
    idle_cycles: u64,
    memory: Arc<MemoryHierarchy>,
    engine: Arc<dyn InstructionEngine>,
}

impl Core {
    /// Creates an idle core with a fresh L1 cache.
    #[must_use]
    pub fn new(
        id: usize,
        cache: Cache,
        memory: Arc<MemoryHierarchy>,
        engine: Arc<dyn InstructionEngine>,
    ) -> Self {
        Self {
            id,
            state: CoreState::Idle,
            cache: Some(cache),
            handle: Mutex::new(None),
            busy_cycles: 0,
            idle_cycles: 0,
            memory,
            engine,
        }
    }

    /// This core's id, the value stored in `Pcb::assigned_core`.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// True iff the core is `Idle` and can accept a dispatch.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.state, CoreState::Idle)
    }

    /// Cumulative cycles spent running a dispatched PCB.
    #[must_use]
    pub fn busy_cycles(&self) -> u64 {
        self.busy_cycles
    }

    /// Cumulative cycles spent with no PCB assigned.
    #[must_use]
    pub fn idle_cycles(&self) -> u64 {
        self.idle_cycles
    }

    /// Counts one idle cycle. The scheduler calls this once per tick for
    /// every core observed idle at the start of that tick.
    pub fn tick_idle(&mut self) {
        self.idle_cycles = self.idle_cycles.saturating_add(1);
    }

    /// Reads the running PCB's `(pid, priority)` under the per-core mutex,
    /// or `None` if the core is not currently running anything.
    ///
    /// Preemptive-priority dispatch must go through this accessor rather
    /// than any other path, to avoid a torn read of the running PCB.
    #[must_use]
    pub fn current_pcb(&self) -> Option<RunningInfo> {
        self.handle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_ref()
            .map(|w| w.info)
    }

    /// Requests that the worker yield at its next instruction boundary,
    /// exactly as if its quantum had expired. A no-op if the core is idle.
    pub fn request_preempt(&self) {
        if let Some(w) = self
            .handle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_ref()
        {
            w.preempt.store(true, Ordering::Relaxed);
        }
    }

    /// Dispatches `pcb` to this core for up to `pcb.quantum` instructions.
    ///
    /// # Panics
    ///
    /// Panics if called while the core is not `Idle` — the scheduler must
    /// check [`Self::is_idle`] first; this is a programming-contract
    /// violation, not a recoverable runtime condition.
    pub fn dispatch(&mut self, mut pcb: Pcb, now_nanos: u64) {
        assert!(
            self.is_idle(),
            "Core::dispatch called on a non-idle core (id={})",
            self.id
        );

        pcb.state = ProcessState::Running;
        pcb.assigned_core = Some(self.id);
        if pcb.timestamps.start.is_none() {
            pcb.timestamps.start = Some(now_nanos);
        }

        let info = RunningInfo {
            pid: pcb.pid,
            priority: pcb.priority,
        };
        let preempt = Arc::new(AtomicBool::new(false));
        let cache = self.cache.take().unwrap_or_else(|| {
            // Reaching here means a previous worker never returned its
            // cache, which is a Core bookkeeping bug, not a user error.
            unreachable!("Core {} dispatched with no cache to hand to the worker", self.id)
        });
        let memory = Arc::clone(&self.memory);
        let engine = Arc::clone(&self.engine);
        let worker_preempt = Arc::clone(&preempt);

        let join = std::thread::spawn(move || {
            run_worker(pcb, cache, &memory, engine.as_ref(), &worker_preempt)
        });

        self.handle = Mutex::new(Some(RunningWorker {
            info,
            preempt,
            join,
        }));
        self.state = CoreState::Busy;
    }

    /// If the core's worker has finished, joins it, restores this core's
    /// cache, transitions the core back to `Idle`, and returns the
    /// completed PCB. Returns `None` if the core is idle or its worker is
    /// still running.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::PolicyViolation`] if the worker thread panicked;
    /// the PCB it was running is unrecoverable in that case.
    pub fn reap(&mut self) -> Result<Option<Pcb>, SimError> {
        let finished = {
            let guard = self
                .handle
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            matches!(guard.as_ref(), Some(w) if w.join.is_finished())
        };
        if !finished {
            return Ok(None);
        }

        let worker = self
            .handle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        let Some(worker) = worker else {
            return Ok(None);
        };

        match worker.join.join() {
            Ok(WorkerResult { pcb, cache, executed }) => {
                self.cache = Some(cache);
                self.busy_cycles = self.busy_cycles.saturating_add(executed);
                self.state = CoreState::Idle;
                debug!(core = self.id, pid = pcb.pid, state = ?pcb.state, "reaped");
                Ok(Some(pcb))
            }
            Err(panic) => {
                warn!(core = self.id, "worker thread panicked during dispatch");
                self.state = CoreState::Idle;
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "worker thread panicked".to_string());
                Err(SimError::PolicyViolation(reason))
            }
        }
    }

    /// Signals the core to stop accepting new dispatches. Does not
    /// interrupt a worker already in flight — it will still run to its
    /// next terminal condition or quantum boundary and must be reaped
    /// normally afterward.
    pub fn begin_stop(&mut self) {
        self.state = CoreState::Stopping;
    }
}

/// The worker thread body: runs `pcb` for up to `pcb.quantum` instructions
/// (or until a terminal condition or a preemption request), then returns
/// the PCB and the cache for the `Core` to reclaim.
fn run_worker(
    mut pcb: Pcb,
    mut cache: Cache,
    memory: &MemoryHierarchy,
    engine: &dyn InstructionEngine,
    preempt: &AtomicBool,
) -> WorkerResult {
    let budget = pcb.quantum;
    let mut executed: u32 = 0;

    loop {
        if let Some(q) = budget {
            if executed >= q {
                pcb.state = ProcessState::Ready;
                pcb.counters.context_switches = pcb.counters.context_switches.saturating_add(1);
                break;
            }
        }
        if preempt.load(Ordering::Relaxed) {
            pcb.state = ProcessState::Ready;
            pcb.counters.context_switches = pcb.counters.context_switches.saturating_add(1);
            break;
        }

        let mut registers = pcb.registers;
        let outcome = engine.step(&mut registers, memory, &mut cache, &mut pcb);
        pcb.registers = registers;
        pcb.counters.pipeline_cycles = pcb.counters.pipeline_cycles.saturating_add(1);
        executed += 1;

        match outcome {
            EngineOutcome::Continued => {}
            EngineOutcome::ProgramEnd => {
                pcb.state = ProcessState::Finished;
                break;
            }
            EngineOutcome::IoRequest { device, cost } => {
                pcb.state = ProcessState::Blocked;
                pcb.pending_io = Some(crate::process::PendingIo { device, cost });
                break;
            }
            EngineOutcome::Exception(reason) => {
                pcb.state = ProcessState::Failed;
                pcb.failure_reason = Some(reason);
                break;
            }
        }
    }

    WorkerResult {
        pcb,
        cache,
        executed: u64::from(executed),
    }
}
