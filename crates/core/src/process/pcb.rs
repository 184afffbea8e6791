//! The Process Control Block: the unit of scheduling.
//!
//! A [`Pcb`] is always owned by exactly one of: a scheduler's ready queue,
//! its blocked list, its finished list, or a [`crate::core_unit::Core`]'s
//! worker thread (moved in for the duration of a dispatch and moved back out
//! on reap). Rust's ownership rules make the "at most one owner at a time"
//! invariant the source system enforced with manual locking and atomics
//! structurally impossible to violate — there is no second handle to race
//! against. See `DESIGN.md` for the rationale.

use crate::config::MemoryWeights;
use crate::process::registers::RegisterBank;

/// Execution state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Waiting in the scheduler's ready queue.
    Ready,
    /// Dispatched to a core and currently executing.
    Running,
    /// Waiting on the I/O manager.
    Blocked,
    /// Ran to completion (`Halt`/program end).
    Finished,
    /// Terminated by an engine exception or an out-of-range address.
    Failed,
}

impl ProcessState {
    /// True for the two terminal states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

/// A pending I/O request recorded on a [`Pcb`] by the worker that ran it,
/// for the scheduler to read at reap time and hand to the I/O manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingIo {
    /// Device identifier, opaque to the runtime.
    pub device: u32,
    /// Device service cost, in cycles.
    pub cost: u64,
}

/// Monotonic performance counters accumulated over a process's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PcbCounters {
    /// Instructions retired across every dispatch.
    pub pipeline_cycles: u64,
    /// Total accesses through the memory hierarchy (reads + writes).
    pub accesses_total: u64,
    /// Read accesses.
    pub reads: u64,
    /// Write accesses.
    pub writes: u64,
    /// L1 hits.
    pub cache_hits: u64,
    /// L1 misses.
    pub cache_misses: u64,
    /// Accesses that reached main memory.
    pub primary_accesses: u64,
    /// Accesses that reached secondary storage.
    pub secondary_accesses: u64,
    /// Dispatch-boundary context switches (quantum expiry or preemption).
    pub context_switches: u64,
    /// Cycles spent blocked on I/O.
    pub io_cycles: u64,
    /// Cycles charged by the memory hierarchy's per-access-level weights
    /// (`weights.cache`/`primary`/`secondary`), accumulated on every access
    /// regardless of whether it hit or missed the L1.
    pub memory_cycles: u64,
}

/// Wall-clock timestamps captured from a single [`crate::common::SimClock`]
/// domain, in nanoseconds since that clock's origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PcbTimestamps {
    /// When the process was admitted.
    pub arrival: Option<u64>,
    /// When the process was first dispatched to a core.
    pub start: Option<u64>,
    /// When the process reached a terminal state.
    pub finish: Option<u64>,
    /// When the process most recently entered the ready queue (used to
    /// accumulate `wait_total` on its next departure from ready).
    pub ready_enqueue: Option<u64>,
}

/// The Process Control Block.
#[derive(Debug, Clone)]
pub struct Pcb {
    /// Unique process identifier.
    pub pid: u64,
    /// Human-readable name, for logs and reports.
    pub name: String,
    /// Static scheduling priority; higher is more urgent.
    pub priority: i32,
    /// Declared instruction-count estimate, consulted only by SJN ordering.
    pub estimated_job_size: u64,
    /// This dispatch's instruction budget. `None` means run to
    /// completion/block. Set by the scheduler immediately before each
    /// `Core::dispatch` call.
    pub quantum: Option<u32>,
    /// Address range `[segment_base, segment_base + segment_size)` the
    /// program was loaded into.
    pub segment_base: u64,
    /// Size in bytes of the loaded program image.
    pub segment_size: u64,
    /// Per-access-level cost weights charged against this process's
    /// `pipeline_cycles` by the memory hierarchy.
    pub weights: MemoryWeights,
    /// General-purpose registers and program counter.
    pub registers: RegisterBank,
    /// Current execution state.
    pub state: ProcessState,
    /// Core id this process is assigned to, if `state == Running`.
    pub assigned_core: Option<usize>,
    /// Set by a worker when the engine reports an I/O request; read and
    /// cleared by the scheduler at reap time.
    pub pending_io: Option<PendingIo>,
    /// Set by a worker when the engine reports an exception, or by the
    /// scheduler on an address fault; surfaced via the terminal `Failed`
    /// state rather than propagated as an error.
    pub failure_reason: Option<String>,
    /// Lifetime performance counters.
    pub counters: PcbCounters,
    /// Scheduling timestamps.
    pub timestamps: PcbTimestamps,
    /// Cumulative time spent in the ready queue, accumulated across every
    /// ready interval (a process may be ready, run, block, and become ready
    /// again several times before finishing).
    pub wait_total_nanos: u64,
}

impl Pcb {
    /// Creates a new, not-yet-admitted process in the `Ready` state.
    ///
    /// `admit` (see [`crate::scheduler::SchedulerCore::admit`]) is
    /// responsible for stamping `arrival`/`ready_enqueue` and inserting the
    /// PCB into a ready queue; this constructor only establishes identity
    /// and static configuration.
    #[must_use]
    pub fn new(
        pid: u64,
        name: impl Into<String>,
        priority: i32,
        estimated_job_size: u64,
        segment_base: u64,
        segment_size: u64,
        weights: MemoryWeights,
    ) -> Self {
        Self {
            pid,
            name: name.into(),
            priority,
            estimated_job_size,
            quantum: None,
            segment_base,
            segment_size,
            weights,
            registers: RegisterBank::new(),
            state: ProcessState::Ready,
            assigned_core: None,
            pending_io: None,
            failure_reason: None,
            counters: PcbCounters::default(),
            timestamps: PcbTimestamps::default(),
            wait_total_nanos: 0,
        }
    }

    /// `finish - arrival`, or `None` if either timestamp is unset.
    #[must_use]
    pub fn turnaround_nanos(&self) -> Option<u64> {
        Some(self.timestamps.finish?.saturating_sub(self.timestamps.arrival?))
    }

    /// `start - arrival`, or `None` if either timestamp is unset.
    #[must_use]
    pub fn response_nanos(&self) -> Option<u64> {
        Some(self.timestamps.start?.saturating_sub(self.timestamps.arrival?))
    }

    /// Accumulates time spent waiting in the ready queue between
    /// `ready_enqueue` and `now`, then clears `ready_enqueue`.
    pub fn leave_ready(&mut self, now_nanos: u64) {
        if let Some(enqueued) = self.timestamps.ready_enqueue.take() {
            self.wait_total_nanos = self
                .wait_total_nanos
                .saturating_add(now_nanos.saturating_sub(enqueued));
        }
    }
}
