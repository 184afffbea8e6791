//! The scheduler: admits processes, drives one tick at a time, and reports
//! aggregate statistics. A single [`SchedulerCore`] type implements the
//! whole tick algorithm; only ready-queue ordering, quantum selection, and
//! early preemption vary by [`policy::Policy`].

pub mod policy;

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::common::{SimClock, SimError};
use crate::config::Config;
use crate::core_unit::Core;
use crate::engine::InstructionEngine;
use crate::io::IoManager;
use crate::memory::{Cache, MemoryHierarchy};
use crate::process::{Pcb, ProcessState};
use crate::stats::{self, Statistics};

/// The scheduler: owns every core, the shared memory hierarchy, the I/O
/// manager, and the ready queue; drives the run via repeated [`Self::tick`]
/// calls from a host loop.
#[derive(Debug)]
pub struct SchedulerCore {
    policy: Box<dyn policy::Policy>,
    configured_quantum: Option<u32>,
    cores: Vec<Core>,
    memory: Arc<MemoryHierarchy>,
    io: IoManager,
    ready: VecDeque<Pcb>,
    finished: Vec<Pcb>,
    clock: SimClock,
    ticks: u64,
    total_count: u64,
    context_switches: u64,
    shutdown: bool,
}

impl SchedulerCore {
    /// Builds a scheduler from `config`, constructing one [`Core`] per
    /// `config.cores`, each with its own L1 cache, sharing one
    /// [`MemoryHierarchy`] and the given `engine`.
    #[must_use]
    pub fn new(config: &Config, engine: Arc<dyn InstructionEngine>) -> Self {
        let memory = Arc::new(MemoryHierarchy::new(&config.memory));
        let cores = (0..config.cores)
            .map(|id| {
                Core::new(
                    id,
                    Cache::new(&config.cache),
                    Arc::clone(&memory),
                    Arc::clone(&engine),
                )
            })
            .collect();
        Self {
            policy: policy::make_policy(config.policy),
            configured_quantum: config.quantum,
            cores,
            memory,
            io: IoManager::new(),
            ready: VecDeque::new(),
            finished: Vec::new(),
            clock: SimClock::new(),
            ticks: 0,
            total_count: 0,
            context_switches: 0,
            shutdown: false,
        }
    }

    /// The shared memory hierarchy, for loaders to write program images
    /// into before admission.
    #[must_use]
    pub fn memory(&self) -> &Arc<MemoryHierarchy> {
        &self.memory
    }

    /// Number of virtual cores.
    #[must_use]
    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    /// Admits `pcb`: stamps `arrival`/`ready_enqueue` if unset, counts it
    /// toward `total_count`, and inserts it into the ready queue per the
    /// policy's ordering.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ShutdownInProgress`] if called after
    /// [`Self::shutdown`]; the process is not admitted.
    pub fn admit(&mut self, mut pcb: Pcb) -> Result<(), SimError> {
        if self.shutdown {
            return Err(SimError::ShutdownInProgress);
        }
        let now = self.clock.now_nanos();
        pcb.timestamps.arrival.get_or_insert(now);
        pcb.timestamps.ready_enqueue = Some(now);
        pcb.state = ProcessState::Ready;
        self.total_count += 1;
        debug!(pid = pcb.pid, "admitted");
        self.policy.insert_ready(&mut self.ready, pcb);
        Ok(())
    }

    /// True iff every admitted process has reached a terminal state and no
    /// core or the I/O manager holds anything in flight.
    #[must_use]
    pub fn all_finished(&self) -> bool {
        self.ready.is_empty()
            && self.io.is_idle()
            && self.cores.iter().all(Core::is_idle)
            && self.finished.len() as u64 == self.total_count
    }

    /// True iff at least one process has been admitted and the run has not
    /// yet reached [`Self::all_finished`].
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.total_count > 0 && !self.all_finished()
    }

    /// Runs one scheduling step: reap terminated/blocked/preempted cores,
    /// unblock completed I/O, check for early preemption, then dispatch
    /// ready processes onto idle cores.
    ///
    /// A no-op once [`Self::all_finished`] is true.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ShutdownInProgress`] if called after
    /// [`Self::shutdown`]. Returns [`SimError::PolicyViolation`] if a
    /// core's worker thread panicked.
    pub fn tick(&mut self) -> Result<(), SimError> {
        if self.shutdown {
            return Err(SimError::ShutdownInProgress);
        }
        if self.all_finished() {
            return Ok(());
        }
        self.ticks += 1;
        let now = self.clock.now_nanos();

        for core in &mut self.cores {
            if core.is_idle() {
                core.tick_idle();
            }
        }

        for core in &mut self.cores {
            if let Some(pcb) = core.reap()? {
                self.settle_reaped(pcb, now);
            }
        }

        for mut pcb in self.io.advance() {
            pcb.state = ProcessState::Ready;
            pcb.timestamps.ready_enqueue = Some(now);
            self.policy.insert_ready(&mut self.ready, pcb);
        }

        self.policy.maybe_preempt(self.ready.front(), &mut self.cores);

        while let Some(idx) = self.cores.iter().position(Core::is_idle) {
            let Some(mut pcb) = self.ready.pop_front() else {
                break;
            };
            pcb.leave_ready(now);
            pcb.quantum = self.policy.quantum_for(self.configured_quantum);
            self.context_switches += 1;
            self.cores[idx].dispatch(pcb, now);
        }

        Ok(())
    }

    /// Routes one just-reaped PCB to the ready queue, the I/O manager, or
    /// the finished list, depending on the state its worker left it in.
    fn settle_reaped(&mut self, mut pcb: Pcb, now: u64) {
        match pcb.state {
            ProcessState::Finished | ProcessState::Failed => {
                pcb.timestamps.finish.get_or_insert(now);
                self.finished.push(pcb);
            }
            ProcessState::Blocked => {
                if let Some(io) = pcb.pending_io.take() {
                    self.io.submit(pcb, io.device, io.cost);
                } else {
                    error!(pid = pcb.pid, "reaped Blocked with no pending_io; failing process");
                    pcb.state = ProcessState::Failed;
                    pcb.failure_reason = Some("blocked with no pending I/O request".to_string());
                    pcb.timestamps.finish = Some(now);
                    self.finished.push(pcb);
                }
            }
            ProcessState::Ready => {
                pcb.timestamps.ready_enqueue = Some(now);
                self.policy.insert_ready(&mut self.ready, pcb);
            }
            ProcessState::Running => {
                error!(pid = pcb.pid, "reaped a PCB still marked Running; failing process");
                pcb.state = ProcessState::Failed;
                pcb.failure_reason = Some("reaped while still Running".to_string());
                pcb.timestamps.finish = Some(now);
                self.finished.push(pcb);
            }
        }
    }

    /// Every process that has reached `Finished` or `Failed` so far, in the
    /// order each one was reaped. Exposed primarily for tests that need to
    /// assert finish order or per-process counters beyond the aggregates
    /// [`Self::statistics`] computes.
    #[must_use]
    pub fn finished_processes(&self) -> &[Pcb] {
        &self.finished
    }

    /// Computes [`Statistics`] from the finished list and every core's
    /// cycle counters. Valid at any time, including mid-run, though the
    /// numbers are only final once [`Self::all_finished`] holds.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        let cycles: Vec<(u64, u64)> = self
            .cores
            .iter()
            .map(|c| (c.busy_cycles(), c.idle_cycles()))
            .collect();
        stats::compute(&self.finished, self.context_switches, &cycles)
    }

    /// Signals every core to stop accepting dispatches, then repeatedly
    /// reaps until every core is idle, catching any PCB that finishes in
    /// the interim. Idempotent: a second call is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::PolicyViolation`] if a core's worker thread
    /// panicked during the drain.
    pub fn shutdown(&mut self) -> Result<(), SimError> {
        if self.shutdown {
            return Ok(());
        }
        for core in &mut self.cores {
            core.begin_stop();
        }
        loop {
            let mut any_busy = false;
            for core in &mut self.cores {
                if !core.is_idle() {
                    any_busy = true;
                    let now = self.clock.now_nanos();
                    if let Some(pcb) = core.reap()? {
                        self.settle_reaped(pcb, now);
                    }
                }
            }
            if !any_busy {
                break;
            }
            std::thread::yield_now();
        }
        self.shutdown = true;
        info!(finished = self.finished.len(), total = self.total_count, "scheduler shut down");
        Ok(())
    }
}
