//! Ready-queue ordering and quantum/preemption rules, one per scheduling
//! policy, behind a single [`Policy`] trait so [`super::SchedulerCore`]
//! never special-cases a policy by name.

use std::collections::VecDeque;

use crate::config::PolicyKind;
use crate::core_unit::Core;
use crate::process::Pcb;

/// The policy-specific half of the scheduling contract: how the ready
/// queue orders its members, what quantum a dispatch gets, and whether a
/// running core should be asked to yield early.
pub trait Policy: std::fmt::Debug + Send {
    /// Inserts `pcb` into `ready`, preserving the policy's ordering
    /// invariant. Ties are broken by leaving `pcb` after any existing
    /// entries it compares equal to, which keeps FIFO-by-enqueue-time among
    /// ties for every policy.
    fn insert_ready(&self, ready: &mut VecDeque<Pcb>, pcb: Pcb);

    /// The quantum to stamp on `pcb` immediately before dispatch.
    /// `configured` is the scheduler's configured quantum (`None` means
    /// unbounded, including via `--non-preemptive`).
    fn quantum_for(&self, configured: Option<u32>) -> Option<u32>;

    /// Called once per tick, after reap/unblock and before dispatch. Only
    /// the preemptive-priority policy does anything here; every other
    /// policy is a no-op.
    fn maybe_preempt(&self, ready_head: Option<&Pcb>, cores: &mut [Core]);
}

/// Inserts `pcb` at the first position whose existing entry fails
/// `higher_priority_goes_first`, i.e. the first strictly-worse entry —
/// preserving FIFO order among entries the comparator treats as equal.
fn insert_by<F>(ready: &mut VecDeque<Pcb>, pcb: Pcb, better: F)
where
    F: Fn(&Pcb, &Pcb) -> bool,
{
    let pos = ready.iter().position(|existing| !better(existing, &pcb));
    match pos {
        Some(i) => ready.insert(i, pcb),
        None => ready.push_back(pcb),
    }
}

/// First-Come, First-Served: FIFO on admission time, runs to completion.
#[derive(Debug, Default)]
pub struct Fcfs;

impl Policy for Fcfs {
    fn insert_ready(&self, ready: &mut VecDeque<Pcb>, pcb: Pcb) {
        ready.push_back(pcb);
    }

    fn quantum_for(&self, _configured: Option<u32>) -> Option<u32> {
        None
    }

    fn maybe_preempt(&self, _ready_head: Option<&Pcb>, _cores: &mut [Core]) {}
}

/// Shortest Job Next: ascending `estimated_job_size` at admission time,
/// runs to completion.
#[derive(Debug, Default)]
pub struct Sjn;

impl Policy for Sjn {
    fn insert_ready(&self, ready: &mut VecDeque<Pcb>, pcb: Pcb) {
        insert_by(ready, pcb, |a, b| a.estimated_job_size <= b.estimated_job_size);
    }

    fn quantum_for(&self, _configured: Option<u32>) -> Option<u32> {
        None
    }

    fn maybe_preempt(&self, _ready_head: Option<&Pcb>, _cores: &mut [Core]) {}
}

/// Non-preemptive Priority: descending `priority`, FIFO among ties, runs
/// to completion.
#[derive(Debug, Default)]
pub struct Priority;

impl Policy for Priority {
    fn insert_ready(&self, ready: &mut VecDeque<Pcb>, pcb: Pcb) {
        insert_by(ready, pcb, |a, b| a.priority >= b.priority);
    }

    fn quantum_for(&self, _configured: Option<u32>) -> Option<u32> {
        None
    }

    fn maybe_preempt(&self, _ready_head: Option<&Pcb>, _cores: &mut [Core]) {}
}

/// Round-Robin: FIFO on re-enqueue time, configured quantum, preempts at
/// quantum expiry only (no early preemption here — that's `core_unit`'s
/// quantum-exhaustion path, not this policy's `maybe_preempt`).
#[derive(Debug, Default)]
pub struct RoundRobin;

impl Policy for RoundRobin {
    fn insert_ready(&self, ready: &mut VecDeque<Pcb>, pcb: Pcb) {
        ready.push_back(pcb);
    }

    fn quantum_for(&self, configured: Option<u32>) -> Option<u32> {
        configured
    }

    fn maybe_preempt(&self, _ready_head: Option<&Pcb>, _cores: &mut [Core]) {}
}

/// Preemptive Priority: descending `priority`, FIFO among ties, configured
/// quantum, and early preemption whenever the ready head strictly outranks
/// a running core.
#[derive(Debug, Default)]
pub struct PriorityPreempt;

impl Policy for PriorityPreempt {
    fn insert_ready(&self, ready: &mut VecDeque<Pcb>, pcb: Pcb) {
        insert_by(ready, pcb, |a, b| a.priority >= b.priority);
    }

    fn quantum_for(&self, configured: Option<u32>) -> Option<u32> {
        configured
    }

    fn maybe_preempt(&self, ready_head: Option<&Pcb>, cores: &mut [Core]) {
        let Some(head) = ready_head else { return };
        for core in cores.iter() {
            if let Some(running) = core.current_pcb() {
                if head.priority > running.priority {
                    core.request_preempt();
                }
            }
        }
    }
}

/// Builds the [`Policy`] implementation for a configured [`PolicyKind`].
#[must_use]
pub fn make_policy(kind: PolicyKind) -> Box<dyn Policy> {
    match kind {
        PolicyKind::Fcfs => Box::new(Fcfs),
        PolicyKind::Sjn => Box::new(Sjn),
        PolicyKind::RoundRobin => Box::new(RoundRobin),
        PolicyKind::Priority => Box::new(Priority),
        PolicyKind::PriorityPreempt => Box::new(PriorityPreempt),
    }
}
