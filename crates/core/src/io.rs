//! The I/O manager: holds blocked processes for a device-cost duration
//! before returning them to the ready queue.
//!
//! No device contention is modeled — every blocked [`Pcb`] ticks down
//! independently of every other, mirroring the one-`advance()`-per-tick
//! cost-decrement the originating scheduler used for its I/O subsystem.

use crate::process::Pcb;

struct Request {
    pcb: Pcb,
    device: u32,
    remaining: u64,
}

/// Tracks processes blocked on simulated I/O.
#[derive(Debug, Default)]
pub struct IoManager {
    active: Vec<Request>,
}

impl IoManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a blocked PCB for `cost` cycles of simulated service on
    /// `device`. The PCB's I/O counter accrues via [`Self::advance`].
    pub fn submit(&mut self, pcb: Pcb, device: u32, cost: u64) {
        self.active.push(Request {
            pcb,
            device,
            remaining: cost,
        });
    }

    /// Decrements every active request's remaining cycles by one, and
    /// returns the PCBs whose requests have just completed, ready state
    /// restored, in FIFO order among requests of equal original cost.
    pub fn advance(&mut self) -> Vec<Pcb> {
        let mut done = Vec::new();
        let mut still_active = Vec::with_capacity(self.active.len());
        for mut req in self.active.drain(..) {
            req.pcb.counters.io_cycles = req.pcb.counters.io_cycles.saturating_add(1);
            req.remaining = req.remaining.saturating_sub(1);
            if req.remaining == 0 {
                done.push(req.pcb);
            } else {
                still_active.push(req);
            }
        }
        self.active = still_active;
        done
    }

    /// True iff no process is currently blocked on I/O.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of processes currently blocked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// True iff [`Self::len`] is zero — identical to [`Self::is_idle`],
    /// provided for the `len`/`is_empty` convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryWeights;
    use crate::process::Pcb;

    fn pcb(pid: u64) -> Pcb {
        Pcb::new(pid, format!("p{pid}"), 0, 1, 0, 0, MemoryWeights::default())
    }

    #[test]
    fn idle_with_no_requests() {
        let mgr = IoManager::new();
        assert!(mgr.is_idle());
    }

    #[test]
    fn request_completes_after_cost_ticks() {
        let mut mgr = IoManager::new();
        mgr.submit(pcb(1), 0, 3);
        assert!(mgr.advance().is_empty());
        assert!(mgr.advance().is_empty());
        let done = mgr.advance();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].pid, 1);
        assert_eq!(done[0].counters.io_cycles, 3);
        assert!(mgr.is_idle());
    }

    #[test]
    fn independent_requests_complete_in_cost_order() {
        let mut mgr = IoManager::new();
        mgr.submit(pcb(1), 0, 2);
        mgr.submit(pcb(2), 0, 1);
        let first = mgr.advance();
        assert_eq!(first.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![2]);
        let second = mgr.advance();
        assert_eq!(second.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn fifo_among_equal_cost_requests() {
        let mut mgr = IoManager::new();
        mgr.submit(pcb(1), 0, 1);
        mgr.submit(pcb(2), 0, 1);
        mgr.submit(pcb(3), 0, 1);
        let done = mgr.advance();
        assert_eq!(done.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
