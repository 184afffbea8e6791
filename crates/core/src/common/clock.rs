//! Single authoritative clock domain for all PCB timestamps.
//!
//! The prior implementation this runtime is descended from mixed a
//! nanosecond wall-clock with an ordinal simulation-tick counter in its
//! timing calculations. This crate keeps the two strictly separate: every
//! [`crate::process::Pcb`] timestamp is a wall-clock [`Instant`] snapshot
//! taken through [`SimClock`], and the scheduler's tick counter (see
//! [`crate::scheduler::SchedulerCore::cycle`]) is an independent `u64` used
//! only for idle accounting and throughput denominators.

use std::time::Instant;

/// A monotonic wall-clock shared by every timestamp a [`crate::process::Pcb`]
/// records.
///
/// Cloning a `SimClock` shares the same origin `Instant`, so nanosecond
/// offsets taken from different clones remain comparable.
#[derive(Debug, Clone)]
pub struct SimClock {
    origin: Instant,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    /// Starts a new clock domain at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Nanoseconds elapsed since this clock's origin.
    #[must_use]
    pub fn now_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}
