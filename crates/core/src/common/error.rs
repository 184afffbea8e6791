//! Scheduler-runtime error types.
//!
//! Two error families exist at different boundaries: [`SimError`] for faults
//! that the scheduler itself must react to (a bad address, a broken
//! invariant), and per-process terminal state, which is not an error at all
//! — a `Failed` [`crate::process::Pcb`] is a normal outcome recorded on the
//! process, never propagated as a [`SimError`].

use thiserror::Error;

/// Errors surfaced by the scheduling and memory runtime.
///
/// Only [`SimError::PolicyViolation`] is fatal to the scheduler itself.
/// [`SimError::AddressOutOfRange`] and [`SimError::EngineException`] are
/// caught at the [`crate::core_unit::Core`] boundary and converted into a
/// `Failed` process instead of propagating.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Invalid `cores`, `quantum`, or `policy` configuration at construction.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A memory access fell outside `[0, main_words + secondary_words)`.
    #[error("address {addr:#x} out of range (limit {limit:#x})")]
    AddressOutOfRange {
        /// The address that was accessed.
        addr: u64,
        /// The first address not backed by main or secondary storage.
        limit: u64,
    },

    /// The instruction engine reported a fault while executing a process.
    #[error("engine exception: {0}")]
    EngineException(String),

    /// A runtime invariant was broken (e.g. two cores claimed the same PCB,
    /// or a core reported idle while still holding one).
    ///
    /// Unlike the other variants this is fatal: the scheduler must
    /// `shutdown()` and re-raise rather than continue ticking.
    #[error("scheduler invariant violated: {0}")]
    PolicyViolation(String),

    /// `admit` or `tick` was invoked after `shutdown()`. Not fatal — the
    /// call is a no-op and the scheduler logs a warning.
    #[error("shutdown already in progress")]
    ShutdownInProgress,
}
