//! The instruction-engine contract.
//!
//! The core depends only on [`InstructionEngine`]; it never inspects a
//! [`RegisterBank`]'s contents or an instruction's encoding. A concrete
//! engine (the `msim-isa` crate's reference MIPS-like decoder, or a mock in
//! tests) is handed to a [`crate::core_unit::Core`] at construction as
//! `Arc<dyn InstructionEngine>` and shared by every core's worker thread.

use crate::memory::{Cache, MemoryHierarchy};
use crate::process::{Pcb, RegisterBank};

/// One instruction's effect on control flow, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    /// The instruction executed normally; dispatch continues.
    Continued,
    /// The program reached its end (e.g. a `Halt`).
    ProgramEnd,
    /// The program requested a blocking I/O operation.
    IoRequest {
        /// Device identifier, opaque to the runtime.
        device: u32,
        /// Device service cost, in cycles.
        cost: u64,
    },
    /// The instruction faulted (illegal opcode, divide by zero, ...).
    Exception(String),
}

/// A black-box instruction engine: given a register bank and the memory
/// hierarchy, advance one instruction and report what happened.
///
/// Implementations must be deterministic: the same register bank, memory
/// contents, and instruction stream always produce the same outcome and the
/// same register/memory effects. Implementations must be `Send + Sync`
/// because a single engine instance is shared by every core's worker
/// thread.
pub trait InstructionEngine: Send + Sync {
    /// Fetches, decodes, and executes one instruction for `pcb`, reading and
    /// writing memory through `mem`/`l1` as needed.
    ///
    /// `registers` (lent separately so the caller controls exactly when the
    /// PCB's persistent copy is written back) holds the live register file;
    /// `pcb` is passed mutably because every `mem.read`/`mem.write` call
    /// charges access counters and weighted cycle cost onto it. Beyond
    /// those memory-hierarchy side effects, an implementation must not
    /// otherwise touch `pcb`'s scheduling fields (state, timestamps) — the
    /// caller (`core_unit::run_worker`) owns those.
    fn step(
        &self,
        registers: &mut RegisterBank,
        mem: &MemoryHierarchy,
        l1: &mut Cache,
        pcb: &mut Pcb,
    ) -> EngineOutcome;
}
