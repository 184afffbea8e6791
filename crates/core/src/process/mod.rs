//! The Process Control Block and the register bank it owns.

/// Process Control Block: identity, state, counters, and timestamps.
pub mod pcb;
/// The general-purpose register bank a PCB lends to the instruction engine.
pub mod registers;

pub use pcb::{PcbCounters, PcbTimestamps, PendingIo, ProcessState};
pub use registers::RegisterBank;
pub use pcb::Pcb;
