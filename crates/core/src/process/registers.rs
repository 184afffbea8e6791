//! The register bank a [`crate::process::Pcb`] owns and lends to the
//! instruction engine.
//!
//! Its contents are opaque to the core and scheduler; only the instruction
//! engine (e.g. `msim-isa`) interprets register values.

/// Number of general-purpose registers. Register 0 is hardwired to zero,
/// matching the MIPS convention the reference engine takes its name from.
pub const GPR_COUNT: usize = 32;

/// A process's general-purpose registers and program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBank {
    gpr: [u64; GPR_COUNT],
    /// Index into the process's instruction stream of the next instruction
    /// to fetch.
    pub pc: u64,
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBank {
    /// Creates a zeroed register bank with `pc = 0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gpr: [0; GPR_COUNT],
            pc: 0,
        }
    }

    /// Reads register `idx`. Out-of-range indices read as zero.
    #[must_use]
    pub fn read(&self, idx: usize) -> u64 {
        self.gpr.get(idx).copied().unwrap_or(0)
    }

    /// Writes register `idx`. Writes to register 0 and out-of-range indices
    /// are silently discarded.
    pub fn write(&mut self, idx: usize, value: u64) {
        if idx == 0 {
            return;
        }
        if let Some(slot) = self.gpr.get_mut(idx) {
            *slot = value;
        }
    }
}
