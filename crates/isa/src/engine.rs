//! The reference `InstructionEngine`: fetch, decode, execute.
//!
//! Mirrors the fetch→decode→execute→mem→writeback naming of the prior
//! implementation's `Core::executeInstruction`. A program's instruction
//! stream lives in the memory hierarchy at `[segment_base, segment_base +
//! segment_size)`, one word per instruction; `registers.pc` is an index
//! into that stream, not a byte address — [`ReferenceEngine::step`]
//! combines the two for every fetch.

use msim_core::engine::{EngineOutcome, InstructionEngine};
use msim_core::memory::{Cache, MemoryHierarchy};
use msim_core::process::{Pcb, RegisterBank};

use crate::decode::decode;
use crate::instruction::Instruction;

/// The reference MIPS-like decoder/executor described in `SPEC_FULL.md`
/// §4.7. Stateless: every dispatch may share the same instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceEngine;

impl ReferenceEngine {
    /// Creates a new reference engine. There is no configuration to carry.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// `base + offset`, computed in two's complement so a negative offset can
/// address below `base`.
fn effective_address(base: u64, offset: i32) -> u64 {
    (base as i64).wrapping_add(i64::from(offset)) as u64
}

impl InstructionEngine for ReferenceEngine {
    fn step(
        &self,
        registers: &mut RegisterBank,
        mem: &MemoryHierarchy,
        l1: &mut Cache,
        pcb: &mut Pcb,
    ) -> EngineOutcome {
        let fetch_addr = pcb.segment_base.wrapping_add(registers.pc);
        let word = match mem.read(fetch_addr, pcb, l1) {
            Ok(word) => word,
            Err(err) => return EngineOutcome::Exception(err.to_string()),
        };
        registers.pc = registers.pc.wrapping_add(1);

        match decode(word) {
            Instruction::Nop => EngineOutcome::Continued,

            Instruction::AddI { rd, rs, imm } => {
                let value = (registers.read(rs.into()) as i64).wrapping_add(i64::from(imm)) as u64;
                registers.write(rd.into(), value);
                EngineOutcome::Continued
            }
            Instruction::Add { rd, rs1, rs2 } => {
                let value = registers.read(rs1.into()).wrapping_add(registers.read(rs2.into()));
                registers.write(rd.into(), value);
                EngineOutcome::Continued
            }
            Instruction::Sub { rd, rs1, rs2 } => {
                let value = registers.read(rs1.into()).wrapping_sub(registers.read(rs2.into()));
                registers.write(rd.into(), value);
                EngineOutcome::Continued
            }
            Instruction::Mul { rd, rs1, rs2 } => {
                let value = registers.read(rs1.into()).wrapping_mul(registers.read(rs2.into()));
                registers.write(rd.into(), value);
                EngineOutcome::Continued
            }

            Instruction::Lw { rd, rs, offset } => {
                let addr = effective_address(registers.read(rs.into()), offset);
                match mem.read(addr, pcb, l1) {
                    Ok(value) => {
                        registers.write(rd.into(), value);
                        EngineOutcome::Continued
                    }
                    Err(err) => EngineOutcome::Exception(err.to_string()),
                }
            }
            Instruction::Sw { rs, rbase, offset } => {
                let addr = effective_address(registers.read(rbase.into()), offset);
                let value = registers.read(rs.into());
                match mem.write(addr, value, pcb, l1) {
                    Ok(()) => EngineOutcome::Continued,
                    Err(err) => EngineOutcome::Exception(err.to_string()),
                }
            }

            Instruction::Beq { rs1, rs2, offset } => {
                if registers.read(rs1.into()) == registers.read(rs2.into()) {
                    registers.pc = (registers.pc as i64).wrapping_add(i64::from(offset)) as u64;
                }
                EngineOutcome::Continued
            }
            Instruction::Bne { rs1, rs2, offset } => {
                if registers.read(rs1.into()) != registers.read(rs2.into()) {
                    registers.pc = (registers.pc as i64).wrapping_add(i64::from(offset)) as u64;
                }
                EngineOutcome::Continued
            }
            Instruction::J { target } => {
                registers.pc = u64::from(target);
                EngineOutcome::Continued
            }

            Instruction::Io { device, cost } => EngineOutcome::IoRequest {
                device,
                cost: u64::from(cost),
            },
            Instruction::Halt => EngineOutcome::ProgramEnd,
            Instruction::Illegal => EngineOutcome::Exception("illegal instruction".to_string()),
        }
    }
}
