//! Decodes a raw instruction word into an [`Instruction`].

use crate::instruction::{opcodes, Instruction, InstructionBits};

/// Decodes `word` into an [`Instruction`]. Never fails: an opcode byte
/// outside the table decodes to [`Instruction::Illegal`], which the engine
/// turns into an exception at execute time.
#[must_use]
pub fn decode(word: u64) -> Instruction {
    let rd = word.rd();
    let rs1 = word.rs1();
    let rs2 = word.rs2();
    let imm = word.imm();

    match word.opcode() {
        opcodes::NOP => Instruction::Nop,
        opcodes::ADD_I => Instruction::AddI { rd, rs: rs1, imm },
        opcodes::ADD => Instruction::Add { rd, rs1, rs2 },
        opcodes::SUB => Instruction::Sub { rd, rs1, rs2 },
        opcodes::MUL => Instruction::Mul { rd, rs1, rs2 },
        opcodes::LW => Instruction::Lw { rd, rs: rs1, offset: imm },
        opcodes::SW => Instruction::Sw {
            rs: rd,
            rbase: rs1,
            offset: imm,
        },
        opcodes::BEQ => Instruction::Beq { rs1, rs2, offset: imm },
        opcodes::BNE => Instruction::Bne { rs1, rs2, offset: imm },
        opcodes::J => Instruction::J { target: word.imm_u() },
        opcodes::IO => Instruction::Io {
            device: u32::from(rd),
            cost: word.imm_u(),
        },
        opcodes::HALT => Instruction::Halt,
        _ => Instruction::Illegal,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::instruction::encode;

    #[test]
    fn decodes_add_i() {
        let word = encode(opcodes::ADD_I, 1, 2, 0, 42);
        assert_eq!(
            decode(word),
            Instruction::AddI {
                rd: 1,
                rs: 2,
                imm: 42
            }
        );
    }

    #[test]
    fn decodes_sw_with_src_in_the_rd_slot() {
        let word = encode(opcodes::SW, 5, 6, 0, 8);
        assert_eq!(
            decode(word),
            Instruction::Sw {
                rs: 5,
                rbase: 6,
                offset: 8
            }
        );
    }

    #[test]
    fn decodes_io_device_from_the_rd_slot() {
        let word = encode(opcodes::IO, 3, 0, 0, 100);
        assert_eq!(decode(word), Instruction::Io { device: 3, cost: 100 });
    }

    #[test]
    fn decodes_j_target_as_unsigned() {
        let word = encode(opcodes::J, 0, 0, 0, -1);
        assert_eq!(decode(word), Instruction::J { target: u32::MAX });
    }

    /// Every opcode with no operand-field reuse quirks decodes to the
    /// expected variant, for the three-register arithmetic instructions.
    #[rstest]
    #[case::add(opcodes::ADD, Instruction::Add { rd: 1, rs1: 2, rs2: 3 })]
    #[case::sub(opcodes::SUB, Instruction::Sub { rd: 1, rs1: 2, rs2: 3 })]
    #[case::mul(opcodes::MUL, Instruction::Mul { rd: 1, rs1: 2, rs2: 3 })]
    fn decodes_three_register_arithmetic(#[case] opcode: u8, #[case] expected: Instruction) {
        let word = encode(opcode, 1, 2, 3, 0);
        assert_eq!(decode(word), expected);
    }

    #[rstest]
    #[case::below_table(opcodes::HALT + 1)]
    #[case::far_above_table(200)]
    #[case::max_byte(255)]
    fn unrecognized_opcode_is_illegal(#[case] opcode: u8) {
        let word = encode(opcode, 0, 0, 0, 0);
        assert_eq!(decode(word), Instruction::Illegal);
    }
}
