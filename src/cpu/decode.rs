//! Instruction decoder for the LS-8.
//!
//! Every instruction starts with an opcode byte laid out as `AABCDDDD`:
//! - `AA`: number of operand bytes that follow (0-2)
//! - `B`: set for ALU operations
//! - `C`: set when the instruction writes PC itself
//! - `DDDD`: operation identifier
//!
//! The operation identifier alone is ambiguous (HLT and RET are both `0001`),
//! so handlers are selected by the whole opcode byte.

use crate::cpu::alu::AluOp;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Opcode byte values.
pub struct Opcode;

impl Opcode {
    pub const HLT: u8 = 0b0000_0001;
    pub const RET: u8 = 0b0001_0001;
    pub const PUSH: u8 = 0b0100_0101;
    pub const POP: u8 = 0b0100_0110;
    pub const PRN: u8 = 0b0100_0111;
    pub const CALL: u8 = 0b0101_0000;
    pub const JMP: u8 = 0b0101_0100;
    pub const JEQ: u8 = 0b0101_0101;
    pub const JNE: u8 = 0b0101_0110;
    pub const LDI: u8 = 0b1000_0010;
    pub const ADD: u8 = 0b1010_0000;
    pub const MUL: u8 = 0b1010_0010;
    pub const CMP: u8 = 0b1010_0111;

    /// Every opcode the machine executes.
    pub const ALL: [u8; 13] = [
        Self::HLT, Self::RET, Self::PUSH, Self::POP, Self::PRN,
        Self::CALL, Self::JMP, Self::JEQ, Self::JNE, Self::LDI,
        Self::ADD, Self::MUL, Self::CMP,
    ];
}

/// Fields packed into an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeFields {
    /// Number of operand bytes following the opcode.
    pub operand_count: u8,
    /// Routed to the ALU rather than the control dispatcher.
    pub is_alu: bool,
    /// The instruction sets PC; the execution loop must not advance it.
    pub sets_pc: bool,
    /// Low nibble.
    pub op_id: u8,
}

impl OpcodeFields {
    /// Total instruction length in bytes, opcode included.
    pub fn len(&self) -> usize {
        self.operand_count as usize + 1
    }
}

/// Split an opcode byte into its fields.
pub fn fields(opcode: u8) -> OpcodeFields {
    OpcodeFields {
        operand_count: opcode >> 6,
        is_alu: opcode & 0b0010_0000 != 0,
        sets_pc: opcode & 0b0001_0000 != 0,
        op_id: opcode & 0b0000_1111,
    }
}

/// Decoded LS-8 instruction.
///
/// Register operands are kept as raw operand bytes; the engine checks them
/// against the register file when the instruction executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Load immediate: R[reg] := value
    Ldi { reg: u8, value: u8 },

    /// Print R[reg] in decimal
    Prn { reg: u8 },

    /// Halt execution
    Hlt,

    /// SP := SP - 1, [SP] := R[reg]
    Push { reg: u8 },

    /// R[reg] := [SP], SP := SP + 1
    Pop { reg: u8 },

    /// Push return address, PC := R[reg]
    Call { reg: u8 },

    /// Pop PC
    Ret,

    /// PC := R[reg]
    Jmp { reg: u8 },

    /// Jump to R[reg] if the equal flag is set
    Jeq { reg: u8 },

    /// Jump to R[reg] if the equal flag is clear
    Jne { reg: u8 },

    /// Two-register ALU operation; results land in R[a]
    Alu { op: AluOp, a: u8, b: u8 },
}

impl Instruction {
    /// The opcode byte this instruction encodes to.
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::Ldi { .. } => Opcode::LDI,
            Instruction::Prn { .. } => Opcode::PRN,
            Instruction::Hlt => Opcode::HLT,
            Instruction::Push { .. } => Opcode::PUSH,
            Instruction::Pop { .. } => Opcode::POP,
            Instruction::Call { .. } => Opcode::CALL,
            Instruction::Ret => Opcode::RET,
            Instruction::Jmp { .. } => Opcode::JMP,
            Instruction::Jeq { .. } => Opcode::JEQ,
            Instruction::Jne { .. } => Opcode::JNE,
            Instruction::Alu { op, .. } => op.opcode(),
        }
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        fields(self.opcode()).len()
    }
}

/// Decode an opcode and its operand bytes.
///
/// Operand bytes beyond the opcode's operand count are ignored.
pub fn decode(opcode: u8, operand_a: u8, operand_b: u8) -> Result<Instruction, DecodeError> {
    if fields(opcode).is_alu {
        let op = AluOp::from_opcode(opcode)
            .ok_or(DecodeError::UnsupportedAluOperation(opcode))?;
        return Ok(Instruction::Alu { op, a: operand_a, b: operand_b });
    }

    let instruction = match opcode {
        Opcode::LDI => Instruction::Ldi { reg: operand_a, value: operand_b },
        Opcode::PRN => Instruction::Prn { reg: operand_a },
        Opcode::HLT => Instruction::Hlt,
        Opcode::PUSH => Instruction::Push { reg: operand_a },
        Opcode::POP => Instruction::Pop { reg: operand_a },
        Opcode::CALL => Instruction::Call { reg: operand_a },
        Opcode::RET => Instruction::Ret,
        Opcode::JMP => Instruction::Jmp { reg: operand_a },
        Opcode::JEQ => Instruction::Jeq { reg: operand_a },
        Opcode::JNE => Instruction::Jne { reg: operand_a },
        _ => return Err(DecodeError::UnsupportedInstruction(opcode)),
    };

    Ok(instruction)
}

/// Encode an instruction to its byte sequence.
pub fn encode(instr: &Instruction) -> Vec<u8> {
    let operands: [u8; 2] = match *instr {
        Instruction::Ldi { reg, value } => [reg, value],
        Instruction::Prn { reg }
        | Instruction::Push { reg }
        | Instruction::Pop { reg }
        | Instruction::Call { reg }
        | Instruction::Jmp { reg }
        | Instruction::Jeq { reg }
        | Instruction::Jne { reg } => [reg, 0],
        Instruction::Hlt | Instruction::Ret => [0, 0],
        Instruction::Alu { a, b, .. } => [a, b],
    };

    let opcode = instr.opcode();
    let count = fields(opcode).operand_count as usize;

    let mut bytes = Vec::with_capacity(count + 1);
    bytes.push(opcode);
    bytes.extend_from_slice(&operands[..count]);
    bytes
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unsupported ALU operation: {0:#010b}")]
    UnsupportedAluOperation(u8),

    #[error("unsupported instruction: {0:#010b}")]
    UnsupportedInstruction(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_of_known_opcodes() {
        // (opcode, operand_count, is_alu, sets_pc, op_id)
        let table = [
            (Opcode::HLT, 0, false, false, 0b0001),
            (Opcode::RET, 0, false, true, 0b0001),
            (Opcode::PUSH, 1, false, false, 0b0101),
            (Opcode::POP, 1, false, false, 0b0110),
            (Opcode::PRN, 1, false, false, 0b0111),
            (Opcode::CALL, 1, false, true, 0b0000),
            (Opcode::JMP, 1, false, true, 0b0100),
            (Opcode::JEQ, 1, false, true, 0b0101),
            (Opcode::JNE, 1, false, true, 0b0110),
            (Opcode::LDI, 2, false, false, 0b0010),
            (Opcode::ADD, 2, true, false, 0b0000),
            (Opcode::MUL, 2, true, false, 0b0010),
            (Opcode::CMP, 2, true, false, 0b0111),
        ];
        assert_eq!(table.len(), Opcode::ALL.len());

        for (opcode, count, alu, sets_pc, id) in table {
            let f = fields(opcode);
            assert_eq!(f.operand_count, count, "operand count of {:#010b}", opcode);
            assert_eq!(f.is_alu, alu, "alu flag of {:#010b}", opcode);
            assert_eq!(f.sets_pc, sets_pc, "pc flag of {:#010b}", opcode);
            assert_eq!(f.op_id, id, "op id of {:#010b}", opcode);
        }
    }

    #[test]
    fn test_fields_boundaries() {
        let all_set = fields(0xFF);
        assert_eq!(all_set.operand_count, 3);
        assert!(all_set.is_alu && all_set.sets_pc);
        assert_eq!(all_set.op_id, 0xF);

        let none_set = fields(0x00);
        assert_eq!(none_set.operand_count, 0);
        assert!(!none_set.is_alu && !none_set.sets_pc);
        assert_eq!(none_set.op_id, 0);
    }

    #[test]
    fn test_every_opcode_decodes() {
        for opcode in Opcode::ALL {
            let instr = decode(opcode, 1, 2).unwrap();
            assert_eq!(instr.opcode(), opcode);
            assert_eq!(instr.len(), fields(opcode).len());
        }
    }

    #[test]
    fn test_decode_operands() {
        assert_eq!(decode(Opcode::LDI, 0, 8).unwrap(), Instruction::Ldi { reg: 0, value: 8 });
        assert_eq!(decode(Opcode::PRN, 3, 99).unwrap(), Instruction::Prn { reg: 3 });
        assert_eq!(
            decode(Opcode::MUL, 0, 1).unwrap(),
            Instruction::Alu { op: AluOp::Mul, a: 0, b: 1 }
        );
    }

    #[test]
    fn test_decode_unsupported() {
        // ALU bit set, unknown identifier
        assert_eq!(
            decode(0b1010_1111, 0, 0),
            Err(DecodeError::UnsupportedAluOperation(0b1010_1111))
        );
        // Control opcode nobody implements
        assert_eq!(decode(0x00, 0, 0), Err(DecodeError::UnsupportedInstruction(0x00)));
        assert_eq!(
            decode(0b0100_1000, 0, 0),
            Err(DecodeError::UnsupportedInstruction(0b0100_1000))
        );
    }

    #[test]
    fn test_encode_lengths() {
        assert_eq!(encode(&Instruction::Hlt), vec![Opcode::HLT]);
        assert_eq!(encode(&Instruction::Prn { reg: 2 }), vec![Opcode::PRN, 2]);
        assert_eq!(
            encode(&Instruction::Ldi { reg: 1, value: 9 }),
            vec![Opcode::LDI, 1, 9]
        );
    }
}
