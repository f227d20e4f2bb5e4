//! Arithmetic/logic unit.
//!
//! Operands are always two register indices. Results are stored back into
//! the first register as byte values: ADD and MUL wrap modulo 256.

use crate::cpu::decode::Opcode;
use crate::cpu::registers::{Flags, RegisterError, Registers};
use serde::{Serialize, Deserialize};

/// Operations executed by the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    /// R[a] := R[a] + R[b]
    Add,
    /// R[a] := R[a] * R[b]
    Mul,
    /// FL := compare(R[a], R[b])
    Cmp,
}

impl AluOp {
    /// Select the operation for an ALU-flagged opcode.
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            Opcode::ADD => Some(AluOp::Add),
            Opcode::MUL => Some(AluOp::Mul),
            Opcode::CMP => Some(AluOp::Cmp),
            _ => None,
        }
    }

    pub fn opcode(self) -> u8 {
        match self {
            AluOp::Add => Opcode::ADD,
            AluOp::Mul => Opcode::MUL,
            AluOp::Cmp => Opcode::CMP,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Mul => "MUL",
            AluOp::Cmp => "CMP",
        }
    }
}

/// Run an ALU operation on registers `a` and `b`.
pub fn execute(op: AluOp, regs: &mut Registers, a: u8, b: u8) -> Result<(), RegisterError> {
    let lhs = regs.get(a as usize)?;
    let rhs = regs.get(b as usize)?;

    match op {
        AluOp::Add => regs.set(a as usize, lhs.wrapping_add(rhs))?,
        AluOp::Mul => regs.set(a as usize, lhs.wrapping_mul(rhs))?,
        AluOp::Cmp => regs.flags = Flags::from_ordering(lhs.cmp(&rhs)),
    }

    Ok(())
}
