//! CPU emulation for the LS-8.
//!
//! This module implements the complete LS-8 architecture:
//! - 256 byte cells of memory
//! - 8 general-purpose registers, R7 reserved as the stack pointer
//! - PC and a compare-flags register
//! - 13-instruction set with register operands

pub mod memory;
pub mod registers;
pub mod decode;
pub mod alu;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::{Flags, Registers, RegisterError};
pub use decode::{Instruction, Opcode, DecodeError};
pub use alu::AluOp;
pub use execute::{Cpu, CpuError, CpuState};
