//! # LS-8 Emulator
//!
//! An emulator for the LS-8, a small 8-bit register machine.
//!
//! The machine has 256 bytes of memory, eight byte registers (R7 doubles
//! as the stack pointer), a program counter and a compare-flags register.
//! Programs are byte code loaded at address 0 and run until `HLT`.

pub mod cpu;
pub mod asm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Memory, Registers, Instruction, Opcode};
pub use asm::{assemble, disassemble, AssemblerError, load_program, parse_program, save_program, ProgramError};
