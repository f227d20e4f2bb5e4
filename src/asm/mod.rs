//! Program files, assembler and disassembler for the LS-8.
//!
//! This module provides:
//! - The line-oriented binary program format (load/save)
//! - A simple two-pass assembler (mnemonics → program bytes)
//! - A disassembler and trace formatter (program bytes → readable text)

pub mod assembler;
pub mod disasm;
pub mod program;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, trace_line};
pub use program::{load_program, parse_program, save_program, ProgramError};
