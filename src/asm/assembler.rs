//! Simple assembler for LS-8 programs.
//!
//! Syntax:
//! ```text
//! # Comment (`;` works too)
//! LABEL:              # Define a label
//!     LDI R0, 8       # Load a literal (decimal, 0x.., 0b.. or a label)
//!     LDI R1, LABEL   # Labels resolve to byte addresses
//!     MUL R0, R1      # Two-register ALU operation
//!     CALL R1         # Register-indirect control flow
//!     HLT
//!
//!     ORG 0x40        # Pad with zeros up to an address
//!     DB 42           # Emit a raw data byte
//! ```

use crate::cpu::alu::AluOp;
use crate::cpu::decode::{encode, Instruction};
use crate::cpu::memory::MEMORY_SIZE;
use crate::cpu::registers::{REGISTER_COUNT, SP};
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a program image starting at address 0.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> address).
    symbols: HashMap<String, u8>,
    /// Literal bytes still waiting for a label: (output_index, label, source_line).
    pending: Vec<(usize, String, usize)>,
    /// Output bytes; the current address is its length.
    output: Vec<u8>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<u8>, AssemblerError> {
        // Pass 1: Collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: Resolve forward references
        self.resolve_references()?;

        if self.output.len() > MEMORY_SIZE {
            return Err(AssemblerError::ProgramTooLarge(self.output.len()));
        }

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find(|c: char| c == '#' || c == ';') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let line = line.trim();

        if line.is_empty() {
            return Ok(());
        }

        // Check for label definition
        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if !label.is_empty() {
                self.define_label(label, line_num)?;
            }

            let rest = line[colon_idx + 1..].trim();
            if !rest.is_empty() {
                return self.process_instruction(rest, line_num);
            }
            return Ok(());
        }

        self.process_instruction(line, line_num)
    }

    fn define_label(&mut self, label: String, line_num: usize) -> Result<(), AssemblerError> {
        let addr = u8::try_from(self.output.len())
            .map_err(|_| AssemblerError::ProgramTooLarge(self.output.len()))?;
        if self.symbols.insert(label.clone(), addr).is_some() {
            return Err(AssemblerError::DuplicateLabel { line: line_num, label });
        }
        Ok(())
    }

    fn process_instruction(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
            Some((mnemonic, rest)) => (mnemonic, rest.trim()),
            None => (line, ""),
        };
        let mnemonic = mnemonic.to_uppercase();
        let operands: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };

        match mnemonic.as_str() {
            // Directives
            "ORG" => {
                let [addr] = expect_operands::<1>(&mnemonic, &operands, line_num)?;
                let addr = self.parse_number(addr, line_num)? as usize;
                if addr < self.output.len() {
                    return Err(AssemblerError::SyntaxError {
                        line: line_num,
                        message: format!("ORG {} is behind the current address {}", addr, self.output.len()),
                    });
                }
                self.output.resize(addr, 0);
            }

            "DB" => {
                if operands.is_empty() {
                    return Err(AssemblerError::WrongOperandCount {
                        line: line_num,
                        mnemonic: mnemonic.clone(),
                        expected: 1,
                        found: 0,
                    });
                }
                for operand in operands {
                    let value = self.parse_literal(operand, self.output.len(), line_num)?;
                    self.output.push(value);
                }
            }

            // Instructions
            _ => {
                let instr = self.parse_instruction(&mnemonic, &operands, line_num)?;
                self.output.extend(encode(&instr));
            }
        }

        Ok(())
    }

    fn parse_instruction(&mut self, mnemonic: &str, operands: &[&str], line_num: usize)
        -> Result<Instruction, AssemblerError>
    {
        let instr = match mnemonic {
            "HLT" | "HALT" => {
                expect_operands::<0>(mnemonic, operands, line_num)?;
                Instruction::Hlt
            }
            "RET" => {
                expect_operands::<0>(mnemonic, operands, line_num)?;
                Instruction::Ret
            }

            "PRN" | "PUSH" | "POP" | "CALL" | "JMP" | "JEQ" | "JNE" => {
                let [reg] = expect_operands::<1>(mnemonic, operands, line_num)?;
                let reg = parse_register(reg, line_num)?;
                match mnemonic {
                    "PRN" => Instruction::Prn { reg },
                    "PUSH" => Instruction::Push { reg },
                    "POP" => Instruction::Pop { reg },
                    "CALL" => Instruction::Call { reg },
                    "JMP" => Instruction::Jmp { reg },
                    "JEQ" => Instruction::Jeq { reg },
                    _ => Instruction::Jne { reg },
                }
            }

            "LDI" => {
                let [reg, value] = expect_operands::<2>(mnemonic, operands, line_num)?;
                let reg = parse_register(reg, line_num)?;
                // The literal is the third byte of the instruction
                let value = self.parse_literal(value, self.output.len() + 2, line_num)?;
                Instruction::Ldi { reg, value }
            }

            "ADD" | "MUL" | "CMP" => {
                let [a, b] = expect_operands::<2>(mnemonic, operands, line_num)?;
                let op = match mnemonic {
                    "ADD" => AluOp::Add,
                    "MUL" => AluOp::Mul,
                    _ => AluOp::Cmp,
                };
                Instruction::Alu {
                    op,
                    a: parse_register(a, line_num)?,
                    b: parse_register(b, line_num)?,
                }
            }

            _ => return Err(AssemblerError::UnknownMnemonic {
                line: line_num,
                mnemonic: mnemonic.to_string(),
            }),
        };

        Ok(instr)
    }

    /// Parse a byte literal. Anything that is not a number is taken as a
    /// label reference and patched into `out_idx` during pass 2.
    fn parse_literal(&mut self, operand: &str, out_idx: usize, line_num: usize) -> Result<u8, AssemblerError> {
        if operand.starts_with(|c: char| c.is_ascii_digit()) {
            return self.parse_number(operand, line_num);
        }

        self.pending.push((out_idx, operand.to_uppercase(), line_num));
        Ok(0) // Placeholder, will be resolved in pass 2
    }

    fn parse_number(&self, operand: &str, line_num: usize) -> Result<u8, AssemblerError> {
        let (digits, radix) = if let Some(hex) = operand.strip_prefix("0x").or_else(|| operand.strip_prefix("0X")) {
            (hex, 16)
        } else if let Some(bin) = operand.strip_prefix("0b").or_else(|| operand.strip_prefix("0B")) {
            (bin, 2)
        } else {
            (operand, 10)
        };

        let value = u32::from_str_radix(digits, radix)
            .map_err(|_| AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid number: {}", operand),
            })?;

        u8::try_from(value).map_err(|_| AssemblerError::ValueOutOfRange { line: line_num, value })
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for (out_idx, label, line_num) in &self.pending {
            let addr = self.symbols.get(label)
                .ok_or_else(|| AssemblerError::UndefinedLabel {
                    line: *line_num,
                    label: label.clone(),
                })?;

            if let Some(byte) = self.output.get_mut(*out_idx) {
                *byte = *addr;
            }
        }
        Ok(())
    }
}

/// Check the operand count and hand the operands back as an array.
fn expect_operands<'a, const N: usize>(mnemonic: &str, operands: &[&'a str], line_num: usize)
    -> Result<[&'a str; N], AssemblerError>
{
    <[&str; N]>::try_from(operands).map_err(|_| AssemblerError::WrongOperandCount {
        line: line_num,
        mnemonic: mnemonic.to_string(),
        expected: N,
        found: operands.len(),
    })
}

/// Parse `R0`-`R7`, or `SP` for R7.
fn parse_register(operand: &str, line_num: usize) -> Result<u8, AssemblerError> {
    let upper = operand.to_uppercase();
    if upper == "SP" {
        return Ok(SP as u8);
    }

    upper.strip_prefix('R')
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|&n| (n as usize) < REGISTER_COUNT)
        .ok_or_else(|| AssemblerError::InvalidRegister {
            line: line_num,
            operand: operand.to_string(),
        })
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("{mnemonic} on line {line} takes {expected} operand(s), found {found}")]
    WrongOperandCount { line: usize, mnemonic: String, expected: usize, found: usize },

    #[error("invalid register on line {line}: {operand}")]
    InvalidRegister { line: usize, operand: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: u32 },

    #[error("program is {0} bytes, memory holds 256")]
    ProgramTooLarge(usize),
}
