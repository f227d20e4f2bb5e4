//! CPU execution engine for the LS-8.
//!
//! Implements the fetch-decode-execute cycle and the control instructions.
//! ALU instructions are handed to [`crate::cpu::alu`].

use crate::cpu::{alu, Memory, Registers};
use crate::cpu::decode::{self, DecodeError, Instruction};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::RegisterError;
use serde::{Serialize, Deserialize};
use std::io::Write;
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed HLT instruction).
    Halted,
}

/// The LS-8 CPU.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count.
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU in its power-on state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset the CPU to its power-on state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Load a program into memory at address 0.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load_program(0, program)
    }

    /// Execute a single instruction, writing any PRN output to `out`.
    ///
    /// Returns the instruction that was executed, or an error.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        // Fetch
        let pc = self.regs.pc;
        let opcode = self.mem.read(pc)?;
        let fields = decode::fields(opcode);

        // Unknown opcodes fault before their operand bytes are touched
        decode::decode(opcode, 0, 0)?;

        // Only the operand bytes this opcode declares are read
        let mut operands = [0u8; 2];
        for (i, operand) in operands
            .iter_mut()
            .take(fields.operand_count as usize)
            .enumerate()
        {
            *operand = self.mem.read(pc + 1 + i)?;
        }

        // Decode
        let instr = decode::decode(opcode, operands[0], operands[1])?;

        // Execute
        match instr {
            Instruction::Alu { op, a, b } => alu::execute(op, &mut self.regs, a, b)?,
            _ => self.dispatch(instr, fields.len(), out)?,
        }

        if !fields.sets_pc {
            self.regs.pc = pc + fields.len();
        }

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(instr)
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited<W: Write>(&mut self, out: &mut W, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.state == CpuState::Running && self.cycles < limit {
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a non-ALU instruction.
    ///
    /// `len` is the length of the instruction in bytes; PC still points at
    /// its opcode.
    fn dispatch<W: Write>(&mut self, instr: Instruction, len: usize, out: &mut W) -> Result<(), CpuError> {
        match instr {
            Instruction::Ldi { reg, value } => {
                self.regs.set(reg as usize, value)?;
            }

            Instruction::Prn { reg } => {
                let value = self.regs.get(reg as usize)?;
                writeln!(out, "{}", value).map_err(|e| CpuError::Output(e.to_string()))?;
            }

            Instruction::Hlt => {
                self.state = CpuState::Halted;
            }

            Instruction::Push { reg } => {
                let value = self.regs.get(reg as usize)?;
                self.push(value)?;
            }

            Instruction::Pop { reg } => {
                let value = self.pop()?;
                self.regs.set(reg as usize, value)?;
            }

            Instruction::Call { reg } => {
                let target = self.regs.get(reg as usize)?;
                let ret = self.regs.pc + len;
                let ret = u8::try_from(ret).map_err(|_| MemoryError::AddressOutOfRange(ret))?;
                self.push(ret)?;
                self.regs.jump(target);
            }

            Instruction::Ret => {
                let addr = self.pop()?;
                self.regs.jump(addr);
            }

            Instruction::Jmp { reg } => {
                let target = self.regs.get(reg as usize)?;
                self.regs.jump(target);
            }

            Instruction::Jeq { reg } => {
                self.branch(self.regs.flags.equal(), reg, len)?;
            }

            Instruction::Jne { reg } => {
                self.branch(!self.regs.flags.equal(), reg, len)?;
            }

            Instruction::Alu { op, .. } => {
                return Err(CpuError::Decode(DecodeError::UnsupportedInstruction(op.opcode())));
            }
        }

        Ok(())
    }

    /// Jump to R[reg] when `taken`, otherwise fall through to the next
    /// instruction.
    fn branch(&mut self, taken: bool, reg: u8, len: usize) -> Result<(), CpuError> {
        if taken {
            let target = self.regs.get(reg as usize)?;
            self.regs.jump(target);
        } else {
            self.regs.pc += len;
        }
        Ok(())
    }

    fn push(&mut self, value: u8) -> Result<(), CpuError> {
        let sp = self.regs.decrement_sp();
        self.mem.write(sp as usize, value)?;
        Ok(())
    }

    fn pop(&mut self) -> Result<u8, CpuError> {
        let value = self.mem.read(self.regs.sp() as usize)?;
        self.regs.increment_sp();
        Ok(value)
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    /// Snapshot the machine state as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("register error: {0}")]
    Register(#[from] RegisterError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("output error: {0}")]
    Output(String),
}
