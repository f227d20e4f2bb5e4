//! LS-8 CPU registers.
//!
//! The LS-8 has:
//! - R0-R7: eight general-purpose byte registers
//! - R7 doubles as the stack pointer (SP), starting at 255
//! - PC: program counter
//! - FL: condition flags, written only by CMP

use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Index of the register reserved as the stack pointer.
pub const SP: usize = 7;

/// Power-on value of the stack pointer.
pub const SP_INIT: u8 = 255;

/// Modulus used when the stack pointer moves.
///
/// A modulus of 255 reproduces the historical wraparound, which skips
/// address 255 on the way back up; 256 spans the full address space.
pub const STACK_MODULUS: u16 = 256;

/// Condition flags register.
///
/// Only the low three bits are meaningful. After a compare exactly one of
/// them is set; before the first compare the register is zero.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags(u8);

impl Flags {
    /// Bit 0: operands were equal.
    pub const EQUAL: u8 = 0b001;
    /// Bit 1: first operand was greater.
    pub const GREATER: u8 = 0b010;
    /// Bit 2: first operand was less.
    pub const LESS: u8 = 0b100;

    /// Flags as left by a compare with the given outcome.
    pub fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Equal => Flags(Self::EQUAL),
            Ordering::Greater => Flags(Self::GREATER),
            Ordering::Less => Flags(Self::LESS),
        }
    }

    /// Raw flags byte.
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn equal(self) -> bool {
        self.0 & Self::EQUAL != 0
    }

    pub fn greater(self) -> bool {
        self.0 & Self::GREATER != 0
    }

    pub fn less(self) -> bool {
        self.0 & Self::LESS != 0
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FL={:03b} ({}{}{})",
            self.0,
            if self.less() { 'L' } else { '-' },
            if self.greater() { 'G' } else { '-' },
            if self.equal() { 'E' } else { '-' },
        )
    }
}

/// The LS-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// R0-R7. R7 is the stack pointer.
    gp: [u8; REGISTER_COUNT],

    /// PC: address of the next opcode to fetch.
    pub pc: usize,

    /// FL: result of the most recent compare.
    pub flags: Flags,
}

impl Registers {
    /// Create a register file in its power-on state.
    pub fn new() -> Self {
        let mut gp = [0; REGISTER_COUNT];
        gp[SP] = SP_INIT;
        Self {
            gp,
            pc: 0,
            flags: Flags::default(),
        }
    }

    /// Reset to the power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read a general-purpose register.
    #[inline]
    pub fn get(&self, index: usize) -> Result<u8, RegisterError> {
        self.gp
            .get(index)
            .copied()
            .ok_or(RegisterError::IndexOutOfRange(index))
    }

    /// Write a general-purpose register.
    #[inline]
    pub fn set(&mut self, index: usize, value: u8) -> Result<(), RegisterError> {
        let reg = self.gp
            .get_mut(index)
            .ok_or(RegisterError::IndexOutOfRange(index))?;
        *reg = value;
        Ok(())
    }

    /// All general-purpose registers, R0 first.
    pub fn general(&self) -> &[u8; REGISTER_COUNT] {
        &self.gp
    }

    /// Current stack pointer.
    pub fn sp(&self) -> u8 {
        self.gp[SP]
    }

    /// Move SP down one cell and return the new value.
    pub fn decrement_sp(&mut self) -> u8 {
        let sp = (self.gp[SP] as u16 + STACK_MODULUS - 1) % STACK_MODULUS;
        self.gp[SP] = sp as u8;
        self.gp[SP]
    }

    /// Move SP up one cell and return the new value.
    pub fn increment_sp(&mut self) -> u8 {
        let sp = (self.gp[SP] as u16 + 1) % STACK_MODULUS;
        self.gp[SP] = sp as u8;
        self.gp[SP]
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u8) {
        self.pc = addr as usize;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during register access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("register index {0} out of range (valid 0-7)")]
    IndexOutOfRange(usize),
}
