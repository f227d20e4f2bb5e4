//! LS-8 memory subsystem.
//!
//! A flat array of 256 byte cells. There is no segmentation and no
//! memory-mapped I/O; the stack lives in the same address space as the
//! program.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of addressable memory cells.
pub const MEMORY_SIZE: usize = 256;

/// LS-8 memory: 256 byte cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Memory {
    cells: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read a cell by address (0-255).
    #[inline]
    pub fn read(&self, addr: usize) -> Result<u8, MemoryError> {
        self.cells
            .get(addr)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange(addr))
    }

    /// Write a cell by address (0-255).
    #[inline]
    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), MemoryError> {
        let cell = self.cells
            .get_mut(addr)
            .ok_or(MemoryError::AddressOutOfRange(addr))?;
        *cell = value;
        Ok(())
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Load a program into memory starting at the given address.
    pub fn load_program(&mut self, start_addr: usize, program: &[u8]) -> Result<(), MemoryError> {
        if start_addr > MEMORY_SIZE {
            return Err(MemoryError::AddressOutOfRange(start_addr));
        }

        let available = MEMORY_SIZE - start_addr;
        if program.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available,
            });
        }

        self.cells[start_addr..start_addr + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u8)> {
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }

    /// The whole address space as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<u8>> for Memory {
    type Error = MemoryError;

    /// Rebuild memory from a snapshot; anything but 256 cells is rejected.
    fn try_from(cells: Vec<u8>) -> Result<Self, Self::Error> {
        if cells.len() != MEMORY_SIZE {
            return Err(MemoryError::InvalidSize(cells.len()));
        }
        Ok(Self { cells })
    }
}

impl From<Memory> for Vec<u8> {
    fn from(mem: Memory) -> Self {
        mem.cells
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is outside valid memory range.
    #[error("address out of range: {0} (valid 0-255)")]
    AddressOutOfRange(usize),

    /// Program is too large to fit in memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },

    /// A memory image does not have exactly 256 cells.
    #[error("memory image has {0} cells, expected 256")]
    InvalidSize(usize),
}
