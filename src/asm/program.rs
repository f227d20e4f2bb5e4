//! LS-8 program file format.
//!
//! A plain text format with one byte per line:
//! - A line counts only if its first character is `0` or `1`
//! - Its first 8 characters are read as a big-endian binary number
//! - Every other line (blank, `#` comment, anything else) is skipped
//!
//! Bytes are placed at consecutive addresses starting from 0.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Number of binary digits read from a significant line.
const DIGITS_PER_LINE: usize = 8;

/// Parse program text into its bytes, in file order.
pub fn parse_program(source: &str) -> Result<Vec<u8>, ProgramError> {
    let mut bytes = Vec::new();

    for (line_num, line) in source.lines().enumerate() {
        if let Some(byte) = parse_line(line, line_num + 1)? {
            bytes.push(byte);
        }
    }

    Ok(bytes)
}

/// Load a program file from disk.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ProgramError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| ProgramError::IoError(e.to_string()))?;
    let reader = BufReader::new(file);

    let mut bytes = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| ProgramError::IoError(e.to_string()))?;
        if let Some(byte) = parse_line(&line, line_num + 1)? {
            bytes.push(byte);
        }
    }

    Ok(bytes)
}

/// Parse one line, returning `None` for lines that carry no byte.
fn parse_line(line: &str, line_num: usize) -> Result<Option<u8>, ProgramError> {
    if !line.starts_with(|c: char| c == '0' || c == '1') {
        return Ok(None);
    }

    let digits: String = line.chars().take(DIGITS_PER_LINE).collect();
    let digits = digits.trim_end();

    u8::from_str_radix(digits, 2)
        .map(Some)
        .map_err(|_| ProgramError::ParseError {
            line: line_num,
            message: format!("expected binary digits, found {:?}", digits),
        })
}

/// Render bytes in the program file format.
pub fn format_program(bytes: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("# LS-8 program\n");
    output.push_str(&format!("# {} bytes\n\n", bytes.len()));

    for (addr, byte) in bytes.iter().enumerate() {
        output.push_str(&format!("{:08b} # {:03}\n", byte, addr));
    }

    output
}

/// Save a program file to disk.
pub fn save_program<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), ProgramError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ProgramError::IoError(e.to_string()))?;

    file.write_all(format_program(bytes).as_bytes())
        .map_err(|e| ProgramError::IoError(e.to_string()))
}

/// Errors that can occur while reading or writing program files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}
