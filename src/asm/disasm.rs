//! Disassembler for LS-8 programs.
//!
//! Converts program bytes back to readable assembly, and formats the
//! per-step trace line used by `--trace`.

use crate::cpu::decode::{decode, fields, Instruction};
use crate::cpu::Cpu;

/// Disassemble the instruction starting at `bytes[0]`.
///
/// Returns the text and the number of bytes consumed. Bytes that do not
/// decode are rendered as data.
pub fn disassemble_instruction(bytes: &[u8]) -> (String, usize) {
    let Some(&opcode) = bytes.first() else {
        return (String::new(), 0);
    };

    let len = fields(opcode).len();
    if len > 3 || bytes.len() < len {
        return (format!("DB {:#04x}", opcode), 1);
    }

    let operand = |i: usize| bytes.get(i).copied().unwrap_or(0);
    match decode(opcode, operand(1), operand(2)) {
        Ok(instr) => (format_instruction(&instr), len),
        Err(_) => (format!("DB {:#04x}", opcode), 1),
    }
}

/// Disassemble a program image.
pub fn disassemble(program: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; LS-8 Disassembly\n");
    output.push_str("; ----------------\n\n");

    let mut addr = 0;
    while addr < program.len() {
        let (line, len) = disassemble_instruction(&program[addr..]);
        let raw: Vec<String> = program[addr..addr + len]
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();
        output.push_str(&format!("{:03}: {:<12} ; {}\n", addr, line, raw.join(" ")));
        addr += len;
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    match instr {
        Instruction::Ldi { reg, value } => format!("LDI R{}, {}", reg, value),
        Instruction::Prn { reg } => format!("PRN R{}", reg),
        Instruction::Hlt => "HLT".to_string(),
        Instruction::Push { reg } => format!("PUSH R{}", reg),
        Instruction::Pop { reg } => format!("POP R{}", reg),
        Instruction::Call { reg } => format!("CALL R{}", reg),
        Instruction::Ret => "RET".to_string(),
        Instruction::Jmp { reg } => format!("JMP R{}", reg),
        Instruction::Jeq { reg } => format!("JEQ R{}", reg),
        Instruction::Jne { reg } => format!("JNE R{}", reg),
        Instruction::Alu { op, a, b } => format!("{} R{}, R{}", op.mnemonic(), a, b),
    }
}

/// One trace line for the instruction at PC: the raw instruction window,
/// every register, and the disassembly.
///
/// ```text
/// TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 FF | LDI R0, 8
/// ```
pub fn trace_line(cpu: &Cpu) -> String {
    let pc = cpu.regs.pc;
    let byte_at = |addr: usize| cpu.mem.read(addr).unwrap_or(0);

    let mut line = format!(
        "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
        pc,
        byte_at(pc),
        byte_at(pc + 1),
        byte_at(pc + 2),
    );

    for reg in cpu.regs.general() {
        line.push_str(&format!(" {:02X}", reg));
    }

    let window = cpu.mem.as_slice().get(pc..).unwrap_or(&[]);
    let (text, _) = disassemble_instruction(window);
    line.push_str(" | ");
    line.push_str(&text);
    line
}
