//! LS-8 Emulator - CLI Entry Point
//!
//! - `ls8-emu <program>` - Run a program file until it halts
//! - `ls8-emu <program.asm>` - Assemble mnemonic source, then run it
//! - `ls8-emu --disasm <program>` - Print a disassembly listing instead

use clap::Parser;
use ls8::asm::disasm::trace_line;
use ls8::{assemble, disassemble, load_program, Cpu};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::exit;

const USAGE: &str = "Error: Missing argument. Usage: ls8-emu <program-file>";

#[derive(Parser)]
#[command(name = "ls8-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator for the LS-8 8-bit register machine")]
struct Cli {
    /// Path to the program file (binary text, or `.asm` source)
    program: Option<PathBuf>,

    /// Print a trace line to stderr before every instruction
    #[arg(short, long)]
    trace: bool,

    /// Stop after this many instructions
    #[arg(short, long)]
    max_cycles: Option<u64>,

    /// Print the final machine state as JSON
    #[arg(long)]
    dump_state: bool,

    /// Print a disassembly of the program instead of running it
    #[arg(short, long)]
    disasm: bool,
}

fn main() {
    let cli = Cli::parse();

    // A missing program is reported but is not a failure.
    let Some(path) = cli.program.as_deref() else {
        println!("{}", USAGE);
        return;
    };

    let program = read_program(path);

    if cli.disasm {
        print!("{}", disassemble(&program));
        return;
    }

    run_program(&program, &cli);
}

/// Load the program bytes, assembling `.asm` sources first.
fn read_program(path: &Path) -> Vec<u8> {
    let is_asm = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("asm"));

    if is_asm {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: failed to read {}: {}", path.display(), e);
                exit(1);
            }
        };

        match assemble(&source) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("error: assembly failed: {}", e);
                exit(1);
            }
        }
    } else {
        match load_program(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("error: failed to load {}: {}", path.display(), e);
                exit(1);
            }
        }
    }
}

fn run_program(program: &[u8], cli: &Cli) {
    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(program) {
        eprintln!("error: failed to load program: {}", e);
        exit(1);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let max_cycles = cli.max_cycles.unwrap_or(u64::MAX);

    while cpu.is_running() && cpu.cycles < max_cycles {
        if cli.trace {
            eprintln!("{}", trace_line(&cpu));
        }

        let pc = cpu.regs.pc;
        if let Err(e) = cpu.step(&mut out) {
            let _ = out.flush();
            eprintln!("error at PC={:#04x}: {}", pc, e);
            exit(1);
        }
    }

    if let Err(e) = out.flush() {
        eprintln!("error: failed to write output: {}", e);
        exit(1);
    }
    drop(out);

    if cpu.is_running() {
        eprintln!("warning: stopped after {} cycles without halting", cpu.cycles);
    }

    if cli.dump_state {
        match cpu.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: failed to serialize state: {}", e);
                exit(1);
            }
        }
    }
}
