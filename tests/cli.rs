//! Command-line behaviour of the `ls8-emu` binary.

use std::path::PathBuf;
use std::process::{Command, Output};

fn ls8_emu(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ls8-emu"))
        .args(args)
        .output()
        .unwrap()
}

fn demo(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "demos", name].iter().collect();
    path.to_string_lossy().into_owned()
}

#[test]
fn missing_argument_prints_usage_and_exits_zero() {
    let output = ls8_emu(&[]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "Error: Missing argument. Usage: ls8-emu <program-file>\n");
}

#[test]
fn unreadable_file_exits_one() {
    let output = ls8_emu(&["/definitely/not/here.ls8"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("failed to load"));
}

#[test]
fn mult_demo_prints_72() {
    let output = ls8_emu(&[&demo("mult.ls8")]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "72\n");
}

#[test]
fn asm_source_is_assembled_before_running() {
    let output = ls8_emu(&[&demo("countdown.asm")]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "5\n4\n3\n2\n1\n");
}
