//! Property tests for the instruction set.

use ls8::cpu::alu::AluOp;
use ls8::cpu::registers::{Flags, SP};
use ls8::cpu::decode::encode;
use ls8::{Cpu, Instruction};
use proptest::prelude::*;

fn program(instructions: &[Instruction]) -> Vec<u8> {
    instructions.iter().flat_map(encode).collect()
}

fn run(instructions: &[Instruction]) -> (Cpu, String) {
    let mut cpu = Cpu::new();
    cpu.load_program(&program(instructions)).unwrap();
    let mut out = Vec::new();
    cpu.run(&mut out).unwrap();
    (cpu, String::from_utf8(out).unwrap())
}

/// Any register except the stack pointer.
fn general_register() -> impl Strategy<Value = u8> {
    0u8..SP as u8
}

proptest! {
    #[test]
    fn ldi_then_prn_prints_value(reg in 0u8..8, value: u8) {
        let (_, out) = run(&[
            Instruction::Ldi { reg, value },
            Instruction::Prn { reg },
            Instruction::Hlt,
        ]);
        prop_assert_eq!(out, format!("{}\n", value));
    }

    #[test]
    fn push_pop_moves_value_and_restores_sp(
        src in general_register(),
        dst in general_register(),
        value: u8,
    ) {
        let (cpu, _) = run(&[
            Instruction::Ldi { reg: src, value },
            Instruction::Push { reg: src },
            Instruction::Pop { reg: dst },
            Instruction::Hlt,
        ]);
        prop_assert_eq!(cpu.regs.get(dst as usize).unwrap(), value);
        prop_assert_eq!(cpu.regs.sp(), 255);
    }

    #[test]
    fn cmp_sets_exactly_one_flag(a: u8, b: u8) {
        let (cpu, _) = run(&[
            Instruction::Ldi { reg: 0, value: a },
            Instruction::Ldi { reg: 1, value: b },
            Instruction::Alu { op: AluOp::Cmp, a: 0, b: 1 },
            Instruction::Hlt,
        ]);
        let flags = cpu.regs.flags;

        prop_assert_eq!(flags.bits().count_ones(), 1);
        prop_assert_eq!(flags, Flags::from_ordering(a.cmp(&b)));
        prop_assert_eq!(flags.equal(), a == b);
        prop_assert_eq!(flags.greater(), a > b);
        prop_assert_eq!(flags.less(), a < b);
        prop_assert_eq!(cpu.regs.get(0).unwrap(), a);
        prop_assert_eq!(cpu.regs.get(1).unwrap(), b);
    }

    #[test]
    fn conditional_jumps_follow_equal_flag(a: u8, b: u8) {
        // 0: LDI R0, a
        // 3: LDI R1, b
        // 6: LDI R2, 18   (target)
        // 9: CMP R0, R1
        // 12: JEQ R2
        // 14: JNE R2
        // 16: HLT         (only reached if neither jumped)
        // 17: HLT
        // 18: LDI R3, 1
        // 21: HLT
        let (cpu, _) = run(&[
            Instruction::Ldi { reg: 0, value: a },
            Instruction::Ldi { reg: 1, value: b },
            Instruction::Ldi { reg: 2, value: 18 },
            Instruction::Alu { op: AluOp::Cmp, a: 0, b: 1 },
            Instruction::Jeq { reg: 2 },
            Instruction::Jne { reg: 2 },
            Instruction::Hlt,
            Instruction::Hlt,
            Instruction::Ldi { reg: 3, value: 1 },
            Instruction::Hlt,
        ]);

        // One of the two always jumps.
        prop_assert_eq!(cpu.regs.get(3).unwrap(), 1);
        // JEQ jumps straight away when equal; otherwise JNE runs one step later.
        let expected_cycles = if a == b { 7 } else { 8 };
        prop_assert_eq!(cpu.cycles, expected_cycles);
    }

    #[test]
    fn add_and_mul_wrap_to_a_byte(a: u8, b: u8) {
        let (cpu, _) = run(&[
            Instruction::Ldi { reg: 0, value: a },
            Instruction::Ldi { reg: 1, value: b },
            Instruction::Ldi { reg: 2, value: a },
            Instruction::Alu { op: AluOp::Add, a: 0, b: 1 },
            Instruction::Alu { op: AluOp::Mul, a: 2, b: 1 },
            Instruction::Hlt,
        ]);
        prop_assert_eq!(cpu.regs.get(0).unwrap() as u32, (a as u32 + b as u32) % 256);
        prop_assert_eq!(cpu.regs.get(2).unwrap() as u32, (a as u32 * b as u32) % 256);
    }

    #[test]
    fn call_returns_after_its_operand(target_reg in general_register(), value: u8) {
        // 0: LDI Rt, 9
        // 3: CALL Rt
        // 5: PRN R6
        // 7: HLT
        // 8: HLT
        // 9: LDI R6, value
        // 12: RET
        prop_assume!(target_reg != 6);
        let (cpu, out) = run(&[
            Instruction::Ldi { reg: target_reg, value: 9 },
            Instruction::Call { reg: target_reg },
            Instruction::Prn { reg: 6 },
            Instruction::Hlt,
            Instruction::Hlt,
            Instruction::Ldi { reg: 6, value },
            Instruction::Ret,
        ]);
        prop_assert_eq!(out, format!("{}\n", value));
        prop_assert_eq!(cpu.regs.pc, 8);
        prop_assert_eq!(cpu.regs.sp(), 255);
    }
}
