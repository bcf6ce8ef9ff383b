//! Program-level semantics: whole instruction sequences driven through
//! the cycle driver, plus input-space properties over decode, sign
//! extension, and the permission boundary.

#![allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

use proptest::prelude::*;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use simulator_core::encoding::{simm11, simm5, simm6, simm7, simm9};
use simulator_core::{
    decode, is_denied, load_object, run, step, Fault, MachineState, Privilege, Reg, TraceRecord,
    HALT_ADDRESS, RESET_PC,
};

// Instruction encoders for readable test programs. Registers are plain
// u16 indices here; the decoder masks every field.
const fn const_op(rd: u16, imm9: i16) -> u16 {
    0x9000 | (rd << 9) | (imm9 as u16 & 0x01FF)
}
const fn hiconst(rd: u16, byte: u16) -> u16 {
    0xD000 | (rd << 9) | byte
}
const fn addi(rd: u16, rs: u16, imm5: i16) -> u16 {
    0x1000 | (rd << 9) | (rs << 6) | 0x0020 | (imm5 as u16 & 0x001F)
}
const fn add(rd: u16, rs: u16, rt: u16) -> u16 {
    0x1000 | (rd << 9) | (rs << 6) | rt
}
const fn br(mask: u16, offset: i16) -> u16 {
    (mask << 9) | (offset as u16 & 0x01FF)
}
const fn jmp_rel(offset: i16) -> u16 {
    0xC800 | (offset as u16 & 0x07FF)
}
const fn jmpr(rs: u16) -> u16 {
    0xC000 | (rs << 6)
}
const fn ldr(rd: u16, base: u16, offset: i16) -> u16 {
    0x6000 | (rd << 9) | (base << 6) | (offset as u16 & 0x003F)
}
const fn str_op(rt: u16, base: u16, offset: i16) -> u16 {
    0x7000 | (rt << 9) | (base << 6) | (offset as u16 & 0x003F)
}
const fn trap(vector: u16) -> u16 {
    0xF000 | vector
}
const fn rti() -> u16 {
    0x8000
}

fn load_words(machine: &mut MachineState, start: u16, words: &[u16]) {
    for (i, &word) in words.iter().enumerate() {
        machine.set_mem(start + u16::try_from(i).expect("short program"), word);
    }
}

#[test]
fn countdown_loop_runs_to_the_halt_sentinel() {
    let mut machine = MachineState::new();
    load_words(
        &mut machine,
        RESET_PC,
        &[
            const_op(0, 3),  // R0 = 3
            addi(0, 0, -1),  // R0 -= 1
            br(0b001, -2),   // BRp back to the decrement
            jmp_rel(-0x105), // to the halt sentinel
        ],
    );

    let mut records: Vec<TraceRecord> = Vec::new();
    let cycles = run(&mut machine, &mut records).expect("program halts");

    assert_eq!(machine.reg(Reg::R0), 0);
    assert_eq!(machine.pc(), HALT_ADDRESS);
    // CONST, then three decrement/branch pairs, then the jump out.
    assert_eq!(cycles, 8);
    assert_eq!(records.len(), 8);
    // The final decrement reaches zero and records Z; the untaken branch
    // and the jump out write no condition code.
    assert_eq!(records[5].nzp, 2);
    assert!(!records[6].nzp_write);
    assert!(!records[7].nzp_write);
}

#[test]
fn trace_records_replay_the_executed_pcs_in_order() {
    let mut machine = MachineState::new();
    load_words(
        &mut machine,
        RESET_PC,
        &[
            const_op(1, 0x42),
            add(2, 1, 1),
            str_op(2, 1, 10), // effective address 0x4C sits in the user half
        ],
    );

    let mut records: Vec<TraceRecord> = Vec::new();
    step(&mut machine, &mut records).expect("const");
    step(&mut machine, &mut records).expect("add");

    assert_eq!(records[0].pc, RESET_PC);
    assert_eq!(records[1].pc, RESET_PC + 1);
    assert_eq!(records[0].word, const_op(1, 0x42));
    assert_eq!(records[1].word, add(2, 1, 1));
    assert_eq!(machine.reg(Reg::R2), 0x84);

    let fault = step(&mut machine, &mut records).expect_err("store crosses the boundary");
    assert!(matches!(fault, Fault::AccessViolation { .. }));
    assert_eq!(records.len(), 2);
}

#[test]
fn loads_and_stores_move_data_through_memory() {
    let mut machine = MachineState::new();
    load_words(
        &mut machine,
        RESET_PC,
        &[
            const_op(1, 0xFF),  // R1 = 0x00FF
            hiconst(1, 0x90),   // R1 = 0x90FF
            const_op(2, 77),    // R2 = 77
            str_op(2, 1, 1),    // memory[0x9100] = 77
            ldr(3, 1, 1),       // R3 = memory[0x9100]
            const_op(4, 0xFF),  // R4 = 0x00FF
            hiconst(4, 0x80),   // R4 = halt sentinel
            jmpr(4),
        ],
    );

    let mut records: Vec<TraceRecord> = Vec::new();
    let cycles = run(&mut machine, &mut records).expect("program halts");

    assert_eq!(cycles, 8);
    assert_eq!(machine.mem(0x9100), 77);
    assert_eq!(machine.reg(Reg::R3), 77);

    let store = &records[3];
    assert!(store.mem_write);
    assert_eq!(store.mem_addr, 0x9100);
    assert_eq!(store.mem_value, 77);

    let load = &records[4];
    assert!(!load.mem_write);
    assert_eq!(load.mem_addr, 0x9100);
    assert_eq!(load.mem_value, 77);
    assert_eq!(load.reg_value, 77);
}

#[test]
fn trap_round_trip_restores_user_mode_and_the_return_address() {
    let mut machine = MachineState::new();
    // Supervisor prologue: build a user entry address and drop privilege.
    load_words(
        &mut machine,
        RESET_PC,
        &[
            const_op(7, 0),   // R7 = 0
            hiconst(7, 0x01), // R7 = 0x0100
            rti(),            // enter user code at 0x0100
        ],
    );
    // User program: trap, then run to the halt sentinel.
    load_words(
        &mut machine,
        0x0100,
        &[
            trap(0x02),       // into the handler at 0x8002
            const_op(1, 0xFF),
            hiconst(1, 0x80), // R1 = halt sentinel
            jmpr(1),
        ],
    );
    // Handler: return to the trapped program.
    load_words(&mut machine, 0x8002, &[rti()]);

    let mut records: Vec<TraceRecord> = Vec::new();
    let cycles = run(&mut machine, &mut records).expect("program halts");

    assert_eq!(cycles, 8);
    assert_eq!(machine.pc(), HALT_ADDRESS);
    assert_eq!(machine.privilege(), Privilege::User);
    // The trap linked its return address and the handler went back there.
    assert_eq!(machine.reg(Reg::R7), 0x0101);
    let trap_record = &records[3];
    assert_eq!(trap_record.pc, 0x0100);
    assert!(trap_record.reg_write);
    assert_eq!(trap_record.rd, 7);
    assert_eq!(trap_record.reg_value, 0x0101);
    let handler_rti = &records[4];
    assert_eq!(handler_rti.pc, 0x8002);
    assert_eq!(records[5].pc, 0x0101);
}

#[test]
fn loaded_object_image_executes_like_hand_placed_memory() {
    let program = [const_op(0, 5), addi(0, 0, 2), jmp_rel(-0x104)];

    let mut image = Vec::new();
    for word in [0xCADE_u16, RESET_PC, 3] {
        image.extend_from_slice(&word.to_be_bytes());
    }
    for word in program {
        image.extend_from_slice(&word.to_be_bytes());
    }

    let mut machine = MachineState::new();
    load_object(&mut machine, &image).expect("image loads");

    let mut records: Vec<TraceRecord> = Vec::new();
    let cycles = run(&mut machine, &mut records).expect("program halts");

    assert_eq!(cycles, 3);
    assert_eq!(machine.reg(Reg::R0), 7);
    assert_eq!(machine.pc(), HALT_ADDRESS);
}

proptest! {
    #[test]
    fn decode_is_total_and_faults_only_on_unassigned_nibbles(word in any::<u16>()) {
        match decode(word) {
            Ok(_) => prop_assert!(!matches!(word >> 12, 0x3 | 0xB | 0xE)),
            Err(fault) => {
                prop_assert!(matches!(word >> 12, 0x3 | 0xB | 0xE));
                prop_assert_eq!(fault, Fault::UnrecognisedOpcode { word });
            }
        }
    }

    #[test]
    fn permission_domains_partition_the_space_except_the_top_word(addr in any::<u16>()) {
        let user = is_denied(Privilege::User, addr);
        let supervisor = is_denied(Privilege::Supervisor, addr);
        if addr == 0xFFFF {
            prop_assert!(!user);
            prop_assert!(!supervisor);
        } else if addr < 0x8000 {
            prop_assert!(!user);
            prop_assert!(supervisor);
        } else {
            prop_assert!(user);
            prop_assert!(!supervisor);
        }
    }

    #[test]
    fn sign_extension_matches_twos_complement_for_every_width(value in any::<u16>()) {
        for (width, extended) in [
            (5_u32, simm5(value)),
            (6, simm6(value)),
            (7, simm7(value)),
            (9, simm9(value)),
            (11, simm11(value)),
        ] {
            let field = i32::from(value & ((1 << width) - 1));
            let expected = if field >= 1 << (width - 1) {
                field - (1 << width)
            } else {
                field
            };
            prop_assert_eq!(i32::from(extended as i16), expected);
        }
    }
}
