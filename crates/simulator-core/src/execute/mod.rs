//! Opcode handlers and the per-cycle driver.
//!
//! One cycle is one call to [`step`]: permission-check the PC, fetch,
//! decode, pre-assert the class write enables, dispatch to the handler,
//! capture a trace record, clear the control signals. Exactly one handler
//! runs per cycle and is the sole mutator of PC/registers/PSR/memory for
//! that cycle. A cycle that faults clears the signals and emits nothing.

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use std::cmp::Ordering;

use crate::access::{check_access, SYSTEM_BASE};
use crate::decoder::{
    decode, ArithmeticOp, BranchCondition, Comparison, Instruction, JumpTarget, LogicalOp,
    ShiftModOp, SubroutineTarget,
};
use crate::encoding::OpcodeClass;
use crate::fault::{AccessKind, Fault};
use crate::state::{Condition, MachineState, Privilege, Reg, HALT_ADDRESS};
use crate::trace::{TraceRecord, TraceSink};

/// Result of one successfully executed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The machine is ready for another cycle.
    Continue,
    /// The PC has reached the halt sentinel; the run loop must stop
    /// without fetching from it.
    HaltPending,
}

/// Executes one datapath cycle against `machine`, recording the cycle
/// into `sink` on success.
///
/// # Errors
///
/// Returns [`Fault::AccessViolation`] when the fetch or a load/store
/// effective address crosses the privilege boundary, and
/// [`Fault::UnrecognisedOpcode`] when the fetched word's top nibble is
/// unassigned. On any fault the control signals are cleared, no trace
/// record is emitted, and no architectural state has been modified by
/// the faulting instruction.
pub fn step(machine: &mut MachineState, sink: &mut dyn TraceSink) -> Result<StepOutcome, Fault> {
    let pc = machine.pc();
    if let Err(fault) = check_access(machine.privilege(), pc, AccessKind::Fetch) {
        machine.clear_signals();
        return Err(fault);
    }

    let word = machine.mem(pc);
    let instruction = match decode(word) {
        Ok(instruction) => instruction,
        Err(fault) => {
            machine.clear_signals();
            return Err(fault);
        }
    };

    preset_write_enables(machine, instruction.class());

    if let Err(fault) = dispatch(machine, &instruction) {
        machine.clear_signals();
        return Err(fault);
    }

    sink.record(&TraceRecord::capture(machine, pc, word));
    machine.clear_signals();

    Ok(if machine.pc() == HALT_ADDRESS {
        StepOutcome::HaltPending
    } else {
        StepOutcome::Continue
    })
}

/// Runs cycles until the PC reaches the halt sentinel, returning the
/// number of executed cycles. The sentinel address itself is never
/// fetched.
///
/// # Errors
///
/// Propagates the first [`Fault`] raised by [`step`]; the machine is
/// left frozen at the faulting cycle.
pub fn run(machine: &mut MachineState, sink: &mut dyn TraceSink) -> Result<u64, Fault> {
    let mut cycles = 0;
    loop {
        if machine.pc() == HALT_ADDRESS {
            return Ok(cycles);
        }
        match step(machine, sink)? {
            StepOutcome::Continue => cycles += 1,
            StepOutcome::HaltPending => return Ok(cycles + 1),
        }
    }
}

/// Pre-asserts the write enables mandated by the instruction class,
/// before the handler runs.
fn preset_write_enables(machine: &mut MachineState, class: OpcodeClass) {
    let signals = machine.signals_mut();
    match class {
        OpcodeClass::Arithmetic
        | OpcodeClass::Logical
        | OpcodeClass::Load
        | OpcodeClass::Const
        | OpcodeClass::ShiftMod
        | OpcodeClass::HiConst
        | OpcodeClass::Trap => {
            signals.reg_write = true;
            signals.nzp_write = true;
        }
        OpcodeClass::Comparative => signals.nzp_write = true,
        OpcodeClass::Store => signals.mem_write = true,
        // JSR links R7 without asserting the register write enable.
        OpcodeClass::Branch | OpcodeClass::Jsr | OpcodeClass::Rti | OpcodeClass::Jump => {}
    }
}

fn dispatch(machine: &mut MachineState, instruction: &Instruction) -> Result<(), Fault> {
    match *instruction {
        Instruction::Load { rd, base, offset } => return load(machine, rd, base, offset),
        Instruction::Store { rt, base, offset } => return store(machine, rt, base, offset),
        Instruction::Branch { condition, offset } => branch(machine, condition, offset),
        Instruction::Arithmetic { rd, rs, op } => arithmetic(machine, rd, rs, op),
        Instruction::Compare { rs, comparison } => compare(machine, rs, comparison),
        Instruction::Subroutine { target } => subroutine(machine, target),
        Instruction::Logical { rd, rs, op } => logical(machine, rd, rs, op),
        Instruction::Rti => rti(machine),
        Instruction::Const { rd, value } => const_value(machine, rd, value),
        Instruction::ShiftMod { rd, rs, op } => shift_mod(machine, rd, rs, op),
        Instruction::Jump { target } => jump(machine, target),
        Instruction::HiConst { rd, value } => hi_const(machine, rd, value),
        Instruction::Trap { vector } => trap(machine, vector),
    }
    Ok(())
}

fn advance_pc(machine: &mut MachineState) {
    machine.set_pc(machine.pc().wrapping_add(1));
}

fn latch_rd_rs(machine: &mut MachineState, rd: Reg, rs: Reg) {
    let signals = machine.signals_mut();
    signals.rd = rd.index() as u8;
    signals.rs = rs.index() as u8;
}

/// Latches the rt selector and reads the register.
fn latch_rt(machine: &mut MachineState, rt: Reg) -> u16 {
    machine.signals_mut().rt = rt.index() as u8;
    machine.reg(rt)
}

fn branch(machine: &mut MachineState, condition: BranchCondition, offset: u16) {
    let next = machine.pc().wrapping_add(1);
    if condition.matches(machine.psr().nzp()) {
        machine.set_pc(next.wrapping_add(offset));
    } else {
        machine.set_pc(next);
    }
}

fn arithmetic(machine: &mut MachineState, rd: Reg, rs: Reg, op: ArithmeticOp) {
    latch_rd_rs(machine, rd, rs);
    let lhs = machine.reg(rs);
    let result = match op {
        ArithmeticOp::Add(rt) => lhs.wrapping_add(latch_rt(machine, rt)),
        ArithmeticOp::Multiply(rt) => lhs.wrapping_mul(latch_rt(machine, rt)),
        ArithmeticOp::Subtract(rt) => lhs.wrapping_sub(latch_rt(machine, rt)),
        ArithmeticOp::Divide(rt) => {
            let divisor = latch_rt(machine, rt);
            if divisor == 0 {
                0
            } else {
                lhs / divisor
            }
        }
        ArithmeticOp::AddImmediate(imm) => lhs.wrapping_add(imm),
    };
    machine.set_reg(rd, result);
    machine.update_nzp(result);
    advance_pc(machine);
}

fn logical(machine: &mut MachineState, rd: Reg, rs: Reg, op: LogicalOp) {
    latch_rd_rs(machine, rd, rs);
    let lhs = machine.reg(rs);
    let result = match op {
        LogicalOp::And(rt) => lhs & latch_rt(machine, rt),
        LogicalOp::Not => !lhs,
        LogicalOp::Or(rt) => lhs | latch_rt(machine, rt),
        LogicalOp::Xor(rt) => lhs ^ latch_rt(machine, rt),
        LogicalOp::AndImmediate(imm) => lhs & imm,
    };
    machine.set_reg(rd, result);
    machine.update_nzp(result);
    advance_pc(machine);
}

fn compare(machine: &mut MachineState, rs: Reg, comparison: Comparison) {
    machine.signals_mut().rs = rs.index() as u8;
    let lhs = machine.reg(rs);
    match comparison {
        // Signed forms take the NZP of the 16-bit wrapping difference.
        Comparison::SignedRegister(rt) => {
            let rhs = latch_rt(machine, rt);
            machine.update_nzp(lhs.wrapping_sub(rhs));
        }
        Comparison::SignedImmediate(imm) => machine.update_nzp(lhs.wrapping_sub(imm)),
        Comparison::UnsignedRegister(rt) => {
            let rhs = latch_rt(machine, rt);
            machine.set_condition(unsigned_order(lhs, rhs));
        }
        Comparison::UnsignedImmediate(imm) => {
            machine.set_condition(unsigned_order(lhs, imm));
        }
    }
    advance_pc(machine);
}

fn unsigned_order(lhs: u16, rhs: u16) -> Condition {
    match lhs.cmp(&rhs) {
        Ordering::Less => Condition::Negative,
        Ordering::Equal => Condition::Zero,
        Ordering::Greater => Condition::Positive,
    }
}

fn subroutine(machine: &mut MachineState, target: SubroutineTarget) {
    let link = machine.pc().wrapping_add(1);
    match target {
        SubroutineTarget::Register(rs) => {
            machine.signals_mut().rs = rs.index() as u8;
            // Read the target before linking so JSRR R7 still transfers
            // to the pre-call value.
            let target = machine.reg(rs);
            machine.set_reg(Reg::LINK, link);
            machine.set_pc(target);
        }
        SubroutineTarget::PageAbsolute(imm11) => {
            machine.set_reg(Reg::LINK, link);
            machine.set_pc((machine.pc() & SYSTEM_BASE) | (imm11 << 4));
        }
    }
}

fn jump(machine: &mut MachineState, target: JumpTarget) {
    match target {
        JumpTarget::Register(rs) => {
            machine.signals_mut().rs = rs.index() as u8;
            let target = machine.reg(rs);
            machine.set_pc(target);
        }
        JumpTarget::Relative(offset) => {
            machine.set_pc(machine.pc().wrapping_add(1).wrapping_add(offset));
        }
    }
}

fn shift_mod(machine: &mut MachineState, rd: Reg, rs: Reg, op: ShiftModOp) {
    latch_rd_rs(machine, rd, rs);
    let value = machine.reg(rs);
    let result = match op {
        ShiftModOp::ShiftLeft(amount) => value << amount,
        ShiftModOp::ShiftRightArithmetic(amount) => ((value as i16) >> amount) as u16,
        ShiftModOp::ShiftRightLogical(amount) => value >> amount,
        ShiftModOp::Modulo(rt) => {
            let divisor = latch_rt(machine, rt);
            if divisor == 0 {
                0
            } else {
                value % divisor
            }
        }
    };
    machine.set_reg(rd, result);
    machine.update_nzp(result);
    advance_pc(machine);
}

fn load(machine: &mut MachineState, rd: Reg, base: Reg, offset: u16) -> Result<(), Fault> {
    let addr = machine.reg(base).wrapping_add(offset);
    // The check precedes every write this instruction performs.
    check_access(machine.privilege(), addr, AccessKind::Load)?;
    let value = machine.mem(addr);
    let signals = machine.signals_mut();
    signals.rd = rd.index() as u8;
    signals.rs = base.index() as u8;
    signals.mem_addr = addr;
    signals.mem_value = value;
    machine.set_reg(rd, value);
    machine.update_nzp(value);
    advance_pc(machine);
    Ok(())
}

fn store(machine: &mut MachineState, rt: Reg, base: Reg, offset: u16) -> Result<(), Fault> {
    let addr = machine.reg(base).wrapping_add(offset);
    check_access(machine.privilege(), addr, AccessKind::Store)?;
    let value = machine.reg(rt);
    let signals = machine.signals_mut();
    signals.rt = rt.index() as u8;
    signals.rs = base.index() as u8;
    signals.mem_addr = addr;
    signals.mem_value = value;
    machine.set_mem(addr, value);
    advance_pc(machine);
    Ok(())
}

fn const_value(machine: &mut MachineState, rd: Reg, value: u16) {
    machine.signals_mut().rd = rd.index() as u8;
    machine.set_reg(rd, value);
    machine.update_nzp(value);
    advance_pc(machine);
}

fn hi_const(machine: &mut MachineState, rd: Reg, value: u8) {
    machine.signals_mut().rd = rd.index() as u8;
    let result = (machine.reg(rd) & 0x00FF) | (u16::from(value) << 8);
    machine.set_reg(rd, result);
    machine.update_nzp(result);
    advance_pc(machine);
}

fn trap(machine: &mut MachineState, vector: u8) {
    let link = machine.pc().wrapping_add(1);
    machine.signals_mut().rd = Reg::LINK.index() as u8;
    machine.set_reg(Reg::LINK, link);
    // The NZP latches the return address, an artifact the trace format
    // preserves.
    machine.update_nzp(link);
    machine.set_pc(SYSTEM_BASE | u16::from(vector));
    machine.set_privilege(Privilege::Supervisor);
}

fn rti(machine: &mut MachineState) {
    machine.set_pc(machine.reg(Reg::LINK));
    machine.set_privilege(Privilege::User);
}
