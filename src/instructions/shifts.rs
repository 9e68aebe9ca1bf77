//! # Shift Instructions
//!
//! This module implements the two rotate-through-carry shifts:
//! - SHL: shift left, old C enters bit 0, old bit 7 becomes C
//! - SHR: shift right, old C enters bit 7, old bit 0 becomes C
//!
//! Because the carry rotates through, SHL followed by SHR (with the pre-shift
//! carry restored) is the identity, and N after SHR equals the old carry.

use crate::cpu::StepResult;
use crate::{Cpu, MemoryBus};

use super::reg_x;

/// Executes SHL Rx.
pub(crate) fn execute_shl<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let rx = reg_x(arg);
    let x = cpu.regs[rx];
    let carry_in = if cpu.flag_c { 1u8 } else { 0 };
    let shifted_out = (x >> 7) & 1;
    let result = (x << 1) | carry_in;
    cpu.regs[rx] = result;
    cpu.flag_c = shifted_out != 0;
    cpu.update_zn(result);
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}

/// Executes SHR Rx.
pub(crate) fn execute_shr<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let rx = reg_x(arg);
    let x = cpu.regs[rx];
    let carry_in = if cpu.flag_c { 0x80u8 } else { 0 };
    let shifted_out = x & 1;
    let result = (x >> 1) | carry_in;
    cpu.regs[rx] = result;
    cpu.flag_c = shifted_out != 0;
    cpu.update_zn(result);
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}
