//! # Logic Instructions
//!
//! This module implements the bitwise operations:
//! - AND, OR, XOR: two-register bitwise ops
//! - NOT: single-register complement
//! - TEST: AND without storing
//!
//! Z and N come from the result. The logical ops clear C; TEST is the one
//! exception and preserves it, so a masked test can sit inside a multi-byte
//! arithmetic chain.

use crate::cpu::StepResult;
use crate::{Cpu, MemoryBus};

use super::{reg_pair, reg_x};

/// Executes AND Rx, Ry. C cleared.
pub(crate) fn execute_and<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let (rx, ry) = reg_pair(arg);
    let result = cpu.regs[rx] & cpu.regs[ry];
    cpu.regs[rx] = result;
    cpu.update_zn(result);
    cpu.flag_c = false;
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}

/// Executes OR Rx, Ry. C cleared.
pub(crate) fn execute_or<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let (rx, ry) = reg_pair(arg);
    let result = cpu.regs[rx] | cpu.regs[ry];
    cpu.regs[rx] = result;
    cpu.update_zn(result);
    cpu.flag_c = false;
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}

/// Executes XOR Rx, Ry. C cleared. `XOR Rx, Rx` is the idiomatic clear.
///
/// # Examples
///
/// ```
/// use oper8::{Cpu, FlatMemory};
///
/// let mut cpu = Cpu::new(FlatMemory::new());
/// cpu.set_reg(5, 0xA5);
/// cpu.load_program(&[0x42, 0x55], 0x0200); // XOR R5, R5
/// cpu.step();
/// assert_eq!(cpu.reg(5), 0);
/// assert!(cpu.flag_z());
/// ```
pub(crate) fn execute_xor<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let (rx, ry) = reg_pair(arg);
    let result = cpu.regs[rx] ^ cpu.regs[ry];
    cpu.regs[rx] = result;
    cpu.update_zn(result);
    cpu.flag_c = false;
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}

/// Executes NOT Rx. C cleared; Z computed honestly from the result even
/// though only a $FF input can produce zero.
pub(crate) fn execute_not<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let rx = reg_x(arg);
    let result = !cpu.regs[rx];
    cpu.regs[rx] = result;
    cpu.update_zn(result);
    cpu.flag_c = false;
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}

/// Executes TEST Rx, Ry: Z and N from Rx & Ry, C preserved, registers
/// untouched.
pub(crate) fn execute_test<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let (rx, ry) = reg_pair(arg);
    let tmp = cpu.regs[rx] & cpu.regs[ry];
    cpu.update_zn(tmp);
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}
