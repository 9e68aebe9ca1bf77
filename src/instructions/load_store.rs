//! # Load and Store Instructions
//!
//! This module implements the four memory-traffic instructions:
//! - LOAD Rx, \[Ry\]: read through the register-pair address (Ry, Ry+1)
//! - STOR Rx, \[Ry\]: write through the register-pair address
//! - LOADZ addr: read a zero-page cell into R0
//! - STORZ addr: write R0 to a zero-page cell
//!
//! Addresses are big-endian: the lower-indexed register of the pair holds the
//! high byte. Data traffic goes through the CPU's hooked load/store helpers,
//! so the memory-mapped console cells (0x00FA/0x00FB) behave as a character
//! port. None of these instructions touch the flags.

use crate::cpu::StepResult;
use crate::{Cpu, MemoryBus};

use super::reg_pair;

/// Effective address for LOAD/STOR: (Ry << 8) | R(y+1 mod 16).
fn pair_address<M: MemoryBus>(cpu: &Cpu<M>, ry: usize) -> u16 {
    let high = cpu.regs[ry] as u16;
    let low = cpu.regs[(ry + 1) & 0x0F] as u16;
    (high << 8) | low
}

/// Executes LOAD Rx, \[Ry:Ry+1\].
///
/// # Examples
///
/// ```
/// use oper8::{Cpu, FlatMemory, MemoryBus};
///
/// let mut cpu = Cpu::new(FlatMemory::new());
/// cpu.memory_mut().write(0x1234, 0x99);
/// cpu.set_reg(2, 0x12);
/// cpu.set_reg(3, 0x34);
/// cpu.load_program(&[0x22, 0x12], 0x0200); // LOAD R1, R2
/// cpu.step();
/// assert_eq!(cpu.reg(1), 0x99);
/// ```
pub(crate) fn execute_load<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let (rx, ry) = reg_pair(arg);
    let addr = pair_address(cpu, ry);
    cpu.regs[rx] = cpu.load_data(addr);
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}

/// Executes STOR Rx, \[Ry:Ry+1\].
pub(crate) fn execute_stor<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let (rx, ry) = reg_pair(arg);
    let addr = pair_address(cpu, ry);
    let value = cpu.regs[rx];
    cpu.store_data(addr, value);
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}

/// Executes LOADZ addr: R0 receives the zero-page byte at the operand
/// address.
pub(crate) fn execute_loadz<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    cpu.regs[0] = cpu.load_data(arg as u16);
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}

/// Executes STORZ addr: the zero-page byte at the operand address receives
/// R0.
pub(crate) fn execute_storz<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let value = cpu.regs[0];
    cpu.store_data(arg as u16, value);
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}
