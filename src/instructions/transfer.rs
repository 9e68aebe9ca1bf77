//! # Register Transfer Instructions
//!
//! This module implements register-to-register movement and immediate loads:
//! - LDI0-LDI15: load an immediate byte into the register named by the opcode
//! - MOV: copy one register into another
//! - SWAP: exchange two registers
//!
//! None of these touch the flags.

use crate::cpu::StepResult;
use crate::{Cpu, MemoryBus};

use super::reg_pair;

/// Executes one of the LDI0-LDI15 immediate loads.
///
/// The destination register is the opcode's low nibble; the operand byte is
/// the value. Flags are preserved.
///
/// # Examples
///
/// ```
/// use oper8::{Cpu, FlatMemory};
///
/// let mut cpu = Cpu::new(FlatMemory::new());
/// cpu.load_program(&[0x17, 0xAB], 0x0200); // LDI7 $AB
/// cpu.step();
/// assert_eq!(cpu.reg(7), 0xAB);
/// ```
pub(crate) fn execute_ldi<M: MemoryBus>(cpu: &mut Cpu<M>, op: u8, arg: u8) -> StepResult {
    let r = (op & 0x0F) as usize;
    cpu.regs[r] = arg;
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}

/// Executes MOV Rx, Ry: Rx receives a copy of Ry. Flags preserved.
pub(crate) fn execute_mov<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let (rx, ry) = reg_pair(arg);
    cpu.regs[rx] = cpu.regs[ry];
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}

/// Executes SWAP Rx, Ry: the two registers exchange values in one step.
/// Swapping a register with itself is a no-op. Flags preserved.
pub(crate) fn execute_swap<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let (rx, ry) = reg_pair(arg);
    cpu.regs.swap(rx, ry);
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}
