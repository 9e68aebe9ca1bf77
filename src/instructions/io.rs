//! # Console I/O Instructions
//!
//! This module implements the two console opcodes:
//! - PRINT Rx: emit a register byte through the character-out callback
//! - INPUT Rx: read a byte from the character-in callback
//!
//! Both callbacks are optional and must never block. PRINT with no callback
//! installed is a no-op; INPUT with no callback reads 0. Hosts poll by
//! looping on INPUT until a nonzero byte arrives.

use crate::cpu::StepResult;
use crate::{Cpu, MemoryBus};

use super::reg_x;

/// Executes PRINT Rx. Flags preserved.
pub(crate) fn execute_print<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let value = cpu.regs[reg_x(arg)];
    if let Some(cb) = cpu.on_output.as_mut() {
        cb(value);
    }
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}

/// Executes INPUT Rx.
///
/// Z and N reflect the byte read, so `INPUT Rx; JZ poll` is the idiomatic
/// wait loop. C is preserved.
pub(crate) fn execute_input<M: MemoryBus>(cpu: &mut Cpu<M>, arg: u8) -> StepResult {
    let rx = reg_x(arg);
    let value = match cpu.on_input.as_mut() {
        Some(cb) => cb(),
        None => 0,
    };
    cpu.regs[rx] = value;
    cpu.update_zn(value);
    cpu.pc = cpu.pc.wrapping_add(2);
    StepResult::Executed
}
