//! # Operand Shapes
//!
//! This module defines the operand shapes used by the OPER-8 instruction set.
//! Every instruction is two bytes: an opcode byte followed by a single operand
//! byte. The operand shape determines how that second byte is interpreted and
//! how the assembler and disassembler render it.

/// OPER-8 operand shape enumeration.
///
/// The shape determines how the second instruction byte is split and used:
///
/// - **No split**: None, Immediate, ZeroPage, Offset (the whole byte is one value)
/// - **Two nibbles**: Register (high nibble only), RegisterPair, RegisterRange
///
/// # Examples
///
/// ```
/// use oper8::{OperandKind, OPCODE_TABLE};
///
/// // MOV takes two register nibbles
/// assert_eq!(OPCODE_TABLE[0x20].operand, OperandKind::RegisterPair);
///
/// // LDI5 takes a full immediate byte
/// assert_eq!(OPCODE_TABLE[0x15].operand, OperandKind::Immediate);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Operand byte unused; assembler emits 0x00.
    ///
    /// Examples: NOP, RET, HLT
    None,

    /// 8-bit constant in the operand byte.
    ///
    /// Example: LDI3 $48 (load 0x48 into R3)
    Immediate,

    /// Single register index in the high nibble; low nibble is zero.
    ///
    /// Examples: INC R4, NOT R7, PRINT R0
    Register,

    /// Two register indices: x in the high nibble, y in the low nibble.
    ///
    /// Examples: MOV R1, R2; ADD R0, R3; JMPL R2, R3
    RegisterPair,

    /// A wrapping register range from x through y, nibble-packed like a pair.
    ///
    /// Examples: PUSH R0, R3 (saves R0, R1, R2, R3); the range may wrap
    /// through R15 back to R0.
    RegisterRange,

    /// Signed 8-bit branch displacement added to PC+2.
    ///
    /// Examples: JMP loop; JNZ -4
    Offset,

    /// 8-bit zero-page address (0x0000-0x00FF).
    ///
    /// Examples: LOADZ $FA, STORZ $FB
    ZeroPage,
}
