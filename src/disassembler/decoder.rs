//! Instruction decoder for the OPER-8 disassembler

use crate::disassembler::Instruction;
use crate::opcodes::OPCODE_TABLE;

/// Decodes one (opcode, operand) pair.
///
/// The function is total: undefined opcodes come back with the "???"
/// mnemonic and are rendered as raw bytes by the formatter.
///
/// # Examples
///
/// ```
/// use oper8::disassembler::decoder::decode_instruction;
/// use oper8::OperandKind;
///
/// let instr = decode_instruction(0x21, 0x1F, 0x0200);
/// assert_eq!(instr.mnemonic, "SWAP");
/// assert_eq!(instr.kind, OperandKind::RegisterPair);
/// assert_eq!(instr.operand, 0x1F);
/// ```
pub fn decode_instruction(opcode: u8, operand: u8, address: u16) -> Instruction {
    let metadata = &OPCODE_TABLE[opcode as usize];
    Instruction {
        address,
        opcode,
        operand,
        mnemonic: metadata.mnemonic,
        kind: metadata.operand,
    }
}
