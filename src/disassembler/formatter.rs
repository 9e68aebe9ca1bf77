//! Formatting functions for disassembled instructions

use crate::disassembler::Instruction;
use crate::operand::OperandKind;

/// Formats a single instruction as canonical assembly text.
///
/// Canonical form: upper-case mnemonic, registers as `R<n>`, immediates and
/// zero-page addresses as `$HH`, branch displacements as signed decimal.
/// Undefined opcodes render as raw bytes: `??? [$99 $AB]`.
///
/// # Arguments
///
/// * `instr` - The instruction to format
///
/// # Examples
///
/// ```
/// use oper8::disassembler::decoder::decode_instruction;
/// use oper8::disassembler::formatter::format_instruction;
///
/// let mov = decode_instruction(0x20, 0x12, 0x0200);
/// assert_eq!(format_instruction(&mov), "MOV R1, R2");
///
/// let jnz = decode_instruction(0x53, 0xFC, 0x0200);
/// assert_eq!(format_instruction(&jnz), "JNZ -4");
/// ```
pub fn format_instruction(instr: &Instruction) -> String {
    if instr.mnemonic == "???" {
        return format!("??? [${:02X} ${:02X}]", instr.opcode, instr.operand);
    }

    let rx = (instr.operand >> 4) & 0x0F;
    let ry = instr.operand & 0x0F;

    match instr.kind {
        OperandKind::None => instr.mnemonic.to_string(),
        OperandKind::Immediate | OperandKind::ZeroPage => {
            format!("{} ${:02X}", instr.mnemonic, instr.operand)
        }
        OperandKind::Register => format!("{} R{}", instr.mnemonic, rx),
        OperandKind::RegisterPair | OperandKind::RegisterRange => {
            format!("{} R{}, R{}", instr.mnemonic, rx, ry)
        }
        OperandKind::Offset => {
            format!("{} {}", instr.mnemonic, instr.operand as i8)
        }
    }
}

/// Formats an instruction as a listing line: address, raw bytes, mnemonic.
///
/// ```text
/// 0200  10 48    LDI0 $48
/// ```
pub fn format_listing_line(instr: &Instruction) -> String {
    format!(
        "{:04X}  {:02X} {:02X}    {}",
        instr.address,
        instr.opcode,
        instr.operand,
        format_instruction(instr)
    )
}
