//! Instruction encoder for the OPER-8 assembler
//!
//! Encodes one instruction line into its two-byte form: mnemonic dispatch
//! through the opcode table, operand-count and operand-shape enforcement, and
//! value resolution (numeric literals, character literals, label references,
//! and the high/low byte operators).
//!
//! Errors come back with line number 0; the two-pass driver stamps the real
//! line before reporting.

use crate::assembler::parser::{
    is_identifier, parse_char_literal, parse_number, parse_register,
};
use crate::assembler::symbol_table::SymbolTable;
use crate::assembler::{AssemblerError, ErrorType};
use crate::opcodes::{opcode_for_mnemonic, OPCODE_TABLE};
use crate::operand::OperandKind;

/// The seven mnemonics whose operand is a relative displacement; a bare
/// label in their operand position resolves to an offset instead of an
/// absolute address.
pub fn is_branch_mnemonic(mnemonic: &str) -> bool {
    matches!(
        mnemonic,
        "JMP" | "JZ" | "JNZ" | "JC" | "JNC" | "JN" | "CALL"
    )
}

fn err(error_type: ErrorType, message: String) -> AssemblerError {
    AssemblerError {
        error_type,
        line: 0,
        message,
    }
}

fn label_address(ident: &str, symbols: &SymbolTable) -> Result<u16, AssemblerError> {
    symbols
        .lookup_symbol(ident)
        .map(|s| s.address)
        .ok_or_else(|| {
            err(
                ErrorType::UndefinedLabel,
                format!("undefined label '{}'", ident),
            )
        })
}

/// Resolves a value token to 0..=0xFFFF.
///
/// Handles, in priority order: `>IDENT`/`HIGH(IDENT)`, `<IDENT`/`LOW(IDENT)`,
/// a bare defined identifier (absolute address), a single-character literal,
/// and the numeric bases. Context range checks are the caller's concern.
pub(super) fn resolve_value(token: &str, symbols: &SymbolTable) -> Result<u16, AssemblerError> {
    if let Some(ident) = high_byte_operand(token) {
        return Ok((label_address(ident, symbols)? >> 8) & 0xFF);
    }
    if let Some(ident) = low_byte_operand(token) {
        return Ok(label_address(ident, symbols)? & 0xFF);
    }
    if token.starts_with('\'') {
        let bytes = parse_char_literal(token)
            .map_err(|m| err(ErrorType::MalformedLiteral, m))?;
        if bytes.len() != 1 {
            return Err(err(
                ErrorType::MalformedLiteral,
                format!(
                    "multi-character literal {} is only allowed in .data",
                    token
                ),
            ));
        }
        return Ok(bytes[0] as u16);
    }
    if is_identifier(token) {
        return label_address(token, symbols);
    }
    parse_number(token).map_err(|m| err(ErrorType::MalformedLiteral, m))
}

/// `>IDENT` or `HIGH(IDENT)` -> the identifier, else None.
pub(super) fn high_byte_operand(token: &str) -> Option<&str> {
    token
        .strip_prefix('>')
        .or_else(|| token.strip_prefix("HIGH(").and_then(|t| t.strip_suffix(')')))
        .filter(|t| is_identifier(t))
}

/// `<IDENT` or `LOW(IDENT)` -> the identifier, else None.
pub(super) fn low_byte_operand(token: &str) -> Option<&str> {
    token
        .strip_prefix('<')
        .or_else(|| token.strip_prefix("LOW(").and_then(|t| t.strip_suffix(')')))
        .filter(|t| is_identifier(t))
}

/// Resolves a branch operand to its encoded offset byte.
///
/// A defined label yields the displacement from the branch's next-instruction
/// address, range-checked to [-128, +127]. A `-n` literal is a backward
/// displacement; any other token resolves as a raw byte value.
fn resolve_offset(
    token: &str,
    symbols: &SymbolTable,
    addr: u16,
) -> Result<u8, AssemblerError> {
    if is_identifier(token) {
        let target = label_address(token, symbols)?;
        let offset = target as i32 - (addr as i32 + 2);
        if !(-128..=127).contains(&offset) {
            return Err(err(
                ErrorType::RangeError,
                format!(
                    "branch to '{}' out of range (offset {}, expected -128 to 127)",
                    token, offset
                ),
            ));
        }
        return Ok((offset as i8) as u8);
    }

    if let Some(rest) = token.strip_prefix('-') {
        let n = parse_number(rest).map_err(|m| err(ErrorType::MalformedLiteral, m))?;
        if n > 128 {
            return Err(err(
                ErrorType::RangeError,
                format!("offset -{} out of range (minimum -128)", n),
            ));
        }
        return Ok((-(n as i32) as i8) as u8);
    }

    let value = resolve_value(token, symbols)?;
    if value > 0xFF {
        return Err(err(
            ErrorType::RangeError,
            format!("offset '{}' exceeds 8 bits", token),
        ));
    }
    Ok(value as u8)
}

fn expected_arity(kind: OperandKind) -> usize {
    match kind {
        OperandKind::None => 0,
        OperandKind::Immediate
        | OperandKind::Register
        | OperandKind::Offset
        | OperandKind::ZeroPage => 1,
        OperandKind::RegisterPair | OperandKind::RegisterRange => 2,
    }
}

/// Encodes one instruction to its two bytes.
///
/// `addr` is the address the instruction will occupy, needed for relative
/// offsets.
///
/// # Examples
///
/// ```
/// use oper8::assembler::encoder::encode_instruction;
/// use oper8::assembler::symbol_table::SymbolTable;
///
/// let symbols = SymbolTable::new();
/// let ops = vec!["R1".to_string(), "R2".to_string()];
/// let bytes = encode_instruction("MOV", &ops, &symbols, 0x0200).unwrap();
/// assert_eq!(bytes, [0x20, 0x12]);
/// ```
pub fn encode_instruction(
    mnemonic: &str,
    operands: &[String],
    symbols: &SymbolTable,
    addr: u16,
) -> Result<[u8; 2], AssemblerError> {
    let op = opcode_for_mnemonic(mnemonic).ok_or_else(|| {
        err(
            ErrorType::UnknownMnemonic,
            format!("unknown mnemonic '{}'", mnemonic),
        )
    })?;
    let kind = OPCODE_TABLE[op as usize].operand;

    let arity = expected_arity(kind);
    if operands.len() != arity {
        return Err(err(
            ErrorType::InvalidOperand,
            format!(
                "{} expects {} operand{}, got {}",
                mnemonic,
                arity,
                if arity == 1 { "" } else { "s" },
                operands.len()
            ),
        ));
    }

    let arg = match kind {
        OperandKind::None => 0,
        OperandKind::Register => {
            let r = parse_register(&operands[0])
                .map_err(|m| err(ErrorType::BadRegister, m))?;
            r << 4
        }
        OperandKind::RegisterPair | OperandKind::RegisterRange => {
            let rx = parse_register(&operands[0])
                .map_err(|m| err(ErrorType::BadRegister, m))?;
            let ry = parse_register(&operands[1])
                .map_err(|m| err(ErrorType::BadRegister, m))?;
            (rx << 4) | ry
        }
        OperandKind::Immediate => {
            let value = resolve_value(&operands[0], symbols)?;
            if value > 0xFF {
                return Err(err(
                    ErrorType::RangeError,
                    format!(
                        "immediate '{}' exceeds 8 bits (${:04X})",
                        operands[0], value
                    ),
                ));
            }
            value as u8
        }
        OperandKind::ZeroPage => {
            let value = resolve_value(&operands[0], symbols)?;
            if value > 0xFF {
                return Err(err(
                    ErrorType::RangeError,
                    format!(
                        "zero-page address '{}' exceeds $FF (${:04X})",
                        operands[0], value
                    ),
                ));
            }
            value as u8
        }
        OperandKind::Offset => resolve_offset(&operands[0], symbols, addr)?,
    };

    Ok([op, arg])
}
