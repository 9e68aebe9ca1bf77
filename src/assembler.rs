//! OPER-8 Assembler Module
//!
//! Converts assembly language source text into the binary instruction stream
//! the engine consumes. Translation is two passes: the first walks lines in
//! order, interning labels and assigning addresses; the second resolves
//! label-derived operands and emits bytes through the encoder.
//!
//! Output is a list of [`Segment`]s (one per `.org` region). Errors carry
//! source line numbers and abort the translation; no partial program is
//! produced.

pub mod encoder;
pub mod parser;
pub mod symbol_table;

use parser::{parse_char_literal, parse_line, parse_number, Directive};
use symbol_table::SymbolTable;

use crate::{Cpu, MemoryBus};

/// Default assembly origin when the source has no leading `.org`.
pub const DEFAULT_ORIGIN: u16 = 0x0200;

/// A contiguous run of assembled bytes at a fixed address.
///
/// Segments are created at the start of assembly and at every `.org`
/// directive. Overlapping segments are undefined; the image builder lets the
/// later segment win.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Starting address of this segment in memory
    pub address: u16,

    /// The assembled bytes
    pub bytes: Vec<u8>,
}

/// A symbol table entry mapping a label name to its address.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Label name, upper-cased
    pub name: String,

    /// Address the label resolves to
    pub address: u16,

    /// Source line where the label was defined
    pub defined_at: usize,
}

/// Complete output from assembling source code.
#[derive(Debug, Clone)]
pub struct AssemblerOutput {
    /// Assembled code, one segment per `.org` region, in source order
    pub segments: Vec<Segment>,

    /// All labels defined by the translation
    pub symbols: Vec<Symbol>,
}

impl AssemblerOutput {
    /// The program start address: the address of the first segment, which is
    /// the first `.org` when one leads the source.
    pub fn origin(&self) -> Option<u16> {
        self.segments.first().map(|s| s.address)
    }

    /// Total number of assembled bytes across all segments.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.bytes.len()).sum()
    }

    /// True when the translation produced no bytes.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.bytes.is_empty())
    }

    /// Look up a label by name (case-insensitive).
    pub fn lookup_symbol(&self, name: &str) -> Option<&Symbol> {
        let folded = name.to_ascii_uppercase();
        self.symbols.iter().find(|s| s.name == folded)
    }

    /// Label address by name, when defined.
    ///
    /// # Examples
    ///
    /// ```
    /// use oper8::assembler::assemble;
    ///
    /// let output = assemble("start:\n    NOP").unwrap();
    /// assert_eq!(output.lookup_symbol_addr("START"), Some(0x0200));
    /// ```
    pub fn lookup_symbol_addr(&self, name: &str) -> Option<u16> {
        self.lookup_symbol(name).map(|s| s.address)
    }

    /// Copies every segment into a machine's memory at its recorded address.
    pub fn load_into<M: MemoryBus>(&self, cpu: &mut Cpu<M>) {
        for segment in &self.segments {
            cpu.load_program(&segment.bytes, segment.address);
        }
    }

    /// Flattens the segments into one image spanning the lowest to highest
    /// assembled address, zero-filling the gaps. Returns the base address and
    /// the bytes; None when nothing was assembled.
    ///
    /// # Examples
    ///
    /// ```
    /// use oper8::assembler::assemble;
    ///
    /// let source = ".org $0200\nNOP\n.org $0206\nHLT";
    /// let (base, image) = assemble(source).unwrap().to_image().unwrap();
    /// assert_eq!(base, 0x0200);
    /// assert_eq!(image, vec![0x00, 0x00, 0, 0, 0, 0, 0xFF, 0x00]);
    /// ```
    pub fn to_image(&self) -> Option<(u16, Vec<u8>)> {
        let occupied: Vec<&Segment> =
            self.segments.iter().filter(|s| !s.bytes.is_empty()).collect();
        let base = occupied.iter().map(|s| s.address).min()?;
        let end = occupied
            .iter()
            .map(|s| s.address as u32 + s.bytes.len() as u32)
            .max()?
            .min(0x1_0000);

        let mut image = vec![0u8; (end - base as u32) as usize];
        for segment in occupied {
            let offset = (segment.address - base) as usize;
            let take = segment.bytes.len().min(image.len() - offset);
            image[offset..offset + take].copy_from_slice(&segment.bytes[..take]);
        }
        Some((base, image))
    }
}

/// Classification of assembly errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// Line does not fit the grammar
    SyntaxError,

    /// Mnemonic is not an OPER-8 instruction
    UnknownMnemonic,

    /// Wrong operand count or shape for the mnemonic
    InvalidOperand,

    /// Register name outside R0-R15
    BadRegister,

    /// Value out of range for its context (immediate, zero page, offset)
    RangeError,

    /// Reference to a label that is never defined
    UndefinedLabel,

    /// Label defined more than once
    DuplicateLabel,

    /// Malformed or unknown directive
    InvalidDirective,

    /// Malformed numeric or character literal
    MalformedLiteral,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorType::SyntaxError => "syntax error",
            ErrorType::UnknownMnemonic => "unknown mnemonic",
            ErrorType::InvalidOperand => "invalid operand",
            ErrorType::BadRegister => "bad register",
            ErrorType::RangeError => "range error",
            ErrorType::UndefinedLabel => "undefined label",
            ErrorType::DuplicateLabel => "duplicate label",
            ErrorType::InvalidDirective => "invalid directive",
            ErrorType::MalformedLiteral => "malformed literal",
        };
        f.write_str(name)
    }
}

/// An error encountered during assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblerError {
    /// Error classification
    pub error_type: ErrorType,

    /// Source line number (1-indexed)
    pub line: usize,

    /// Human-readable message
    pub message: String,
}

impl std::fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: {}: {}",
            self.line, self.error_type, self.message
        )
    }
}

impl std::error::Error for AssemblerError {}

/// Pass-1 plan: what to emit, where, from which source line.
enum Item {
    Instruction {
        addr: u16,
        line: usize,
        mnemonic: String,
        operands: Vec<String>,
    },
    Data {
        addr: u16,
        line: usize,
        values: Vec<String>,
    },
}

/// Assembles source text at the default origin (0x0200).
///
/// # Examples
///
/// ```
/// use oper8::assembler::assemble;
///
/// let output = assemble("LDI0 $48\nSTORZ $FA\nHLT").unwrap();
/// assert_eq!(output.segments[0].bytes, vec![0x10, 0x48, 0x25, 0xFA, 0xFF, 0x00]);
/// ```
pub fn assemble(source: &str) -> Result<AssemblerOutput, Vec<AssemblerError>> {
    assemble_with_origin(source, DEFAULT_ORIGIN)
}

/// Assembles source text with a caller-chosen origin. A leading `.org` in
/// the source overrides it.
pub fn assemble_with_origin(
    source: &str,
    origin: u16,
) -> Result<AssemblerOutput, Vec<AssemblerError>> {
    let mut errors = Vec::new();

    // Parse every line up front so later passes work on structure.
    let mut lines = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        match parse_line(raw, idx + 1) {
            Ok(line) => lines.push(line),
            Err(message) => {
                let error_type = if raw.trim_start().starts_with('.') {
                    ErrorType::InvalidDirective
                } else {
                    ErrorType::SyntaxError
                };
                errors.push(AssemblerError {
                    error_type,
                    line: idx + 1,
                    message,
                });
            }
        }
    }

    // Pass 1: assign addresses, intern labels, record emission items.
    let mut symbols = SymbolTable::new();
    let mut items = Vec::new();
    let mut addr = origin;

    for line in &lines {
        if let Some(ref label) = line.label {
            if let Err(existing) =
                symbols.add_symbol(label.clone(), addr, line.line_number)
            {
                errors.push(AssemblerError {
                    error_type: ErrorType::DuplicateLabel,
                    line: line.line_number,
                    message: format!(
                        "duplicate label '{}' (previously defined at line {})",
                        label, existing.defined_at
                    ),
                });
            }
            continue;
        }

        if let Some(ref directive) = line.directive {
            match directive {
                Directive::Org(address) => addr = *address,
                Directive::Data(values) => {
                    let len: u16 = values.iter().map(|v| data_token_len(v)).sum();
                    items.push(Item::Data {
                        addr,
                        line: line.line_number,
                        values: values.clone(),
                    });
                    addr = addr.wrapping_add(len);
                }
            }
            continue;
        }

        if let Some(ref mnemonic) = line.mnemonic {
            items.push(Item::Instruction {
                addr,
                line: line.line_number,
                mnemonic: mnemonic.clone(),
                operands: line.operands.clone(),
            });
            addr = addr.wrapping_add(2);
        }
    }

    // Pass 2: resolve operands and emit bytes into segments.
    let mut segments: Vec<Segment> = Vec::new();
    for item in &items {
        let (addr, bytes) = match item {
            Item::Instruction {
                addr,
                line,
                mnemonic,
                operands,
            } => {
                match encoder::encode_instruction(mnemonic, operands, &symbols, *addr) {
                    Ok(encoded) => (*addr, encoded.to_vec()),
                    Err(mut e) => {
                        e.line = *line;
                        errors.push(e);
                        continue;
                    }
                }
            }
            Item::Data { addr, line, values } => {
                let mut bytes = Vec::new();
                for value in values {
                    match data_token_bytes(value, &symbols) {
                        Ok(mut b) => bytes.append(&mut b),
                        Err(mut e) => {
                            e.line = *line;
                            errors.push(e);
                        }
                    }
                }
                (*addr, bytes)
            }
        };

        match segments.last_mut() {
            Some(last)
                if last.address.wrapping_add(last.bytes.len() as u16) == addr =>
            {
                last.bytes.extend(bytes);
            }
            _ => segments.push(Segment {
                address: addr,
                bytes,
            }),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(AssemblerOutput {
        segments,
        symbols: symbols.symbols().to_vec(),
    })
}

/// Byte length a `.data` token will occupy, computable before labels resolve:
/// character literals take one byte per character, label references two,
/// numbers one or two depending on magnitude. Malformed tokens get a
/// placeholder length; pass 2 reports them.
fn data_token_len(token: &str) -> u16 {
    if token.starts_with('\'') {
        return parse_char_literal(token).map(|b| b.len() as u16).unwrap_or(1);
    }
    if encoder::high_byte_operand(token).is_some() || encoder::low_byte_operand(token).is_some() {
        return 1;
    }
    if parser::is_identifier(token) {
        return 2;
    }
    match parse_number(token) {
        Ok(v) if v > 0xFF => 2,
        _ => 1,
    }
}

/// Resolves a `.data` token to its bytes. Sixteen-bit values (labels and
/// numbers above 255) emit big-endian, matching the machine's address order.
fn data_token_bytes(
    token: &str,
    symbols: &SymbolTable,
) -> Result<Vec<u8>, AssemblerError> {
    if token.starts_with('\'') {
        return parse_char_literal(token).map_err(|m| AssemblerError {
            error_type: ErrorType::MalformedLiteral,
            line: 0,
            message: m,
        });
    }
    if parser::is_identifier(token) {
        let value = encoder::resolve_value(token, symbols)?;
        return Ok(vec![(value >> 8) as u8, (value & 0xFF) as u8]);
    }
    if encoder::high_byte_operand(token).is_some() || encoder::low_byte_operand(token).is_some() {
        let value = encoder::resolve_value(token, symbols)?;
        return Ok(vec![value as u8]);
    }
    let value = parse_number(token).map_err(|m| AssemblerError {
        error_type: ErrorType::MalformedLiteral,
        line: 0,
        message: m,
    })?;
    if value > 0xFF {
        Ok(vec![(value >> 8) as u8, (value & 0xFF) as u8])
    } else {
        Ok(vec![value as u8])
    }
}
