//! Assembly source parsing: line classification and literal parsing
//!
//! This module provides the character-level half of the assembler. It turns a
//! raw source line into a [`SourceLine`] (label, directive, or instruction
//! with operand texts) and parses the literal forms the OPER-8 grammar
//! allows: `$hex`, `0xhex`, `0bbin`, decimal, and character literals with a
//! small escape set.
//!
//! Case is folded to upper outside quotes, so mnemonics, register names, and
//! label references are all case-insensitive; the contents of character
//! literals are preserved exactly.
//!
//! Label resolution and byte emission live in the
//! [`encoder`](super::encoder) and the two-pass driver in
//! [`assembler`](super); this module never looks at the symbol table.

/// A parsed line of assembly source.
///
/// At most one of `label`, `directive`, and `mnemonic` is set; blank and
/// comment-only lines leave all three empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    /// Line number in source file (1-indexed)
    pub line_number: usize,

    /// Label definition ("START" from "start:")
    pub label: Option<String>,

    /// Directive, when the line is one
    pub directive: Option<Directive>,

    /// Instruction mnemonic, upper-cased ("MOV")
    pub mnemonic: Option<String>,

    /// Operand texts, comma-split, trimmed, case-folded outside quotes
    pub operands: Vec<String>,
}

/// Assembler directive forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// `.org <value>` - move the assembly address
    Org(u16),

    /// `.data <value>...` - raw byte values; tokens kept as text until pass 2
    /// so label references resolve against the finished symbol table
    Data(Vec<String>),
}

/// Strips a trailing `;` or `//` comment, honoring character literals so
/// `';'` survives.
pub fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                // Skip to the closing quote; a lone quote runs to end of line
                // and the literal parser reports it later.
                i += 1;
                while i < bytes.len() && bytes[i] != b'\'' {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i += 1;
            }
            b';' => return &line[..i],
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => return &line[..i],
            _ => i += 1,
        }
    }
    line
}

/// Upper-cases a token unless it is a character literal.
fn fold_token(token: &str) -> String {
    if token.starts_with('\'') {
        token.to_string()
    } else {
        token.to_ascii_uppercase()
    }
}

/// Splits an operand field on commas that sit outside character literals.
fn split_on_commas(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();
    let mut in_quote = false;
    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_quote => {
                in_quote = true;
                current.push(c);
            }
            '\\' if in_quote => {
                current.push(c);
                if let Some(&next) = chars.peek() {
                    current.push(next);
                    chars.next();
                }
            }
            '\'' if in_quote => {
                in_quote = false;
                current.push(c);
            }
            ',' if !in_quote => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    parts.push(current.trim().to_string());
    parts
}

/// Splits a `.data` argument field on whitespace and commas outside quotes,
/// so `' '` and `'a b'` stay single tokens.
pub fn split_data_values(s: &str) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();
    let mut in_quote = false;
    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_quote => {
                in_quote = true;
                current.push(c);
            }
            '\\' if in_quote => {
                current.push(c);
                if let Some(&next) = chars.peek() {
                    current.push(next);
                    chars.next();
                }
            }
            '\'' if in_quote => {
                in_quote = false;
                current.push(c);
            }
            c if !in_quote && (c.is_ascii_whitespace() || c == ',') => {
                if !current.is_empty() {
                    parts.push(fold_token(&current));
                    current.clear();
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(fold_token(&current));
    }
    parts
}

/// Parses one source line into its classified form.
///
/// # Examples
///
/// ```
/// use oper8::assembler::parser::parse_line;
///
/// let line = parse_line("  mov r1, r2  ; copy", 3).unwrap();
/// assert_eq!(line.mnemonic.as_deref(), Some("MOV"));
/// assert_eq!(line.operands, vec!["R1", "R2"]);
///
/// let line = parse_line("loop:", 4).unwrap();
/// assert_eq!(line.label.as_deref(), Some("LOOP"));
/// ```
pub fn parse_line(raw: &str, line_number: usize) -> Result<SourceLine, String> {
    let text = strip_comment(raw).trim();

    let mut line = SourceLine {
        line_number,
        label: None,
        directive: None,
        mnemonic: None,
        operands: Vec::new(),
    };

    if text.is_empty() {
        return Ok(line);
    }

    // Directive lines start with '.'
    if let Some(rest) = text.strip_prefix('.') {
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((n, a)) => (n.to_ascii_uppercase(), a.trim()),
            None => (rest.to_ascii_uppercase(), ""),
        };
        line.directive = Some(parse_directive(&name, args)?);
        return Ok(line);
    }

    // Label definition: IDENT ':' alone on its line
    if let Some(name) = text.strip_suffix(':') {
        let name = name.trim().to_ascii_uppercase();
        if !is_identifier(&name) {
            return Err(format!("invalid label name '{}'", name.trim()));
        }
        line.label = Some(name);
        return Ok(line);
    }

    // Instruction: mnemonic followed by optional comma-separated operands
    let (mnemonic, args) = match text.split_once(char::is_whitespace) {
        Some((m, a)) => (m.to_ascii_uppercase(), a.trim()),
        None => (text.to_ascii_uppercase(), ""),
    };
    line.mnemonic = Some(mnemonic);
    if !args.is_empty() {
        line.operands = split_on_commas(args).iter().map(|t| fold_token(t)).collect();
    }
    Ok(line)
}

fn parse_directive(name: &str, args: &str) -> Result<Directive, String> {
    match name {
        "ORG" => {
            if args.is_empty() {
                return Err(".org requires an address".to_string());
            }
            let addr = parse_number(&args.to_ascii_uppercase())
                .map_err(|e| format!(".org address: {}", e))?;
            Ok(Directive::Org(addr))
        }
        "DATA" => {
            let values = split_data_values(args);
            if values.is_empty() {
                return Err(".data requires at least one value".to_string());
            }
            Ok(Directive::Data(values))
        }
        other => Err(format!("unknown directive '.{}'", other.to_lowercase())),
    }
}

/// True when `token` matches `[A-Z_][A-Z0-9_]*` (already upper-cased input).
pub fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Parses a numeric literal: `$HEX`, `0xHEX`, `0bBIN`, else base-10.
///
/// The token must already be upper-cased. Values above 0xFFFF and malformed
/// digits are errors; context-specific range checks (immediates, zero-page
/// addresses) happen in the encoder.
///
/// # Examples
///
/// ```
/// use oper8::assembler::parser::parse_number;
///
/// assert_eq!(parse_number("$FF"), Ok(0xFF));
/// assert_eq!(parse_number("0X200"), Ok(0x200));
/// assert_eq!(parse_number("0B1010"), Ok(10));
/// assert_eq!(parse_number("42"), Ok(42));
/// assert!(parse_number("$XYZ").is_err());
/// ```
pub fn parse_number(token: &str) -> Result<u16, String> {
    let (digits, radix) = if let Some(hex) = token.strip_prefix('$') {
        (hex, 16)
    } else if let Some(hex) = token.strip_prefix("0X") {
        (hex, 16)
    } else if let Some(bin) = token.strip_prefix("0B") {
        (bin, 2)
    } else {
        (token, 10)
    };

    if digits.is_empty() {
        return Err(format!("'{}' has no digits", token));
    }

    u32::from_str_radix(digits, radix)
        .map_err(|_| format!("malformed number '{}'", token))
        .and_then(|v| {
            if v > 0xFFFF {
                Err(format!("number '{}' exceeds 16 bits", token))
            } else {
                Ok(v as u16)
            }
        })
}

/// Parses a character literal into its byte sequence.
///
/// A literal is one or more characters between single quotes; the escapes
/// `\0 \n \r \t \\ \'` map to their byte values. Whether more than one byte
/// is acceptable depends on context (`.data` only), so the caller checks the
/// length.
///
/// # Examples
///
/// ```
/// use oper8::assembler::parser::parse_char_literal;
///
/// assert_eq!(parse_char_literal("'A'"), Ok(vec![0x41]));
/// assert_eq!(parse_char_literal("'\\n'"), Ok(vec![10]));
/// assert_eq!(parse_char_literal("'Hi'"), Ok(vec![0x48, 0x69]));
/// assert!(parse_char_literal("''").is_err());
/// ```
pub fn parse_char_literal(token: &str) -> Result<Vec<u8>, String> {
    let inner = token
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .ok_or_else(|| format!("unterminated character literal {}", token))?;

    if inner.is_empty() {
        return Err("empty character literal".to_string());
    }

    let mut bytes = Vec::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let escaped = chars
                .next()
                .ok_or_else(|| "dangling escape in character literal".to_string())?;
            bytes.push(match escaped {
                '0' => 0,
                'n' => 10,
                'r' => 13,
                't' => 9,
                '\\' => 92,
                '\'' => 39,
                other => return Err(format!("unknown escape '\\{}'", other)),
            });
        } else if c.is_ascii() {
            bytes.push(c as u8);
        } else {
            return Err(format!("non-ASCII character '{}' in literal", c));
        }
    }
    Ok(bytes)
}

/// Parses a register name `R0`-`R15` (already upper-cased).
pub fn parse_register(token: &str) -> Result<u8, String> {
    let digits = token
        .strip_prefix('R')
        .ok_or_else(|| format!("bad register name '{}'", token))?;
    let n: u8 = digits
        .parse()
        .map_err(|_| format!("bad register name '{}'", token))?;
    if n > 15 || (digits.len() > 1 && digits.starts_with('0')) {
        return Err(format!("bad register name '{}'", token));
    }
    Ok(n)
}
