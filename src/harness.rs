//! # Single-Step Test Harness
//!
//! A declarative property-checker for the instruction set. A test is one
//! string of semicolon-separated groups:
//!
//! ```text
//! preconditions ; instruction [; instruction ...] ; postconditions
//! ```
//!
//! The first group applies preconditions to a fresh machine, every middle
//! group is one instruction, and the last group lists postconditions. The
//! harness assembles the instructions contiguously at 0x0100, points PC
//! there, executes exactly one `step` per instruction, then verifies each
//! postcondition and reports every mismatch.
//!
//! Condition tokens are whitespace-separated `NAME:VALUE` forms with hex
//! values:
//!
//! - `R<n>:HH` - register n
//! - `PC:HHHH` - program counter
//! - `Z:0|1`, `C:0|1`, `N:0|1` - flags
//! - `M[HHHH]:HH` - memory cell
//!
//! Example: `R0:05 R1:00 ; DIV R0, R1 ; R0:02 PC:FFFE`

use crate::assembler::assemble_with_origin;
use crate::{Cpu, FlatMemory, MemoryBus};

/// Address where the harness places the instructions under test.
pub const TEST_ORIGIN: u16 = 0x0100;

/// A malformed test string or a failed assembly inside one.
///
/// Distinct from a failing test: a failing test parses and runs but misses
/// its postconditions.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessError {
    /// What went wrong
    pub message: String,
}

impl HarnessError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HarnessError {}

/// One machine-state condition, usable as a pre- or postcondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    Reg(u8, u8),
    Pc(u16),
    Flag(char, bool),
    Mem(u16, u8),
}

/// A postcondition the machine missed.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// The condition text as written ("R0:02")
    pub condition: String,

    /// Expected value, formatted
    pub expected: String,

    /// Observed value, formatted
    pub actual: String,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {}, actual {}",
            self.condition, self.expected, self.actual
        )
    }
}

/// Outcome of one single-step test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestReport {
    /// Number of instructions executed
    pub steps: usize,

    /// Every postcondition the machine missed; empty means the test passed
    pub mismatches: Vec<Mismatch>,
}

impl TestReport {
    /// True when every postcondition held.
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

fn parse_hex(digits: &str, bits: u32, what: &str) -> Result<u16, HarnessError> {
    let value = u16::from_str_radix(digits, 16)
        .map_err(|_| HarnessError::new(format!("malformed {} value '{}'", what, digits)))?;
    if bits == 8 && value > 0xFF {
        return Err(HarnessError::new(format!(
            "{} value '{}' exceeds 8 bits",
            what, digits
        )));
    }
    Ok(value)
}

fn parse_condition(token: &str) -> Result<Condition, HarnessError> {
    let (name, value) = token
        .split_once(':')
        .ok_or_else(|| HarnessError::new(format!("condition '{}' is missing ':'", token)))?;
    let name = name.trim().to_ascii_uppercase();
    let value = value.trim();

    if let Some(digits) = name.strip_prefix('R') {
        let reg: u8 = digits
            .parse()
            .map_err(|_| HarnessError::new(format!("bad register in condition '{}'", token)))?;
        if reg > 15 {
            return Err(HarnessError::new(format!(
                "register R{} out of range in '{}'",
                reg, token
            )));
        }
        return Ok(Condition::Reg(reg, parse_hex(value, 8, "register")? as u8));
    }

    if name == "PC" {
        return Ok(Condition::Pc(parse_hex(value, 16, "PC")?));
    }

    if matches!(name.as_str(), "Z" | "C" | "N") {
        let set = match value {
            "0" => false,
            "1" => true,
            _ => {
                return Err(HarnessError::new(format!(
                    "flag condition '{}' must be 0 or 1",
                    token
                )))
            }
        };
        let flag = if name == "Z" {
            'Z'
        } else if name == "C" {
            'C'
        } else {
            'N'
        };
        return Ok(Condition::Flag(flag, set));
    }

    if let Some(addr) = name
        .strip_prefix("M[")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return Ok(Condition::Mem(
            parse_hex(addr, 16, "memory address")?,
            parse_hex(value, 8, "memory")? as u8,
        ));
    }

    Err(HarnessError::new(format!("unknown condition '{}'", token)))
}

fn parse_condition_group(group: &str) -> Result<Vec<(String, Condition)>, HarnessError> {
    group
        .split_whitespace()
        .map(|token| Ok((token.to_string(), parse_condition(token)?)))
        .collect()
}

fn apply_condition(cpu: &mut Cpu<FlatMemory>, condition: Condition) {
    match condition {
        Condition::Reg(r, value) => cpu.set_reg(r, value),
        Condition::Pc(value) => cpu.set_pc(value),
        Condition::Flag('Z', set) => cpu.set_flag_z(set),
        Condition::Flag('C', set) => cpu.set_flag_c(set),
        Condition::Flag(_, set) => cpu.set_flag_n(set),
        Condition::Mem(addr, value) => cpu.memory_mut().write(addr, value),
    }
}

fn check_condition(cpu: &Cpu<FlatMemory>, text: &str, condition: Condition) -> Option<Mismatch> {
    let (expected, actual) = match condition {
        Condition::Reg(r, want) => {
            let got = cpu.reg(r);
            if got == want {
                return None;
            }
            (format!("${:02X}", want), format!("${:02X}", got))
        }
        Condition::Pc(want) => {
            let got = cpu.pc();
            if got == want {
                return None;
            }
            (format!("${:04X}", want), format!("${:04X}", got))
        }
        Condition::Flag(flag, want) => {
            let got = match flag {
                'Z' => cpu.flag_z(),
                'C' => cpu.flag_c(),
                _ => cpu.flag_n(),
            };
            if got == want {
                return None;
            }
            (u8::from(want).to_string(), u8::from(got).to_string())
        }
        Condition::Mem(addr, want) => {
            let got = cpu.memory().read(addr);
            if got == want {
                return None;
            }
            (format!("${:02X}", want), format!("${:02X}", got))
        }
    };
    Some(Mismatch {
        condition: text.to_string(),
        expected,
        actual,
    })
}

/// Runs one single-step test.
///
/// # Examples
///
/// ```
/// use oper8::harness::run_single_step_test;
///
/// let report = run_single_step_test("R1:01 R2:02 ; ADD R1, R2 ; R1:03 Z:0 C:0").unwrap();
/// assert!(report.passed());
/// ```
pub fn run_single_step_test(test: &str) -> Result<TestReport, HarnessError> {
    let groups: Vec<&str> = test.split(';').collect();
    if groups.len() < 3 {
        return Err(HarnessError::new(
            "expected 'preconditions ; instructions ; postconditions'",
        ));
    }

    let preconditions = parse_condition_group(groups[0])?;
    let postconditions = parse_condition_group(groups[groups.len() - 1])?;
    let instructions: Vec<&str> = groups[1..groups.len() - 1]
        .iter()
        .map(|g| g.trim())
        .collect();
    if instructions.iter().any(|i| i.is_empty()) {
        return Err(HarnessError::new("empty instruction group"));
    }

    let mut cpu = Cpu::new(FlatMemory::new());
    for (_, condition) in &preconditions {
        apply_condition(&mut cpu, *condition);
    }

    let source = instructions.join("\n");
    let output = assemble_with_origin(&source, TEST_ORIGIN).map_err(|errors| {
        let detail: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        HarnessError::new(format!("assembly failed: {}", detail.join("; ")))
    })?;
    output.load_into(&mut cpu);
    cpu.set_pc(TEST_ORIGIN);

    for _ in 0..instructions.len() {
        cpu.step();
    }

    let mismatches = postconditions
        .iter()
        .filter_map(|(text, condition)| check_condition(&cpu, text, *condition))
        .collect();

    Ok(TestReport {
        steps: instructions.len(),
        mismatches,
    })
}

/// One failed or unrunnable test inside a test file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    /// Source line number (1-indexed)
    pub line: usize,

    /// The test string as written
    pub test: String,

    /// Mismatch list or harness error, formatted
    pub detail: String,
}

/// Aggregate outcome of a test file run.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// Number of tests found in the file
    pub total: usize,

    /// The tests that did not pass
    pub failures: Vec<FileFailure>,
}

impl FileReport {
    /// True when every test in the file passed.
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of passing tests.
    pub fn passed(&self) -> usize {
        self.total - self.failures.len()
    }
}

/// Runs every test in a line-oriented test file. Blank lines and `//`
/// comments are ignored; a malformed test string counts as a failure rather
/// than aborting the rest of the file.
pub fn run_test_file(content: &str) -> FileReport {
    let mut total = 0;
    let mut failures = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        total += 1;

        match run_single_step_test(line) {
            Ok(report) if report.passed() => {}
            Ok(report) => {
                let detail: Vec<String> =
                    report.mismatches.iter().map(|m| m.to_string()).collect();
                failures.push(FileFailure {
                    line: idx + 1,
                    test: line.to_string(),
                    detail: detail.join(", "),
                });
            }
            Err(e) => failures.push(FileFailure {
                line: idx + 1,
                test: line.to_string(),
                detail: e.to_string(),
            }),
        }
    }

    FileReport { total, failures }
}
