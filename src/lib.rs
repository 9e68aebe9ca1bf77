//! # OPER-8 CPU Core
//!
//! A byte-accurate implementation of the OPER-8 fantasy 8-bit CPU together
//! with its reference toolchain: the execution engine, a two-pass assembler,
//! a disassembler, and a declarative single-step test harness.
//!
//! The machine: 16 byte-wide registers, 64 KiB of flat memory, a 16-bit
//! program counter that must stay even, three status flags (Z, C, N), and
//! 2-byte fixed-width instructions. Addresses are big-endian; R14:R15 form
//! the stack pointer by convention. Exceptional conditions (invalid opcode,
//! divide by zero, misaligned PC) dispatch through a fault vector in the
//! zero page rather than surfacing as host errors.
//!
//! ## Quick Start
//!
//! ```rust
//! use oper8::assembler::assemble;
//! use oper8::{Cpu, FlatMemory};
//!
//! let output = assemble(
//!     "start:
//!          LDI0 $48
//!          PRINT R0
//!          HLT",
//! )
//! .unwrap();
//!
//! let mut cpu = Cpu::new(FlatMemory::new());
//! output.load_into(&mut cpu);
//! cpu.set_on_output(|byte| print!("{}", byte as char));
//!
//! cpu.run(1_000);
//! assert!(cpu.halted());
//! ```
//!
//! ## Architecture
//!
//! - **Table-driven decoding**: all opcode metadata lives in a single
//!   256-entry table (`opcodes`)
//! - **Modularity**: the CPU is generic over a `MemoryBus` trait; the flat
//!   64 KiB machine is one implementation
//! - **In-machine faults**: the engine never raises Rust errors for program
//!   misbehavior; hosts observe faults through R0 and the fault vector
//! - **Deterministic execution**: no timing, no interrupts, strict program
//!   order
//!
//! ## Modules
//!
//! - `cpu` - machine state, fetch-decode-execute, faults, run loop
//! - `memory` - MemoryBus trait and the flat 64 KiB implementation
//! - `opcodes` - opcode metadata table
//! - `operand` - operand shape enumeration
//! - `assembler` - two-pass source translation
//! - `disassembler` - binary back to canonical mnemonics
//! - `harness` - single-step test strings and test files

pub mod assembler;
pub mod cpu;
pub mod disassembler;
pub mod harness;
pub mod memory;
pub mod opcodes;
pub mod operand;

// Internal instruction implementations (not part of the public API)
mod instructions;

// Re-export the public API
pub use cpu::{Cpu, Fault, StepResult};
pub use memory::{FlatMemory, MemoryBus};
pub use opcodes::{OpcodeMetadata, OPCODE_TABLE};
pub use operand::OperandKind;
