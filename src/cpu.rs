//! # CPU State and Execution
//!
//! This module contains the Cpu struct representing the OPER-8 machine state
//! and the fetch-decode-execute loop.
//!
//! ## Machine State
//!
//! The CPU maintains:
//! - **Registers**: sixteen byte-wide registers R0-R15. By convention R14:R15
//!   form the stack pointer (R14 holds the high byte)
//! - **Program counter** (PC): 16-bit address of the next instruction, even
//!   before every fetch, 0x0200 after reset
//! - **Status flags**: Z, C, N (individual bool fields)
//! - **Halted indicator**: once set, `step` refuses to run
//! - **Console callbacks**: optional character-out / character-in hooks used
//!   by PRINT/INPUT and the memory-mapped console cells
//!
//! ## Execution Model
//!
//! The CPU executes instructions via:
//! - `step()`: execute one instruction
//! - `run()`: execute until halt or a step budget is exhausted
//!
//! Exceptional conditions never surface as Rust errors. They enter the fault
//! mechanism: the fault code lands in R0, the faulting PC is saved to the
//! zero page, and execution redirects through the fault vector.

use crate::{instructions, MemoryBus, OPCODE_TABLE};

/// PC value installed by reset.
pub const RESET_PC: u16 = 0x0200;

/// Zero-page cell holding the high byte of the PC saved on fault entry.
pub const FAULT_PC_SAVE: u16 = 0x00FC;

/// Zero-page cell holding the high byte of the fault handler vector.
pub const FAULT_VECTOR: u16 = 0x00FE;

/// Address of the two-byte HLT backstop installed by reset; also the reset
/// value of the fault vector, so an untrapped fault halts cleanly.
pub const BACKSTOP: u16 = 0xFFFE;

/// Memory-mapped console output cell: data stores here invoke the
/// character-out callback.
pub const CHAR_OUT: u16 = 0x00FA;

/// Memory-mapped console input cell: data loads from here return the next
/// buffered input byte (0 when none).
pub const CHAR_IN: u16 = 0x00FB;

/// Register index of the stack pointer high byte.
pub const SP_HIGH: usize = 14;

/// Register index of the stack pointer low byte.
pub const SP_LOW: usize = 15;

/// Architectural fault codes.
///
/// Codes 0x04-0x0F are reserved for future architectural faults; 0x10-0xFF
/// are free for program-defined use via [`Cpu::fault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Fault {
    /// Fetched an opcode the architecture leaves undefined.
    InvalidOpcode = 0x01,

    /// DIV with a zero divisor.
    DivZero = 0x02,

    /// Attempted to fetch from an odd PC.
    MisalignedPc = 0x03,
}

impl Fault {
    /// The byte written to R0 on fault entry.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Outcome of a single [`Cpu::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// An instruction executed normally (including HLT, which executes and
    /// sets the halted indicator).
    Executed,

    /// The machine was already halted; nothing ran and no state changed.
    Halted,

    /// The step entered the fault mechanism with the given code. The machine
    /// state already reflects fault entry (R0, saved PC, redirected PC).
    Faulted(u8),
}

/// OPER-8 machine state and execution context.
///
/// Generic over the memory implementation via the `MemoryBus` trait, like the
/// rest of the crate. A machine owns its memory and registers exclusively;
/// multiple machines in one process are fully independent.
///
/// # Examples
///
/// ```
/// use oper8::{Cpu, FlatMemory, StepResult};
///
/// let mut cpu = Cpu::new(FlatMemory::new());
/// assert_eq!(cpu.pc(), 0x0200);
///
/// // LDI0 $48 at the reset PC
/// cpu.load_program(&[0x10, 0x48], 0x0200);
/// assert_eq!(cpu.step(), StepResult::Executed);
/// assert_eq!(cpu.reg(0), 0x48);
/// assert_eq!(cpu.pc(), 0x0202);
/// ```
pub struct Cpu<M: MemoryBus> {
    /// Register file R0-R15
    pub(crate) regs: [u8; 16],

    /// Program counter (address of next instruction)
    pub(crate) pc: u16,

    /// Zero flag (last flag-affecting result was 0)
    pub(crate) flag_z: bool,

    /// Carry flag (unsigned overflow, borrow, or shifted-out bit)
    pub(crate) flag_c: bool,

    /// Negative flag (bit 7 of last result)
    pub(crate) flag_n: bool,

    /// Halted indicator
    pub(crate) halted: bool,

    /// Memory bus implementation
    pub(crate) memory: M,

    /// Character output callback (PRINT, stores to CHAR_OUT)
    pub(crate) on_output: Option<Box<dyn FnMut(u8)>>,

    /// Character input callback (INPUT, loads from CHAR_IN)
    pub(crate) on_input: Option<Box<dyn FnMut() -> u8>>,
}

impl<M: MemoryBus> Cpu<M> {
    /// Creates a new machine around the given memory bus.
    ///
    /// CPU state matches the reset state: registers and flags cleared,
    /// PC = 0x0200, not halted, the fault vector pointing at 0xFFFE and the
    /// HLT backstop installed there. The memory contents are otherwise taken
    /// as given, so a freshly zeroed `FlatMemory` yields the architectural
    /// reset image.
    pub fn new(memory: M) -> Self {
        let mut cpu = Self {
            regs: [0; 16],
            pc: RESET_PC,
            flag_z: false,
            flag_c: false,
            flag_n: false,
            halted: false,
            memory,
            on_output: None,
            on_input: None,
        };
        cpu.install_reset_image();
        cpu
    }

    /// Resets the machine: registers and flags cleared, memory zeroed except
    /// the reserved vector and backstop bytes, PC = 0x0200, not halted.
    ///
    /// The console callbacks survive reset; they belong to the host, not the
    /// program.
    pub fn reset(&mut self) {
        for addr in 0..=0xFFFFu32 {
            self.memory.write(addr as u16, 0);
        }
        self.regs = [0; 16];
        self.pc = RESET_PC;
        self.flag_z = false;
        self.flag_c = false;
        self.flag_n = false;
        self.halted = false;
        self.install_reset_image();
    }

    fn install_reset_image(&mut self) {
        // Fault vector -> backstop, backstop = two HLT bytes. A fault with an
        // untouched vector lands on HLT and stops the machine.
        self.memory.write(FAULT_VECTOR, (BACKSTOP >> 8) as u8);
        self.memory
            .write(FAULT_VECTOR.wrapping_add(1), (BACKSTOP & 0xFF) as u8);
        self.memory.write(BACKSTOP, 0xFF);
        self.memory.write(BACKSTOP.wrapping_add(1), 0xFF);
    }

    /// Copies an assembled program into memory starting at `addr`.
    ///
    /// Does not touch PC; callers position it separately when the program
    /// does not start at the reset PC.
    pub fn load_program(&mut self, bytes: &[u8], addr: u16) {
        self.memory.load(addr, bytes);
    }

    /// Executes one instruction.
    ///
    /// 1. A halted machine refuses to run and returns [`StepResult::Halted`].
    /// 2. An odd PC enters the MISALIGNED_PC fault.
    /// 3. Otherwise the opcode and operand bytes are fetched and dispatched.
    ///
    /// # Examples
    ///
    /// ```
    /// use oper8::{Cpu, Fault, FlatMemory, StepResult};
    ///
    /// let mut cpu = Cpu::new(FlatMemory::new());
    /// cpu.set_pc(0x0201);
    /// assert_eq!(cpu.step(), StepResult::Faulted(Fault::MisalignedPc.code()));
    /// ```
    pub fn step(&mut self) -> StepResult {
        if self.halted {
            return StepResult::Halted;
        }

        if self.pc & 1 != 0 {
            return self.fault(Fault::MisalignedPc.code());
        }

        let op = self.memory.read(self.pc);
        let arg = self.memory.read(self.pc.wrapping_add(1));

        match OPCODE_TABLE[op as usize].mnemonic {
            "NOP" => instructions::control::execute_nop(self),
            "LDI0" | "LDI1" | "LDI2" | "LDI3" | "LDI4" | "LDI5" | "LDI6" | "LDI7" | "LDI8"
            | "LDI9" | "LDI10" | "LDI11" | "LDI12" | "LDI13" | "LDI14" | "LDI15" => {
                instructions::transfer::execute_ldi(self, op, arg)
            }
            "MOV" => instructions::transfer::execute_mov(self, arg),
            "SWAP" => instructions::transfer::execute_swap(self, arg),
            "LOAD" => instructions::load_store::execute_load(self, arg),
            "STOR" => instructions::load_store::execute_stor(self, arg),
            "LOADZ" => instructions::load_store::execute_loadz(self, arg),
            "STORZ" => instructions::load_store::execute_storz(self, arg),
            "ADD" => instructions::alu::execute_add(self, arg),
            "ADC" => instructions::alu::execute_adc(self, arg),
            "SUB" => instructions::alu::execute_sub(self, arg),
            "SBC" => instructions::alu::execute_sbc(self, arg),
            "INC" => instructions::alu::execute_inc(self, arg),
            "DEC" => instructions::alu::execute_dec(self, arg),
            "CMP" => instructions::alu::execute_cmp(self, arg),
            "MUL" => instructions::alu::execute_mul(self, arg),
            "DIV" => instructions::alu::execute_div(self, arg),
            "AND" => instructions::logic::execute_and(self, arg),
            "OR" => instructions::logic::execute_or(self, arg),
            "XOR" => instructions::logic::execute_xor(self, arg),
            "NOT" => instructions::logic::execute_not(self, arg),
            "TEST" => instructions::logic::execute_test(self, arg),
            "SHL" => instructions::shifts::execute_shl(self, arg),
            "SHR" => instructions::shifts::execute_shr(self, arg),
            "JMP" => instructions::branches::execute_jmp(self, arg),
            "JZ" => instructions::branches::execute_jz(self, arg),
            "JNZ" => instructions::branches::execute_jnz(self, arg),
            "JC" => instructions::branches::execute_jc(self, arg),
            "JNC" => instructions::branches::execute_jnc(self, arg),
            "JN" => instructions::branches::execute_jn(self, arg),
            "JMPL" => instructions::branches::execute_jmpl(self, arg),
            "CALL" => instructions::control::execute_call(self, arg),
            "CALLL" => instructions::control::execute_calll(self, arg),
            "RET" => instructions::control::execute_ret(self),
            "PUSH" => instructions::stack::execute_push(self, arg),
            "POP" => instructions::stack::execute_pop(self, arg),
            "PRINT" => instructions::io::execute_print(self, arg),
            "INPUT" => instructions::io::execute_input(self, arg),
            "HLT" => instructions::control::execute_hlt(self),
            _ => self.fault(Fault::InvalidOpcode.code()),
        }
    }

    /// Runs the CPU for up to `max_steps` instructions, stopping early once
    /// the machine halts. Returns the number of steps actually taken (fault
    /// entries count; a refused step on an already-halted machine does not).
    ///
    /// # Examples
    ///
    /// ```
    /// use oper8::{Cpu, FlatMemory};
    ///
    /// let mut cpu = Cpu::new(FlatMemory::new());
    /// // NOP; NOP; HLT
    /// cpu.load_program(&[0x00, 0x00, 0x00, 0x00, 0xFF, 0x00], 0x0200);
    /// assert_eq!(cpu.run(1_000), 3);
    /// assert!(cpu.halted());
    /// ```
    pub fn run(&mut self, max_steps: u64) -> u64 {
        let mut taken = 0;
        while taken < max_steps {
            match self.step() {
                StepResult::Halted => break,
                _ => taken += 1,
            }
            if self.halted {
                break;
            }
        }
        taken
    }

    /// Enters the fault mechanism with the given code.
    ///
    /// In order: R0 receives the code, the current PC is saved big-endian to
    /// 0x00FC:0x00FD, and PC is redirected through the vector at
    /// 0x00FE:0x00FF. The PC saved is the one observed at step start; no
    /// instruction advances it before faulting.
    ///
    /// Public so hosts and programs under test can raise the user-defined
    /// codes (0x10-0xFF).
    pub fn fault(&mut self, code: u8) -> StepResult {
        self.regs[0] = code;
        self.memory.write(FAULT_PC_SAVE, (self.pc >> 8) as u8);
        self.memory
            .write(FAULT_PC_SAVE.wrapping_add(1), (self.pc & 0xFF) as u8);
        let high = self.memory.read(FAULT_VECTOR) as u16;
        let low = self.memory.read(FAULT_VECTOR.wrapping_add(1)) as u16;
        self.pc = (high << 8) | low;
        StepResult::Faulted(code)
    }

    /// Points the fault vector at `handler`.
    ///
    /// Convenience for hosts and tests; equivalent to two memory pokes.
    pub fn install_fault_handler(&mut self, handler: u16) {
        self.memory.write(FAULT_VECTOR, (handler >> 8) as u8);
        self.memory
            .write(FAULT_VECTOR.wrapping_add(1), (handler & 0xFF) as u8);
    }

    // ========== Register and Flag Access ==========

    /// Returns the value of register `r` (index taken mod 16).
    pub fn reg(&self, r: u8) -> u8 {
        self.regs[(r & 0x0F) as usize]
    }

    /// Sets register `r` (index taken mod 16).
    pub fn set_reg(&mut self, r: u8, value: u8) {
        self.regs[(r & 0x0F) as usize] = value;
    }

    /// Returns the whole register file.
    pub fn registers(&self) -> &[u8; 16] {
        &self.regs
    }

    /// Returns the program counter.
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Sets the program counter.
    pub fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    /// Returns the 16-bit stack pointer formed from R14:R15.
    pub fn sp(&self) -> u16 {
        ((self.regs[SP_HIGH] as u16) << 8) | self.regs[SP_LOW] as u16
    }

    /// Writes a 16-bit stack pointer back to R14:R15.
    pub fn set_sp(&mut self, value: u16) {
        self.regs[SP_HIGH] = (value >> 8) as u8;
        self.regs[SP_LOW] = (value & 0xFF) as u8;
    }

    /// Returns true if the Zero flag is set.
    pub fn flag_z(&self) -> bool {
        self.flag_z
    }

    /// Returns true if the Carry flag is set.
    pub fn flag_c(&self) -> bool {
        self.flag_c
    }

    /// Returns true if the Negative flag is set.
    pub fn flag_n(&self) -> bool {
        self.flag_n
    }

    /// Sets the Zero flag.
    pub fn set_flag_z(&mut self, value: bool) {
        self.flag_z = value;
    }

    /// Sets the Carry flag.
    pub fn set_flag_c(&mut self, value: bool) {
        self.flag_c = value;
    }

    /// Sets the Negative flag.
    pub fn set_flag_n(&mut self, value: bool) {
        self.flag_n = value;
    }

    /// Returns true once the machine has executed HLT.
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// Returns a shared reference to the memory bus.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Returns a mutable reference to the memory bus.
    ///
    /// This is how tests, the harness, and the REPL poke memory directly.
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Installs the character output callback used by PRINT and by data
    /// stores to the CHAR_OUT cell.
    pub fn set_on_output(&mut self, callback: impl FnMut(u8) + 'static) {
        self.on_output = Some(Box::new(callback));
    }

    /// Installs the character input callback used by INPUT and by data loads
    /// from the CHAR_IN cell. The callback must not block; return 0 when no
    /// byte is buffered.
    pub fn set_on_input(&mut self, callback: impl FnMut() -> u8 + 'static) {
        self.on_input = Some(Box::new(callback));
    }

    // ========== Helpers for Instruction Implementations ==========

    /// Sets Z and N from an 8-bit result.
    pub(crate) fn update_zn(&mut self, value: u8) {
        self.flag_z = value == 0;
        self.flag_n = value & 0x80 != 0;
    }

    /// Data store with the memory-mapped console hook: a store to CHAR_OUT
    /// also emits the byte. Instruction fetches and stack traffic bypass this.
    pub(crate) fn store_data(&mut self, addr: u16, value: u8) {
        self.memory.write(addr, value);
        if addr == CHAR_OUT {
            if let Some(cb) = self.on_output.as_mut() {
                cb(value);
            }
        }
    }

    /// Data load with the memory-mapped console hook: a load from CHAR_IN
    /// returns the next input byte (0 when no callback is installed).
    pub(crate) fn load_data(&mut self, addr: u16) -> u8 {
        if addr == CHAR_IN {
            return match self.on_input.as_mut() {
                Some(cb) => cb(),
                None => 0,
            };
        }
        self.memory.read(addr)
    }

    /// Relative branch target: PC + 2 + sign-extended offset, mod 2^16.
    pub(crate) fn branch_target(&self, offset: u8) -> u16 {
        self.pc.wrapping_add(2).wrapping_add(offset as i8 as u16)
    }
}
