//! OPER-8 command-line runner: batch execution, REPL, debugger, and the
//! single-step test modes. Thin glue over the library core.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use oper8::assembler::{assemble_with_origin, AssemblerOutput};
use oper8::disassembler::formatter::format_listing_line;
use oper8::disassembler::{disassemble, Instruction};
use oper8::harness::{run_single_step_test, run_test_file};
use oper8::{Cpu, FlatMemory, MemoryBus};

/// Default load address for raw binary programs.
const BIN_ORIGIN: u16 = 0x0200;

/// The cooperative slice size: the run loop yields back to the host between
/// slices so buffered input can be queued.
const RUN_SLICE: u64 = 1_000;

/// OPER-8 fantasy CPU runner
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Program to run: assembled from source (.asm/.s) or loaded raw at 0x0200
    path: Option<PathBuf>,

    /// Start the interactive REPL (with an optional initial program)
    #[clap(short, long)]
    interactive: bool,

    /// Debug a program: single-step with a state dump per instruction
    #[clap(short, long)]
    debug: bool,

    /// Run one single-step test string, e.g. "R0:05 ; INC R0 ; R0:06"
    #[clap(long = "ss", value_name = "TEST")]
    single_step: Option<String>,

    /// Run every single-step test in a line-oriented file
    #[clap(short = 't', long = "test-file", value_name = "FILE")]
    test_file: Option<PathBuf>,

    /// Step budget for batch runs
    #[clap(long, default_value_t = 1_000_000_000)]
    max_steps: u64,
}

fn main() -> ExitCode {
    let env = env_logger::Env::default().filter_or("OPER8_LOG", "warn");
    env_logger::init_from_env(env);

    let args = Args::parse();
    match dispatch(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn dispatch(args: Args) -> Result<ExitCode> {
    if let Some(test) = args.single_step {
        return run_one_test(&test);
    }
    if let Some(path) = args.test_file {
        return run_tests_from(&path);
    }
    if args.interactive {
        return repl(args.path.as_deref());
    }
    let Some(path) = args.path else {
        bail!("no program given; see --help");
    };
    if args.debug {
        debug_program(&path)
    } else {
        run_program(&path, args.max_steps)
    }
}

/// Loads a program into a fresh machine: assembly source by extension,
/// anything else as a raw image at 0x0200.
fn load_into(cpu: &mut Cpu<FlatMemory>, path: &Path) -> Result<u16> {
    let is_source = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("asm") | Some("s") | Some("oper8")
    );

    if is_source {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {:?}", path))?;
        let output = assemble_source(&source)?;
        output.load_into(cpu);
        let origin = output.origin().unwrap_or(BIN_ORIGIN);
        info!("assembled {} bytes at {:04X}", output.len(), origin);
        Ok(origin)
    } else {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {:?}", path))?;
        if bytes.len() > 0x10000 - BIN_ORIGIN as usize {
            bail!("binary {:?} does not fit above {:04X}", path, BIN_ORIGIN);
        }
        cpu.load_program(&bytes, BIN_ORIGIN);
        info!("loaded {} bytes at {:04X}", bytes.len(), BIN_ORIGIN);
        Ok(BIN_ORIGIN)
    }
}

fn assemble_source(source: &str) -> Result<AssemblerOutput> {
    assemble_with_origin(source, BIN_ORIGIN).map_err(|errors| {
        let listing: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::anyhow!("assembly failed:\n  {}", listing.join("\n  "))
    })
}

fn wire_console(cpu: &mut Cpu<FlatMemory>) -> Rc<RefCell<VecDeque<u8>>> {
    cpu.set_on_output(|byte| {
        let mut out = io::stdout();
        let _ = out.write_all(&[byte]);
        let _ = out.flush();
    });
    let queue = Rc::new(RefCell::new(VecDeque::new()));
    let input = Rc::clone(&queue);
    cpu.set_on_input(move || input.borrow_mut().pop_front().unwrap_or(0));
    queue
}

fn run_program(path: &Path, max_steps: u64) -> Result<ExitCode> {
    let mut cpu = Cpu::new(FlatMemory::new());
    let origin = load_into(&mut cpu, path)?;
    cpu.set_pc(origin);
    let _input = wire_console(&mut cpu);

    let taken = cpu.run(max_steps);
    if !cpu.halted() {
        warn!("step budget of {} exhausted before halt", max_steps);
        bail!("program did not halt within {} steps", max_steps);
    }
    info!("halted after {} steps at PC={:04X}", taken, cpu.pc());
    Ok(ExitCode::SUCCESS)
}

fn run_one_test(test: &str) -> Result<ExitCode> {
    match run_single_step_test(test) {
        Ok(report) if report.passed() => {
            println!("ok ({} instruction{})", report.steps, plural(report.steps));
            Ok(ExitCode::SUCCESS)
        }
        Ok(report) => {
            for mismatch in &report.mismatches {
                println!("FAIL {}", mismatch);
            }
            Ok(ExitCode::from(1))
        }
        Err(e) => {
            eprintln!("error: {}", e);
            Ok(ExitCode::from(1))
        }
    }
}

fn run_tests_from(path: &Path) -> Result<ExitCode> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {:?}", path))?;
    let report = run_test_file(&content);

    for failure in &report.failures {
        println!("FAIL line {}: {}", failure.line, failure.test);
        println!("     {}", failure.detail);
    }
    println!("{} passed, {} failed", report.passed(), report.failures.len());

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn format_state(cpu: &Cpu<FlatMemory>) -> String {
    let flags = format!(
        "Z={} C={} N={}{}",
        u8::from(cpu.flag_z()),
        u8::from(cpu.flag_c()),
        u8::from(cpu.flag_n()),
        if cpu.halted() { " HALTED" } else { "" }
    );
    let regs: Vec<String> = cpu
        .registers()
        .iter()
        .enumerate()
        .map(|(i, v)| format!("R{}={:02X}", i, v))
        .collect();
    format!(
        "PC={:04X} {}\n{}\n{}",
        cpu.pc(),
        flags,
        regs[..8].join(" "),
        regs[8..].join(" ")
    )
}

fn current_instruction(cpu: &Cpu<FlatMemory>) -> Instruction {
    let pc = cpu.pc();
    let bytes = [cpu.memory().read(pc), cpu.memory().read(pc.wrapping_add(1))];
    disassemble(&bytes, pc).remove(0)
}

fn debug_program(path: &Path) -> Result<ExitCode> {
    let mut cpu = Cpu::new(FlatMemory::new());
    let origin = load_into(&mut cpu, path)?;
    cpu.set_pc(origin);
    let _input = wire_console(&mut cpu);

    println!("{}", format_state(&cpu));
    println!("debugger: Enter steps, c runs to halt, q quits");

    let stdin = io::stdin();
    loop {
        print!("dbg> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "" | "s" => {
                println!("{}", format_listing_line(&current_instruction(&cpu)));
                cpu.step();
                println!("{}", format_state(&cpu));
            }
            "c" => {
                while !cpu.halted() {
                    cpu.run(RUN_SLICE);
                }
                println!("{}", format_state(&cpu));
            }
            "q" => break,
            other => println!("unknown command '{}'", other),
        }
        if cpu.halted() {
            println!("machine halted");
            break;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn repl(initial: Option<&Path>) -> Result<ExitCode> {
    let mut cpu = Cpu::new(FlatMemory::new());
    let input = wire_console(&mut cpu);

    if let Some(path) = initial {
        match load_into(&mut cpu, path) {
            Ok(origin) => cpu.set_pc(origin),
            Err(e) => eprintln!("error: {:#}", e),
        }
    }

    println!("OPER-8 REPL; 'help' lists commands");
    let stdin = io::stdin();
    loop {
        print!("oper8> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim().to_string();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line.as_str(), ""),
        };

        match command {
            "" => {}
            "help" => print_repl_help(),
            "quit" | "exit" => break,
            "reset" => {
                cpu.reset();
                input.borrow_mut().clear();
                println!("machine reset");
            }
            "load" => match load_into(&mut cpu, Path::new(rest)) {
                Ok(origin) => {
                    cpu.set_pc(origin);
                    println!("loaded; PC={:04X}", origin);
                }
                Err(e) => eprintln!("error: {:#}", e),
            },
            "asm" => match read_inline_source(&stdin) {
                Ok(source) => match assemble_source(&source) {
                    Ok(output) => {
                        output.load_into(&mut cpu);
                        if let Some(origin) = output.origin() {
                            cpu.set_pc(origin);
                            println!("{} bytes at {:04X}", output.len(), origin);
                        }
                    }
                    Err(e) => eprintln!("{:#}", e),
                },
                Err(e) => eprintln!("error: {:#}", e),
            },
            "run" => {
                let budget = parse_repl_number(rest).unwrap_or(10_000_000);
                let mut taken = 0;
                while taken < budget && !cpu.halted() {
                    let slice = RUN_SLICE.min(budget - taken);
                    let n = cpu.run(slice);
                    taken += n;
                    if n < slice {
                        break;
                    }
                }
                println!("{} steps", taken);
                println!("{}", format_state(&cpu));
            }
            "step" => {
                let count = parse_repl_number(rest).unwrap_or(1);
                for _ in 0..count {
                    println!("{}", format_listing_line(&current_instruction(&cpu)));
                    cpu.step();
                    if cpu.halted() {
                        break;
                    }
                }
                println!("{}", format_state(&cpu));
            }
            "regs" => println!("{}", format_state(&cpu)),
            "mem" => repl_mem(&cpu, rest),
            "dis" => repl_dis(&cpu, rest),
            "poke" => repl_poke(&mut cpu, rest),
            "in" => {
                input.borrow_mut().extend(rest.bytes());
                println!("queued {} byte{}", rest.len(), plural(rest.len()));
            }
            "ss" => {
                let _ = run_one_test(rest);
            }
            other => println!("unknown command '{}'; try 'help'", other),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_repl_help() {
    println!(
        "\
  asm               read assembly lines until '.' and load them
  load <file>       load a .bin or .asm program
  run [n]           run until halt (or at most n steps)
  step [n]          single-step with disassembly and state dump
  regs              show registers and flags
  mem <addr> [len]  hex dump memory
  dis <addr> [n]    disassemble n instructions (default 8)
  poke <addr> <b>   write one memory byte
  in <text>         queue characters for INPUT
  ss <test>         run a single-step test string
  reset             reset the machine
  quit              leave the REPL"
    );
}

fn read_inline_source(stdin: &io::Stdin) -> Result<String> {
    println!("enter assembly; '.' on its own line ends input");
    let mut source = String::new();
    loop {
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim() == "." {
            return Ok(source);
        }
        source.push_str(&line);
    }
}

fn parse_repl_number(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    if let Some(hex) = text.strip_prefix('$').or_else(|| text.strip_prefix("0x")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

fn repl_mem(cpu: &Cpu<FlatMemory>, args: &str) {
    let mut parts = args.split_whitespace();
    let Some(addr) = parts.next().and_then(parse_repl_number) else {
        println!("usage: mem <addr> [len]");
        return;
    };
    let len = parts.next().and_then(parse_repl_number).unwrap_or(64);
    let addr = addr as u16;
    for row in 0..(len as u16).div_ceil(16) {
        let base = addr.wrapping_add(row * 16);
        let bytes: Vec<String> = (0..16)
            .map(|i| format!("{:02X}", cpu.memory().read(base.wrapping_add(i))))
            .collect();
        println!("{:04X}  {}", base, bytes.join(" "));
    }
}

fn repl_dis(cpu: &Cpu<FlatMemory>, args: &str) {
    let mut parts = args.split_whitespace();
    let addr = parts
        .next()
        .and_then(parse_repl_number)
        .map(|a| a as u16)
        .unwrap_or_else(|| cpu.pc());
    let count = parts.next().and_then(parse_repl_number).unwrap_or(8) as usize;
    let mut bytes = Vec::with_capacity(count * 2);
    for i in 0..count * 2 {
        bytes.push(cpu.memory().read(addr.wrapping_add(i as u16)));
    }
    for instr in disassemble(&bytes, addr) {
        println!("{}", format_listing_line(&instr));
    }
}

fn repl_poke(cpu: &mut Cpu<FlatMemory>, args: &str) {
    let mut parts = args.split_whitespace();
    let (Some(addr), Some(value)) = (
        parts.next().and_then(parse_repl_number),
        parts.next().and_then(parse_repl_number),
    ) else {
        println!("usage: poke <addr> <byte>");
        return;
    };
    if value > 0xFF {
        println!("byte value out of range");
        return;
    }
    cpu.memory_mut().write(addr as u16, value as u8);
}
