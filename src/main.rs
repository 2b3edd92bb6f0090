//! Native host for the RV32I toolchain: assembles the given sources, links
//! them in argument order and runs the result, streaming environment-call
//! output to stdout.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use kestrel_asm::kestrel::asm::assemble;
use kestrel_asm::kestrel::decoder;
use kestrel_asm::kestrel::linker::link;
use kestrel_asm::kestrel::sim::{Output, Simulator};

/// Steps per scheduling batch; breakpoints and the step limit are checked
/// between batches, the cadence a cooperative UI host would also use.
const BATCH: usize = 100;

#[derive(Parser)]
#[command(name = "kestrel", about = "RV32I assembler, linker and simulator")]
struct Cli {
    /// Assembly source files, linked in argument order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print the linked program's disassembly instead of running it.
    #[arg(long)]
    disasm: bool,

    /// Give up after this many executed instructions.
    #[arg(long, default_value_t = 1_000_000)]
    max_steps: usize,
}

struct Stdout;

impl Output for Stdout {
    fn write_str(&mut self, s: &str) {
        print!("{s}");
    }
}

fn main() {
    let cli = Cli::parse();

    let mut programs = Vec::new();
    let mut failed = false;
    for path in &cli.files {
        let source = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                process::exit(1);
            }
        };
        let (program, errors) = assemble(&source);
        for err in &errors {
            eprintln!("{}: {err}", path.display());
        }
        failed |= !errors.is_empty();
        programs.push(program);
    }
    if failed {
        process::exit(1);
    }

    let linked = match link(&programs) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("link error: {e}");
            process::exit(1);
        }
    };

    if cli.disasm {
        for (i, w) in linked.text.iter().enumerate() {
            println!("{:08x}:  {w:08x}  {}", i * 4, decoder::disasm(*w));
        }
        return;
    }

    let mut sim = Simulator::new(linked, Box::new(Stdout));
    let mut steps = 0usize;
    while !sim.is_done() {
        for _ in 0..BATCH {
            if sim.is_done() {
                break;
            }
            if let Err(e) = sim.step() {
                eprintln!("runtime error at pc 0x{:08x}: {e}", sim.get_pc());
                process::exit(1);
            }
            steps += 1;
        }
        if steps >= cli.max_steps && !sim.is_done() {
            eprintln!("stopped after {steps} steps");
            process::exit(1);
        }
    }
    process::exit(sim.exit_code() as i32);
}
