//! Thin driver binary.
//!
//! Per spec §1/§6, the command-line surface, printer, and colorized
//! diagnostic rendering are external collaborators out of scope for this
//! crate. This binary exists only so the crate still produces something
//! runnable: it reads a single path from argv, calls [`lc3_assembler::assemble`],
//! prints each diagnostic's plain-text rendering to stderr, writes the object
//! stream to stdout on success, and sets the process exit code from whether
//! any error-level diagnostic was emitted.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use lc3_assembler::config::AssemblerConfig;
use lc3_assembler::{assemble, object};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: lc3-assembler <file.asm> [--liberal]");
        return ExitCode::FAILURE;
    }

    let path = &args[1];
    let config = if args.iter().any(|a| a == "--liberal") {
        AssemblerConfig::liberal()
    } else {
        AssemblerConfig::strict()
    };

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = assemble(&source, config);
    for diagnostic in &outcome.diagnostics {
        eprintln!("{}", diagnostic.render(path));
    }

    if !outcome.success {
        eprintln!("assembly failed");
        return ExitCode::FAILURE;
    }

    if let Err(err) = write_stdout(&outcome.entries) {
        eprintln!("failed to write object stream: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn write_stdout(entries: &[object::MemoryEntry]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    object::write_object(entries, &mut handle)?;
    handle.flush()
}
