//! # LC-3 Assembler Core
//!
//! A two-pass assembler for the LC-3 (Little Computer 3) educational
//! instruction-set architecture: a 16-bit word size, eight general-purpose
//! registers, a condition-code trio (N/Z/P), memory-mapped I/O, and
//! branch/memory/arithmetic instructions encoded in single 16-bit words.
//!
//! ## Pipeline
//!
//! ```text
//! source text
//!   -> lexer::tokenize            (C1: Tokenizer)
//!   -> statement::build_statements (C3: Statement Builder, consulting C2: isa)
//!   -> first_pass::assign_program_counters (C4: PC Assigner)
//!   -> first_pass::build_symbol_table      (C5: Symbol Builder)
//!   -> encoder::encode            (C6: Encoder, consulting C2 and C5)
//!   -> object::write_object       (C8: Object Record Writer)
//! ```
//!
//! `diagnostics::DiagnosticSink` (C7) observes every stage; nothing in the
//! pipeline aborts on a non-fatal anomaly, so a single invocation reports
//! every diagnostic it can instead of stopping at the first.
//!
//! ## Example
//!
//! ```rust
//! use lc3_assembler::{assemble, config::AssemblerConfig};
//!
//! let source = ".ORIG x3000\nHALT\n.END\n";
//! let outcome = assemble(source, AssemblerConfig::strict());
//! assert!(outcome.success);
//! assert_eq!(outcome.entries.len(), 2);
//! ```

pub mod config;
pub mod diagnostics;
pub mod encoder;
pub mod error;
pub mod first_pass;
pub mod isa;
pub mod lexer;
pub mod object;
pub mod span;
pub mod statement;

use config::AssemblerConfig;
use diagnostics::{Diagnostic, DiagnosticSink};
use first_pass::SymbolTable;
use object::MemoryEntry;

/// The result of running the whole pipeline once over a source string.
///
/// `success` mirrors the "any error emitted" flag spec.md §5/§7 describes:
/// a driver (out of scope for this crate) should treat `success == false` as
/// "assembly failed" and skip writing `entries` to an object file, even
/// though `entries` may be non-empty (a pass can emit partial output before
/// a later statement fails).
#[derive(Debug)]
pub struct AssembleOutcome {
    pub entries: Vec<MemoryEntry>,
    pub diagnostics: Vec<Diagnostic>,
    pub symbols: SymbolTable,
    pub success: bool,
}

/// Run the full two-pass pipeline over `source` under `config`, collecting
/// every diagnostic along the way rather than aborting at the first (fail
/// collect, per spec §5), except for the one fatal structural case (no
/// `.orig` anywhere in the source) which makes further passes meaningless:
/// that still runs the remaining passes over statements that are all marked
/// invalid, so PC assignment/encoding never panics on an unassigned PC, but
/// `success` is `false` and `entries` is best treated as unusable.
pub fn assemble(source: &str, config: AssemblerConfig) -> AssembleOutcome {
    let source_lines: Vec<String> = source.lines().map(str::to_owned).collect();
    let mut sink = DiagnosticSink::new();

    let lexed = lexer::tokenize(source);
    sink.push_all(&lexed.errors, &source_lines);

    let mut statements = statement::build_statements(&lexed.tokens);

    let pc_errors = first_pass::assign_program_counters(&mut statements, &config);
    sink.push_all(&pc_errors, &source_lines);

    let (symbols, symbol_errors) = first_pass::build_symbol_table(&statements, &config);
    sink.push_all(&symbol_errors, &source_lines);

    let (entries, encode_errors) = encoder::encode(&statements, &symbols, &config);
    sink.push_all(&encode_errors, &source_lines);

    let success = !sink.had_error();
    AssembleOutcome {
        entries,
        diagnostics: sink.into_diagnostics(),
        symbols,
        success,
    }
}
