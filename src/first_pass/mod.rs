//! # PC Assigner (C4)
//!
//! The first pass: walks statements left to right with a single mutable
//! cursor, tracking `.orig`/`.end` region boundaries and assigning a
//! 16-bit program counter to every statement inside a live region.

pub mod symbol_table;

pub use symbol_table::{build_symbol_table, SymbolTable};

use crate::config::AssemblerConfig;
use crate::error::{AsmError, ErrorKind};
use crate::span::Span;
use crate::statement::{PieceKind, Statement};

/// The upper memory range reserved for device registers; code and data
/// cannot be assembled into it (spec §4.4, §6).
pub const MMIO_START: u16 = 0xFE00;

fn pseudo_name(statement: &Statement) -> Option<String> {
    statement
        .base
        .as_ref()
        .filter(|b| b.kind == PieceKind::PseudoOp)
        .map(|b| b.text.to_ascii_lowercase())
}

fn statement_span(statement: &Statement) -> Span {
    statement
        .base
        .as_ref()
        .map(|p| p.span)
        .or_else(|| statement.label.as_ref().map(|p| p.span))
        .unwrap_or_else(|| Span::new(statement.row, 0, 0))
}

/// How many PC slots this statement occupies beyond the generic one every
/// in-region statement already gets: 0 for everything but `.blkw` and
/// `.stringz`, whose operand determines a larger block.
fn extra_advance(statement: &Statement) -> u32 {
    let Some(name) = pseudo_name(statement) else { return 0 };
    match name.as_str() {
        ".blkw" => {
            let count = statement.operands.first().and_then(|o| o.number_value).unwrap_or(1);
            count.max(1) as u32 - 1
        }
        ".stringz" => {
            let len = statement
                .operands
                .first()
                .filter(|o| o.kind == PieceKind::StringOperand)
                .map(|o| o.text.len())
                .unwrap_or(0);
            len as u32
        }
        _ => 0,
    }
}

/// Walk `statements`, assigning `pc` and `valid` in place. Returns the
/// diagnostics collected along the way; callers consult `had_error` on
/// those (via the diagnostic sink) rather than an explicit success flag
/// here, per spec §5's fail-collect contract.
pub fn assign_program_counters(statements: &mut [Statement], config: &AssemblerConfig) -> Vec<AsmError> {
    let mut errors = Vec::new();
    let mut cur_pc: u32 = 0;
    let mut found_orig = false;
    let mut previous_region_ended = false;

    for statement in statements.iter_mut() {
        match pseudo_name(statement).as_deref() {
            Some(".orig") => {
                if found_orig && !previous_region_ended {
                    errors.push(AsmError::mode_dependent(
                        ErrorKind::OrigInsideLiveRegion,
                        config.mode.is_strict(),
                        "new .orig found, but previous region did not have .end",
                        statement_span(statement),
                    ));
                }
                found_orig = true;
                previous_region_ended = false;

                let operand = statement.operands.first().and_then(|o| o.number_value).unwrap_or(0);
                if !(0..=0xFFFF).contains(&operand) {
                    errors.push(AsmError::mode_dependent(
                        ErrorKind::Truncation,
                        config.mode.is_strict(),
                        format!(".orig operand {operand} truncated to 16 bits"),
                        statement_span(statement),
                    ));
                }
                cur_pc = (operand as i64 as u64 & 0xFFFF) as u32;
                statement.pc = 0;
                log::debug!("new .orig region at pc={cur_pc:#06x}");
            }
            Some(".end") => {
                previous_region_ended = true;
                statement.pc = 0;
                if !found_orig {
                    statement.valid = false;
                }
            }
            _ if statement.is_label_only() => {
                statement.pc = cur_pc as u16;
                if !found_orig {
                    statement.valid = false;
                }
            }
            _ if found_orig => {
                if cur_pc >= MMIO_START as u32 {
                    errors.push(AsmError::error(
                        ErrorKind::CodeInMmio,
                        "cannot assemble code into the memory-mapped I/O region",
                        statement_span(statement),
                    ));
                    statement.valid = false;
                } else if previous_region_ended {
                    statement.valid = false;
                } else {
                    statement.pc = cur_pc as u16;
                    log::trace!("assigned pc={:#06x} to row {}", statement.pc, statement.row);
                    cur_pc += 1 + extra_advance(statement);
                }
            }
            _ => {
                statement.valid = false;
            }
        }
    }

    if !found_orig {
        errors.push(AsmError::error(ErrorKind::MissingOrig, "no .orig found in source", Span::new(0, 0, 0)));
    } else if !previous_region_ended {
        errors.push(AsmError::mode_dependent(
            ErrorKind::MissingEnd,
            config.mode.is_strict(),
            "no .end at end of file",
            Span::new(0, 0, 0),
        ));
    }

    errors
}
