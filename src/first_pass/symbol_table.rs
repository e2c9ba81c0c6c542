//! # Symbol Builder (C5)
//!
//! Walks the PC-assigned statements once, considering only label pieces,
//! and builds the case-folded label → address map the encoder resolves
//! `.fill` and PC-relative operands against.

use std::collections::HashMap;

use crate::config::AssemblerConfig;
use crate::error::{AsmError, ErrorKind};
use crate::isa;
use crate::statement::{PieceKind, Statement};

/// Case-folded label → 16-bit address. Built once by
/// [`build_symbol_table`], then read-only for the rest of the pipeline.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    addresses: HashMap<String, u16>,
}

impl SymbolTable {
    pub fn get(&self, label: &str) -> Option<u16> {
        self.addresses.get(&label.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

pub fn build_symbol_table(statements: &[Statement], config: &AssemblerConfig) -> (SymbolTable, Vec<AsmError>) {
    let mut table = SymbolTable::default();
    let mut errors = Vec::new();

    for statement in statements {
        let Some(label) = &statement.label else { continue };

        if label.kind == PieceKind::NumberOperand {
            errors.push(AsmError::error(
                ErrorKind::NumericLabel,
                "label cannot be a numeric value",
                label.span,
            ));
            continue;
        }
        if label.kind != PieceKind::Label {
            continue;
        }

        if statement.base.is_none() && !statement.operands.is_empty() {
            errors.push(AsmError::error(
                ErrorKind::LabelWithStrayOperands,
                format!("'{}' is followed by operands but has no instruction or pseudo-op", label.text),
                label.span,
            ));
            continue;
        }

        if label.text.starts_with(|c: char| c.is_ascii_digit()) && config.mode.is_strict() {
            errors.push(AsmError::error(
                ErrorKind::LabelStartsWithDigit,
                format!("label '{}' begins with a digit", label.text),
                label.span,
            ));
            continue;
        }

        if isa::nearest_instruction_distance(&label.text) == 0 && config.mode.is_strict() {
            errors.push(AsmError::error(
                ErrorKind::LabelIsInstruction,
                format!("label '{}' is an instruction name", label.text),
                label.span,
            ));
            continue;
        }

        if table.addresses.contains_key(&label.text) {
            if config.mode.is_strict() {
                errors.push(AsmError::error(
                    ErrorKind::DuplicateLabel,
                    format!("label '{}' is already defined", label.text),
                    label.span,
                ));
                continue;
            }
            errors.push(AsmError::warning(
                ErrorKind::DuplicateLabel,
                format!("label '{}' redefined, overwriting previous value", label.text),
                label.span,
            ));
        }

        log::trace!("symbol '{}' -> {:#06x}", label.text, statement.pc);
        table.addresses.insert(label.text.clone(), statement.pc);
    }

    (table, errors)
}
