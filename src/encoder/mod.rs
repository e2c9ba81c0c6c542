//! # Encoder (C6)
//!
//! The second pass: walks PC-assigned statements, validates each against
//! the instruction pattern table (C2) using Levenshtein-ranked candidate
//! selection, resolves labels through the symbol table (C5), and emits a
//! stream of memory entries.

use crate::config::AssemblerConfig;
use crate::error::{AsmError, ErrorKind};
use crate::first_pass::symbol_table::SymbolTable;
use crate::isa::{self, levenshtein, Pattern, PseudoOperand, SlotKind};
use crate::object::MemoryEntry;
use crate::span::Span;
use crate::statement::{PieceKind, Statement, StatementPiece};

const CANDIDATE_THRESHOLD: usize = 2;
const MAX_SUGGESTIONS: usize = 3;

fn mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

fn statement_span(statement: &Statement) -> Span {
    statement
        .base
        .as_ref()
        .map(|p| p.span)
        .or_else(|| statement.label.as_ref().map(|p| p.span))
        .unwrap_or_else(|| Span::new(statement.row, 0, 0))
}

fn operand_shape(statement: &Statement) -> String {
    statement
        .operands
        .iter()
        .map(|o| match o.kind {
            PieceKind::Register => 'r',
            PieceKind::NumberOperand => 'n',
            _ => 's',
        })
        .collect()
}

/// Drive the whole encoding pass. Every statement is visited in order;
/// invalid statements (the PC assigner couldn't place them) are skipped
/// with a mode-dependent diagnostic rather than aborting the pass.
pub fn encode(statements: &[Statement], symbols: &SymbolTable, config: &AssemblerConfig) -> (Vec<MemoryEntry>, Vec<AsmError>) {
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    for statement in statements {
        if !statement.valid {
            errors.push(AsmError::mode_dependent(
                ErrorKind::StrayAfterEnd,
                config.mode.is_strict(),
                "cannot determine address for statement",
                statement_span(statement),
            ));
            continue;
        }

        let Some(base) = statement.base.clone() else { continue };
        match base.kind {
            PieceKind::PseudoOp => encode_pseudo(statement, &base, symbols, config, &mut entries, &mut errors),
            PieceKind::Instruction => encode_instruction_statement(statement, &base, symbols, config, &mut entries, &mut errors),
            _ => {}
        }
    }

    (entries, errors)
}

/// Check operand count and kind against the pseudo's declared shape (spec
/// §4.2) before any emission happens. Wrong count or wrong kind is always a
/// syntactic error (spec §7), independent of strict/liberal mode — unlike a
/// truncation or a label clash, there's no sensible value to fall back to.
fn validate_pseudo_operands(name: &str, statement: &Statement, errors: &mut Vec<AsmError>) -> bool {
    let shape = isa::pseudo_for(name).map(|p| p.operand).unwrap_or(PseudoOperand::None);
    let ops = &statement.operands;
    let span = statement_span(statement);

    match shape {
        PseudoOperand::None => {
            if !ops.is_empty() {
                errors.push(AsmError::error(ErrorKind::InvalidUsage, format!("'{name}' takes no operands"), span));
                return false;
            }
        }
        PseudoOperand::Numeric | PseudoOperand::PositiveNumeric => {
            if ops.len() != 1 {
                errors.push(AsmError::error(ErrorKind::InvalidUsage, format!("'{name}' expects exactly one numeric operand"), span));
                return false;
            }
            if ops[0].kind != PieceKind::NumberOperand {
                errors.push(AsmError::error(ErrorKind::InvalidUsage, format!("'{name}' expects a numeric operand"), ops[0].span));
                return false;
            }
        }
        PseudoOperand::NumericOrLabel => {
            if ops.len() != 1 {
                errors.push(AsmError::error(ErrorKind::InvalidUsage, format!("'{name}' expects exactly one operand"), span));
                return false;
            }
            if !matches!(ops[0].kind, PieceKind::NumberOperand | PieceKind::StringOperand) {
                errors.push(AsmError::error(ErrorKind::InvalidUsage, format!("'{name}' expects a numeric or label operand"), ops[0].span));
                return false;
            }
        }
        PseudoOperand::StringLiteral => {
            if ops.len() != 1 {
                errors.push(AsmError::error(ErrorKind::InvalidUsage, format!("'{name}' expects exactly one string operand"), span));
                return false;
            }
            if ops[0].kind != PieceKind::StringOperand {
                errors.push(AsmError::error(ErrorKind::InvalidUsage, format!("'{name}' expects a string operand"), ops[0].span));
                return false;
            }
        }
    }
    true
}

fn encode_pseudo(
    statement: &Statement,
    base: &StatementPiece,
    symbols: &SymbolTable,
    config: &AssemblerConfig,
    entries: &mut Vec<MemoryEntry>,
    errors: &mut Vec<AsmError>,
) {
    let name = base.text.to_ascii_lowercase();
    if !validate_pseudo_operands(&name, statement, errors) {
        return;
    }

    match name.as_str() {
        ".orig" => {
            let operand = statement.operands[0].number_value.unwrap_or(0);
            let value = mask_truncated(operand, 16, config, errors, statement_span(statement), ".orig");
            entries.push(MemoryEntry::new(value, true, statement.source_line.clone()));
        }
        ".fill" => {
            let operand = &statement.operands[0];
            let value = match operand.kind {
                PieceKind::NumberOperand => {
                    mask_truncated(operand.number_value.unwrap_or(0), 16, config, errors, operand.span, ".fill")
                }
                _ => match symbols.get(&operand.text) {
                    Some(addr) => addr,
                    None => {
                        errors.push(AsmError::error(ErrorKind::UnknownLabel, "could not find label", operand.span));
                        return;
                    }
                },
            };
            entries.push(MemoryEntry::new(value, false, statement.source_line.clone()));
        }
        ".blkw" => {
            let count = statement.operands[0].number_value.unwrap_or(0);
            if count <= 0 {
                errors.push(AsmError::error(ErrorKind::InvalidBlkwCount, "operand to .blkw must be > 0", statement_span(statement)));
                return;
            }
            for _ in 0..count {
                entries.push(MemoryEntry::new(0, false, statement.source_line.clone()));
            }
        }
        ".stringz" => {
            let operand = &statement.operands[0];
            for c in operand.text.chars() {
                entries.push(MemoryEntry::new(c as u32 as u16, false, c.to_string()));
            }
            entries.push(MemoryEntry::new(0, false, statement.source_line.clone()));
        }
        ".end" => {}
        _ => {}
    }
}

/// Mask `value` to `width` bits, reporting a mode-dependent truncation
/// diagnostic when it didn't already fit. Always returns the masked value —
/// in strict mode the caller still emits the (now-flagged) entry, matching
/// spec §9's framing that both modes produce identical output once only
/// warnings are emitted.
fn mask_truncated(value: i32, width: u32, config: &AssemblerConfig, errors: &mut Vec<AsmError>, span: Span, context: &str) -> u16 {
    let masked = (value as i64 as u64 & mask(width) as u64) as u16;
    if !(0..=mask(width) as i64).contains(&(value as i64)) {
        errors.push(AsmError::mode_dependent(
            ErrorKind::Truncation,
            config.mode.is_strict(),
            format!("{context} operand {value} truncated to {width} bits"),
            span,
        ));
    }
    masked
}

struct Candidate {
    name_distance: usize,
    operand_distance: usize,
    pattern: &'static Pattern,
}

fn rank_candidates(name: &str, shape: &str) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = isa::patterns_within(name, CANDIDATE_THRESHOLD)
        .into_iter()
        .map(|(name_distance, pattern)| Candidate {
            name_distance,
            operand_distance: levenshtein::distance(shape, &pattern.operand_shape()),
            pattern,
        })
        .collect();
    candidates.sort_by(|a, b| (a.name_distance, a.operand_distance).cmp(&(b.name_distance, b.operand_distance)));
    log::trace!(
        "'{name}' (shape '{shape}') scored {} candidate(s), best {:?}",
        candidates.len(),
        candidates.first().map(|c| (c.pattern.mnemonic, c.name_distance, c.operand_distance))
    );
    candidates
}

fn nearest_mnemonic_suggestions(name: &str) -> Vec<String> {
    let lowered = name.to_ascii_lowercase();
    let mut scored: Vec<(usize, &'static str)> = isa::PATTERNS
        .iter()
        .map(|p| p.mnemonic)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .map(|m| (levenshtein::distance(&lowered, m), m))
        .collect();
    scored.sort();
    scored.into_iter().take(MAX_SUGGESTIONS).map(|(_, m)| m.to_string()).collect()
}

fn format_suggestions(names: &[String]) -> String {
    names.iter().map(|n| format!("'{n}'")).collect::<Vec<_>>().join(", ")
}

fn encode_instruction_statement(
    statement: &Statement,
    base: &StatementPiece,
    symbols: &SymbolTable,
    config: &AssemblerConfig,
    entries: &mut Vec<MemoryEntry>,
    errors: &mut Vec<AsmError>,
) {
    let shape = operand_shape(statement);
    let candidates = rank_candidates(&base.text, &shape);

    let Some(top) = candidates.first() else {
        let suggestions = nearest_mnemonic_suggestions(&base.text);
        errors.push(AsmError::error(
            ErrorKind::InvalidInstruction,
            format!("invalid instruction '{}'; did you mean {}?", base.text, format_suggestions(&suggestions)),
            base.span,
        ));
        return;
    };

    if top.name_distance != 0 {
        let suggestions = nearest_mnemonic_suggestions(&base.text);
        errors.push(AsmError::error(
            ErrorKind::InvalidInstruction,
            format!("invalid instruction '{}'; did you mean {}?", base.text, format_suggestions(&suggestions)),
            base.span,
        ));
        return;
    }

    if top.operand_distance != 0 {
        let variants: Vec<String> = isa::patterns_for(&base.text)
            .iter()
            .take(MAX_SUGGESTIONS)
            .map(|p| format!("{}({})", p.mnemonic, p.operand_shape()))
            .collect();
        errors.push(AsmError::error(
            ErrorKind::InvalidUsage,
            format!("invalid usage of '{}'; did you mean {}?", base.text, format_suggestions(&variants)),
            base.span,
        ));
        return;
    }

    if let Some(word) = encode_slots(statement, top.pattern, symbols, config, errors) {
        entries.push(MemoryEntry::new(word, false, statement.source_line.clone()));
    }
}

fn encode_slots(statement: &Statement, pattern: &Pattern, symbols: &SymbolTable, config: &AssemblerConfig, errors: &mut Vec<AsmError>) -> Option<u16> {
    let mut acc: u32 = 0;
    let mut operand_idx = 0;
    let mut ok = true;

    for slot in pattern.slots {
        acc <<= slot.width;
        let bits = match slot.kind {
            SlotKind::Fixed => slot.fixed_value as u32 & mask(slot.width),
            SlotKind::Register => {
                let operand = &statement.operands[operand_idx];
                operand_idx += 1;
                match isa::register_index(&operand.text) {
                    Some(idx) => idx as u32,
                    None => {
                        errors.push(AsmError::error(ErrorKind::InvalidUsage, format!("'{}' is not a register", operand.text), operand.span));
                        ok = false;
                        0
                    }
                }
            }
            SlotKind::UnsignedImmediate => {
                let operand = &statement.operands[operand_idx];
                operand_idx += 1;
                let value = operand.number_value.unwrap_or(0);
                if !(0..=mask(slot.width) as i64).contains(&(value as i64)) {
                    errors.push(AsmError::mode_dependent(
                        ErrorKind::Truncation,
                        config.mode.is_strict(),
                        format!("immediate {value} truncated to {} bits", slot.width),
                        operand.span,
                    ));
                }
                value as u32 & mask(slot.width)
            }
            SlotKind::SignedImmediate => {
                let operand = &statement.operands[operand_idx];
                operand_idx += 1;
                match signed_in_range(operand.number_value.unwrap_or(0) as i64, slot.width) {
                    Some(bits) => bits,
                    None => {
                        errors.push(AsmError::error(
                            ErrorKind::ImmediateOutOfRange,
                            format!("immediate {} does not fit in {} signed bits", operand.number_value.unwrap_or(0), slot.width),
                            operand.span,
                        ));
                        ok = false;
                        0
                    }
                }
            }
            SlotKind::PcOffsetSigned | SlotKind::Label => {
                let operand = &statement.operands[operand_idx];
                operand_idx += 1;
                let target = match operand.kind {
                    PieceKind::NumberOperand => operand.number_value.unwrap_or(0) as i64,
                    _ => match symbols.get(&operand.text) {
                        Some(addr) => addr as i64 - (statement.pc as i64 + 1),
                        None => {
                            errors.push(AsmError::error(ErrorKind::UnknownLabel, "could not find label", operand.span));
                            ok = false;
                            continue;
                        }
                    },
                };
                match signed_in_range(target, slot.width) {
                    Some(bits) => bits,
                    None => {
                        errors.push(AsmError::error(
                            ErrorKind::OffsetOutOfRange,
                            format!("offset {target} does not fit in {} signed bits", slot.width),
                            operand.span,
                        ));
                        ok = false;
                        0
                    }
                }
            }
        };
        acc |= bits;
    }

    ok.then_some(acc as u16)
}

fn signed_in_range(value: i64, width: u32) -> Option<u32> {
    let lo = -(1i64 << (width - 1));
    let hi = (1i64 << (width - 1)) - 1;
    if value < lo || value > hi {
        return None;
    }
    Some((value as u32) & mask(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first_pass::{assign_program_counters, build_symbol_table};
    use crate::lexer::tokenize;
    use crate::statement::build_statements;

    fn assemble_entries(source: &str, config: &AssemblerConfig) -> (Vec<MemoryEntry>, Vec<AsmError>) {
        let mut statements = build_statements(&tokenize(source).tokens);
        assign_program_counters(&mut statements, config);
        let (symbols, _) = build_symbol_table(&statements, config);
        encode(&statements, &symbols, config)
    }

    #[test]
    fn minimal_program_emits_orig_and_halt() {
        let (entries, errors) = assemble_entries(".ORIG x3000\nHALT\n.END", &AssemblerConfig::strict());
        assert!(errors.is_empty());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], MemoryEntry::new(0x3000, true, ".ORIG x3000"));
        assert!(!entries[1].is_origin);
        assert_eq!(entries[1].value, 0xF025);
    }

    #[test]
    fn add_register_form_matches_known_encoding() {
        let (entries, _) = assemble_entries(".ORIG x3000\nADD R0,R1,R2\n.END", &AssemblerConfig::strict());
        assert_eq!(entries[1].value, 0x1042);
    }

    #[test]
    fn and_register_form_matches_known_encoding() {
        let (entries, _) = assemble_entries(".ORIG x3000\nAND R0,R1,R2\n.END", &AssemblerConfig::strict());
        assert_eq!(entries[1].value, 0x5042);
    }

    #[test]
    fn not_matches_known_encoding() {
        let (entries, _) = assemble_entries(".ORIG x3000\nNOT R0,R1\n.END", &AssemblerConfig::strict());
        assert_eq!(entries[1].value, 0x907F);
    }

    #[test]
    fn add_immediate_form_encodes_negative_five_bit_immediate() {
        let (entries, errors) = assemble_entries(".ORIG x3000\nADD R0,R0,#-1\n.END", &AssemblerConfig::strict());
        assert!(errors.is_empty());
        // 0001 000 000 1 11111
        assert_eq!(entries[1].value, 0b0001_000_000_1_11111);
    }

    #[test]
    fn label_branch_resolves_pc_relative_offset() {
        let (entries, errors) =
            assemble_entries(".ORIG x3000\nLOOP ADD R0,R0,#-1\nBRnzp LOOP\n.END", &AssemblerConfig::strict());
        assert!(errors.is_empty());
        // BRnzp is at 0x3001, LOOP resolves to 0x3000: offset = 0x3000 - 0x3002 = -2.
        let br_word = entries[2].value;
        assert_eq!(br_word, 0b0000_111_111111110);
    }

    #[test]
    fn typo_produces_invalid_instruction_diagnostic_and_no_entry() {
        let (entries, errors) = assemble_entries(".ORIG x3000\nADDD R0,R1,R2\n.END", &AssemblerConfig::strict());
        assert_eq!(entries.len(), 1); // only the .orig marker
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidInstruction && e.message.contains("'add'")));
    }

    #[test]
    fn wrong_operand_shape_is_invalid_usage() {
        let (_, errors) = assemble_entries(".ORIG x3000\nADD R0,R1\n.END", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidUsage));
    }

    #[test]
    fn fill_resolves_a_forward_label() {
        let (entries, errors) = assemble_entries(".ORIG x3000\n.FILL DATA\nDATA .FILL #42\n.END", &AssemblerConfig::strict());
        assert!(errors.is_empty());
        assert_eq!(entries[1].value, 0x3001);
        assert_eq!(entries[2].value, 42);
    }

    #[test]
    fn fill_unknown_label_is_an_error() {
        let (_, errors) = assemble_entries(".ORIG x3000\n.FILL NOWHERE\n.END", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::UnknownLabel));
    }

    #[test]
    fn blkw_emits_n_zero_entries() {
        let (entries, _) = assemble_entries(".ORIG x3000\n.BLKW #3\n.END", &AssemblerConfig::strict());
        assert_eq!(entries.len(), 4);
        assert!(entries[1..].iter().all(|e| e.value == 0));
    }

    #[test]
    fn blkw_zero_is_rejected() {
        let (_, errors) = assemble_entries(".ORIG x3000\n.BLKW #0\n.END", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidBlkwCount));
    }

    #[test]
    fn stringz_emits_one_entry_per_byte_plus_terminator() {
        let (entries, _) = assemble_entries(".ORIG x3000\n.STRINGZ \"hi\"\n.END", &AssemblerConfig::strict());
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1].value, 'h' as u16);
        assert_eq!(entries[1].source_line, "h");
        assert_eq!(entries[2].value, 'i' as u16);
        assert_eq!(entries[3].value, 0);
    }

    #[test]
    fn signed_immediate_out_of_range_is_an_error() {
        let (_, errors) = assemble_entries(".ORIG x3000\nADD R0,R0,#16\n.END", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::ImmediateOutOfRange));
    }

    #[test]
    fn case_insensitive_mnemonics_produce_identical_output() {
        let (upper, _) = assemble_entries(".ORIG x3000\nADD R0,R1,R2\n.END", &AssemblerConfig::strict());
        let (lower, _) = assemble_entries(".orig x3000\nadd r0,r1,r2\n.end", &AssemblerConfig::strict());
        assert_eq!(upper, lower);
    }

    #[test]
    fn orig_without_an_operand_is_invalid_usage_not_a_default_origin() {
        let (entries, errors) = assemble_entries(".ORIG\nHALT\n.END", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidUsage));
        assert!(entries.iter().all(|e| !e.is_origin));
    }

    #[test]
    fn orig_with_a_label_operand_is_invalid_usage() {
        let (_, errors) = assemble_entries(".ORIG DATA\nHALT\n.END", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidUsage));
    }

    #[test]
    fn fill_without_an_operand_is_invalid_usage_not_a_silent_gap() {
        let (entries, errors) = assemble_entries(".ORIG x3000\n.FILL\nHALT\n.END", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidUsage));
        assert_eq!(entries.len(), 2); // .orig marker and HALT only, nothing for the bad .fill
    }

    #[test]
    fn blkw_without_an_operand_is_invalid_usage() {
        let (entries, errors) = assemble_entries(".ORIG x3000\n.BLKW\n.END", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidUsage));
        assert_eq!(entries.len(), 1); // only the .orig marker
    }

    #[test]
    fn blkw_with_a_label_operand_is_invalid_usage() {
        let (_, errors) = assemble_entries(".ORIG x3000\n.BLKW DATA\n.END", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidUsage));
    }

    #[test]
    fn stringz_with_a_numeric_operand_is_invalid_usage_not_truncated_text() {
        let (entries, errors) = assemble_entries(".ORIG x3000\n.STRINGZ #5\n.END", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidUsage));
        assert_eq!(entries.len(), 1); // only the .orig marker, no phantom characters
    }

    #[test]
    fn stringz_without_an_operand_is_invalid_usage() {
        let (_, errors) = assemble_entries(".ORIG x3000\n.STRINGZ\n.END", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidUsage));
    }

    #[test]
    fn end_with_a_stray_operand_is_invalid_usage() {
        let (_, errors) = assemble_entries(".ORIG x3000\nHALT\n.END x3000", &AssemblerConfig::strict());
        assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidUsage));
    }
}
