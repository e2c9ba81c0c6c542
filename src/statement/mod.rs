//! # Statement Builder (C3)
//!
//! Groups the tokens of one source line into a `Statement`: at most one
//! label, at most one base (instruction or pseudo-op), and the remaining
//! operands. The source grammar offers no reserved-word distinction, so
//! classification leans on edit distance to the instruction table (C2) to
//! guess what the user meant — this component never rejects a line outright;
//! a bad guess just surfaces later as an encoder diagnostic.

use crate::isa;
use crate::lexer::{Token, TokenKind};
use crate::span::Span;

/// The instruction-name closeness threshold: admits a single-character typo
/// while rejecting an arbitrary identifier that merely happens to share a
/// letter or two with a mnemonic.
const CLOSE_ENOUGH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Label,
    Instruction,
    PseudoOp,
    Register,
    StringOperand,
    NumberOperand,
}

/// A token promoted into a semantic role within a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementPiece {
    pub kind: PieceKind,
    pub text: String,
    pub number_value: Option<i32>,
    pub span: Span,
    pub line_text: String,
}

impl StatementPiece {
    fn from_token(kind: PieceKind, token: &Token) -> Self {
        let text = if kind == PieceKind::Label {
            token.text.to_ascii_lowercase()
        } else {
            token.text.clone()
        };
        Self {
            kind,
            text,
            number_value: token.number_value,
            span: token.span,
            line_text: token.line_text.clone(),
        }
    }
}

/// One logical source line, after classification. Exactly one of `label`,
/// `base` is populated on any statement meant to be emitted; `pc` and
/// `valid` are undefined/true respectively until the PC assigner (C4) runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub label: Option<StatementPiece>,
    pub base: Option<StatementPiece>,
    pub operands: Vec<StatementPiece>,
    pub pc: u16,
    pub valid: bool,
    pub source_line: String,
    pub row: usize,
}

impl Statement {
    fn empty(row: usize, source_line: String) -> Self {
        Self {
            label: None,
            base: None,
            operands: Vec::new(),
            pc: 0,
            valid: true,
            source_line,
            row,
        }
    }

    pub fn is_label_only(&self) -> bool {
        self.label.is_some() && self.base.is_none()
    }
}

fn classify_operand(token: &Token) -> StatementPiece {
    match token.kind {
        TokenKind::Number => StatementPiece::from_token(PieceKind::NumberOperand, token),
        TokenKind::Str => {
            if isa::is_register_name(&token.text) {
                StatementPiece::from_token(PieceKind::Register, token)
            } else {
                StatementPiece::from_token(PieceKind::StringOperand, token)
            }
        }
        TokenKind::EndOfLine => unreachable!("end-of-line tokens never reach operand classification"),
    }
}

/// Split a whole token stream into per-line statements on
/// `TokenKind::EndOfLine` boundaries.
pub fn build_statements(tokens: &[Token]) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut line: Vec<&Token> = Vec::new();
    for token in tokens {
        if token.is_end_of_line() {
            statements.push(build_statement(&line, token));
            line.clear();
        } else {
            line.push(token);
        }
    }
    statements
}

fn build_statement(line: &[&Token], eol: &Token) -> Statement {
    let row = line.first().map_or(eol.span.row, |t| t.span.row);
    let source_line = line.first().map_or_else(|| eol.line_text.clone(), |t| t.line_text.clone());
    let mut statement = Statement::empty(row, source_line);

    if line.is_empty() {
        return statement;
    }

    let first = line[0];
    let second = line.get(1).copied();

    let operands_start = match first.kind {
        TokenKind::Number => {
            statement.label = Some(StatementPiece::from_token(PieceKind::NumberOperand, first));
            1
        }
        TokenKind::Str if isa::is_pseudo_name(&first.text) => {
            statement.base = Some(StatementPiece::from_token(PieceKind::PseudoOp, first));
            1
        }
        TokenKind::Str => {
            let d0 = isa::nearest_instruction_distance(&first.text);
            if d0 == 0 {
                let second_is_pseudo =
                    matches!(second, Some(t) if t.kind == TokenKind::Str && isa::is_pseudo_name(&t.text));
                if second_is_pseudo {
                    statement.label = Some(StatementPiece::from_token(PieceKind::Label, first));
                    statement.base = Some(StatementPiece::from_token(PieceKind::PseudoOp, second.unwrap()));
                    2
                } else {
                    statement.base = Some(StatementPiece::from_token(PieceKind::Instruction, first));
                    1
                }
            } else if let Some(second) = second {
                if second.kind == TokenKind::Str {
                    let d1 = isa::nearest_instruction_distance(&second.text);
                    if isa::is_pseudo_name(&second.text) {
                        statement.label = Some(StatementPiece::from_token(PieceKind::Label, first));
                        statement.base = Some(StatementPiece::from_token(PieceKind::PseudoOp, second));
                        2
                    } else if isa::is_register_name(&second.text) {
                        if d0 < CLOSE_ENOUGH {
                            statement.base = Some(StatementPiece::from_token(PieceKind::Instruction, first));
                            1
                        } else {
                            statement.label = Some(StatementPiece::from_token(PieceKind::Label, first));
                            1
                        }
                    } else if d1 < d0 {
                        if d1 < CLOSE_ENOUGH {
                            statement.label = Some(StatementPiece::from_token(PieceKind::Label, first));
                            statement.base = Some(StatementPiece::from_token(PieceKind::Instruction, second));
                            2
                        } else {
                            statement.label = Some(StatementPiece::from_token(PieceKind::Label, first));
                            1
                        }
                    } else if d0 < CLOSE_ENOUGH {
                        statement.base = Some(StatementPiece::from_token(PieceKind::Instruction, first));
                        1
                    } else {
                        statement.label = Some(StatementPiece::from_token(PieceKind::Label, first));
                        1
                    }
                } else {
                    // token[1] is a NUMBER.
                    if d0 < CLOSE_ENOUGH {
                        statement.base = Some(StatementPiece::from_token(PieceKind::Instruction, first));
                        1
                    } else {
                        statement.label = Some(StatementPiece::from_token(PieceKind::Label, first));
                        1
                    }
                }
            } else {
                statement.label = Some(StatementPiece::from_token(PieceKind::Label, first));
                1
            }
        }
        TokenKind::EndOfLine => unreachable!("end-of-line tokens are split out before this point"),
    };

    statement.operands = line[operands_start..].iter().map(|t| classify_operand(t)).collect();

    statement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn build(source: &str) -> Vec<Statement> {
        build_statements(&tokenize(source).tokens)
    }

    #[test]
    fn exact_pseudo_op_is_base_with_no_label() {
        let statements = build(".ORIG x3000");
        assert!(statements[0].label.is_none());
        assert_eq!(statements[0].base.as_ref().unwrap().kind, PieceKind::PseudoOp);
        assert_eq!(statements[0].operands.len(), 1);
    }

    #[test]
    fn exact_instruction_is_base_with_no_label() {
        let statements = build("ADD R0,R1,R2");
        assert_eq!(statements[0].base.as_ref().unwrap().kind, PieceKind::Instruction);
        assert_eq!(statements[0].operands.len(), 2);
        assert_eq!(statements[0].operands[0].kind, PieceKind::Register);
    }

    #[test]
    fn exact_instruction_word_stays_an_instruction_when_followed_by_a_non_pseudo_word() {
        let statements = build("ADD HALT");
        // "ADD" is exact (d0=0); token[1] "HALT" is a STRING that isn't a
        // pseudo-op, so ADD is taken as the instruction and HALT becomes a
        // plain (string) operand — not classified as a label.
        assert_eq!(statements[0].base.as_ref().unwrap().kind, PieceKind::Instruction);
        assert_eq!(statements[0].operands[0].kind, PieceKind::StringOperand);
    }

    #[test]
    fn exact_instruction_word_followed_by_pseudo_op_is_treated_as_a_label() {
        let statements = build("ADD .FILL x5");
        assert_eq!(statements[0].label.as_ref().unwrap().kind, PieceKind::Label);
        assert_eq!(statements[0].label.as_ref().unwrap().text, "add");
        assert_eq!(statements[0].base.as_ref().unwrap().kind, PieceKind::PseudoOp);
    }

    #[test]
    fn label_then_near_instruction_recognized_through_register_operand() {
        // "LOOP" is far from any mnemonic; "ADD" is exact (d0=0 < 2), and
        // register operands follow it.
        let statements = build("LOOP ADD R0,R0,R1");
        assert_eq!(statements[0].label.as_ref().unwrap().text, "loop");
        let base = statements[0].base.as_ref().unwrap();
        assert_eq!(base.kind, PieceKind::Instruction);
        assert_eq!(base.text, "ADD");
    }

    #[test]
    fn typo_instruction_still_becomes_base_within_close_enough_distance() {
        let statements = build("ADDD R0,R1,R2");
        assert_eq!(statements[0].base.as_ref().unwrap().kind, PieceKind::Instruction);
        assert_eq!(statements[0].base.as_ref().unwrap().text, "ADDD");
    }

    #[test]
    fn bare_number_at_line_start_is_a_rejectable_label() {
        let statements = build("123 HALT");
        assert_eq!(statements[0].label.as_ref().unwrap().kind, PieceKind::NumberOperand);
    }

    #[test]
    fn label_only_line_has_no_base() {
        let statements = build("LOOP");
        assert_eq!(statements[0].label.as_ref().unwrap().text, "loop");
        assert!(statements[0].base.is_none());
        assert!(statements[0].operands.is_empty());
    }

    #[test]
    fn label_followed_by_stray_operands_has_no_base() {
        let statements = build("LOOP SOMETHING");
        assert!(statements[0].is_label_only());
        assert_eq!(statements[0].operands.len(), 1);
    }

    #[test]
    fn blank_line_produces_an_empty_statement() {
        let statements = build("ADD R0,R1,R2\n\nHALT");
        assert!(statements[1].label.is_none());
        assert!(statements[1].base.is_none());
        assert!(statements[1].operands.is_empty());
    }
}
