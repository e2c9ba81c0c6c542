//! Error taxonomy for every pass of the pipeline (spec §7).
//!
//! `AsmError` is the value every pass collects into a `Vec` rather than
//! aborting on. `ErrorKind` exists separately from the message text so tests
//! can assert on the *class* of failure without depending on exact wording.

use crate::span::Span;
use thiserror::Error;

/// Severity of an `AsmError`. Each call site decides strict-vs-liberal
/// severity itself (consulting `AssemblerConfig::mode`) the same place the
/// original assembler's `#ifdef _LIBERAL_ASM` branches lived, rather than
/// inferring severity centrally from `ErrorKind` after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Extra,
    Note,
    Warning,
    Error,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::Extra => "extra",
            Level::Note => "note",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

/// The cause class of an `AsmError`, grouped the way spec §7 groups them:
/// Lexical, Structural, Symbolic, Syntactic, Semantic, Truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // Lexical
    UnterminatedString,
    InvalidNumberLiteral,

    // Structural
    MissingOrig,
    OrigInsideLiveRegion,
    MissingEnd,
    CodeInMmio,
    StrayAfterEnd,

    // Symbolic
    NumericLabel,
    LabelIsInstruction,
    DuplicateLabel,
    LabelStartsWithDigit,
    LabelWithStrayOperands,

    // Syntactic
    InvalidInstruction,
    InvalidUsage,

    // Semantic
    UnknownLabel,
    ImmediateOutOfRange,
    OffsetOutOfRange,
    InvalidBlkwCount,

    // Truncation
    Truncation,
}

/// One error or warning-grade anomaly, anchored at a `Span`.
///
/// This is the unit every pass pushes into its result's `errors: Vec<AsmError>`
/// (fail-collect, per spec §5/§7). Rendering it to the `file:row:col: level:
/// message` + source excerpt form is `diagnostics::Diagnostic`'s job, not
/// this type's — `AsmError` only needs to carry enough to build one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AsmError {
    pub kind: ErrorKind,
    pub level: Level,
    pub message: String,
    pub span: Span,
}

impl AsmError {
    pub fn new(kind: ErrorKind, level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            level,
            message: message.into(),
            span,
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self::new(kind, Level::Error, message, span)
    }

    pub fn warning(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self::new(kind, Level::Warning, message, span)
    }

    /// Build an `AsmError` whose severity depends on `strict`: `Error` in
    /// strict mode, `Warning` in liberal mode. Used at the handful of call
    /// sites in spec §7 whose anomaly class is mode-dependent.
    pub fn mode_dependent(
        kind: ErrorKind,
        strict: bool,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        let level = if strict { Level::Error } else { Level::Warning };
        Self::new(kind, level, message, span)
    }
}
