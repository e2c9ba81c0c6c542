//! # Diagnostic Logger (C7)
//!
//! Renders location-anchored messages in the form:
//!
//! ```text
//! <filename>:<row+1>:<column+1>: error: <message>
//!     <source line verbatim>
//!     <spaces>^~~~
//! ```
//!
//! Colorization is an external printer's job (out of scope here, per spec
//! §4.7) — `Diagnostic::render` only ever emits plain text, keyed by
//! `level`, so a caller can colorize by switching on `level` without this
//! crate depending on a terminal-color crate itself.
//!
//! `Level::Extra` traces are additionally mirrored through the `log` facade
//! (`log::trace!`) as they're pushed — a host binary that only wants
//! warnings and errors can drop a log filter instead of paying to collect
//! every trace-level note into the returned `Vec<Diagnostic>`.

use crate::error::{AsmError, Level};
use crate::span::Span;

/// One leveled, optionally span-anchored message.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Option<Span>,
    pub source_line: Option<String>,
}

impl Diagnostic {
    pub fn note(message: impl Into<String>) -> Self {
        Self {
            level: Level::Note,
            message: message.into(),
            span: None,
            source_line: None,
        }
    }

    pub fn extra(message: impl Into<String>) -> Self {
        Self {
            level: Level::Extra,
            message: message.into(),
            span: None,
            source_line: None,
        }
    }

    fn from_error(err: &AsmError, source_line: Option<&str>) -> Self {
        Self {
            level: err.level,
            message: err.message.clone(),
            span: Some(err.span),
            source_line: source_line.map(str::to_owned),
        }
    }

    /// Render exactly as spec §4.7 describes: header line, verbatim source
    /// excerpt, then a caret under the span's first column with tildes
    /// spanning the remainder of the lexeme.
    pub fn render(&self, filename: &str) -> String {
        let Some(span) = self.span else {
            return format!("{}: {}: {}", filename, self.level.label(), self.message);
        };

        let mut out = format!(
            "{}:{}:{}: {}: {}",
            filename,
            span.row + 1,
            span.col + 1,
            self.level.label(),
            self.message
        );

        if let Some(line) = &self.source_line {
            out.push('\n');
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
            out.push_str(&" ".repeat(4 + span.col));
            out.push('^');
            if span.len > 1 {
                out.push_str(&"~".repeat(span.len - 1));
            }
        }

        out
    }
}

/// Accumulates diagnostics across the whole pipeline and tracks whether any
/// `Error`-level diagnostic has been emitted, per spec §5's fail-collect
/// contract: a pass keeps iterating statements after a non-fatal error, and
/// the driver fails only after every pass has had a chance to report.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    had_error: bool,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.level == Level::Extra {
            log::trace!("{}", diagnostic.message);
        }
        if diagnostic.level == Level::Error {
            self.had_error = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Record an `AsmError`, looking up its source line (by 0-based row) so
    /// the rendered excerpt is always available.
    pub fn push_error(&mut self, err: &AsmError, source_lines: &[String]) {
        let line = source_lines.get(err.span.row).map(String::as_str);
        self.push(Diagnostic::from_error(err, line));
    }

    pub fn push_all(&mut self, errors: &[AsmError], source_lines: &[String]) {
        for err in errors {
            self.push_error(err, source_lines);
        }
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.push(Diagnostic::note(message));
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn renders_caret_under_span_start() {
        let source_line = "    ADDD R0,R1,R2";
        let err = AsmError::error(ErrorKind::InvalidInstruction, "invalid instruction", Span::new(2, 4, 4));
        let source_lines = vec!["".into(), "".into(), source_line.into()];
        let mut sink = DiagnosticSink::new();
        sink.push_error(&err, &source_lines);
        let rendered = sink.diagnostics()[0].render("test.asm");
        let expected = format!(
            "test.asm:3:5: error: invalid instruction\n    {}\n{}^~~~",
            source_line,
            " ".repeat(4 + 4)
        );
        assert_eq!(rendered, expected);
        assert!(sink.had_error());
    }

    #[test]
    fn note_has_no_span() {
        let mut sink = DiagnosticSink::new();
        sink.note("did you mean 'add'?");
        assert_eq!(sink.diagnostics()[0].render("test.asm"), "test.asm: note: did you mean 'add'?");
        assert!(!sink.had_error());
    }
}
