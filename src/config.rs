//! Runtime assembler configuration.
//!
//! The original `lc3tools` picked strict vs. liberal diagnostics with a
//! `_LIBERAL_ASM` preprocessor switch baked in at compile time. Per the
//! design notes, that becomes a plain runtime value here so a single build
//! of this crate supports both behaviors; every pass takes `&AssemblerConfig`
//! rather than reading a global.

/// Selects whether certain anomaly classes (see `error::ErrorKind`) are
/// reported as warnings or as errors. See spec §6/§7 for the exact list of
/// mode-dependent anomalies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Strict,
    Liberal,
}

impl Mode {
    pub fn is_strict(self) -> bool {
        matches!(self, Mode::Strict)
    }

    pub fn is_liberal(self) -> bool {
        matches!(self, Mode::Liberal)
    }
}

/// Configuration threaded through the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssemblerConfig {
    pub mode: Mode,
}

impl AssemblerConfig {
    pub fn strict() -> Self {
        Self { mode: Mode::Strict }
    }

    pub fn liberal() -> Self {
        Self { mode: Mode::Liberal }
    }
}
