//! Source synthesis: turns a mode (and, eventually, user source) into Go
//! program text for the toolchain.
//!
//! The [`Synthesizer`] trait is the seam where a real front end (lexer,
//! parser, codegen) plugs in. Today the only implementation is
//! [`TemplateSynthesizer`], which emits one of two fixed programs.

use std::fmt;

use thiserror::Error;

pub use diagnostics::{Diagnostic, Severity, Span};

pub type SynthResult<T> = Result<T, SynthError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    #[error("syntax error: {0}")]
    Syntax(Diagnostic),
    #[error("semantic error: {0}")]
    Semantic(Diagnostic),
}

impl SynthError {
    pub fn diagnostic(&self) -> &Diagnostic {
        match self {
            Self::Syntax(diagnostic) | Self::Semantic(diagnostic) => diagnostic,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Normal,
    Test,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Test => f.write_str("test"),
        }
    }
}

/// Target-language program text. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    mode: Mode,
    text: String,
}

impl GeneratedSource {
    pub fn new(mode: Mode, text: impl Into<String>) -> Self {
        Self {
            mode,
            text: text.into(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

pub trait Synthesizer {
    /// Produce Go source for `mode`. `user_source` is the program the user
    /// wrote, when there is one.
    fn synthesize(&self, mode: Mode, user_source: Option<&str>) -> SynthResult<GeneratedSource>;
}

const HELLO_PROGRAM: &str = "package main\nimport \"fmt\"\nfunc main() { fmt.Println(\"hello\") }";

const TEST_PROGRAM: &str =
    "package main\nimport \"fmt\"\nfunc main() { fmt.Println(\"...............................ok\") }";

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSynthesizer;

impl TemplateSynthesizer {
    pub fn template(mode: Mode) -> &'static str {
        match mode {
            Mode::Normal => HELLO_PROGRAM,
            Mode::Test => TEST_PROGRAM,
        }
    }
}

impl Synthesizer for TemplateSynthesizer {
    fn synthesize(&self, mode: Mode, _user_source: Option<&str>) -> SynthResult<GeneratedSource> {
        Ok(GeneratedSource::new(mode, Self::template(mode)))
    }
}

/// Shorthand for the built-in templates, which cannot fail.
pub fn synthesize(mode: Mode) -> GeneratedSource {
    GeneratedSource::new(mode, TemplateSynthesizer::template(mode))
}
