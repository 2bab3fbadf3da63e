use std::path::PathBuf;

use synth::SynthError;
use thiserror::Error;

pub type DriverResult<T> = Result<T, DriverError>;

/// Every way a dispatched command can fail.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Synthesis(#[from] SynthError),
    /// The transient source file could not be created or written.
    #[error("failed to create temporary source {}: {source}", path.display())]
    ArtifactCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The toolchain executable could not be started at all.
    #[error("failed to run `{program}`: {source}")]
    ToolchainSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` {}", describe_exit(*code))]
    ToolchainFailed {
        program: String,
        code: Option<i32>,
        output: String,
    },
}

impl DriverError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Synthesis(_) => "synthesis",
            Self::ArtifactCreation { .. } => "artifact",
            Self::ToolchainSpawn { .. } => "spawn",
            Self::ToolchainFailed { .. } => "toolchain",
        }
    }

    /// Text the toolchain printed before failing, if it got that far.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::ToolchainFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}
