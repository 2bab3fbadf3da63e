//! `moa.toml` loading and the resolved driver configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "moa.toml";
pub const DEFAULT_TOOLCHAIN: &str = "go";

pub const ENV_TOOLCHAIN: &str = "MOA_TOOLCHAIN";
pub const ENV_SCRATCH_DIR: &str = "MOA_SCRATCH_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed reading {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{key} cannot be empty")]
    Empty { key: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    #[serde(default = "default_program")]
    pub program: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            program: default_program(),
        }
    }
}

fn default_program() -> String {
    DEFAULT_TOOLCHAIN.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scratch {
    pub dir: Option<PathBuf>,
}

/// Driver configuration: which toolchain to run and where transient
/// sources are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub toolchain: Toolchain,
    #[serde(default)]
    pub scratch: Scratch,
}

impl Config {
    pub fn new(program: impl Into<String>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            toolchain: Toolchain {
                program: program.into(),
            },
            scratch: Scratch {
                dir: Some(scratch_dir.into()),
            },
        }
    }

    /// Reads `moa.toml` from `dir` if present, then applies process
    /// environment overrides.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(MANIFEST_FILE);
        let mut config = if path.is_file() {
            load_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env(&process_env());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self, vars: &BTreeMap<String, String>) {
        if let Some(program) = vars.get(ENV_TOOLCHAIN) {
            self.toolchain.program = program.clone();
        }
        if let Some(dir) = vars.get(ENV_SCRATCH_DIR) {
            self.scratch.dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.toolchain.program.trim().is_empty() {
            return Err(ConfigError::Empty {
                key: "toolchain.program",
            });
        }
        if self
            .scratch
            .dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(ConfigError::Empty { key: "scratch.dir" });
        }
        Ok(())
    }

    pub fn program(&self) -> &str {
        &self.toolchain.program
    }

    /// Configured scratch directory, falling back to the system temp dir.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch
            .dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

fn process_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

pub fn load(contents: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(contents)
}

pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
