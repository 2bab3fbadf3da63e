use std::ffi::OsStr;
use std::path::PathBuf;

use log::info;
use manifest::Config;
use synth::{Mode, Synthesizer, TemplateSynthesizer};

use crate::error::DriverResult;
use crate::scratch::with_scratch_source;
use crate::toolchain::Toolchain;

pub const PRODUCT: &str = "moa";
pub const BUILD_OUTPUT: &str = "a.out";

const BUILD_FLAGS: [&str; 5] = ["build", "-ldflags=-s -w", "-trimpath", "-o", BUILD_OUTPUT];

pub const USAGE: &str = "Moa is a programming language

Usage: moa <command> [...arguments]

Commands:
  moa build [os] [arch]    compile to an executable file
  moa repl                 start a REPL session
  moa run                  execute the program
  moa test                 run tests
  moa version              display Moa version
  moa go-version           display the Go toolchain version

Flags:
  --json                   print results as JSON
  --verbose                log pipeline steps to stderr";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

/// Cross-compilation target for `build`, handed to the toolchain as
/// `GOOS`/`GOARCH`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildTarget {
    pub os: Option<String>,
    pub arch: Option<String>,
}

impl BuildTarget {
    fn env(&self) -> Vec<(&'static str, &str)> {
        let mut vars = Vec::new();
        if let Some(os) = &self.os {
            vars.push(("GOOS", os.as_str()));
        }
        if let Some(arch) = &self.arch {
            vars.push(("GOARCH", arch.as_str()));
        }
        vars
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Build { target: BuildTarget },
    Run,
    Test,
    Repl { args: Vec<String> },
    Version,
    GoVersion,
    Help,
}

impl Command {
    /// Picks the command from the arguments after the program name. Anything
    /// unrecognised falls back to help.
    pub fn parse(args: &[String]) -> Self {
        match args.first().map(String::as_str) {
            Some("build") => Self::Build {
                target: BuildTarget {
                    os: args.get(1).cloned(),
                    arch: args.get(2).cloned(),
                },
            },
            Some("run") => Self::Run,
            Some("test") => Self::Test,
            Some("repl") => Self::Repl {
                args: args[1..].to_vec(),
            },
            Some("version") => Self::Version,
            Some("go-version") => Self::GoVersion,
            _ => Self::Help,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Build { .. } => "build",
            Self::Run => "run",
            Self::Test => "test",
            Self::Repl { .. } => "repl",
            Self::Version => "version",
            Self::GoVersion => "go-version",
            Self::Help => "help",
        }
    }
}

/// Maps commands onto synthesis, scratch files and toolchain runs.
#[derive(Debug, Clone)]
pub struct Driver<S = TemplateSynthesizer> {
    toolchain: Toolchain,
    scratch_dir: PathBuf,
    synthesizer: S,
}

impl Driver<TemplateSynthesizer> {
    pub fn new(config: &Config) -> Self {
        Self::with_synthesizer(config, TemplateSynthesizer)
    }
}

impl<S: Synthesizer> Driver<S> {
    pub fn with_synthesizer(config: &Config, synthesizer: S) -> Self {
        Self {
            toolchain: Toolchain::new(config.program()),
            scratch_dir: config.scratch_dir(),
            synthesizer,
        }
    }

    /// Runs one command and returns the text to print on stdout.
    pub fn dispatch(&self, command: &Command) -> DriverResult<String> {
        info!("dispatching `{}`", command.name());
        match command {
            Command::Build { target } => {
                self.compile(Mode::Normal, &BUILD_FLAGS, &target.env())?;
                Ok(String::new())
            }
            Command::Run => self.compile(Mode::Normal, &["run"], &[]),
            Command::Test => self.compile(Mode::Test, &["run"], &[]),
            Command::GoVersion => Ok(self.toolchain.invoke(["version"])?.output),
            Command::Repl { .. } | Command::Version | Command::Help => {
                Ok(local_output(command).unwrap_or_default())
            }
        }
    }

    fn compile(&self, mode: Mode, args: &[&str], envs: &[(&str, &str)]) -> DriverResult<String> {
        let source = self.synthesizer.synthesize(mode, None)?;
        with_scratch_source(&self.scratch_dir, source.as_bytes(), |path| {
            let argv = args
                .iter()
                .map(OsStr::new)
                .chain(std::iter::once(path.as_os_str()));
            let result = self
                .toolchain
                .invoke_with_env(argv, envs.iter().copied())?;
            Ok(result.output)
        })
    }
}

/// Output of the commands that need neither configuration nor the
/// toolchain, or `None` for the ones that do.
pub fn local_output(command: &Command) -> Option<String> {
    match command {
        Command::Repl { args } => Some(repl_placeholder(args)),
        Command::Version => Some(format!("{}\n", version_string())),
        Command::Help => Some(format!("{USAGE}\n")),
        Command::Build { .. } | Command::Run | Command::Test | Command::GoVersion => None,
    }
}

fn repl_placeholder(args: &[String]) -> String {
    if args.is_empty() {
        "repl not implemented yet\n".to_string()
    } else {
        format!("repl not implemented yet : {}\n", args.join(" "))
    }
}

/// `moa v<version> <os>/<arch>`, using the toolchain's platform names.
pub fn version_string() -> String {
    format!(
        "{PRODUCT} v{} {}/{}",
        env!("CARGO_PKG_VERSION"),
        platform_os(std::env::consts::OS),
        platform_arch(std::env::consts::ARCH)
    )
}

fn platform_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn platform_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        other => other,
    }
}
