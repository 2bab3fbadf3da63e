//! Runs the external toolchain and captures what it prints.

use std::ffi::OsStr;
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};

use log::debug;

use crate::error::{DriverError, DriverResult};

/// Captured output of a toolchain run that exited successfully.
#[derive(Debug, Clone)]
pub struct ToolchainResult {
    pub output: String,
    pub status: ExitStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    program: String,
}

impl Toolchain {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn invoke<I, S>(&self, args: I) -> DriverResult<ToolchainResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.invoke_with_env(args, std::iter::empty::<(&str, &str)>())
    }

    /// Spawns the toolchain once and waits for it. Stdout and stderr share a
    /// single pipe, so the captured text keeps the order the OS delivered.
    pub fn invoke_with_env<I, S, E, K, V>(&self, args: I, envs: E) -> DriverResult<ToolchainResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
        E: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let (mut reader, writer) = std::io::pipe().map_err(|err| self.spawn_error(err))?;
        let stdout = writer.try_clone().map_err(|err| self.spawn_error(err))?;

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .envs(envs)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(writer);
        debug!("spawning {cmd:?}");
        let spawned = cmd.spawn();
        // The command still holds the write ends; release them so the read
        // below sees EOF once the child exits.
        drop(cmd);
        let mut child = spawned.map_err(|err| self.spawn_error(err))?;

        let mut captured = Vec::new();
        let read = reader.read_to_end(&mut captured);
        let status = child.wait().map_err(|err| self.spawn_error(err))?;
        read.map_err(|err| self.spawn_error(err))?;

        let output = String::from_utf8_lossy(&captured).into_owned();
        debug!(
            "`{}` finished with {status} ({} bytes of output)",
            self.program,
            output.len()
        );
        if !status.success() {
            return Err(DriverError::ToolchainFailed {
                program: self.program.clone(),
                code: status.code(),
                output,
            });
        }
        Ok(ToolchainResult { output, status })
    }

    fn spawn_error(&self, source: std::io::Error) -> DriverError {
        DriverError::ToolchainSpawn {
            program: self.program.clone(),
            source,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn merges_stdout_and_stderr_in_order() {
        let sh = Toolchain::new("sh");
        let result = sh
            .invoke(["-c", "echo one; echo two 1>&2; echo three"])
            .expect("sh should succeed");
        assert!(result.status.success());
        assert_eq!(result.output, "one\ntwo\nthree\n");
    }

    #[test]
    fn non_zero_exit_keeps_output() {
        let sh = Toolchain::new("sh");
        let err = sh
            .invoke(["-c", "echo 'main.go:1: syntax error' 1>&2; exit 3"])
            .expect_err("exit 3 is a failure");
        match err {
            DriverError::ToolchainFailed {
                program,
                code,
                output,
            } => {
                assert_eq!(program, "sh");
                assert_eq!(code, Some(3));
                assert_eq!(output, "main.go:1: syntax error\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let missing = Toolchain::new("/nonexistent/moa-toolchain");
        let err = missing.invoke(["version"]).expect_err("program is missing");
        assert_eq!(err.kind(), "spawn");
        assert!(err.to_string().contains("/nonexistent/moa-toolchain"));
    }

    #[test]
    fn passes_environment() {
        let sh = Toolchain::new("sh");
        let result = sh
            .invoke_with_env(["-c", "echo $GOOS/$GOARCH"], [("GOOS", "plan9"), ("GOARCH", "386")])
            .expect("sh should succeed");
        assert_eq!(result.output, "plan9/386\n");
    }

    #[test]
    fn does_not_inherit_stdin() {
        let sh = Toolchain::new("sh");
        let result = sh
            .invoke(["-c", "cat; echo done"])
            .expect("cat on closed stdin should finish");
        assert_eq!(result.output, "done\n");
    }
}
