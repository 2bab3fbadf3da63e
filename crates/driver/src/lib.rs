//! Orchestration for the `moa` command line: command dispatch, source
//! synthesis, scratch files and toolchain invocation.

pub mod cli_output;
pub mod command;
pub mod error;
pub mod scratch;
pub mod toolchain;

pub use command::{local_output, version_string, BuildTarget, Command, Driver, Format, USAGE};
pub use error::{DriverError, DriverResult};
pub use scratch::{with_scratch_source, ScratchSource};
pub use toolchain::{Toolchain, ToolchainResult};
