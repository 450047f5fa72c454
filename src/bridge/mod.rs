//! Narrow interfaces to the world outside the command core.
//!
//! The dispatcher only ever talks to a [`FileSystem`] and a [`ProcessRunner`].
//! Every call takes the calling tab's working directory explicitly so tabs
//! never share a process-wide current directory.

mod local;
mod mock;

pub use local::{LocalFileSystem, LocalProcessRunner};
pub use mock::MockFileSystem;

use anyhow::Result;

/// Outcome of a filesystem operation that can fail "softly" with a
/// human-readable message instead of an `Err`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsResponse {
    pub success: bool,
    pub data: Option<String>,
    pub error: Option<String>,
}

impl FsResponse {
    pub fn ok() -> Self {
        FsResponse {
            success: true,
            ..Self::default()
        }
    }

    pub fn with_data(data: impl Into<String>) -> Self {
        FsResponse {
            success: true,
            data: Some(data.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        FsResponse {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

pub trait FileSystem {
    /// Absolute form of `cwd`.
    fn pwd(&self, cwd: &str) -> Result<String>;
    /// Entry names of `path` (or of `cwd` when `None`).
    fn ls(&self, cwd: &str, path: Option<&str>) -> Result<Vec<String>>;
    /// Resolve `path` as a new working directory. On success `data` holds
    /// the absolute directory.
    fn cd(&self, cwd: &str, path: &str) -> Result<FsResponse>;
    fn cat(&self, cwd: &str, path: &str) -> Result<FsResponse>;
    fn mkdir(&self, cwd: &str, path: &str) -> Result<FsResponse>;
    fn touch(&self, cwd: &str, path: &str) -> Result<FsResponse>;
    fn rm(&self, cwd: &str, path: &str, recursive: bool) -> Result<FsResponse>;
    fn cp(&self, cwd: &str, src: &str, dest: &str) -> Result<FsResponse>;
    fn mv(&self, cwd: &str, src: &str, dest: &str) -> Result<FsResponse>;
    fn computer_name(&self) -> Result<String>;
    /// Directory new tabs start in when nothing else is configured.
    fn home_dir(&self) -> String;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

pub trait ProcessRunner {
    /// Run `argv[0]` with the remaining arguments in `cwd`, capturing output.
    /// `Err` means the process could not be run at all.
    fn run(&self, cwd: &str, argv: &[String]) -> Result<ProcessOutput>;
}
