use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::Oid;
use crate::error::SongError;

static OID_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9a-f]{64})").unwrap());

pub trait LfsClient: Send + Sync {
    /// Raw `git lfs ls-files --long` output for files under `scope`.
    fn ls_files(&self, scope: &Path) -> Result<String, SongError>;
}

/// Runs `git` from the process working directory, which must be inside the
/// repository that tracks the audio files.
#[derive(Clone)]
pub struct SystemLfsClient {
    git: PathBuf,
}

impl SystemLfsClient {
    pub fn new() -> Self {
        Self {
            git: PathBuf::from("git"),
        }
    }
}

impl Default for SystemLfsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LfsClient for SystemLfsClient {
    fn ls_files(&self, scope: &Path) -> Result<String, SongError> {
        let mut cmd = Command::new(&self.git);
        cmd.args(["lfs", "ls-files", "--long"])
            .arg(format!("--include={}", scope.display()));
        let output = cmd
            .output()
            .map_err(|err| SongError::Lfs(format!("{}: {err}", self.git.display())))?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("git lfs ls-files exited with {}", output.status)
        } else {
            stderr
        };
        Err(SongError::Lfs(message))
    }
}

/// OID at the very start of `ls-files --long` output, if any.
pub fn parse_oid(output: &str) -> Option<Oid> {
    OID_LINE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|oid| oid.as_str().parse().ok())
}
