use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SongError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("{url} returned status {status}")]
    HttpStatus { status: u16, url: String },

    #[error("download of {url} failed after {attempts} attempt(s): {message}")]
    DownloadFailed {
        url: String,
        attempts: usize,
        message: String,
    },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("invalid listing page: {0}")]
    Listing(String),

    #[error("no chanson.md found at {0}")]
    MissingMetadata(PathBuf),

    #[error("no front matter block in {0}")]
    #[diagnostic(help("the file must start with a `---` line and close the header with another `---` line"))]
    MissingFrontMatter(PathBuf),

    #[error("malformed front matter in {path}: {message}")]
    FrontMatter { path: PathBuf, message: String },

    #[error("invalid LFS object id: {0}")]
    InvalidOid(String),

    #[error("git lfs failed: {0}")]
    Lfs(String),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}
