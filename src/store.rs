use std::fs;
use std::io::Write;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::Slug;
use crate::error::SongError;

pub const METADATA_FILE: &str = "chanson.md";
pub const AUDIO_DIR: &str = "chansons";

/// On-disk layout of an import. Metadata lives under the output root, audio
/// under a `chansons` tree next to it, which the site serves as `/chansons`.
#[derive(Debug, Clone)]
pub struct SongStore {
    output_root: Utf8PathBuf,
}

impl SongStore {
    pub fn new(output_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Utf8Path {
        &self.output_root
    }

    pub fn song_dir(&self, slug: &Slug) -> Utf8PathBuf {
        self.output_root.join(slug.as_str())
    }

    pub fn metadata_path(&self, slug: &Slug) -> Utf8PathBuf {
        self.song_dir(slug).join(METADATA_FILE)
    }

    pub fn audio_root(&self) -> Utf8PathBuf {
        self.output_root.join("..").join(AUDIO_DIR)
    }

    pub fn audio_path(&self, slug: &Slug, file_name: &str) -> Utf8PathBuf {
        self.audio_root().join(slug.as_str()).join(file_name)
    }

    /// Path of the audio file as the rendered site links to it.
    pub fn site_audio_path(slug: &Slug, file_name: &str) -> String {
        format!("/{AUDIO_DIR}/{}/{file_name}", slug.as_str())
    }

    pub fn ensure_song_dir(&self, slug: &Slug) -> Result<Utf8PathBuf, SongError> {
        let dir = self.song_dir(slug);
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| SongError::Filesystem(format!("create {dir}: {err}")))?;
        Ok(dir)
    }
}

/// Replaces `path` with `content` through a temporary file in the same
/// directory, so readers see either the old or the new file.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), SongError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|err| SongError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".chanson")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|err| SongError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| SongError::Filesystem(err.to_string()))?;
    temp.as_file()
        .sync_all()
        .map_err(|err| SongError::Filesystem(err.to_string()))?;
    temp.persist(path)
        .map_err(|err| SongError::Filesystem(format!("replace {}: {err}", path.display())))?;
    Ok(())
}

/// Last path segment of a URL, without query or fragment.
pub fn url_file_name(url: &str) -> Option<&str> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let path = without_fragment.split('?').next().unwrap_or(without_fragment);
    let name = path.rsplit('/').next()?.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return None;
    }
    Some(name)
}
