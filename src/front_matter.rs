//! `chanson.md` documents: a YAML mapping between two `---` lines, followed
//! by a free-form body.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::domain::Oid;
use crate::error::SongError;
use crate::store;

pub const DELIMITER: &str = "---";
pub const OID_KEY: &str = "mp3_oid";

/// Header of a song's `chanson.md`. Field order is the order written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongDocument {
    pub id: u64,
    pub is_published: bool,
    pub title: String,
    pub contributors: String,
    pub original_title: String,
    pub original_artist: String,
    pub original_clip_url: String,
    pub lyrics: String,
    pub audio: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mp3_oid: Option<Oid>,
}

impl SongDocument {
    pub fn render(&self) -> Result<String, SongError> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|err| SongError::Filesystem(format!("serialize front matter: {err}")))?;
        Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n"))
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, SongError> {
        let (header, _) =
            split_front_matter(content).ok_or_else(|| SongError::MissingFrontMatter(path.into()))?;
        serde_yaml::from_str(header).map_err(|err| SongError::FrontMatter {
            path: path.into(),
            message: err.to_string(),
        })
    }
}

/// Splits a document into its YAML header and everything after the closing
/// delimiter. The rest starts right after the closing `---`, so it keeps the
/// newline that ends that line.
pub fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let after_open = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let header = &after_open[..offset];
            let rest = &after_open[offset + DELIMITER.len()..];
            return Some((header, rest));
        }
        offset += line.len();
    }
    None
}

/// Sets `key` in the header mapping, in place when it already exists and
/// last otherwise. The body after the header is returned untouched.
pub fn set_header_value(
    path: &Path,
    content: &str,
    key: &str,
    value: Value,
) -> Result<String, SongError> {
    let (header, rest) =
        split_front_matter(content).ok_or_else(|| SongError::MissingFrontMatter(path.into()))?;

    let parsed: Value = if header.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(header).map_err(|err| SongError::FrontMatter {
            path: path.into(),
            message: err.to_string(),
        })?
    };
    let mut mapping = match parsed {
        Value::Mapping(mapping) => mapping,
        Value::Null => Mapping::new(),
        other => {
            return Err(SongError::FrontMatter {
                path: path.into(),
                message: format!("expected a mapping, found {}", value_kind(&other)),
            });
        }
    };
    mapping.insert(Value::String(key.to_string()), value);

    let yaml = serde_yaml::to_string(&mapping).map_err(|err| SongError::FrontMatter {
        path: path.into(),
        message: err.to_string(),
    })?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}{rest}"))
}

/// Records `oid` as `mp3_oid` in the `chanson.md` at `path`.
pub fn patch_oid(path: &Path, oid: &Oid) -> Result<(), SongError> {
    if !path.is_file() {
        return Err(SongError::MissingMetadata(path.into()));
    }
    let content = fs::read_to_string(path)
        .map_err(|err| SongError::Filesystem(format!("read {}: {err}", path.display())))?;
    let patched = set_header_value(path, &content, OID_KEY, Value::String(oid.to_string()))?;
    if patched == content {
        return Ok(());
    }
    store::write_atomic(path, patched.as_bytes())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
