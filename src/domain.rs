use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::SongError;

/// One entry of the listing page, as extracted. Link fields are empty when
/// the page carried no link at that position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRecord {
    pub id: u64,
    pub contributors: String,
    pub title: String,
    pub original_title: String,
    pub original_artist: String,
    pub lyrics_url: String,
    pub audio_url: String,
    pub original_clip_url: String,
}

impl SongRecord {
    pub fn slug(&self) -> Slug {
        Slug::from_identity(&self.contributors, &self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slug(String);

impl Slug {
    pub fn from_identity(contributors: &str, title: &str) -> Self {
        Self(slugify(&format!("{contributors}-{title}")))
    }

    /// Used to tell apart two songs that slugify to the same name.
    pub fn with_suffix(&self, suffix: impl fmt::Display) -> Self {
        Self(slugify(&format!("{}-{suffix}", self.0)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lower-case ASCII slug: diacritics are stripped, anything that is not a
/// letter, digit, whitespace or hyphen is dropped, and whitespace/hyphen runs
/// collapse into a single `-`.
pub fn slugify(text: &str) -> String {
    let ascii = text
        .nfkd()
        .filter(|ch| ch.is_ascii())
        .collect::<String>()
        .to_ascii_lowercase();

    let mut slug = String::with_capacity(ascii.len());
    let mut pending_sep = false;
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(ch);
        } else if ch == '-' || ch.is_ascii_whitespace() {
            pending_sep = true;
        }
    }
    slug.trim_matches(|ch| ch == '-' || ch == '_').to_string()
}

/// Git LFS object id: a SHA-256 digest in lower-case hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    pub const LEN: usize = 64;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Oid {
    type Err = SongError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let is_valid = value.len() == Self::LEN
            && value
                .chars()
                .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch));
        if !is_valid {
            return Err(SongError::InvalidOid(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

impl TryFrom<String> for Oid {
    type Error = SongError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Oid> for String {
    fn from(value: Oid) -> Self {
        value.0
    }
}
