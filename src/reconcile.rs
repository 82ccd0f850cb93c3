use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::app::{EventLevel, ProgressEvent, ProgressSink};
use crate::domain::Oid;
use crate::error::SongError;
use crate::front_matter;
use crate::lfs::{self, LfsClient};
use crate::store::METADATA_FILE;

pub const AUDIO_EXTENSION: &str = "mp3";

pub type OidMap = BTreeMap<PathBuf, Option<Oid>>;

/// Looks up the LFS object id of every audio file under a tree and records it
/// as `mp3_oid` in the `chanson.md` next to it.
pub struct Reconciler<L: LfsClient> {
    lfs: L,
}

impl<L: LfsClient> Reconciler<L> {
    pub fn new(lfs: L) -> Self {
        Self { lfs }
    }

    /// Per-file problems are logged and leave `None` (or an unpatched
    /// document) behind; only a `root` that is not a directory is an error.
    pub fn reconcile(&self, root: &Path, sink: &dyn ProgressSink) -> Result<OidMap, SongError> {
        if !root.is_dir() {
            return Err(SongError::NotADirectory(root.to_path_buf()));
        }
        sink.event(ProgressEvent::new(
            EventLevel::Info,
            "oids",
            format!("scanning {} for .{AUDIO_EXTENSION} files", root.display()),
        ));

        let mut oids = OidMap::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    sink.event(ProgressEvent::new(
                        EventLevel::Warn,
                        "oids",
                        format!("skipping unreadable entry: {err}"),
                    ));
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_audio(entry.path()) {
                continue;
            }
            let path = entry.into_path();
            let oid = self.resolve(&path, sink);
            if let Some(oid) = &oid {
                self.record(&path, oid, sink);
            }
            oids.insert(path, oid);
        }
        Ok(oids)
    }

    fn resolve(&self, path: &Path, sink: &dyn ProgressSink) -> Option<Oid> {
        let scope = format!("oid/{}", path.display());
        let dir = path.parent().unwrap_or(Path::new("."));
        match self.lfs.ls_files(dir) {
            Ok(output) => {
                let oid = lfs::parse_oid(&output);
                match &oid {
                    Some(oid) => sink.event(ProgressEvent::new(
                        EventLevel::Info,
                        &scope,
                        format!("found {oid}"),
                    )),
                    None => sink.event(ProgressEvent::new(EventLevel::Warn, &scope, "no OID found")),
                }
                oid
            }
            Err(err) => {
                sink.event(ProgressEvent::new(EventLevel::Error, &scope, err.to_string()));
                None
            }
        }
    }

    fn record(&self, path: &Path, oid: &Oid, sink: &dyn ProgressSink) {
        let scope = format!("oid/{}", path.display());
        let metadata = path
            .parent()
            .unwrap_or(Path::new("."))
            .join(METADATA_FILE);
        match front_matter::patch_oid(&metadata, oid) {
            Ok(()) => sink.event(ProgressEvent::new(
                EventLevel::Info,
                &scope,
                format!("updated {}", metadata.display()),
            )),
            Err(err) => sink.event(ProgressEvent::new(EventLevel::Error, &scope, err.to_string())),
        }
    }
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| value.eq_ignore_ascii_case(AUDIO_EXTENSION))
        .unwrap_or(false)
}
