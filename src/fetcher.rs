use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::app::{EventLevel, ProgressEvent, ProgressSink};
use crate::error::SongError;
use crate::site::SiteClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Streams `url` into `destination`, retrying with a fixed pause.
///
/// A failed attempt never leaves a file behind, so after an `Err` the
/// destination does not exist. Whether a download is needed at all is up to
/// the caller.
pub fn fetch_with_retry<C: SiteClient + ?Sized>(
    client: &C,
    url: &str,
    destination: &Path,
    policy: RetryPolicy,
    sink: &dyn ProgressSink,
) -> Result<PathBuf, SongError> {
    let attempts = policy.max_attempts.max(1);
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|err| SongError::Filesystem(err.to_string()))?;
    }

    let mut attempt = 1usize;
    loop {
        let err = match client.download(url, destination) {
            Ok(()) => return Ok(destination.to_path_buf()),
            Err(err) => err,
        };

        sink.event(ProgressEvent::new(
            EventLevel::Warn,
            "download",
            format!("attempt {attempt}/{attempts} for {url} failed: {err}"),
        ));
        remove_partial(destination)?;

        if attempt >= attempts {
            return Err(SongError::DownloadFailed {
                url: url.to_string(),
                attempts,
                message: err.to_string(),
            });
        }
        if !policy.backoff.is_zero() {
            thread::sleep(policy.backoff);
        }
        attempt += 1;
    }
}

fn remove_partial(path: &Path) -> Result<(), SongError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(SongError::Filesystem(format!(
            "remove partial download {}: {err}",
            path.display()
        ))),
    }
}
