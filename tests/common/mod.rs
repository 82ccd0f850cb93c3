#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pmf_chansons::app::{ProgressEvent, ProgressSink};
use pmf_chansons::error::SongError;
use pmf_chansons::lfs::LfsClient;
use pmf_chansons::site::SiteClient;

pub const BASE_URL: &str = "https://pardon-my-french.fr";
pub const AUDIO_BYTES: &[u8] = b"ID3 fake mp3 payload";

#[derive(Default)]
pub struct MockSite {
    pub pages: HashMap<String, String>,
    pub last_modified: Option<String>,
    pub failures_before_success: Mutex<usize>,
    pub download_calls: Mutex<usize>,
}

impl MockSite {
    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn with_last_modified(mut self, value: &str) -> Self {
        self.last_modified = Some(value.to_string());
        self
    }

    pub fn failing(self, failures: usize) -> Self {
        *self.failures_before_success.lock().unwrap() = failures;
        self
    }

    pub fn downloads(&self) -> usize {
        *self.download_calls.lock().unwrap()
    }
}

impl SiteClient for MockSite {
    fn get_text(&self, url: &str) -> Result<String, SongError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| SongError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
    }

    fn last_modified(&self, _url: &str) -> Result<Option<String>, SongError> {
        Ok(self.last_modified.clone())
    }

    fn download(&self, _url: &str, destination: &Path) -> Result<(), SongError> {
        *self.download_calls.lock().unwrap() += 1;
        let mut failures = self.failures_before_success.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            fs::write(destination, b"ID3 trunc").unwrap();
            return Err(SongError::Http("connection reset by peer".to_string()));
        }
        fs::write(destination, AUDIO_BYTES).unwrap();
        Ok(())
    }
}

#[derive(Default)]
pub struct MockLfs {
    pub outputs: HashMap<PathBuf, String>,
    pub calls: Mutex<Vec<PathBuf>>,
}

impl MockLfs {
    pub fn with_output(mut self, scope: &Path, output: &str) -> Self {
        self.outputs.insert(scope.to_path_buf(), output.to_string());
        self
    }
}

impl LfsClient for MockLfs {
    fn ls_files(&self, scope: &Path) -> Result<String, SongError> {
        self.calls.lock().unwrap().push(scope.to_path_buf());
        self.outputs
            .get(scope)
            .cloned()
            .ok_or_else(|| SongError::Lfs("exit status: 128".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| format!("[{}] {}", event.scope, event.message))
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
