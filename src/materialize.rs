use camino::Utf8PathBuf;
use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::app::{EventLevel, ProgressEvent, ProgressSink};
use crate::domain::{Slug, SongRecord};
use crate::error::SongError;
use crate::fetcher::{RetryPolicy, fetch_with_retry};
use crate::front_matter::SongDocument;
use crate::site::SiteClient;
use crate::store::{self, SongStore};

/// Outcome of a best-effort step. A degraded step leaves its field empty
/// instead of failing the song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Ok(T),
    Degraded(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterializeOptions {
    pub force_download: bool,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Fetched,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioStatus {
    Downloaded,
    AlreadyPresent,
    Degraded,
    NoAudio,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterializedSong {
    pub id: u64,
    pub slug: String,
    pub metadata_path: Utf8PathBuf,
    pub lyrics: StepStatus,
    pub audio: AudioStatus,
}

struct AudioAsset {
    site_path: String,
    date: String,
    status: AudioStatus,
}

pub struct Materializer<'a, C: SiteClient + ?Sized> {
    client: &'a C,
    store: &'a SongStore,
}

impl<'a, C: SiteClient + ?Sized> Materializer<'a, C> {
    pub fn new(client: &'a C, store: &'a SongStore) -> Self {
        Self { client, store }
    }

    pub fn materialize(
        &self,
        record: &SongRecord,
        options: MaterializeOptions,
        sink: &dyn ProgressSink,
    ) -> Result<Option<MaterializedSong>, SongError> {
        self.materialize_as(record, &record.slug(), options, sink)
    }

    /// Writes `<output>/<slug>/chanson.md` for `record`, downloading its audio
    /// first when needed. Lyrics and audio failures only empty their fields;
    /// `Err` means the document itself could not be written. A record without
    /// any sluggable name is skipped.
    pub fn materialize_as(
        &self,
        record: &SongRecord,
        slug: &Slug,
        options: MaterializeOptions,
        sink: &dyn ProgressSink,
    ) -> Result<Option<MaterializedSong>, SongError> {
        let scope = format!("song/{}", record.id);
        if slug.is_empty() {
            sink.event(ProgressEvent::new(
                EventLevel::Warn,
                &scope,
                "no usable title or contributors, skipping",
            ));
            return Ok(None);
        }
        self.store.ensure_song_dir(slug)?;

        sink.event(ProgressEvent::new(EventLevel::Info, &scope, "fetching lyrics"));
        let (lyrics, lyrics_status) = match self.fetch_lyrics(record) {
            Fetched::Ok(text) => (text, StepStatus::Fetched),
            Fetched::Degraded(reason) => {
                sink.event(ProgressEvent::new(
                    EventLevel::Warn,
                    &scope,
                    format!("lyrics unavailable: {reason}"),
                ));
                (String::new(), StepStatus::Degraded)
            }
        };

        let (audio, date, audio_status) = if record.audio_url.is_empty() {
            (String::new(), String::new(), AudioStatus::NoAudio)
        } else {
            match self.fetch_audio(record, slug, &scope, options, sink) {
                Fetched::Ok(asset) => (asset.site_path, asset.date, asset.status),
                Fetched::Degraded(reason) => {
                    sink.event(ProgressEvent::new(
                        EventLevel::Error,
                        &scope,
                        format!("audio unavailable: {reason}"),
                    ));
                    (String::new(), String::new(), AudioStatus::Degraded)
                }
            }
        };

        let document = SongDocument {
            id: record.id,
            is_published: true,
            title: record.title.clone(),
            contributors: record.contributors.clone(),
            original_title: record.original_title.clone(),
            original_artist: record.original_artist.clone(),
            original_clip_url: record.original_clip_url.clone(),
            lyrics,
            audio,
            date,
            mp3_oid: None,
        };
        let metadata_path = self.store.metadata_path(slug);
        store::write_atomic(metadata_path.as_std_path(), document.render()?.as_bytes())?;

        Ok(Some(MaterializedSong {
            id: record.id,
            slug: slug.to_string(),
            metadata_path,
            lyrics: lyrics_status,
            audio: audio_status,
        }))
    }

    fn fetch_lyrics(&self, record: &SongRecord) -> Fetched<String> {
        if record.lyrics_url.is_empty() {
            return Fetched::Degraded("no lyrics link".to_string());
        }
        match self.client.get_text(&record.lyrics_url) {
            Ok(text) => Fetched::Ok(text),
            Err(err) => Fetched::Degraded(err.to_string()),
        }
    }

    fn fetch_date(&self, url: &str) -> Fetched<NaiveDate> {
        match self.client.last_modified(url) {
            Ok(Some(header)) => match parse_http_date(&header) {
                Some(date) => Fetched::Ok(date),
                None => Fetched::Degraded(format!("unparsable Last-Modified {header:?}")),
            },
            Ok(None) => Fetched::Degraded("no Last-Modified header".to_string()),
            Err(err) => Fetched::Degraded(err.to_string()),
        }
    }

    fn fetch_audio(
        &self,
        record: &SongRecord,
        slug: &Slug,
        scope: &str,
        options: MaterializeOptions,
        sink: &dyn ProgressSink,
    ) -> Fetched<AudioAsset> {
        let Some(file_name) = store::url_file_name(&record.audio_url) else {
            return Fetched::Degraded(format!("no file name in {}", record.audio_url));
        };
        let local_path = self.store.audio_path(slug, file_name);

        let date = match self.fetch_date(&record.audio_url) {
            Fetched::Ok(date) => date.format("%Y-%m-%d").to_string(),
            Fetched::Degraded(reason) => {
                sink.event(ProgressEvent::new(
                    EventLevel::Warn,
                    scope,
                    format!("no asset date: {reason}"),
                ));
                String::new()
            }
        };

        let status = if options.force_download || !local_path.as_std_path().exists() {
            sink.event(ProgressEvent::new(EventLevel::Info, scope, "downloading audio"));
            if let Err(err) = fetch_with_retry(
                self.client,
                &record.audio_url,
                local_path.as_std_path(),
                options.retry,
                sink,
            ) {
                return Fetched::Degraded(err.to_string());
            }
            AudioStatus::Downloaded
        } else {
            sink.event(ProgressEvent::new(
                EventLevel::Info,
                scope,
                "audio already downloaded, skipping",
            ));
            AudioStatus::AlreadyPresent
        };

        Fetched::Ok(AudioAsset {
            site_path: SongStore::site_audio_path(slug, file_name),
            date,
            status,
        })
    }
}

/// Calendar date of an HTTP date header (`Wed, 21 Oct 2015 07:28:00 GMT`).
pub fn parse_http_date(value: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|datetime| datetime.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_dates_become_calendar_dates() {
        assert_eq!(
            parse_http_date("Wed, 21 Oct 2015 07:28:00 GMT"),
            NaiveDate::from_ymd_opt(2015, 10, 21)
        );
        assert_eq!(parse_http_date("yesterday"), None);
    }
}
