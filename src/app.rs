use std::collections::HashMap;

use serde::Serialize;

use crate::config::ImportConfig;
use crate::domain::Slug;
use crate::error::SongError;
use crate::listing;
use crate::materialize::{MaterializeOptions, MaterializedSong, Materializer};
use crate::site::SiteClient;
use crate::store::SongStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// A progress line, tagged with the unit it concerns (`songs`, `song/42`,
/// `oid/<path>`).
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub level: EventLevel,
    pub scope: String,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(level: EventLevel, scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            scope: scope.into(),
            message: message.into(),
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Forwards progress to the installed `tracing` subscriber.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        match event.level {
            EventLevel::Info => tracing::info!("[{}] {}", event.scope, event.message),
            EventLevel::Warn => tracing::warn!("[{}] {}", event.scope, event.message),
            EventLevel::Error => tracing::error!("[{}] {}", event.scope, event.message),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub force_download: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub base_url: String,
    pub output: String,
    pub songs: Vec<MaterializedSong>,
    pub failed: Vec<FailedSong>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedSong {
    pub id: u64,
    pub error: String,
}

pub struct App<C: SiteClient> {
    client: C,
    store: SongStore,
    config: ImportConfig,
}

impl<C: SiteClient> App<C> {
    pub fn new(client: C, config: ImportConfig) -> Self {
        let store = SongStore::new(config.output.clone());
        Self {
            client,
            store,
            config,
        }
    }

    /// Lists the site and materializes every song in page order. Only a
    /// failure to get the listing aborts; a song whose document cannot be
    /// written is reported in `failed` and the run goes on.
    pub fn import(
        &self,
        options: ImportOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ImportReport, SongError> {
        let records = listing::list_songs(&self.client, &self.config.base_url, sink)?;
        let materializer = Materializer::new(&self.client, &self.store);
        let song_options = MaterializeOptions {
            force_download: options.force_download,
            retry: self.config.retry,
        };

        let mut claimed = HashMap::<Slug, u64>::new();
        let mut songs = Vec::new();
        let mut failed = Vec::new();
        for record in &records {
            let scope = format!("song/{}", record.id);
            sink.event(ProgressEvent::new(EventLevel::Info, &scope, "importing song"));

            let wanted = record.slug();
            let slug = claim_slug(&mut claimed, &wanted, record.id);
            if slug != wanted {
                sink.event(ProgressEvent::new(
                    EventLevel::Warn,
                    &scope,
                    format!("slug {wanted} already used in this run, writing to {slug}"),
                ));
            }

            match materializer.materialize_as(record, &slug, song_options, sink) {
                Ok(Some(song)) => songs.push(song),
                Ok(None) => {}
                Err(err) => {
                    sink.event(ProgressEvent::new(
                        EventLevel::Error,
                        &scope,
                        format!("failed to save song: {err}"),
                    ));
                    failed.push(FailedSong {
                        id: record.id,
                        error: err.to_string(),
                    });
                }
            }
        }

        sink.event(ProgressEvent::new(
            EventLevel::Info,
            "songs",
            format!(
                "saved {} songs to {} ({} failed)",
                songs.len(),
                self.store.output_root(),
                failed.len()
            ),
        ));
        Ok(ImportReport {
            base_url: self.config.base_url.clone(),
            output: self.store.output_root().to_string(),
            songs,
            failed,
        })
    }
}

/// Claims the first slug in `wanted`, `wanted-<id>`, `wanted-<id>-2`, ... that
/// no other song id holds yet. A song id always gets back its own slug.
fn claim_slug(claimed: &mut HashMap<Slug, u64>, wanted: &Slug, id: u64) -> Slug {
    let mut slug = wanted.clone();
    let mut round = 1;
    while claimed.get(&slug).is_some_and(|owner| *owner != id) {
        slug = match round {
            1 => wanted.with_suffix(id),
            n => wanted.with_suffix(format!("{id}-{n}")),
        };
        round += 1;
    }
    claimed.insert(slug.clone(), id);
    slug
}
