mod common;

use std::fs;
use std::path::Path;
use std::time::Duration;

use camino::Utf8PathBuf;
use pmf_chansons::domain::SongRecord;
use pmf_chansons::fetcher::RetryPolicy;
use pmf_chansons::front_matter::SongDocument;
use pmf_chansons::materialize::{AudioStatus, MaterializeOptions, Materializer, StepStatus};
use pmf_chansons::store::SongStore;

use common::{AUDIO_BYTES, MockSite, RecordingSink};

const LYRICS_URL: &str = "https://pardon-my-french.fr/paroles/a.txt";
const AUDIO_URL: &str = "https://pardon-my-french.fr/mp3/Le titre.mp3";

fn record() -> SongRecord {
    SongRecord {
        id: 7,
        contributors: "Anna".to_string(),
        title: "Le titre".to_string(),
        original_title: "The Title".to_string(),
        original_artist: "Someone".to_string(),
        lyrics_url: LYRICS_URL.to_string(),
        audio_url: AUDIO_URL.to_string(),
        original_clip_url: "https://youtu.be/x".to_string(),
    }
}

fn options(force_download: bool) -> MaterializeOptions {
    MaterializeOptions {
        force_download,
        retry: RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        },
    }
}

fn site() -> MockSite {
    MockSite::default()
        .with_page(LYRICS_URL, "Première ligne\nDeuxième ligne\n")
        .with_last_modified("Wed, 21 Oct 2015 07:28:00 GMT")
}

fn store_in(root: &Path) -> SongStore {
    SongStore::new(Utf8PathBuf::from_path_buf(root.join("site/chansons")).unwrap())
}

fn read_document(path: &Utf8PathBuf) -> SongDocument {
    let content = fs::read_to_string(path.as_std_path()).unwrap();
    SongDocument::parse(path.as_std_path(), &content).unwrap()
}

#[test]
fn writes_document_and_audio() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let site = site();

    let song = Materializer::new(&site, &store)
        .materialize(&record(), options(false), &RecordingSink::default())
        .unwrap()
        .unwrap();

    assert_eq!(song.slug, "anna-le-titre");
    assert_eq!(song.lyrics, StepStatus::Fetched);
    assert_eq!(song.audio, AudioStatus::Downloaded);
    assert!(song.metadata_path.ends_with("site/chansons/anna-le-titre/chanson.md"));

    let content = fs::read_to_string(song.metadata_path.as_std_path()).unwrap();
    assert!(content.starts_with("---\nid: 7\nis_published: true\ntitle: Le titre\n"));
    assert!(content.ends_with("---\n"));

    let document = read_document(&song.metadata_path);
    assert_eq!(document.lyrics, "Première ligne\nDeuxième ligne\n");
    assert_eq!(document.audio, "/chansons/anna-le-titre/Le titre.mp3");
    assert_eq!(document.date, "2015-10-21");
    assert_eq!(document.original_clip_url, "https://youtu.be/x");
    assert_eq!(document.mp3_oid, None);

    let audio = temp.path().join("site/chansons/anna-le-titre/Le titre.mp3");
    assert_eq!(fs::read(audio).unwrap(), AUDIO_BYTES);
}

#[test]
fn rerun_does_not_download_again() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let site = site();
    let materializer = Materializer::new(&site, &store);
    let sink = RecordingSink::default();

    let first = materializer
        .materialize(&record(), options(false), &sink)
        .unwrap()
        .unwrap();
    let before = read_document(&first.metadata_path);
    let second = materializer
        .materialize(&record(), options(false), &sink)
        .unwrap()
        .unwrap();
    let after = read_document(&second.metadata_path);

    assert_eq!(site.downloads(), 1);
    assert_eq!(second.audio, AudioStatus::AlreadyPresent);
    assert_eq!(before.audio, after.audio);
    assert_eq!(before.date, after.date);
}

#[test]
fn force_download_fetches_existing_audio() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let site = site();
    let materializer = Materializer::new(&site, &store);
    let sink = RecordingSink::default();

    materializer.materialize(&record(), options(false), &sink).unwrap();
    materializer.materialize(&record(), options(true), &sink).unwrap();

    assert_eq!(site.downloads(), 2);
}

#[test]
fn song_without_links_degrades_to_empty_fields() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let site = site();
    let mut record = record();
    record.lyrics_url.clear();
    record.audio_url.clear();
    record.original_clip_url.clear();

    let song = Materializer::new(&site, &store)
        .materialize(&record, options(false), &RecordingSink::default())
        .unwrap()
        .unwrap();

    assert_eq!(song.lyrics, StepStatus::Degraded);
    assert_eq!(song.audio, AudioStatus::NoAudio);
    let document = read_document(&song.metadata_path);
    assert_eq!(document.lyrics, "");
    assert_eq!(document.audio, "");
    assert_eq!(document.date, "");
    assert_eq!(site.downloads(), 0);
}

#[test]
fn failed_lyrics_are_not_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let site = MockSite::default().with_last_modified("Wed, 21 Oct 2015 07:28:00 GMT");
    let sink = RecordingSink::default();

    let song = Materializer::new(&site, &store)
        .materialize(&record(), options(false), &sink)
        .unwrap()
        .unwrap();

    assert_eq!(song.lyrics, StepStatus::Degraded);
    assert_eq!(song.audio, AudioStatus::Downloaded);
    assert_eq!(read_document(&song.metadata_path).lyrics, "");
    assert!(
        sink.messages()
            .iter()
            .any(|line| line.starts_with("[song/7] lyrics unavailable"))
    );
}

#[test]
fn failed_download_empties_audio_and_date() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let site = site().failing(3);

    let song = Materializer::new(&site, &store)
        .materialize(&record(), options(false), &RecordingSink::default())
        .unwrap()
        .unwrap();

    assert_eq!(site.downloads(), 3);
    assert_eq!(song.audio, AudioStatus::Degraded);
    let document = read_document(&song.metadata_path);
    assert_eq!(document.audio, "");
    assert_eq!(document.date, "");
    assert_eq!(document.lyrics, "Première ligne\nDeuxième ligne\n");
    assert!(!temp.path().join("site/chansons/anna-le-titre/Le titre.mp3").exists());
}

#[test]
fn missing_last_modified_keeps_audio() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let site = MockSite::default().with_page(LYRICS_URL, "la la");

    let song = Materializer::new(&site, &store)
        .materialize(&record(), options(false), &RecordingSink::default())
        .unwrap()
        .unwrap();

    let document = read_document(&song.metadata_path);
    assert_eq!(document.audio, "/chansons/anna-le-titre/Le titre.mp3");
    assert_eq!(document.date, "");
}

#[test]
fn document_is_overwritten_without_leftovers() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let site = site();
    let materializer = Materializer::new(&site, &store);
    let sink = RecordingSink::default();

    let song = materializer
        .materialize(&record(), options(false), &sink)
        .unwrap()
        .unwrap();
    fs::write(song.metadata_path.as_std_path(), "stale").unwrap();
    materializer.materialize(&record(), options(false), &sink).unwrap();

    assert_eq!(read_document(&song.metadata_path).id, 7);
    let mut names = fs::read_dir(temp.path().join("site/chansons/anna-le-titre"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, vec!["Le titre.mp3", "chanson.md"]);
}

#[test]
fn blank_record_is_skipped() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());
    let site = site();
    let mut record = record();
    record.contributors.clear();
    record.title = "?!".to_string();

    let result = Materializer::new(&site, &store)
        .materialize(&record, options(false), &RecordingSink::default())
        .unwrap();

    assert!(result.is_none());
    assert!(!temp.path().join("site/chansons/chanson.md").exists());
}
