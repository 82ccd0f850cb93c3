use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::app::{EventLevel, ProgressEvent, ProgressSink};
use crate::domain::SongRecord;
use crate::error::SongError;
use crate::site::SiteClient;

const SONG_ID_PREFIX: &str = "song";

static CREDIT_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-\u{2013}\u{2014}]\s+").unwrap());

/// Downloads the listing page and extracts every well-formed song entry.
pub fn list_songs<C: SiteClient + ?Sized>(
    client: &C,
    base_url: &str,
    sink: &dyn ProgressSink,
) -> Result<Vec<SongRecord>, SongError> {
    sink.event(ProgressEvent::new(
        EventLevel::Info,
        "songs",
        format!("fetching song list from {base_url}"),
    ));
    let html = client.get_text(base_url)?;
    let songs = parse_listing(&html, base_url)?;
    sink.event(ProgressEvent::new(
        EventLevel::Info,
        "songs",
        format!("found {} songs", songs.len()),
    ));
    Ok(songs)
}

struct Selectors {
    item: Selector,
    cover: Selector,
    original: Selector,
    action_link: Selector,
}

impl Selectors {
    fn new() -> Result<Self, SongError> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|err| SongError::Listing(format!("{css}: {err}")))
        };
        Ok(Self {
            item: parse("li.song")?,
            cover: parse("span.cover")?,
            original: parse("span.original")?,
            action_link: parse("div.actions a.mp3")?,
        })
    }
}

/// Entries with a non-numeric id, no cover label, or an original label that
/// does not split into artist and title are left out.
pub fn parse_listing(html: &str, base_url: &str) -> Result<Vec<SongRecord>, SongError> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(html);

    let songs = document
        .select(&selectors.item)
        .filter_map(|item| parse_item(item, &selectors, base_url))
        .collect();
    Ok(songs)
}

fn parse_item(item: ElementRef<'_>, selectors: &Selectors, base_url: &str) -> Option<SongRecord> {
    let id = item
        .value()
        .attr("id")?
        .trim()
        .strip_prefix(SONG_ID_PREFIX)?
        .parse::<u64>()
        .ok()?;

    let cover = element_text(item, &selectors.cover)?;
    let (contributors, title) = split_credit(&cover).unwrap_or_else(|| {
        let single = cover.trim().to_string();
        (single.clone(), single)
    });

    let original = element_text(item, &selectors.original)?.replace(['\n', '\t'], "");
    let (original_artist, original_title) = split_credit(&original)?;

    let hrefs = item
        .select(&selectors.action_link)
        .map(|link| link.value().attr("href").map(decode_href).unwrap_or_default())
        .collect::<Vec<_>>();
    let links = ActionLinks::from_positional(&hrefs, base_url);

    Some(SongRecord {
        id,
        contributors,
        title,
        original_title,
        original_artist,
        lyrics_url: links.lyrics,
        audio_url: links.audio,
        original_clip_url: links.original_clip,
    })
}

fn element_text(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    item.select(selector)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
}

/// Splits `"lead - last"` on spaced dashes. The last token is returned on its
/// own, everything before it is re-joined. `None` when there is no separator.
pub fn split_credit(text: &str) -> Option<(String, String)> {
    let parts = CREDIT_SEPARATOR
        .split(text.trim())
        .map(str::trim)
        .collect::<Vec<_>>();
    let (last, lead) = parts.split_last()?;
    if lead.is_empty() {
        return None;
    }
    Some((lead.join(" - "), last.to_string()))
}

fn decode_href(href: &str) -> String {
    let href = href.trim();
    urlencoding::decode(href)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| href.to_string())
}

/// The action links of a song entry, in page order: audio, original clip,
/// lyrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionLinks {
    pub audio: String,
    pub original_clip: String,
    pub lyrics: String,
}

impl ActionLinks {
    /// The markup carries no per-link purpose, only position. Audio and
    /// lyrics live on the site and are joined to `base_url`; the clip usually
    /// points elsewhere and is kept as written.
    pub fn from_positional(hrefs: &[String], base_url: &str) -> Self {
        let at = |index: usize| hrefs.get(index).map(String::as_str).unwrap_or("");
        let site_link = |index: usize| match at(index) {
            "" => String::new(),
            href => join_site_url(base_url, href),
        };
        Self {
            audio: site_link(0),
            original_clip: at(1).to_string(),
            lyrics: site_link(2),
        }
    }
}

pub fn join_site_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        href.trim_start_matches('/')
    )
}
