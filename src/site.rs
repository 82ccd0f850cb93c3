use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, LAST_MODIFIED, USER_AGENT};

use crate::config::ImportConfig;
use crate::error::SongError;

/// The HTTP surface the importer relies on. Every call is a single attempt;
/// retrying is the caller's business.
pub trait SiteClient: Send + Sync {
    fn get_text(&self, url: &str) -> Result<String, SongError>;

    /// `Last-Modified` header of a HEAD request, if the server sent one.
    fn last_modified(&self, url: &str) -> Result<Option<String>, SongError>;

    /// Streams the body of `url` into `destination`, creating or truncating it.
    fn download(&self, url: &str, destination: &Path) -> Result<(), SongError>;
}

#[derive(Clone)]
pub struct SiteHttpClient {
    client: Client,
    request_timeout: Duration,
    download_timeout: Option<Duration>,
}

impl SiteHttpClient {
    pub fn new(config: &ImportConfig) -> Result<Self, SongError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|err| SongError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(config.timeout)
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| SongError::Http(err.to_string()))?;
        Ok(Self {
            client,
            request_timeout: config.timeout,
            download_timeout: config.download_timeout,
        })
    }

    fn handle_status(url: &str, response: Response) -> Result<Response, SongError> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(SongError::HttpStatus {
            status: response.status().as_u16(),
            url: url.to_string(),
        })
    }
}

impl SiteClient for SiteHttpClient {
    fn get_text(&self, url: &str) -> Result<String, SongError> {
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .map_err(|err| SongError::Http(err.to_string()))?;
        Self::handle_status(url, response)?
            .text()
            .map_err(|err| SongError::Http(err.to_string()))
    }

    fn last_modified(&self, url: &str) -> Result<Option<String>, SongError> {
        let response = self
            .client
            .head(url)
            .timeout(self.request_timeout)
            .send()
            .map_err(|err| SongError::Http(err.to_string()))?;
        let response = Self::handle_status(url, response)?;
        Ok(response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string()))
    }

    /// Audio bodies can be large, so only the configured download deadline
    /// (none by default) bounds the transfer; connecting is still bounded.
    fn download(&self, url: &str, destination: &Path) -> Result<(), SongError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = self.download_timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .map_err(|err| SongError::Http(err.to_string()))?;
        let mut response = Self::handle_status(url, response)?;
        let mut file =
            File::create(destination).map_err(|err| SongError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| SongError::Http(format!("read body of {url}: {err}")))?;
        Ok(())
    }
}
