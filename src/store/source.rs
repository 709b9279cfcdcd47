//! Candidate sources
//!
//! A source produces the raw candidate list for a NameStore. Two on-disk/wire
//! formats are understood: one declaration name per line, and a JSON array of
//! structured records. Either may be gzip-compressed.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use flate2::read::GzDecoder;

use crate::store::error::StoreError;
use crate::store::types::Candidate;

/// Payload format of a candidate source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    /// Decide from the file name or URL path
    #[default]
    Auto,
    /// One declaration name per line
    Lines,
    /// JSON array of candidate records
    Json,
}

impl SourceFormat {
    /// Resolve `Auto` against a path or URL
    pub fn resolve(self, location: &str) -> SourceFormat {
        match self {
            SourceFormat::Auto => {
                let trimmed = strip_gzip_suffix(location.split(['?', '#']).next().unwrap_or(""));
                if trimmed.to_ascii_lowercase().ends_with(".json") {
                    SourceFormat::Json
                } else {
                    SourceFormat::Lines
                }
            }
            other => other,
        }
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(SourceFormat::Auto),
            "lines" | "txt" => Ok(SourceFormat::Lines),
            "json" => Ok(SourceFormat::Json),
            _ => anyhow::bail!("unknown source format '{s}', expected auto, lines or json"),
        }
    }
}

fn strip_gzip_suffix(location: &str) -> &str {
    location
        .strip_suffix(".gz")
        .or_else(|| location.strip_suffix(".GZ"))
        .unwrap_or(location)
}

fn is_gzip(location: &str, bytes: &[u8]) -> bool {
    location.to_ascii_lowercase().ends_with(".gz") || bytes.starts_with(&[0x1f, 0x8b])
}

/// Decode a raw payload into candidates
pub fn parse_candidates(
    location: &str,
    bytes: &[u8],
    format: SourceFormat,
) -> Result<Vec<Candidate>, StoreError> {
    let decompressed;
    let bytes = if is_gzip(location, bytes) {
        let mut out = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut out)
            .map_err(|e| StoreError::config(format!("failed to decompress {location}: {e}")))?;
        decompressed = out;
        decompressed.as_slice()
    } else {
        bytes
    };

    match format.resolve(location) {
        SourceFormat::Json => serde_json::from_slice::<Vec<Candidate>>(bytes)
            .map_err(|e| StoreError::config(format!("failed to parse records from {location}: {e}"))),
        SourceFormat::Lines | SourceFormat::Auto => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| StoreError::config(format!("{location} is not valid UTF-8: {e}")))?;
            Ok(text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(Candidate::new)
                .collect())
        }
    }
}

/// Provider of the raw candidate list
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Path, URL or label, used in logs and errors
    fn name(&self) -> &str;

    /// Fetch and decode all candidates
    async fn fetch(&self) -> Result<Vec<Candidate>, StoreError>;
}

/// Reads candidates from a local file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    label: String,
    format: SourceFormat,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>, format: SourceFormat) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            label: path.display().to_string(),
            path,
            format,
        }
    }
}

#[async_trait]
impl CandidateSource for FileSource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<Candidate>, StoreError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| StoreError::unavailable(&self.label, e))?;
        tracing::debug!("Read {} bytes from {}", bytes.len(), self.label);
        parse_candidates(&self.label, &bytes, self.format)
    }
}

/// Fetches candidates over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    format: SourceFormat,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, format: SourceFormat) -> anyhow::Result<Self> {
        Ok(Self {
            url: url.into(),
            format,
            client: Self::build_http_client()?,
        })
    }

    fn build_http_client() -> anyhow::Result<reqwest::Client> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        tracing::info!("Creating HTTP client with User-Agent: {}", user_agent);

        Ok(reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?)
    }
}

#[async_trait]
impl CandidateSource for HttpSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<Candidate>, StoreError> {
        tracing::debug!("Fetching candidates from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| StoreError::unavailable(&self.url, e))?;

        if !response.status().is_success() {
            return Err(StoreError::unavailable(
                &self.url,
                format!("HTTP {}", response.status()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::unavailable(&self.url, e))?;
        parse_candidates(&self.url, &bytes, self.format)
    }
}

/// Fixed in-memory candidate list
#[derive(Debug, Clone)]
pub struct MemorySource {
    label: String,
    candidates: Vec<Candidate>,
}

impl MemorySource {
    pub fn new<I, C>(candidates: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Candidate>,
    {
        Self {
            label: "memory".to_string(),
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CandidateSource for MemorySource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<Candidate>, StoreError> {
        Ok(self.candidates.clone())
    }
}

/// Pick a file or HTTP source for `location`
pub fn source_for(location: &str, format: SourceFormat) -> anyhow::Result<Box<dyn CandidateSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpSource::new(location, format)?))
    } else {
        Ok(Box::new(FileSource::new(location, format)))
    }
}
