//! Where a solar CSV comes from: a local file or an HTTP(S) URL.

use std::fmt;
use std::path::PathBuf;
use tracing::Instrument;

use crate::error::{PipelineError, Result};
use crate::fetch::{HttpClient, fetch_bytes};

/// Data file the dashboard reads when no source is given.
pub const DEFAULT_SOURCE: &str =
    "https://raw.githubusercontent.com/MidlandAfrica/Solar_Data/main/28-09.csv";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    Url(String),
    Path(PathBuf),
}

impl Source {
    /// Anything starting with `http://` or `https://` is fetched; the rest is a path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(raw.to_string())
        } else {
            Source::Path(PathBuf::from(raw))
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Url(DEFAULT_SOURCE.to_string())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Loads the raw bytes of `source`. Any I/O or HTTP failure is reported as
/// [`PipelineError::MalformedInput`].
pub async fn read_source<C: HttpClient>(client: &C, source: &Source) -> Result<Vec<u8>> {
    let span = tracing::info_span!("read_source", source = %source);
    async {
        match source {
            Source::Url(url) => fetch_bytes(client, url).await.map_err(|e| {
                PipelineError::MalformedInput(format!("failed to fetch {url}: {e:#}"))
            }),
            Source::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                PipelineError::MalformedInput(format!("failed to read {}: {e}", path.display()))
            }),
        }
    }
    .instrument(span)
    .await
}
