use std::path::PathBuf;

use thiserror::Error;

/// Failure downloading or storing one media asset.
///
/// These never abort a run: the caller logs the event and leaves the
/// status's media reference pointing at the remote URL.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("fetching {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected status {status} downloading {url}")]
    FetchStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
