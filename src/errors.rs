use std::path::PathBuf;

/// Failures surfaced by the persistence layer.
///
/// The in-memory jar is always updated before any of these can occur, so an
/// error only means the on-disk copy for one host key is stale.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Cannot create cookie folder {path}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write cookie file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read cookie file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cookie file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot encode cookies: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Invalid host key: {0:?}")]
    InvalidHostKey(String),
}

pub type Result<T> = std::result::Result<T, CookieError>;
