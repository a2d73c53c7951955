//! Error type shared by the configuration and startup paths.
//!
//! Only startup can fail: once a [`crate::ControlLoop`] or
//! [`crate::engine::BrightnessEngine`] is built, a cycle always produces a
//! command for every lamp. Runtime conditions such as a missing policy entry
//! or a stale track are handled in place and never surface here.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed calibration, empty lamp layout or inconsistent parameters.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
