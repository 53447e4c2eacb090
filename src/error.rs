use std::io;
use std::path::PathBuf;

/// Errors raised by the map viewer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("invalid GeoJSON: {0}")]
    Parse(String),

    #[error("could not write view mode to {}: {reason}", path.display())]
    Store { path: PathBuf, reason: String },

    #[error("invalid settings in {}: {reason}", path.display())]
    Settings { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
