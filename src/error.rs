use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{label} failed with status {status}: {body}")]
    RequestFailed {
        label: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response: {0}")]
    Response(String),

    #[error("malformed feature entry {entry:?} in document {doc_index}: {reason}")]
    MalformedFeature {
        doc_index: usize,
        entry: String,
        reason: String,
    },

    #[error("template error: {0}")]
    Template(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("destination is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("data directory does not exist and could not be created: {0}")]
    DataDir(PathBuf),
}
