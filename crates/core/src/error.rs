use crate::ingest::SkippedPdf;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing required config key: {0}")]
    MissingKey(&'static str),

    #[error("invalid config value for {key}: {details}")]
    Invalid { key: &'static str, details: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("{backend} returned no content")]
    EmptyResponse { backend: String },
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("no index at {0}; index the manuals first")]
    NotIndexed(PathBuf),

    #[error("refusing to build an index from zero pages")]
    EmptyRebuild,

    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("index holds collection {found}, expected {expected}")]
    CollectionMismatch { expected: String, found: String },

    #[error("index built with {expected}, queried with {actual}; re-index the manuals")]
    EmbedderMismatch { expected: String, actual: String },

    #[error("embedding dimension {actual} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding failed: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("no pdf files found in {0}")]
    NoDocumentsFound(PathBuf),

    #[error("none of the {} pdf files could be read", .0.len())]
    AllManualsUnreadable(Vec<SkippedPdf>),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("model invocation failed: {0}")]
    Model(#[from] ModelError),
}

impl AssistantError {
    pub fn is_not_indexed(&self) -> bool {
        matches!(self, AssistantError::Index(IndexError::NotIndexed(_)))
    }
}
