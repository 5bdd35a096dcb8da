use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("reporting-verb lexicon not found: {0}")]
    LexiconNotFound(PathBuf),

    #[error("clustering error: {0}")]
    Clustering(String),

    #[error("feature vector is missing '{0}'")]
    MissingFeature(&'static str),
}

/// A per-document failure recorded during a batch run.
///
/// These never abort the batch; they travel alongside the successful
/// results so callers can report them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileError {
    pub file_name: String,
    pub message: String,
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.file_name, self.message)
    }
}
