//! Error types for the anime resolver.

use std::sync::Arc;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the anime resolver.
///
/// Records that simply do not exist are not errors: lookups return
/// `Ok(None)` for those. The variants here are either structural problems
/// in the catalogue, transport failures, or local configuration problems.
#[derive(Error, Debug)]
pub enum Error {
    // Catalogue integrity errors
    #[error(
        "File {file_id} at {path} is shared by series {candidates:?}, but none of them own the folder exclusively"
    )]
    AmbiguousFolder {
        file_id: u32,
        path: String,
        candidates: Vec<u32>,
    },

    #[error("File {file_id} has no recorded locations")]
    MissingFileLocation { file_id: u32 },

    #[error("File {file_id} has no location matching {path}")]
    UnmatchedFileLocation { file_id: u32, path: String },

    // Server errors
    #[error("Server returned {status} for {url}")]
    Server { status: u16, url: String },

    #[error("Catalogue API key not configured. Set SHOKO_API_KEY environment variable")]
    ApiKeyMissing,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // TOML errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A failure produced by one cache computation and observed by every
    /// caller that was waiting on it.
    #[error("{0}")]
    Shared(Arc<Error>),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// The underlying error, looking through shared wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Shared(inner) => inner.root(),
            other => other,
        }
    }

    /// Whether this error describes a structural problem in the catalogue
    /// that retrying will not fix.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self.root(),
            Error::AmbiguousFolder { .. }
                | Error::MissingFileLocation { .. }
                | Error::UnmatchedFileLocation { .. }
        )
    }
}

impl From<Arc<Error>> for Error {
    fn from(err: Arc<Error>) -> Self {
        match Arc::try_unwrap(err) {
            Ok(err) => err,
            Err(shared) => Error::Shared(shared),
        }
    }
}
