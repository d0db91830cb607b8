use std::path::PathBuf;
use thiserror::Error;

/// Error taxonomy of the core.
///
/// Malformed heading metadata is deliberately NOT represented here: the
/// codec recovers from it field-wise and never fails a document for it.
#[derive(Debug, Error)]
pub enum MnemoError {
    /// Path classification on a path that does not exist.
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// An unreadable/unwritable backing file. Scoped to one document; a
    /// repository scan logs it and moves on.
    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A structural edit whose precondition failed (unknown note index,
    /// unknown tree key, read-only repository). The call fails as a whole
    /// and no tree is mutated.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The strict serializer refused to write a document that would not
    /// round-trip (corrupted depth sequence).
    #[error("corrupt outline '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    /// A background scan thread died before delivering its result.
    #[error("scan task failed: {0}")]
    ScanFailed(String),
}

impl MnemoError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        MnemoError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MnemoError>;
