//! Error types for kindling operations.

use thiserror::Error;

use crate::mobi::ChapterId;

/// Errors that can occur while building or serializing a MOBI document.
///
/// Tree-structure errors ([`Error::InvalidParent`], [`Error::AlreadyAttached`])
/// indicate misuse of the chapter tree rather than bad user input; they are
/// returned as values so the library stays embeddable.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "cli")]
    #[error("invalid settings file {path}: {source}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("chapter {0} does not exist in this tree")]
    InvalidParent(ChapterId),

    #[error("chapter {0} is already attached to a parent")]
    AlreadyAttached(ChapterId),

    #[error("cover requires both a cover image and a thumbnail; ignoring partial assets")]
    IncompleteCoverAssets,

    #[error("serialization failed: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
