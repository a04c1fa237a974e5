//! Error types for Ripple.

use alloc::string::String;
use thiserror::Error;

/// Result type alias for Ripple operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by the observation layer.
///
/// Most failures degrade to "no notification" and never reach a caller; what
/// remains are configuration mistakes and a closed commit pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// An aspect table entry is malformed.
    #[error("invalid mapping: {message}")]
    InvalidMapping { message: String },

    /// The same relation name was registered twice.
    #[error("relation already registered: {name}")]
    DuplicateRelation { name: String },

    /// The receiving side of the commit pipeline is gone.
    #[error("commit channel closed")]
    ChannelClosed,
}

impl Error {
    /// Creates an invalid mapping error.
    pub fn invalid_mapping(message: impl Into<String>) -> Self {
        Error::InvalidMapping {
            message: message.into(),
        }
    }

    /// Creates a duplicate relation error.
    pub fn duplicate_relation(name: impl Into<String>) -> Self {
        Error::DuplicateRelation { name: name.into() }
    }
}
