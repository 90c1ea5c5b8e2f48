//! Error types for dv-core
//!
//! One unified error enum covering the whole client surface. Remote and codec
//! failures are propagated, never recovered from; the variants carry enough
//! context (path, format) to tie a failure back to the operation that caused
//! it.

use thiserror::Error;

use crate::codec::Format;

/// Result type alias for dv-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for dv-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or empty path input
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A path that was assumed to exist is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success outcome from a remote download/upload or RPC call
    #[error("Transport failure for '{path}': {reason}")]
    Transport { path: String, reason: String },

    /// Payload bytes do not conform to the requested format
    #[error("Cannot decode {format} from '{path}': {reason}")]
    Decode {
        format: Format,
        path: String,
        reason: String,
    },

    /// Payload could not be rendered in the requested format
    #[error("Cannot encode {format} for '{path}': {reason}")]
    Encode {
        format: Format,
        path: String,
        reason: String,
    },

    /// Authentication failure
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Operation not offered by the remote store
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Transport failure tied to a path
    pub fn transport(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Error::Transport {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Decode failure tied to a path and format
    pub fn decode(
        format: Format,
        path: impl std::fmt::Display,
        reason: impl std::fmt::Display,
    ) -> Self {
        Error::Decode {
            format,
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Encode failure tied to a path and format
    pub fn encode(
        format: Format,
        path: impl std::fmt::Display,
        reason: impl std::fmt::Display,
    ) -> Self {
        Error::Encode {
            format,
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let err = Error::decode(Format::Yaml, "/notes.yml", "bad indentation");
        assert_eq!(
            err.to_string(),
            "Cannot decode yaml from '/notes.yml': bad indentation"
        );

        let err = Error::transport("/data.bin", "HTTP 503");
        assert_eq!(err.to_string(), "Transport failure for '/data.bin': HTTP 503");
    }

    #[test]
    fn test_invalid_path_display() {
        let err = Error::InvalidPath("path is empty".into());
        assert_eq!(err.to_string(), "Invalid path: path is empty");
    }
}
