//! Error taxonomy shared by the asset pipeline.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Fatal failures of a mesh load. No partial asset is ever returned alongside one.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Caller asked for something the pipeline cannot do (empty name, unknown format).
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Asset not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A geometry line could not be understood. `line` is 1-based.
    #[error("Parse error in {source_name} at line {line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AssetError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn parse(source_name: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.to_owned(),
            line,
            message: message.into(),
        }
    }

    /// Maps an open/read failure onto the taxonomy: a missing file becomes [`AssetError::NotFound`].
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type AssetResult<T> = Result<T, AssetError>;

/// A material property that could not be applied. Recovered by the caller:
/// the field keeps its previous value and parsing continues.
#[derive(Debug, Error)]
pub enum MaterialFieldError {
    #[error("'{directive}' on line {line}: expected {expected} numbers, found {found}")]
    Arity {
        directive: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("'{directive}' on line {line}: invalid number '{token}'")]
    InvalidNumber {
        directive: String,
        line: usize,
        token: String,
    },

    #[error("'{directive}' on line {line}: missing value")]
    MissingValue { directive: String, line: usize },

    #[error("'{directive}' on line {line} appears before any 'newmtl'")]
    NoCurrentMaterial { directive: String, line: usize },
}
