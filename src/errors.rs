use std::path::PathBuf;

use thiserror::Error;

/// A single request description that could not be turned into a [`RequestRecord`].
///
/// [`RequestRecord`]: crate::request_record::RequestRecord
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("expected a mapping of request fields")]
    NotAMapping,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unexpected field `{0}`")]
    UnknownField(String),
    #[error("field `{field}` {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("`{0}` is not an allowed http method")]
    UnknownMethod(String),
    #[error("port {0} is outside of 1..=65535")]
    PortOutOfRange(String),
}

impl RecordError {
    /// Name of the offending field, when the error is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            RecordError::NotAMapping => None,
            RecordError::MissingField(field) => Some(*field),
            RecordError::UnknownField(field) => Some(field.as_str()),
            RecordError::InvalidField { field, .. } => Some(*field),
            RecordError::UnknownMethod(_) => Some("method"),
            RecordError::PortOutOfRange(_) => Some("port"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("requests should be a list")]
    NotASequence,
    #[error("request #{index} contains bad parameters: {reason}")]
    Record {
        index: usize,
        #[source]
        reason: RecordError,
    },
}

#[derive(Debug, Error)]
#[error("body of case `{case}` could not be rendered")]
pub struct SerializationError {
    pub case: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationErrorKind {
    ParentMissing,
    IsDirectory,
    NotWritable,
    Io,
}

impl std::fmt::Display for DestinationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            DestinationErrorKind::ParentMissing => "parent directory does not exist",
            DestinationErrorKind::IsDirectory => "path is a directory",
            DestinationErrorKind::NotWritable => "path is not writable",
            DestinationErrorKind::Io => "i/o failure",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
#[error("can't write {}: {kind}", .path.display())]
pub struct DestinationError {
    pub path: PathBuf,
    pub kind: DestinationErrorKind,
    #[source]
    pub source: Option<std::io::Error>,
}

impl DestinationError {
    pub fn new(path: impl Into<PathBuf>, kind: DestinationErrorKind) -> Self {
        DestinationError {
            path: path.into(),
            kind,
            source: None,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::PermissionDenied => DestinationErrorKind::NotWritable,
            std::io::ErrorKind::NotFound => DestinationErrorKind::ParentMissing,
            _ => DestinationErrorKind::Io,
        };
        DestinationError {
            path: path.into(),
            kind,
            source: Some(source),
        }
    }
}

/// Everything that can abort an ammo batch.
#[derive(Debug, Error)]
pub enum AmmoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("request #{index}: {source}")]
    Serialization {
        index: usize,
        #[source]
        source: SerializationError,
    },
    #[error(transparent)]
    Destination(#[from] DestinationError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{0}` is not a known log level")]
    LogLevel(String),
}
