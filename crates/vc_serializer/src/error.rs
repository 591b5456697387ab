use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

use crate::types::SyntaxError;

// -----------------------------------------------------------------------------
// ErrorKind

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A type expression could not be parsed.
    Syntax,
    /// Malformed input while building or configuring metadata and contexts.
    InvalidArgument,
    /// Failure while accessing or converting data.
    Runtime,
    /// The caller violated an API contract.
    Logic,
}

// -----------------------------------------------------------------------------
// Error

/// The error type of every fallible operation in this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("invalid argument: {0}")]
    InvalidArgument(Cow<'static, str>),

    #[error(
        "no accessor for property `{property}` of class `{class}`: tried {}",
        .tried.join(", ")
    )]
    MissingAccessor {
        class: String,
        property: String,
        tried: Vec<String>,
    },

    #[error("method `{method}` does not exist on class `{class}`")]
    MissingMethod { class: String, method: String },

    #[error(
        "the discriminator field name `{field}` for base-class `{base_class}` was not found in input data"
    )]
    DiscriminatorFieldMissing { field: String, base_class: String },

    #[error(
        "the type value `{value}` does not exist in the discriminator map of class `{base_class}`. Available types: {}",
        .available.join(", ")
    )]
    DiscriminatorValueUnknown {
        value: String,
        base_class: String,
        available: Vec<String>,
    },

    #[error("no metadata available for class `{0}`")]
    MetadataNotFound(String),

    #[error("no instantiator registered for class `{0}`")]
    NotInstantiable(String),

    #[error("expected {expected}, but got {found}")]
    UnexpectedData {
        expected: Cow<'static, str>,
        found: String,
    },

    #[error("the format `{0}` is not supported")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Runtime(Cow<'static, str>),

    #[error("{0}")]
    Logic(Cow<'static, str>),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("at `{path}`: {source}")]
    AtPath {
        path: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Creates an [`Error::InvalidArgument`].
    #[inline]
    pub fn invalid_argument(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates an [`Error::Runtime`].
    #[inline]
    pub fn runtime(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Creates an [`Error::Logic`].
    #[inline]
    pub fn logic(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Logic(msg.into())
    }

    /// Creates an [`Error::UnexpectedData`].
    #[inline]
    pub fn unexpected(expected: impl Into<Cow<'static, str>>, found: impl Into<String>) -> Self {
        Self::UnexpectedData {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Attaches a property path to the error.
    ///
    /// Errors that already carry a path are returned unchanged, so the
    /// innermost (most precise) path wins. An empty path is ignored.
    pub fn at_path(self, path: String) -> Self {
        if path.is_empty() || matches!(self, Self::AtPath { .. }) {
            return self;
        }
        Self::AtPath {
            path,
            source: Box::new(self),
        }
    }

    /// Returns the path attached with [`at_path`](Self::at_path), if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::AtPath { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns the error without its path annotation.
    pub fn root(&self) -> &Error {
        match self {
            Self::AtPath { source, .. } => source.root(),
            other => other,
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax(_) => ErrorKind::Syntax,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::MissingAccessor { .. }
            | Self::MissingMethod { .. }
            | Self::MetadataNotFound(_)
            | Self::NotInstantiable(_)
            | Self::UnexpectedData { .. }
            | Self::UnsupportedFormat(_)
            | Self::DiscriminatorFieldMissing { .. }
            | Self::DiscriminatorValueUnknown { .. }
            | Self::Runtime(_)
            | Self::Json(_) => ErrorKind::Runtime,
            Self::Logic(_) => ErrorKind::Logic,
            Self::AtPath { source, .. } => source.kind(),
        }
    }
}

/// A specialized [`Result`](core::result::Result) for this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::{Error, ErrorKind};

    #[test]
    fn innermost_path_wins() {
        let err = Error::runtime("boom")
            .at_path("a.b".to_string())
            .at_path("a".to_string());

        assert_eq!(err.path(), Some("a.b"));
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert_eq!(err.to_string(), "at `a.b`: boom");
    }

    #[test]
    fn discriminator_message_lists_keys() {
        let err = Error::DiscriminatorValueUnknown {
            value: "bus".to_string(),
            base_class: "Vehicle".to_string(),
            available: vec!["car".to_string(), "moped".to_string()],
        };
        let msg = err.to_string();

        assert!(msg.contains("`bus`"));
        assert!(msg.ends_with("Available types: car, moped"));
    }
}
