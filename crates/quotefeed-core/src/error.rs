use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Errors raised while converting scraped text into a typed value.
///
/// A parse error is fatal to the field (and therefore the request unit)
/// it occurred in, never to sibling units.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed numeric token '{text}'")]
    MalformedNumber { text: String },

    #[error("unsupported month '{month}' in '{text}'")]
    UnsupportedMonth { month: String, text: String },

    #[error("calendar value out of range in '{text}'")]
    InvalidCalendar { text: String },

    #[error("value '{text}' parsed as {actual}, expected a number")]
    NotNumeric {
        text: String,
        actual: &'static str,
    },
}

/// Errors raised while assembling the field catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("field with name already registered: {name}")]
    DuplicateField { name: &'static str },
}

/// Errors raised by result table operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("unknown column '{name}'")]
    UnknownColumn { name: String },

    #[error("value of type {actual} does not fit column '{column}' of type {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    UnsupportedField,
    Parse,
    Incomplete,
    Internal,
}

/// Structured error returned by source adapters and the fetch pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unsupported_field(field: impl Display) -> Self {
        Self {
            kind: SourceErrorKind::UnsupportedField,
            message: format!("field '{field}' is not supported by this source"),
            retryable: false,
        }
    }

    pub fn parse(field: impl Display, error: ParseError) -> Self {
        Self {
            kind: SourceErrorKind::Parse,
            message: format!("failed to parse field '{field}': {error}"),
            retryable: false,
        }
    }

    pub fn incomplete(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Incomplete,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::UnsupportedField => "source.unsupported_field",
            SourceErrorKind::Parse => "source.parse",
            SourceErrorKind::Incomplete => "source.incomplete",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ParseError> for SourceError {
    fn from(error: ParseError) -> Self {
        Self {
            kind: SourceErrorKind::Parse,
            message: error.to_string(),
            retryable: false,
        }
    }
}

impl From<TableError> for SourceError {
    fn from(error: TableError) -> Self {
        Self::internal(error.to_string())
    }
}
