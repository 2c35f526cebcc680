use std::fmt;

/// Unified error type for hard failures in the type core.
///
/// Collected analysis problems (override violations, missing abstract
/// implementations, sealed-scope breaches) flow through
/// [`crate::diagnostics::Diagnostic`] instead; `Error` is reserved for
/// malformed inputs that cannot produce a partial result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A type value could not be constructed from the requested shape.
    Construction { message: String },
    /// A generic could not be bound to the supplied type arguments.
    Binding { message: String },
    /// A mutation was attempted on a frozen symbol table.
    Frozen { message: String },
}

/// Convenience result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Construct a new type-construction error.
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
        }
    }

    /// Construct a new generic-binding error.
    pub fn binding(message: impl Into<String>) -> Self {
        Self::Binding {
            message: message.into(),
        }
    }

    /// Construct a new frozen-table error.
    pub fn frozen(message: impl Into<String>) -> Self {
        Self::Frozen {
            message: message.into(),
        }
    }

    /// The human-readable message carried by this error.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Error::Construction { message } | Error::Binding { message } | Error::Frozen { message } => message,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Construction { message } => write!(f, "construction error: {message}"),
            Error::Binding { message } => write!(f, "binding error: {message}"),
            Error::Frozen { message } => write!(f, "frozen table: {message}"),
        }
    }
}

impl std::error::Error for Error {}
