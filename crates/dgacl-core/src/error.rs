//! Error types for the dgacl core library.

/// Errors raised while resolving configuration or translating permissions.
///
/// Every variant is terminal for the invocation that produced it; nothing in
/// this crate is retried.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A mandatory setting resolved to an empty value.
    #[error("Missing required setting '{setting}' for command '{command}'")]
    MissingRequired {
        /// Command being resolved
        command: String,
        /// Setting that was empty
        setting: String,
    },

    /// Permission value outside the 3-bit range.
    #[error("Invalid permission {value}: must be an integer in [0, 7]")]
    InvalidPermission {
        /// The rejected value, as entered
        value: String,
    },

    /// A setting was present but could not be interpreted.
    #[error("Invalid value for '{setting}': {message}")]
    InvalidValue {
        /// Setting name
        setting: String,
        /// What went wrong
        message: String,
    },

    /// The endpoint list contained no usable addresses.
    #[error("No endpoints given: the endpoint list is empty")]
    NoEndpoints,

    /// Configuration file problem.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type alias for dgacl core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error stems from user-supplied configuration.
    ///
    /// Used by the CLI to decide how much context to log.
    pub fn is_config(&self) -> bool {
        match self {
            Error::MissingRequired { .. } => true,
            Error::InvalidPermission { .. } => true,
            Error::InvalidValue { .. } => true,
            Error::NoEndpoints => true,
            Error::Config { .. } => true,
            Error::Io(_) => false,
        }
    }

    /// Creates a new missing-required error.
    pub fn missing_required<C, S>(command: C, setting: S) -> Self
    where
        C: Into<String>,
        S: Into<String>,
    {
        Error::MissingRequired {
            command: command.into(),
            setting: setting.into(),
        }
    }

    /// Creates a new invalid-permission error.
    pub fn invalid_permission<V: ToString>(value: V) -> Self {
        Error::InvalidPermission {
            value: value.to_string(),
        }
    }

    /// Creates a new invalid-value error.
    pub fn invalid_value<S, M>(setting: S, message: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Error::InvalidValue {
            setting: setting.into(),
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}
