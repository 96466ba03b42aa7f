//! Error types for dgacl-cli

use thiserror::Error;

use crate::verb::Verb;

/// Result type alias for dgacl-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that end a dgacl invocation
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from dgacl-core
    #[error("Core error: {0}")]
    Core(#[from] dgacl_core::Error),

    /// Error from dgacl-client
    #[error("Client error: {0}")]
    Client(#[from] dgacl_client::Error),

    /// A verb handler failed after the client was built
    #[error("{verb} failed: {source}")]
    Handler {
        /// The verb being run
        verb: Verb,
        /// What the client reported
        #[source]
        source: dgacl_client::Error,
    },
}

impl Error {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Whether the error stems from user-supplied configuration.
    pub fn is_config(&self) -> bool {
        match self {
            Error::Core(e) => e.is_config(),
            Error::Client(dgacl_client::Error::Core(e)) => e.is_config(),
            _ => false,
        }
    }

    /// Whether the cluster declined the request.
    pub fn is_remote(&self) -> bool {
        self.client_error().is_some_and(dgacl_client::Error::is_remote)
    }

    /// The underlying client error, if any.
    pub fn client_error(&self) -> Option<&dgacl_client::Error> {
        match self {
            Error::Client(e) | Error::Handler { source: e, .. } => Some(e),
            _ => None,
        }
    }
}
