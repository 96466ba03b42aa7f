//! Error types for dgacl-client

use thiserror::Error;

use crate::protocol::RejectCode;

/// Result type alias for dgacl-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or using a client
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The endpoint list was empty after splitting and trimming
    #[error("No endpoints to connect to")]
    NoEndpoints,

    /// One endpoint could not be dialled; the whole build is abandoned
    #[error("Connection setup failed for endpoint {endpoint}: {reason}")]
    ConnectionSetupFailed {
        /// The offending endpoint
        endpoint: String,
        /// Why dialling failed
        reason: String,
    },

    /// TLS material could not be loaded or the TLS config is invalid
    #[error("TLS error: {message}")]
    Tls {
        /// What went wrong
        message: String,
    },

    /// The cluster declined the request
    #[error("Remote rejected request ({code}): {message}")]
    RemoteRejected {
        /// Rejection class reported by the cluster
        code: RejectCode,
        /// Message reported by the cluster
        message: String,
    },

    /// I/O failure on an established connection
    #[error("Transport error on {endpoint}: {source}")]
    Transport {
        /// Endpoint of the failing connection
        endpoint: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Malformed or unexpected message
    #[error("Protocol error: {message}")]
    Protocol {
        /// What was wrong with the message
        message: String,
    },

    /// Error from dgacl-core
    #[error("Core error: {0}")]
    Core(#[from] dgacl_core::Error),
}

impl Error {
    /// Whether the cluster itself declined the request.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::RemoteRejected { .. })
    }

    /// The rejection class, for remote rejections.
    pub fn reject_code(&self) -> Option<RejectCode> {
        match self {
            Error::RemoteRejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Creates a new connection setup error.
    pub fn setup_failed<E, R>(endpoint: E, reason: R) -> Self
    where
        E: Into<String>,
        R: ToString,
    {
        Error::ConnectionSetupFailed {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new TLS error.
    pub fn tls<S: Into<String>>(message: S) -> Self {
        Error::Tls {
            message: message.into(),
        }
    }

    /// Creates a new protocol error.
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Error::Protocol {
            message: message.into(),
        }
    }
}
