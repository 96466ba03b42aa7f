//! A single connection to one cluster endpoint.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::{Envelope, JsonCodec, Outcome, Reply, ReplyBody, Request};
use crate::tls::TlsDialer;
use crate::transport::{Io, read_frame, write_frame};

/// An open, possibly TLS-wrapped, connection to one endpoint.
///
/// Requests are strictly sequential: each [`Connection::call`] writes one
/// envelope and waits for the matching reply.
pub struct Connection {
    endpoint: String,
    io: Box<dyn Io>,
    next_id: u64,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Dial `endpoint`, running the TLS handshake when a dialer is given.
    ///
    /// Every failure is reported as [`Error::ConnectionSetupFailed`] naming
    /// the endpoint.
    pub async fn open(
        endpoint: &str,
        tls: Option<&TlsDialer>,
        dial_timeout: Duration,
    ) -> Result<Self> {
        let tcp = match tokio::time::timeout(dial_timeout, TcpStream::connect(endpoint)).await {
            Ok(Ok(tcp)) => tcp,
            Ok(Err(e)) => return Err(Error::setup_failed(endpoint, e)),
            Err(_) => {
                return Err(Error::setup_failed(
                    endpoint,
                    format!("timed out after {dial_timeout:?}"),
                ));
            }
        };
        tcp.set_nodelay(true)
            .map_err(|e| Error::setup_failed(endpoint, e))?;

        let io: Box<dyn Io> = match tls {
            Some(dialer) => {
                let stream = dialer.connect(endpoint, tcp).await.map_err(|e| match e {
                    Error::Tls { message } => Error::setup_failed(endpoint, message),
                    other => other,
                })?;
                Box::new(stream)
            }
            None => Box::new(tcp),
        };

        debug!(endpoint, tls = tls.is_some(), "Connection established");
        Ok(Self {
            endpoint: endpoint.to_string(),
            io,
            next_id: 1,
        })
    }

    /// Wrap an already established stream.
    pub fn from_stream<S: Io + 'static>(endpoint: impl Into<String>, stream: S) -> Self {
        Self {
            endpoint: endpoint.into(),
            io: Box::new(stream),
            next_id: 1,
        }
    }

    /// The endpoint this connection was dialled to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request and wait for its reply.
    pub async fn call(&mut self, access_jwt: Option<&str>, request: Request) -> Result<ReplyBody> {
        let id = self.next_id;
        self.next_id += 1;
        trace!(endpoint = %self.endpoint, id, request = request.name(), "Sending request");

        let envelope = Envelope {
            id,
            access_jwt: access_jwt.map(str::to_string),
            request,
        };
        let data = JsonCodec::encode(&envelope)?;
        write_frame(&mut self.io, &data)
            .await
            .map_err(|e| self.transport_error(e))?;

        let frame = read_frame(&mut self.io)
            .await
            .map_err(|e| self.transport_error(e))?
            .ok_or_else(|| {
                self.transport_error(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed by peer",
                ))
            })?;
        let reply: Reply = JsonCodec::decode(&frame)?;
        if reply.id != id {
            return Err(Error::protocol(format!(
                "reply id {} does not match request id {id}",
                reply.id
            )));
        }

        match reply.outcome {
            Outcome::Ok { body } => Ok(body),
            Outcome::Rejected { code, message } => {
                debug!(endpoint = %self.endpoint, %code, %message, "Request rejected");
                Err(Error::RemoteRejected { code, message })
            }
        }
    }

    /// Shut the stream down.
    pub async fn close(mut self) {
        if let Err(e) = self.io.shutdown().await {
            trace!(endpoint = %self.endpoint, error = %e, "Shutdown error ignored");
        }
    }

    fn transport_error(&self, source: std::io::Error) -> Error {
        Error::Transport {
            endpoint: self.endpoint.clone(),
            source,
        }
    }
}
