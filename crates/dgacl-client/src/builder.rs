//! Builds a [`LogicalClient`] from an endpoint list and a TLS policy.

use std::time::Duration;

use dgacl_core::config::{DEFAULT_ENDPOINT_SEPARATOR, split_endpoints};
use dgacl_core::TlsPolicy;
use tracing::{debug, info, warn};

use crate::client::LogicalClient;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::tls::TlsDialer;

/// Default time allowed for dialling one endpoint.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Dials every endpoint up front and fails fast.
///
/// Either every endpoint connects and a [`LogicalClient`] is returned, or the
/// first failure is returned and all connections opened so far are closed.
///
/// ```no_run
/// # async fn demo() -> dgacl_client::Result<()> {
/// use dgacl_client::ClientBuilder;
/// use dgacl_core::TlsPolicy;
///
/// let client = ClientBuilder::new()
///     .build("10.0.0.1:9080, 10.0.0.2:9080", &TlsPolicy::disabled())
///     .await?;
/// assert_eq!(client.len(), 2);
/// client.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    separator: char,
    dial_timeout: Duration,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Comma separator, default dial timeout.
    pub fn new() -> Self {
        Self {
            separator: DEFAULT_ENDPOINT_SEPARATOR,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }

    /// Use a different endpoint separator.
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Use a different per-endpoint dial timeout.
    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Split `endpoints` on the separator and connect to each.
    pub async fn build(&self, endpoints: &str, tls: &TlsPolicy) -> Result<LogicalClient> {
        let list = split_endpoints(endpoints, self.separator);
        self.build_endpoints(&list, tls).await
    }

    /// Connect to each endpoint in order.
    pub async fn build_endpoints<S: AsRef<str>>(
        &self,
        endpoints: &[S],
        tls: &TlsPolicy,
    ) -> Result<LogicalClient> {
        if endpoints.is_empty() {
            return Err(Error::NoEndpoints);
        }

        let dialer = if tls.enabled {
            Some(TlsDialer::from_policy(tls)?)
        } else {
            None
        };

        info!(
            endpoints = endpoints.len(),
            tls = tls.enabled,
            "Connecting to cluster"
        );

        let mut opened = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let endpoint = endpoint.as_ref().trim();
            debug!(endpoint, "Dialling");
            match Connection::open(endpoint, dialer.as_ref(), self.dial_timeout).await {
                Ok(conn) => opened.push(conn),
                Err(e) => {
                    warn!(endpoint, error = %e, "Endpoint unreachable, abandoning client");
                    for conn in opened {
                        conn.close().await;
                    }
                    return Err(e);
                }
            }
        }

        LogicalClient::from_connections(opened)
    }
}
