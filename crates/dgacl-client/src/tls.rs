//! TLS dialing (rustls + tokio-rustls).

use std::path::Path;
use std::sync::Arc;

use dgacl_core::TlsPolicy;
use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, ServerName, pem::PemObject};
use tokio::net::TcpStream;
use tokio_rustls::{TlsConnector, client::TlsStream};

use crate::error::{Error, Result};

/// Wraps freshly dialled TCP streams in TLS.
///
/// Built once per client from the shared [`TlsPolicy`] and reused for every
/// endpoint.
#[derive(Clone)]
pub struct TlsDialer {
    connector: TlsConnector,
    server_name: Option<String>,
}

impl std::fmt::Debug for TlsDialer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsDialer")
            .field("server_name", &self.server_name)
            .finish_non_exhaustive()
    }
}

impl TlsDialer {
    /// Load certificates named by `policy` and build the rustls client config.
    ///
    /// Server certificates are verified against the CA bundle when one is
    /// given. The bundled web PKI roots are trusted when `use_system_ca` is
    /// set or when no CA bundle is configured.
    pub fn from_policy(policy: &TlsPolicy) -> Result<Self> {
        policy.validate()?;

        let mut roots = RootCertStore::empty();
        if let Some(ca) = &policy.ca_certs {
            for cert in load_certs(ca)? {
                roots
                    .add(cert)
                    .map_err(|e| Error::tls(format!("bad CA certificate in {}: {e}", ca.display())))?;
            }
        }
        if policy.use_system_ca || policy.ca_certs.is_none() {
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::tls(e.to_string()))?
            .with_root_certificates(roots);

        let config = match (&policy.cert, &policy.key) {
            (Some(cert), Some(key)) => {
                let chain = load_certs(cert)?;
                let key = PrivateKeyDer::from_pem_file(key)
                    .map_err(|e| Error::tls(format!("failed to read key {}: {e}", key.display())))?;
                builder
                    .with_client_auth_cert(chain, key)
                    .map_err(|e| Error::tls(format!("invalid client certificate: {e}")))?
            }
            _ => builder.with_no_client_auth(),
        };

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            server_name: policy.server_name.clone(),
        })
    }

    /// The name verified against the certificate presented by `endpoint`.
    pub fn server_name_for(&self, endpoint: &str) -> Result<ServerName<'static>> {
        let name = match &self.server_name {
            Some(name) => name.clone(),
            None => host_of(endpoint).to_string(),
        };
        ServerName::try_from(name.clone())
            .map_err(|e| Error::tls(format!("invalid server name '{name}': {e}")))
    }

    /// Run the TLS handshake over an established TCP stream.
    pub async fn connect(&self, endpoint: &str, tcp: TcpStream) -> Result<TlsStream<TcpStream>> {
        let name = self.server_name_for(endpoint)?;
        self.connector
            .connect(name, tcp)
            .await
            .map_err(|e| Error::setup_failed(endpoint, format!("TLS handshake failed: {e}")))
    }
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let certs = CertificateDer::pem_file_iter(path)
        .map_err(|e| Error::tls(format!("failed to read {}: {e}", path.display())))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::tls(format!("failed to parse {}: {e}", path.display())))?;
    if certs.is_empty() {
        return Err(Error::tls(format!(
            "certificate file contained no certificates: {}",
            path.display()
        )));
    }
    Ok(certs)
}

/// Host part of `host:port`, without IPv6 brackets.
fn host_of(endpoint: &str) -> &str {
    if let Some(rest) = endpoint.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match endpoint.rsplit_once(':') {
        Some((host, _)) => host,
        None => endpoint,
    }
}
