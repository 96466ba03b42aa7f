//! Connection settings shared by every verb.

use std::fmt;
use std::path::PathBuf;

use crate::config::resolver::ResolvedSettings;
use crate::config::spec::SettingSpec;
use crate::error::{Error, Result};

/// Separator between endpoints in the `dgraph` setting.
pub const DEFAULT_ENDPOINT_SEPARATOR: char = ',';

/// Default cluster endpoint.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:9080";

/// Setting names owned by the parent command.
pub mod keys {
    /// Comma-separated endpoint list.
    pub const DGRAPH: &str = "dgraph";
    /// Enable TLS.
    pub const TLS_ON: &str = "tls-on";
    /// CA certificate bundle (PEM).
    pub const TLS_CA_CERTS: &str = "tls-ca-certs";
    /// Client certificate (PEM).
    pub const TLS_CERT: &str = "tls-cert";
    /// Client private key (PEM).
    pub const TLS_CERT_KEY: &str = "tls-cert-key";
    /// Trust the bundled web PKI roots as well.
    pub const TLS_USE_SYSTEM_CA: &str = "tls-use-system-ca";
    /// Name to verify the server certificate against.
    pub const TLS_SERVER_NAME: &str = "tls-server-name";
}

/// Parent-command settings inherited by every verb.
pub const PARENT_SETTINGS: &[SettingSpec] = &[
    SettingSpec::required(keys::DGRAPH).default_value(DEFAULT_ENDPOINT),
    SettingSpec::optional(keys::TLS_ON),
    SettingSpec::optional(keys::TLS_CA_CERTS),
    SettingSpec::optional(keys::TLS_CERT),
    SettingSpec::optional(keys::TLS_CERT_KEY),
    SettingSpec::optional(keys::TLS_USE_SYSTEM_CA),
    SettingSpec::optional(keys::TLS_SERVER_NAME),
];

/// Split an endpoint list, trimming whitespace and dropping empty segments.
pub fn split_endpoints(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// TLS settings applied uniformly to every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TlsPolicy {
    /// Whether to use TLS at all.
    pub enabled: bool,
    /// CA bundle used to verify servers.
    pub ca_certs: Option<PathBuf>,
    /// Client certificate for mutual TLS.
    pub cert: Option<PathBuf>,
    /// Client private key for mutual TLS.
    pub key: Option<PathBuf>,
    /// Override for the name verified against the server certificate.
    pub server_name: Option<String>,
    /// Trust the bundled web PKI roots in addition to `ca_certs`.
    pub use_system_ca: bool,
}

impl TlsPolicy {
    /// Plaintext connections.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build the policy from resolved parent settings.
    pub fn from_resolved(settings: &ResolvedSettings) -> Result<Self> {
        let policy = Self {
            enabled: settings.get_bool(keys::TLS_ON)?,
            ca_certs: settings.get_path(keys::TLS_CA_CERTS),
            cert: settings.get_path(keys::TLS_CERT),
            key: settings.get_path(keys::TLS_CERT_KEY),
            server_name: settings
                .get_non_empty(keys::TLS_SERVER_NAME)
                .map(str::to_string),
            use_system_ca: settings.get_bool(keys::TLS_USE_SYSTEM_CA)?,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check that the client certificate and key come as a pair.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        match (&self.cert, &self.key) {
            (Some(_), None) => Err(Error::invalid_value(
                keys::TLS_CERT_KEY,
                "a client certificate was given without its key",
            )),
            (None, Some(_)) => Err(Error::invalid_value(
                keys::TLS_CERT,
                "a client key was given without its certificate",
            )),
            _ => Ok(()),
        }
    }

    /// Whether a client certificate pair is configured.
    pub fn has_client_cert(&self) -> bool {
        self.cert.is_some() && self.key.is_some()
    }
}

/// Base configuration: where to connect and how.
#[derive(Clone, PartialEq, Eq)]
pub struct BaseConfig {
    /// Ordered, non-empty endpoint list.
    pub endpoints: Vec<String>,
    /// Shared TLS policy.
    pub tls: TlsPolicy,
}

impl BaseConfig {
    /// Build from resolved parent settings.
    pub fn from_resolved(settings: &ResolvedSettings) -> Result<Self> {
        let raw = settings.require(keys::DGRAPH)?;
        let endpoints = split_endpoints(raw, DEFAULT_ENDPOINT_SEPARATOR);
        if endpoints.is_empty() {
            return Err(Error::NoEndpoints);
        }
        Ok(Self {
            endpoints,
            tls: TlsPolicy::from_resolved(settings)?,
        })
    }
}

impl fmt::Debug for BaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseConfig")
            .field("endpoints", &self.endpoints)
            .field("tls", &self.tls.enabled)
            .finish()
    }
}
