//! Layered configuration.
//!
//! Settings are declared per command with [`SettingSpec`]/[`CommandSpec`] and
//! resolved by [`Resolver`] with a fixed precedence:
//!
//! 1. explicit command-line flag
//! 2. environment variable `{PREFIX}_{NAME}` under the command's prefix,
//!    which also covers inherited parent settings
//! 3. config file table for the command
//! 4. config file table for the parent command
//! 5. command-specific default
//! 6. inherited parent default
//!
//! The parent command's settings (endpoint list, TLS) are shared by every
//! verb; [`BaseConfig`] is the typed view of them.

pub mod base;
pub mod env;
pub mod file;
pub mod resolver;
pub mod spec;

pub use base::{
    BaseConfig, DEFAULT_ENDPOINT, DEFAULT_ENDPOINT_SEPARATOR, PARENT_SETTINGS, TlsPolicy, keys,
    split_endpoints,
};
pub use env::{EnvSource, ProcessEnv};
pub use file::ConfigFile;
pub use resolver::{ExplicitFlags, ResolvedSettings, ResolvedValue, Resolver, Source};
pub use spec::{CommandSpec, SettingSpec, env_var_name};
