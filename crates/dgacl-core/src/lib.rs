#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! dgacl core library
//!
//! Shared building blocks for the dgacl admin tool. It has no internal dgacl
//! dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`permission`]: Integer/symbolic predicate permission codec
//! - [`config`]: Layered configuration resolver and base connection config

pub mod config;
pub mod error;
pub mod permission;

mod proptests;

// Re-exports for convenience
pub use config::{
    BaseConfig, CommandSpec, ConfigFile, EnvSource, ExplicitFlags, ProcessEnv, ResolvedSettings,
    Resolver, SettingSpec, Source, TlsPolicy,
};
pub use error::{Error, Result};
pub use permission::{Permission, Rights, decode, encode};
