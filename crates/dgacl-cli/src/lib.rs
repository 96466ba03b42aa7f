#![doc = include_str!("../README.md")]
//! # dgacl-cli
//!
//! Command-line administration of cluster ACLs.
//!
//! This crate provides:
//! - The clap command tree: seven verbs plus shared connection flags
//! - The verb table and typed per-verb parameters
//! - The dispatcher that resolves settings, connects, and runs one
//!   transaction per invocation
//! - Logging setup for the `dgacl` binary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod verb;

pub use cli::Cli;
pub use dispatch::{Dispatcher, Outcome, Stage};
pub use error::{Error, Result};
pub use handlers::Report;
pub use verb::{EffectiveConfig, Verb, VerbParams};
