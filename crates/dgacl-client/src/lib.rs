#![doc = include_str!("../README.md")]
//! # dgacl-client
//!
//! Secure multi-endpoint RPC client for cluster ACL administration.
//!
//! This crate provides:
//! - The request/response wire protocol and its length-prefixed JSON framing
//! - Per-endpoint connections over plaintext TCP or rustls
//! - [`ClientBuilder`], which dials every endpoint up front and fails fast
//! - [`LogicalClient`], one handle over N connections with round-robin
//!   transaction routing
//! - A `testing` feature with an in-process mock cluster

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod client;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod tls;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use builder::ClientBuilder;
pub use client::{LogicalClient, Txn};
pub use connection::Connection;
pub use error::{Error, Result};
pub use protocol::{AclMutation, LoginResponse, RejectCode, Request, TxnContext};
