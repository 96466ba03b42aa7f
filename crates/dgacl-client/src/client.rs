//! The logical client: one handle over every endpoint connection.

use tracing::{debug, warn};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::protocol::{AclMutation, LoginResponse, ReplyBody, Request, TxnContext};

/// One client over N connections.
///
/// Each new transaction is routed to the next member in round-robin order,
/// starting with the first endpoint.
#[derive(Debug)]
pub struct LogicalClient {
    members: Vec<Connection>,
    next: usize,
    access_jwt: Option<String>,
}

impl LogicalClient {
    /// Combine already opened connections. Fails on an empty list.
    pub fn from_connections(members: Vec<Connection>) -> Result<Self> {
        if members.is_empty() {
            return Err(Error::NoEndpoints);
        }
        Ok(Self {
            members,
            next: 0,
            access_jwt: None,
        })
    }

    /// Number of member connections.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; a client holds at least one connection.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member endpoints in dial order.
    pub fn endpoints(&self) -> Vec<&str> {
        self.members.iter().map(Connection::endpoint).collect()
    }

    /// Session token from the last successful login.
    pub fn access_jwt(&self) -> Option<&str> {
        self.access_jwt.as_deref()
    }

    /// Log in and keep the access token for subsequent requests.
    pub async fn login(&mut self, user: &str, password: &str) -> Result<LoginResponse> {
        let idx = self.pick();
        let conn = &mut self.members[idx];
        debug!(endpoint = conn.endpoint(), user, "Logging in");
        let body = conn
            .call(
                None,
                Request::Login {
                    user: user.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        let ReplyBody::Login(resp) = body else {
            return Err(Error::protocol("login answered with a non-login reply"));
        };
        self.access_jwt = Some(resp.access_jwt.clone());
        Ok(resp)
    }

    /// Start a transaction on the next member.
    pub fn new_txn(&mut self) -> Txn<'_> {
        let idx = self.pick();
        let Self {
            members,
            access_jwt,
            ..
        } = self;
        let conn = &mut members[idx];
        debug!(endpoint = conn.endpoint(), "Starting transaction");
        Txn {
            conn,
            access_jwt: access_jwt.as_deref(),
            start_ts: 0,
            finished: false,
        }
    }

    /// Close every member connection.
    pub async fn close(self) {
        for conn in self.members {
            conn.close().await;
        }
    }

    fn pick(&mut self) -> usize {
        let idx = self.next % self.members.len();
        self.next = self.next.wrapping_add(1);
        idx
    }
}

/// A transaction bound to one member connection.
///
/// Must end in [`Txn::commit`] or [`Txn::discard`]; dropping it unfinished
/// leaves staged mutations to expire on the server.
pub struct Txn<'a> {
    conn: &'a mut Connection,
    access_jwt: Option<&'a str>,
    start_ts: u64,
    finished: bool,
}

impl Txn<'_> {
    /// Endpoint serving this transaction.
    pub fn endpoint(&self) -> &str {
        self.conn.endpoint()
    }

    /// Timestamp assigned by the server, 0 until the first mutation.
    pub fn start_ts(&self) -> u64 {
        self.start_ts
    }

    /// Stage one mutation.
    pub async fn mutate(&mut self, mutation: AclMutation) -> Result<TxnContext> {
        debug!(
            endpoint = self.conn.endpoint(),
            op = mutation.op(),
            subject = mutation.subject(),
            "Staging mutation"
        );
        let body = self
            .conn
            .call(
                self.access_jwt,
                Request::Mutate {
                    start_ts: self.start_ts,
                    mutation,
                    commit_now: false,
                },
            )
            .await?;
        let ctx = expect_txn(body)?;
        self.start_ts = ctx.start_ts;
        Ok(ctx)
    }

    /// Commit staged mutations. A transaction with nothing staged commits
    /// trivially.
    pub async fn commit(mut self) -> Result<TxnContext> {
        self.finished = true;
        if self.start_ts == 0 {
            return Ok(TxnContext {
                start_ts: 0,
                committed: true,
            });
        }
        let body = self
            .conn
            .call(
                self.access_jwt,
                Request::Commit {
                    start_ts: self.start_ts,
                },
            )
            .await?;
        let ctx = expect_txn(body)?;
        debug!(start_ts = ctx.start_ts, "Transaction committed");
        Ok(ctx)
    }

    /// Abort the transaction, dropping staged mutations.
    pub async fn discard(mut self) -> Result<()> {
        self.finished = true;
        if self.start_ts == 0 {
            return Ok(());
        }
        self.conn
            .call(
                self.access_jwt,
                Request::Abort {
                    start_ts: self.start_ts,
                },
            )
            .await?;
        debug!(start_ts = self.start_ts, "Transaction discarded");
        Ok(())
    }
}

impl Drop for Txn<'_> {
    fn drop(&mut self) {
        if !self.finished && self.start_ts != 0 {
            warn!(
                endpoint = self.conn.endpoint(),
                start_ts = self.start_ts,
                "Transaction dropped without commit or discard"
            );
        }
    }
}

fn expect_txn(body: ReplyBody) -> Result<TxnContext> {
    match body {
        ReplyBody::Txn(ctx) => Ok(ctx),
        other => Err(Error::protocol(format!(
            "expected a transaction reply, got {other:?}"
        ))),
    }
}
