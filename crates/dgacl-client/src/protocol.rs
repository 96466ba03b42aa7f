//! Wire protocol between dgacl and the cluster.
//!
//! Every frame carries one JSON document. The client sends an [`Envelope`]
//! and the cluster answers with a [`Reply`] echoing the envelope id.
//!
//! ```text
//! -> {"id":1,"request":{"type":"mutate","start_ts":0,"commit_now":false,
//!         "mutation":{"op":"set_group_permission","group":"dev","predicate":"name","permission":6}}}
//! <- {"id":1,"outcome":{"status":"ok","body":{"kind":"txn","start_ts":17,"committed":false}}}
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One ACL change applied inside a transaction.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AclMutation {
    /// Create an account.
    CreateUser {
        /// User id
        user: String,
        /// Initial password
        password: String,
    },
    /// Remove an account.
    DeleteUser {
        /// User id
        user: String,
    },
    /// Create a group.
    CreateGroup {
        /// Group id
        group: String,
    },
    /// Remove a group.
    DeleteGroup {
        /// Group id
        group: String,
    },
    /// Replace a user's group membership.
    SetUserGroups {
        /// User id
        user: String,
        /// Complete new membership
        groups: Vec<String>,
    },
    /// Set a group's permission on one predicate.
    SetGroupPermission {
        /// Group id
        group: String,
        /// Predicate name
        predicate: String,
        /// 3-bit permission value
        permission: u8,
    },
}

impl AclMutation {
    /// Short operation name for logs.
    pub fn op(&self) -> &'static str {
        match self {
            Self::CreateUser { .. } => "create_user",
            Self::DeleteUser { .. } => "delete_user",
            Self::CreateGroup { .. } => "create_group",
            Self::DeleteGroup { .. } => "delete_group",
            Self::SetUserGroups { .. } => "set_user_groups",
            Self::SetGroupPermission { .. } => "set_group_permission",
        }
    }

    /// The user or group the mutation targets.
    pub fn subject(&self) -> &str {
        match self {
            Self::CreateUser { user, .. }
            | Self::DeleteUser { user }
            | Self::SetUserGroups { user, .. } => user,
            Self::CreateGroup { group }
            | Self::DeleteGroup { group }
            | Self::SetGroupPermission { group, .. } => group,
        }
    }
}

// Passwords stay out of logs and panic messages.
impl fmt::Debug for AclMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateUser { user, .. } => f
                .debug_struct("CreateUser")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            Self::DeleteUser { user } => f.debug_struct("DeleteUser").field("user", user).finish(),
            Self::CreateGroup { group } => {
                f.debug_struct("CreateGroup").field("group", group).finish()
            }
            Self::DeleteGroup { group } => {
                f.debug_struct("DeleteGroup").field("group", group).finish()
            }
            Self::SetUserGroups { user, groups } => f
                .debug_struct("SetUserGroups")
                .field("user", user)
                .field("groups", groups)
                .finish(),
            Self::SetGroupPermission {
                group,
                predicate,
                permission,
            } => f
                .debug_struct("SetGroupPermission")
                .field("group", group)
                .field("predicate", predicate)
                .field("permission", permission)
                .finish(),
        }
    }
}

/// A client request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Exchange credentials for a session token.
    Login {
        /// User id
        user: String,
        /// Password
        password: String,
    },
    /// Stage a mutation; `start_ts == 0` opens a new transaction.
    Mutate {
        /// Transaction timestamp, 0 for a new transaction
        start_ts: u64,
        /// The change
        mutation: AclMutation,
        /// Commit immediately after staging
        commit_now: bool,
    },
    /// Commit a staged transaction.
    Commit {
        /// Transaction timestamp
        start_ts: u64,
    },
    /// Drop a staged transaction.
    Abort {
        /// Transaction timestamp
        start_ts: u64,
    },
}

impl Request {
    /// Short request name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::Mutate { .. } => "mutate",
            Self::Commit { .. } => "commit",
            Self::Abort { .. } => "abort",
        }
    }
}

/// Request frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-connection request id, echoed in the reply
    pub id: u64,
    /// Session token from an earlier login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_jwt: Option<String>,
    /// The request itself
    pub request: Request,
}

/// Response frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Id of the envelope being answered
    pub id: u64,
    /// Result of the request
    pub outcome: Outcome,
}

/// Success or rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The request was applied.
    Ok {
        /// Response payload
        body: ReplyBody,
    },
    /// The cluster declined the request.
    Rejected {
        /// Rejection class
        code: RejectCode,
        /// Human-readable reason
        message: String,
    },
}

/// Payload of a successful reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyBody {
    /// Answer to [`Request::Login`].
    Login(LoginResponse),
    /// Answer to [`Request::Mutate`] and [`Request::Commit`].
    Txn(TxnContext),
    /// Answer to [`Request::Abort`].
    Empty,
}

/// Session tokens issued on login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Short-lived access token
    pub access_jwt: String,
    /// Token used to obtain a new access token
    pub refresh_jwt: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse").finish_non_exhaustive()
    }
}

/// State of a transaction as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnContext {
    /// Transaction timestamp
    pub start_ts: u64,
    /// Whether the transaction is committed
    pub committed: bool,
}

/// Why the cluster declined a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectCode {
    /// The user or group already exists.
    AlreadyExists,
    /// The user or group does not exist.
    NotFound,
    /// A field failed validation.
    InvalidArgument,
    /// Bad credentials.
    Unauthenticated,
    /// The caller may not perform this change.
    PermissionDenied,
    /// The transaction was aborted.
    Aborted,
    /// Anything else.
    Internal,
}

impl fmt::Display for RejectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
            Self::Unauthenticated => "unauthenticated",
            Self::PermissionDenied => "permission_denied",
            Self::Aborted => "aborted",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// JSON encoding of protocol frames.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a frame payload.
    pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::protocol(format!("encode failed: {e}")))
    }

    /// Decode a frame payload.
    pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
        serde_json::from_slice(data).map_err(|e| Error::protocol(format!("decode failed: {e}")))
    }
}
