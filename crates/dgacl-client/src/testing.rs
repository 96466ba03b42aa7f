//! In-process mock cluster for tests.
//!
//! [`MockCluster`] listens on a loopback port, speaks the dgacl wire
//! protocol over plaintext TCP, and keeps an in-memory ACL store that tests
//! can seed and inspect.
//!
//! # Semantics
//!
//! - Mutations are staged per transaction and validated against the store
//!   as it would look after the already staged ones.
//! - Commit applies the staged mutations; an unknown transaction is
//!   rejected with [`RejectCode::Aborted`].
//! - Creating an existing user or group is [`RejectCode::AlreadyExists`];
//!   touching a missing one is [`RejectCode::NotFound`].
//! - A permission above 7 is [`RejectCode::InvalidArgument`].
//! - Deleting a group removes it from every user.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use dgacl_client::testing::MockCluster;
//! use dgacl_client::{AclMutation, ClientBuilder};
//! use dgacl_core::TlsPolicy;
//!
//! let cluster = MockCluster::start().await?;
//! cluster.add_group("dev");
//!
//! let mut client = ClientBuilder::new()
//!     .build(&cluster.endpoint(), &TlsPolicy::disabled())
//!     .await?;
//! let mut txn = client.new_txn();
//! txn.mutate(AclMutation::CreateUser {
//!     user: "alice".into(),
//!     password: "secret".into(),
//! })
//! .await?;
//! txn.commit().await?;
//! assert!(cluster.has_user("alice"));
//! client.close().await;
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dgacl_core::Rights;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::protocol::{
    AclMutation, Envelope, JsonCodec, LoginResponse, Outcome, RejectCode, Reply, ReplyBody,
    Request, TxnContext,
};
use crate::transport::{read_frame, write_frame};

type Rejection = (RejectCode, String);

#[derive(Debug, Clone, Default)]
struct UserRecord {
    password: String,
    groups: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct Store {
    users: BTreeMap<String, UserRecord>,
    groups: BTreeMap<String, BTreeMap<String, u8>>,
}

impl Store {
    fn apply(&mut self, mutation: &AclMutation) -> Result<(), Rejection> {
        match mutation {
            AclMutation::CreateUser { user, password } => {
                if self.users.contains_key(user) {
                    return Err(already_exists("user", user));
                }
                self.users.insert(
                    user.clone(),
                    UserRecord {
                        password: password.clone(),
                        groups: Vec::new(),
                    },
                );
            }
            AclMutation::DeleteUser { user } => {
                if self.users.remove(user).is_none() {
                    return Err(not_found("user", user));
                }
            }
            AclMutation::CreateGroup { group } => {
                if self.groups.contains_key(group) {
                    return Err(already_exists("group", group));
                }
                self.groups.insert(group.clone(), BTreeMap::new());
            }
            AclMutation::DeleteGroup { group } => {
                if self.groups.remove(group).is_none() {
                    return Err(not_found("group", group));
                }
                for record in self.users.values_mut() {
                    record.groups.retain(|g| g != group);
                }
            }
            AclMutation::SetUserGroups { user, groups } => {
                if let Some(missing) = groups.iter().find(|g| !self.groups.contains_key(*g)) {
                    return Err(not_found("group", missing));
                }
                let Some(record) = self.users.get_mut(user) else {
                    return Err(not_found("user", user));
                };
                record.groups = groups.clone();
            }
            AclMutation::SetGroupPermission {
                group,
                predicate,
                permission,
            } => {
                if *permission > dgacl_core::permission::MAX_PERMISSION {
                    return Err((
                        RejectCode::InvalidArgument,
                        format!("permission {permission} is out of range"),
                    ));
                }
                let Some(acl) = self.groups.get_mut(group) else {
                    return Err(not_found("group", group));
                };
                acl.insert(predicate.clone(), *permission);
            }
        }
        Ok(())
    }
}

fn already_exists(kind: &str, id: &str) -> Rejection {
    (
        RejectCode::AlreadyExists,
        format!("{kind} '{id}' already exists"),
    )
}

fn not_found(kind: &str, id: &str) -> Rejection {
    (RejectCode::NotFound, format!("{kind} '{id}' does not exist"))
}

#[derive(Debug, Default)]
struct ClusterState {
    store: Store,
    staged: HashMap<u64, Vec<AclMutation>>,
    next_ts: u64,
    received: Vec<AclMutation>,
    committed: Vec<u64>,
    logins: usize,
}

impl ClusterState {
    fn handle(&mut self, request: Request) -> Result<ReplyBody, Rejection> {
        match request {
            Request::Login { user, password } => {
                let ok = self
                    .store
                    .users
                    .get(&user)
                    .is_some_and(|r| r.password == password);
                if !ok {
                    return Err((
                        RejectCode::Unauthenticated,
                        "invalid username or password".to_string(),
                    ));
                }
                self.logins += 1;
                Ok(ReplyBody::Login(LoginResponse {
                    access_jwt: format!("access-{user}-{}", self.logins),
                    refresh_jwt: format!("refresh-{user}-{}", self.logins),
                }))
            }
            Request::Mutate {
                start_ts,
                mutation,
                commit_now,
            } => {
                self.received.push(mutation.clone());
                let start_ts = if start_ts == 0 {
                    self.next_ts += 1;
                    self.staged.insert(self.next_ts, Vec::new());
                    self.next_ts
                } else {
                    start_ts
                };
                let Some(staged) = self.staged.get(&start_ts) else {
                    return Err(unknown_txn(start_ts));
                };

                let mut preview = self.store.clone();
                for m in staged {
                    preview.apply(m)?;
                }
                preview.apply(&mutation)?;

                if commit_now {
                    self.staged.remove(&start_ts);
                    self.store = preview;
                    self.committed.push(start_ts);
                } else if let Some(staged) = self.staged.get_mut(&start_ts) {
                    staged.push(mutation);
                }
                Ok(ReplyBody::Txn(TxnContext {
                    start_ts,
                    committed: commit_now,
                }))
            }
            Request::Commit { start_ts } => {
                let Some(staged) = self.staged.remove(&start_ts) else {
                    return Err(unknown_txn(start_ts));
                };
                let mut next = self.store.clone();
                for m in &staged {
                    next.apply(m)
                        .map_err(|(_, message)| (RejectCode::Aborted, message))?;
                }
                self.store = next;
                self.committed.push(start_ts);
                Ok(ReplyBody::Txn(TxnContext {
                    start_ts,
                    committed: true,
                }))
            }
            Request::Abort { start_ts } => {
                if self.staged.remove(&start_ts).is_none() {
                    return Err(unknown_txn(start_ts));
                }
                Ok(ReplyBody::Empty)
            }
        }
    }
}

fn unknown_txn(start_ts: u64) -> Rejection {
    (
        RejectCode::Aborted,
        format!("transaction {start_ts} is not open"),
    )
}

struct OpenGuard(Arc<AtomicUsize>);

impl OpenGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A loopback cluster with an in-memory ACL store.
///
/// The listener stops when the value is dropped.
pub struct MockCluster {
    addr: SocketAddr,
    state: Arc<Mutex<ClusterState>>,
    open: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for MockCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCluster")
            .field("addr", &self.addr)
            .field("open", &self.open_connections())
            .finish_non_exhaustive()
    }
}

impl MockCluster {
    /// Bind a loopback port and start serving.
    pub async fn start() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(ClusterState::default()));
        let open = Arc::new(AtomicUsize::new(0));

        let task = tokio::spawn(accept_loop(listener, Arc::clone(&state), Arc::clone(&open)));
        debug!(%addr, "Mock cluster listening");
        Ok(Self {
            addr,
            state,
            open,
            task,
        })
    }

    /// `host:port` to dial.
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    /// Connections currently being served.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Poll until exactly `n` connections are open or `timeout` elapses.
    pub async fn wait_for_open_connections(&self, n: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.open_connections() == n {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Seed a user with no groups.
    pub fn add_user(&self, user: &str, password: &str) {
        self.lock().store.users.insert(
            user.to_string(),
            UserRecord {
                password: password.to_string(),
                groups: Vec::new(),
            },
        );
    }

    /// Seed an empty group.
    pub fn add_group(&self, group: &str) {
        self.lock()
            .store
            .groups
            .entry(group.to_string())
            .or_default();
    }

    /// Whether `user` exists in the committed store.
    pub fn has_user(&self, user: &str) -> bool {
        self.lock().store.users.contains_key(user)
    }

    /// Whether `group` exists in the committed store.
    pub fn has_group(&self, group: &str) -> bool {
        self.lock().store.groups.contains_key(group)
    }

    /// Committed group membership of `user`.
    pub fn user_groups(&self, user: &str) -> Option<Vec<String>> {
        self.lock().store.users.get(user).map(|r| r.groups.clone())
    }

    /// Committed rights of `group` on `predicate`.
    pub fn group_permission(&self, group: &str, predicate: &str) -> Option<Rights> {
        let value = *self.lock().store.groups.get(group)?.get(predicate)?;
        dgacl_core::decode(i64::from(value)).ok()
    }

    /// Every mutation received, committed or not, in arrival order.
    pub fn received_mutations(&self) -> Vec<AclMutation> {
        self.lock().received.clone()
    }

    /// Timestamps of committed transactions, in commit order.
    pub fn committed(&self) -> Vec<u64> {
        self.lock().committed.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MockCluster {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn accept_loop(
    listener: TcpListener,
    state: Arc<Mutex<ClusterState>>,
    open: Arc<AtomicUsize>,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "Mock cluster accept failed");
                continue;
            }
        };
        let guard = OpenGuard::new(&open);
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = serve(stream, state).await {
                trace!(%peer, error = %e, "Mock connection ended with error");
            }
            drop(guard);
        });
    }
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<ClusterState>>) -> io::Result<()> {
    while let Some(frame) = read_frame(&mut stream).await? {
        let envelope: Envelope = JsonCodec::decode(&frame)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        trace!(id = envelope.id, request = envelope.request.name(), "Mock request");

        let outcome = {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            match state.handle(envelope.request) {
                Ok(body) => Outcome::Ok { body },
                Err((code, message)) => Outcome::Rejected { code, message },
            }
        };
        let reply = Reply {
            id: envelope.id,
            outcome,
        };
        let data = JsonCodec::encode(&reply)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        write_frame(&mut stream, &data).await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn create_user(user: &str) -> AclMutation {
        AclMutation::CreateUser {
            user: user.to_string(),
            password: "pw".to_string(),
        }
    }

    fn mutate(start_ts: u64, mutation: AclMutation) -> Request {
        Request::Mutate {
            start_ts,
            mutation,
            commit_now: false,
        }
    }

    #[test]
    fn test_staged_mutation_invisible_until_commit() {
        let mut state = ClusterState::default();
        let ReplyBody::Txn(ctx) = state.handle(mutate(0, create_user("alice"))).unwrap() else {
            unreachable!("expected txn reply");
        };
        assert!(!state.store.users.contains_key("alice"));

        state.handle(Request::Commit { start_ts: ctx.start_ts }).unwrap();
        assert!(state.store.users.contains_key("alice"));
        assert_eq!(state.committed, vec![ctx.start_ts]);
    }

    #[test]
    fn test_duplicate_within_txn_rejected() {
        let mut state = ClusterState::default();
        state.handle(mutate(0, create_user("alice"))).unwrap();
        let (code, _) = state.handle(mutate(1, create_user("alice"))).unwrap_err();
        assert_eq!(code, RejectCode::AlreadyExists);
    }

    #[test]
    fn test_delete_group_removes_membership() {
        let mut store = Store::default();
        store.apply(&create_user("alice")).unwrap();
        store
            .apply(&AclMutation::CreateGroup {
                group: "dev".to_string(),
            })
            .unwrap();
        store
            .apply(&AclMutation::SetUserGroups {
                user: "alice".to_string(),
                groups: vec!["dev".to_string()],
            })
            .unwrap();
        store
            .apply(&AclMutation::DeleteGroup {
                group: "dev".to_string(),
            })
            .unwrap();
        assert!(store.users["alice"].groups.is_empty());
    }

    #[test]
    fn test_set_groups_with_unknown_group() {
        let mut store = Store::default();
        store.apply(&create_user("alice")).unwrap();
        let (code, message) = store
            .apply(&AclMutation::SetUserGroups {
                user: "alice".to_string(),
                groups: vec!["ghost".to_string()],
            })
            .unwrap_err();
        assert_eq!(code, RejectCode::NotFound);
        assert!(message.contains("ghost"));
    }

    #[test]
    fn test_permission_out_of_range() {
        let mut store = Store::default();
        store
            .apply(&AclMutation::CreateGroup {
                group: "dev".to_string(),
            })
            .unwrap();
        let (code, _) = store
            .apply(&AclMutation::SetGroupPermission {
                group: "dev".to_string(),
                predicate: "name".to_string(),
                permission: 8,
            })
            .unwrap_err();
        assert_eq!(code, RejectCode::InvalidArgument);
    }

    #[test]
    fn test_login_checks_password() {
        let mut state = ClusterState::default();
        state.store.apply(&create_user("groot")).unwrap();
        let err = state
            .handle(Request::Login {
                user: "groot".to_string(),
                password: "wrong".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.0, RejectCode::Unauthenticated);

        let body = state
            .handle(Request::Login {
                user: "groot".to_string(),
                password: "pw".to_string(),
            })
            .unwrap();
        assert!(matches!(body, ReplyBody::Login(_)));
    }

    #[test]
    fn test_unknown_txn_aborted() {
        let mut state = ClusterState::default();
        let (code, _) = state.handle(Request::Commit { start_ts: 42 }).unwrap_err();
        assert_eq!(code, RejectCode::Aborted);
    }
}
