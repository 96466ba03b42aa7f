//! Transactions and routing through the logical client.

use dgacl_client::{AclMutation, Error, RejectCode};
use dgacl_core::Rights;

use crate::common::{cluster, connect};

fn create_group(group: &str) -> AclMutation {
    AclMutation::CreateGroup {
        group: group.to_string(),
    }
}

#[tokio::test]
async fn test_commit_applies_mutation() {
    let cluster = cluster().await;
    let mut client = connect(&[&cluster]).await;

    let mut txn = client.new_txn();
    let ctx = txn.mutate(create_group("dev")).await.unwrap();
    assert!(!ctx.committed);
    assert!(!cluster.has_group("dev"));

    let done = txn.commit().await.unwrap();
    assert!(done.committed);
    assert_eq!(done.start_ts, ctx.start_ts);
    assert!(cluster.has_group("dev"));
    assert_eq!(cluster.committed(), vec![ctx.start_ts]);

    client.close().await;
}

#[tokio::test]
async fn test_discard_drops_mutation() {
    let cluster = cluster().await;
    let mut client = connect(&[&cluster]).await;

    let mut txn = client.new_txn();
    txn.mutate(create_group("dev")).await.unwrap();
    txn.discard().await.unwrap();

    assert!(!cluster.has_group("dev"));
    assert!(cluster.committed().is_empty());
    assert_eq!(cluster.received_mutations(), vec![create_group("dev")]);
    client.close().await;
}

#[tokio::test]
async fn test_commit_without_mutation_is_noop() {
    let cluster = cluster().await;
    let mut client = connect(&[&cluster]).await;

    let ctx = client.new_txn().commit().await.unwrap();
    assert!(ctx.committed);
    assert!(cluster.committed().is_empty());
    client.close().await;
}

#[tokio::test]
async fn test_group_permission_round_trip() {
    let cluster = cluster().await;
    cluster.add_group("dev");
    let mut client = connect(&[&cluster]).await;

    let mut txn = client.new_txn();
    txn.mutate(AclMutation::SetGroupPermission {
        group: "dev".to_string(),
        predicate: "name".to_string(),
        permission: 6,
    })
    .await
    .unwrap();
    txn.commit().await.unwrap();

    assert_eq!(
        cluster.group_permission("dev", "name"),
        Some(Rights::new(true, true, false))
    );
    client.close().await;
}

#[tokio::test]
async fn test_duplicate_user_rejected() {
    let cluster = cluster().await;
    let mut client = connect(&[&cluster]).await;

    let mut txn = client.new_txn();
    let err = txn
        .mutate(AclMutation::CreateUser {
            user: "groot".to_string(),
            password: "other".to_string(),
        })
        .await
        .unwrap_err();
    txn.discard().await.unwrap();

    assert!(err.is_remote());
    assert_eq!(err.reject_code(), Some(RejectCode::AlreadyExists));
    client.close().await;
}

#[tokio::test]
async fn test_round_robin_across_members() {
    let a = cluster().await;
    let b = cluster().await;
    let mut client = connect(&[&a, &b]).await;

    let first = client.new_txn().endpoint().to_string();
    let second = client.new_txn().endpoint().to_string();
    let third = client.new_txn().endpoint().to_string();

    assert_eq!(first, a.endpoint());
    assert_eq!(second, b.endpoint());
    assert_eq!(third, a.endpoint());
    client.close().await;
}

#[tokio::test]
async fn test_login_stores_access_token() {
    let cluster = cluster().await;
    let mut client = connect(&[&cluster]).await;
    assert!(client.access_jwt().is_none());

    let resp = client.login("groot", "password").await.unwrap();
    assert!(!resp.access_jwt.is_empty());
    assert_eq!(client.access_jwt(), Some(resp.access_jwt.as_str()));
    client.close().await;
}

#[tokio::test]
async fn test_login_bad_password() {
    let cluster = cluster().await;
    let mut client = connect(&[&cluster]).await;

    let err = client.login("groot", "nope").await.unwrap_err();
    let Error::RemoteRejected { code, .. } = err else {
        unreachable!("expected RemoteRejected, got {err:?}");
    };
    assert_eq!(code, RejectCode::Unauthenticated);
    assert!(client.access_jwt().is_none());
    client.close().await;
}
