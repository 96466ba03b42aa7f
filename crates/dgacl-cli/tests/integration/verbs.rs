//! Each verb end to end against the mock cluster.

use dgacl_cli::{Error, Verb};
use dgacl_client::{AclMutation, RejectCode};
use dgacl_core::Rights;

use crate::common::TestHarness;

#[tokio::test]
async fn test_user_add() {
    let h = TestHarness::new().await;
    let report = h
        .run(&["user-add", "-u", "alice", "-p", "s3cret"])
        .await
        .unwrap();

    assert_eq!(report.verb, Verb::UserAdd);
    assert!(h.cluster.has_user("alice"));
    assert_eq!(h.cluster.committed().len(), 1);
}

#[tokio::test]
async fn test_user_delete_alias() {
    let h = TestHarness::new().await;
    h.cluster.add_user("alice", "pw");

    h.run(&["userdel", "--user", "alice"]).await.unwrap();
    assert!(!h.cluster.has_user("alice"));
}

#[tokio::test]
async fn test_user_delete_missing_user_is_remote_error() {
    let h = TestHarness::new().await;
    let err = h.run(&["user-delete", "-u", "ghost"]).await.unwrap_err();

    let Error::Handler { verb, source } = &err else {
        unreachable!("expected handler error, got {err:?}");
    };
    assert_eq!(*verb, Verb::UserDelete);
    assert_eq!(source.reject_code(), Some(RejectCode::NotFound));
    assert!(err.is_remote());
    assert_eq!(err.exit_code(), 1);
    assert!(h.cluster.committed().is_empty());
}

#[tokio::test]
async fn test_login_prints_token() {
    let h = TestHarness::new().await;
    let report = h
        .run(&["login", "-u", "groot", "-p", "password"])
        .await
        .unwrap();

    assert_eq!(report.verb, Verb::Login);
    assert!(report.message.starts_with("access-groot"));
    assert!(report.txn.is_none());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let h = TestHarness::new().await;
    let err = h
        .run(&["login", "-u", "groot", "-p", "nope"])
        .await
        .unwrap_err();
    assert_eq!(
        err.client_error().and_then(|e| e.reject_code()),
        Some(RejectCode::Unauthenticated)
    );
}

#[tokio::test]
async fn test_group_add_and_delete() {
    let h = TestHarness::new().await;
    h.run(&["groupadd", "-g", "ops"]).await.unwrap();
    assert!(h.cluster.has_group("ops"));

    h.run(&["group-delete", "-g", "ops"]).await.unwrap();
    assert!(!h.cluster.has_group("ops"));
}

#[tokio::test]
async fn test_group_add_duplicate() {
    let h = TestHarness::new().await;
    let err = h.run(&["group-add", "-g", "dev"]).await.unwrap_err();
    assert_eq!(
        err.client_error().and_then(|e| e.reject_code()),
        Some(RejectCode::AlreadyExists)
    );
}

#[tokio::test]
async fn test_usermod_dedups_groups() {
    let h = TestHarness::new().await;
    h.cluster.add_user("alice", "pw");
    h.cluster.add_group("ops");

    h.run(&["usermod", "-u", "alice", "-g", "dev, ops,dev"])
        .await
        .unwrap();

    assert_eq!(
        h.cluster.user_groups("alice"),
        Some(vec!["dev".to_string(), "ops".to_string()])
    );
    assert_eq!(
        h.cluster.received_mutations(),
        vec![AclMutation::SetUserGroups {
            user: "alice".to_string(),
            groups: vec!["dev".to_string(), "ops".to_string()],
        }]
    );
}

#[tokio::test]
async fn test_chmod_integer_permission() {
    let h = TestHarness::new().await;
    h.run(&["chmod", "-g", "dev", "-p", "name", "-P", "6"])
        .await
        .unwrap();

    assert_eq!(
        h.cluster.group_permission("dev", "name"),
        Some(Rights::new(true, true, false))
    );
}

#[tokio::test]
async fn test_chmod_symbolic_permission() {
    let h = TestHarness::new().await;
    h.run(&["group-modify-permission", "--group", "dev", "--pred", "age", "--perm", "r--"])
        .await
        .unwrap();

    assert_eq!(
        h.cluster.group_permission("dev", "age"),
        Some(Rights::new(true, false, false))
    );
}

#[tokio::test]
async fn test_chmod_invalid_permission_never_sent() {
    let h = TestHarness::new().await;
    for bad in ["8", "-1"] {
        let err = h
            .run(&["chmod", "-g", "dev", "-p", "name", "-P", bad])
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::Core(dgacl_core::Error::InvalidPermission { .. })),
            "{bad} gave {err:?}"
        );
    }
    assert!(h.cluster.received_mutations().is_empty());
    assert_eq!(h.cluster.open_connections(), 0);
}

#[tokio::test]
async fn test_missing_required_setting() {
    let h = TestHarness::new().await;
    let err = h.run(&["group-add"]).await.unwrap_err();

    let Error::Core(dgacl_core::Error::MissingRequired { command, setting }) = &err else {
        unreachable!("expected MissingRequired, got {err:?}");
    };
    assert_eq!(command, "group-add");
    assert_eq!(setting, "group");
    assert!(err.is_config());
}

#[tokio::test]
async fn test_explicit_empty_endpoint_flag_wins() {
    let mut h = TestHarness::new().await;
    let endpoint = h.cluster.endpoint();
    h.set_env("DGACL_GROUP_ADD_DGRAPH", &endpoint);

    let err = h
        .run_raw(&["dgacl", "group-add", "-g", "ops", "-d", ""])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Core(dgacl_core::Error::MissingRequired { .. })
    ));
    assert!(!h.cluster.has_group("ops"));
}

#[tokio::test]
async fn test_unreachable_member_fails_before_any_mutation() {
    let h = TestHarness::new().await;
    let dead = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };
    let endpoints = format!("{},{}", h.cluster.endpoint(), dead);

    let err = h
        .run_raw(&["dgacl", "group-add", "-g", "ops", "-d", &endpoints])
        .await
        .unwrap_err();

    let Error::Client(dgacl_client::Error::ConnectionSetupFailed { endpoint, .. }) = &err else {
        unreachable!("expected ConnectionSetupFailed, got {err:?}");
    };
    assert_eq!(endpoint, &dead);
    assert!(h.cluster.received_mutations().is_empty());
    assert!(
        h.cluster
            .wait_for_open_connections(0, std::time::Duration::from_secs(2))
            .await
    );
}

#[tokio::test]
async fn test_password_whitespace_survives_to_login() {
    let h = TestHarness::new().await;
    h.run(&["user-add", "-u", "alice", "-p", "  pass word  "])
        .await
        .unwrap();

    h.run(&["login", "-u", "alice", "-p", "  pass word  "])
        .await
        .unwrap();
    let err = h
        .run(&["login", "-u", "alice", "-p", "pass word"])
        .await
        .unwrap_err();
    assert_eq!(
        err.client_error().and_then(|e| e.reject_code()),
        Some(RejectCode::Unauthenticated)
    );
}

#[tokio::test]
async fn test_dispatcher_stage_after_failure_and_success() {
    use clap::Parser;
    use dgacl_cli::{Cli, Dispatcher, Outcome, Stage};

    let h = TestHarness::new().await;
    let endpoint = h.cluster.endpoint();
    let mut dispatcher = Dispatcher::new(&h.env);
    assert_eq!(dispatcher.stage(), Stage::Idle);

    let cli = Cli::try_parse_from(["dgacl", "user-delete", "-u", "ghost", "-d", endpoint.as_str()]).unwrap();
    dispatcher.dispatch(&cli).await.unwrap_err();
    assert_eq!(dispatcher.stage(), Stage::Done(Outcome::Failure));

    let cli = Cli::try_parse_from(["dgacl", "group-add", "-d", endpoint.as_str()]).unwrap();
    dispatcher.dispatch(&cli).await.unwrap_err();
    assert_eq!(dispatcher.stage(), Stage::Done(Outcome::Failure));

    let cli = Cli::try_parse_from(["dgacl", "group-add", "-g", "ops", "-d", endpoint.as_str()]).unwrap();
    dispatcher.dispatch(&cli).await.unwrap();
    assert_eq!(dispatcher.stage(), Stage::Done(Outcome::Success));
}
