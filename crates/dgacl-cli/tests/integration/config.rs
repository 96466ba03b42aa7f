//! Settings from the environment and the config file.

use dgacl_cli::{Dispatcher, Error, Verb, VerbParams};

use crate::common::{TestHarness, config_file};

#[tokio::test]
async fn test_endpoint_from_verb_env() {
    let mut h = TestHarness::new().await;
    let endpoint = h.cluster.endpoint();
    h.set_env("DGACL_GROUP_ADD_DGRAPH", &endpoint);

    h.run_raw(&["dgacl", "group-add", "-g", "ops"]).await.unwrap();
    assert!(h.cluster.has_group("ops"));
}

#[tokio::test]
async fn test_verb_setting_from_env() {
    let mut h = TestHarness::new().await;
    h.set_env("DGACL_USER_ADD_PASSWORD", "from-env");

    h.run(&["user-add", "-u", "alice"]).await.unwrap();
    assert!(h.cluster.has_user("alice"));
}

#[tokio::test]
async fn test_other_verbs_env_is_ignored() {
    let mut h = TestHarness::new().await;
    h.set_env("DGACL_LOGIN_PASSWORD", "wrong-verb");

    let err = h.run(&["user-add", "-u", "alice"]).await.unwrap_err();
    assert!(err.is_config());
}

#[tokio::test]
async fn test_config_file_supplies_settings() {
    let h = TestHarness::new().await;
    let file = config_file(&format!(
        r#"
[acl]
dgraph = "{}"

[group-modify-permission]
predicate = "name"
permission = "rwm"
"#,
        h.cluster.endpoint()
    ));
    let path = file.path().to_str().unwrap();

    h.run_raw(&["dgacl", "--config", path, "chmod", "-g", "dev"])
        .await
        .unwrap();
    assert_eq!(
        h.cluster.group_permission("dev", "name").map(|r| r.to_string()),
        Some("rwm".to_string())
    );
}

#[tokio::test]
async fn test_env_beats_config_file() {
    let mut h = TestHarness::new().await;
    let file = config_file(
        r#"
[group-modify-permission]
predicate = "name"
permission = 7
"#,
    );
    h.set_env("DGACL_GROUP_MODIFY_PERMISSION_PERMISSION", "4");
    let path = file.path().to_str().unwrap();

    let cli = <dgacl_cli::Cli as clap::Parser>::try_parse_from([
        "dgacl", "--config", path, "chmod", "-g", "dev",
    ])
    .unwrap();
    let config = Dispatcher::new(&h.env)
        .resolve(Verb::GroupModifyPermission, &cli)
        .unwrap();
    let VerbParams::GroupModifyPermission { permission, .. } = config.params else {
        unreachable!("wrong params variant");
    };
    assert_eq!(permission.value(), 4);
}

#[tokio::test]
async fn test_missing_explicit_config_file() {
    let h = TestHarness::new().await;
    let err = h
        .run(&["--config", "/nonexistent/dgacl.toml", "group-add", "-g", "ops"])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Core(dgacl_core::Error::Config { .. })));
}

#[tokio::test]
async fn test_tls_cert_without_key() {
    let h = TestHarness::new().await;
    let err = h
        .run(&["group-add", "-g", "ops", "--tls-on", "--tls-cert", "client.pem"])
        .await
        .unwrap_err();
    let Error::Core(dgacl_core::Error::InvalidValue { setting, .. }) = &err else {
        unreachable!("expected InvalidValue, got {err:?}");
    };
    assert_eq!(setting, "tls-cert-key");
}
