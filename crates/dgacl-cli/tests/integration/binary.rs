//! The `dgacl` binary's exit status and output streams.

use std::process::Output;

use tokio::process::Command;

use crate::common::TestHarness;

async fn dgacl(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dgacl"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("DGACL_CONFIG")
        .output()
        .await
        .expect("binary should run")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_user_delete_unknown_user_exits_1() {
    let h = TestHarness::new().await;
    let endpoint = h.cluster.endpoint();

    let out = dgacl(&["user-delete", "-u", "ghost", "-d", &endpoint]).await;

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("ghost"), "stderr: {stderr}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_login_prints_token_to_stdout() {
    let h = TestHarness::new().await;
    let endpoint = h.cluster.endpoint();

    let out = dgacl(&["login", "-u", "groot", "-p", "password", "-d", &endpoint]).await;

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.trim().starts_with("access-groot"), "stdout: {stdout}");
}

#[tokio::test]
async fn test_unreachable_endpoint_exits_1() {
    let dead = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };
    let out = dgacl(&["group-add", "-g", "ops", "-d", &dead]).await;
    assert_eq!(out.status.code(), Some(1));
}

#[tokio::test]
async fn test_usage_error_exits_2() {
    let out = dgacl(&["no-such-verb"]).await;
    assert_eq!(out.status.code(), Some(2));
}
