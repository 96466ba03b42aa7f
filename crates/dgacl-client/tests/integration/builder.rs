//! Fail-fast client construction.

use dgacl_client::testing::MockCluster;
use dgacl_client::{ClientBuilder, Error};
use dgacl_core::TlsPolicy;

use crate::common::{SETTLE, cluster, unused_endpoint};

#[tokio::test]
async fn test_single_endpoint() {
    let cluster = cluster().await;
    let client = ClientBuilder::new()
        .build(&cluster.endpoint(), &TlsPolicy::disabled())
        .await
        .unwrap();

    assert_eq!(client.len(), 1);
    assert_eq!(client.endpoints(), vec![cluster.endpoint().as_str()]);
    assert!(cluster.wait_for_open_connections(1, SETTLE).await);

    client.close().await;
    assert!(cluster.wait_for_open_connections(0, SETTLE).await);
}

#[tokio::test]
async fn test_endpoints_keep_order_and_trim() {
    let a = cluster().await;
    let b = cluster().await;
    let raw = format!(" {} ,{} ", a.endpoint(), b.endpoint());

    let client = ClientBuilder::new()
        .build(&raw, &TlsPolicy::disabled())
        .await
        .unwrap();

    assert_eq!(
        client.endpoints(),
        vec![a.endpoint().as_str(), b.endpoint().as_str()]
    );
    client.close().await;
}

#[tokio::test]
async fn test_custom_separator() {
    let a = cluster().await;
    let b = cluster().await;
    let raw = format!("{};{}", a.endpoint(), b.endpoint());

    let client = ClientBuilder::new()
        .with_separator(';')
        .build(&raw, &TlsPolicy::disabled())
        .await
        .unwrap();
    assert_eq!(client.len(), 2);
    client.close().await;
}

#[tokio::test]
async fn test_unreachable_endpoint_fails_whole_build() {
    let reachable = cluster().await;
    let dead = unused_endpoint();
    let raw = format!("{},{}", reachable.endpoint(), dead);

    let err = ClientBuilder::new()
        .with_dial_timeout(SETTLE)
        .build(&raw, &TlsPolicy::disabled())
        .await
        .unwrap_err();

    let Error::ConnectionSetupFailed { endpoint, .. } = err else {
        unreachable!("expected ConnectionSetupFailed, got {err:?}");
    };
    assert_eq!(endpoint, dead);

    // The connection to the reachable member was closed again.
    assert!(reachable.wait_for_open_connections(0, SETTLE).await);
}

#[tokio::test]
async fn test_first_endpoint_unreachable() {
    let dead = unused_endpoint();
    let reachable = MockCluster::start().await.unwrap();
    let raw = format!("{},{}", dead, reachable.endpoint());

    let err = ClientBuilder::new()
        .build(&raw, &TlsPolicy::disabled())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ConnectionSetupFailed { .. }));
    assert_eq!(reachable.open_connections(), 0);
}

#[tokio::test]
async fn test_empty_list() {
    let endpoints: Vec<String> = Vec::new();
    let err = ClientBuilder::new()
        .build_endpoints(&endpoints, &TlsPolicy::disabled())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoEndpoints));
}
