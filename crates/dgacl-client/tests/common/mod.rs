//! Shared helpers for client integration tests.

use std::time::Duration;

use dgacl_client::testing::MockCluster;
use dgacl_client::{ClientBuilder, LogicalClient};
use dgacl_core::TlsPolicy;

/// How long to wait for the mock to observe connection changes.
pub const SETTLE: Duration = Duration::from_secs(2);

/// Start a mock cluster seeded with an admin account.
pub async fn cluster() -> MockCluster {
    let cluster = MockCluster::start().await.expect("mock cluster should bind");
    cluster.add_user("groot", "password");
    cluster
}

/// Connect a plaintext client to every given cluster, in order.
pub async fn connect(clusters: &[&MockCluster]) -> LogicalClient {
    let endpoints: Vec<String> = clusters.iter().map(|c| c.endpoint()).collect();
    ClientBuilder::new()
        .with_dial_timeout(SETTLE)
        .build_endpoints(&endpoints, &TlsPolicy::disabled())
        .await
        .expect("client should connect")
}

/// A loopback address nothing is listening on.
pub fn unused_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}
