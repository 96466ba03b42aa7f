//! Common test utilities for dgacl-cli integration tests.

use std::collections::HashMap;
use std::io::Write;

use clap::Parser;
use dgacl_cli::{Cli, Dispatcher, Report, Result};
use dgacl_client::testing::MockCluster;
use tempfile::NamedTempFile;

/// A mock cluster plus the environment the dispatcher sees.
pub struct TestHarness {
    /// The cluster every command talks to
    pub cluster: MockCluster,
    /// Environment visible to the resolver
    pub env: HashMap<String, String>,
}

impl TestHarness {
    /// Start a cluster seeded with an admin user and a `dev` group.
    pub async fn new() -> Self {
        let cluster = MockCluster::start().await.expect("mock cluster should bind");
        cluster.add_user("groot", "password");
        cluster.add_group("dev");
        Self {
            cluster,
            env: HashMap::new(),
        }
    }

    /// Set a variable in the dispatcher's environment.
    pub fn set_env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Run `dgacl <args> -d <cluster>`.
    pub async fn run(&self, args: &[&str]) -> Result<Report> {
        let endpoint = self.cluster.endpoint();
        let mut argv = vec!["dgacl"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["-d", endpoint.as_str()]);
        self.run_raw(&argv).await
    }

    /// Run exactly `argv` (including the program name).
    pub async fn run_raw(&self, argv: &[&str]) -> Result<Report> {
        let cli = Cli::try_parse_from(argv).expect("arguments should parse");
        Dispatcher::new(&self.env).dispatch(&cli).await
    }
}

/// Write `content` to a temporary TOML file.
pub fn config_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}
