//! Test server management.
//!
//! Spawns and manages chatrelayd instances for integration testing.

#![allow(dead_code)]

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// A test server instance.
pub struct TestServer {
    child: Child,
    port: u16,
    data_dir: TempDir,
}

impl TestServer {
    /// Spawn a server with an empty chat log.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with_history(&[]).await
    }

    /// Spawn a server whose chat log already holds `lines`.
    pub async fn spawn_with_history(lines: &[&str]) -> anyhow::Result<Self> {
        let data_dir = tempfile::tempdir()?;
        let log_path = data_dir.path().join("messages.log");
        let mut seeded = String::new();
        for line in lines {
            seeded.push_str(line);
            seeded.push('\n');
        }
        std::fs::write(&log_path, seeded)?;

        let port = free_port()?;
        let config_path = data_dir.path().join("config.toml");
        std::fs::write(&config_path, test_config(port, &log_path))?;

        let child = Command::new(env!("CARGO_BIN_EXE_chatrelayd"))
            .arg(&config_path)
            .spawn()?;

        let server = Self {
            child,
            port,
            data_dir,
        };

        server.wait_until_ready().await?;

        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Connect and register a client under `nick`.
    pub async fn connect(&self, nick: &str) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::register(&self.address(), nick).await
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.path().join("messages.log")
    }

    /// Current contents of the chat log, one entry per line.
    pub fn history(&self) -> Vec<String> {
        std::fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

fn test_config(port: u16, log_path: &std::path::Path) -> String {
    format!(
        r#"
[server]
name = "test.relay"
metrics_port = 0

[listen]
address = "127.0.0.1:{port}"

[timeouts]
shutdown_grace = 1

[history]
path = "{}"
replay_count = 10

[delivery]
queue_capacity = 15
policy = "bounded-retry"
max_retries = 3
retry_timeout_ms = 500
"#,
        log_path.display()
    )
}

/// Path of the server binary under test.
pub fn binary() -> &'static str {
    env!("CARGO_BIN_EXE_chatrelayd")
}
