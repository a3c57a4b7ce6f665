//! Integration tests for the `chatrelay` terminal client.

mod common;

use common::TestServer;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;

/// A running client process driven through its stdin and stdout.
struct ClientProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl ClientProcess {
    fn spawn(address: &str, cache: &Path) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_chatrelay"))
            .arg(address)
            .arg(cache)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn client");
        let stdin = child.stdin.take();
        let stdout = BufReader::new(child.stdout.take().expect("stdout is piped")).lines();
        Self {
            child,
            stdin,
            stdout,
        }
    }

    async fn type_line(&mut self, line: &str) {
        let stdin = self.stdin.as_mut().expect("stdin already closed");
        stdin.write_all(line.as_bytes()).await.unwrap();
        stdin.write_all(b"\n").await.unwrap();
        stdin.flush().await.unwrap();
    }

    /// Read output until a line containing `needle` shows up.
    async fn wait_for(&mut self, needle: &str) {
        let found = timeout(Duration::from_secs(5), async {
            while let Ok(Some(line)) = self.stdout.next_line().await {
                if line.contains(needle) {
                    return true;
                }
            }
            false
        })
        .await;
        assert_eq!(found, Ok(true), "client never printed {needle:?}");
    }

    fn close_stdin(&mut self) {
        self.stdin = None;
    }

    async fn exit_status(mut self) -> ExitStatus {
        timeout(Duration::from_secs(5), self.child.wait())
            .await
            .expect("client did not exit")
            .unwrap()
    }
}

#[tokio::test]
async fn test_client_relays_lines_and_caches_them() {
    let server = TestServer::spawn().await.expect("Failed to spawn server");
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("messages.log");

    let mut bob = server.connect("bob").await.unwrap();
    let mut carol = ClientProcess::spawn(&server.address(), &cache);
    carol.wait_for("Client cache is empty").await;
    carol.wait_for("Enter your nickname:").await;
    carol.type_line("carol").await;
    bob.expect("User carol joined the chat").await.unwrap();

    bob.send("hi carol").await.unwrap();
    carol.wait_for("(bob): hi carol").await;
    carol.type_line("   ").await;
    carol.type_line("hello bob").await;
    bob.expect("(carol): hello bob").await.unwrap();

    carol.close_stdin();
    carol.wait_for("Exiting chat...").await;
    assert!(carol.exit_status().await.success());
    bob.expect("User carol has left the chat").await.unwrap();

    let cached = std::fs::read_to_string(&cache).unwrap();
    assert!(cached.lines().any(|l| l == "(bob): hi carol"), "cache: {cached:?}");
    assert!(cached.lines().all(|l| !l.trim().is_empty()));
}

#[tokio::test]
async fn test_client_shows_cached_tail_on_start() {
    let server = TestServer::spawn().await.expect("Failed to spawn server");
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("messages.log");
    let seeded: String = (1..=8).map(|i| format!("(dave): m{i}\n")).collect();
    std::fs::write(&cache, seeded).unwrap();

    let mut client = ClientProcess::spawn(&server.address(), &cache);
    client.wait_for("CLIENT CACHE").await;
    let mut shown = Vec::new();
    loop {
        let line = timeout(Duration::from_secs(5), client.stdout.next_line())
            .await
            .unwrap()
            .unwrap()
            .expect("client output ended");
        if line.starts_with("|-") && !shown.is_empty() {
            break;
        }
        if !line.starts_with("|-") {
            shown.push(line);
        }
    }
    let expected: Vec<String> = (4..=8).map(|i| format!("(dave): m{i}")).collect();
    assert_eq!(shown, expected);
}

#[cfg(unix)]
#[tokio::test]
async fn test_client_exits_cleanly_on_sigterm() {
    let server = TestServer::spawn().await.expect("Failed to spawn server");
    let dir = tempfile::tempdir().unwrap();

    let mut client = ClientProcess::spawn(&server.address(), &dir.path().join("messages.log"));
    client.wait_for("Enter your nickname:").await;

    let pid = client.child.id().expect("client is running");
    let status = Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status()
        .await
        .unwrap();
    assert!(status.success());

    client.wait_for("Exiting chat...").await;
    assert!(client.exit_status().await.success());
}

#[tokio::test]
async fn test_client_reports_server_disconnect() {
    let server = TestServer::spawn().await.expect("Failed to spawn server");
    let dir = tempfile::tempdir().unwrap();

    let mut client = ClientProcess::spawn(&server.address(), &dir.path().join("messages.log"));
    client.wait_for("Enter your nickname:").await;
    client.type_line("erin").await;
    client.type_line("/exit").await;

    client.wait_for("Server disconnected.").await;
    assert!(client.exit_status().await.success());
}
