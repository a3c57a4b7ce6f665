//! chatrelay - terminal client for chatrelayd.
//!
//! Usage: `chatrelay [ADDRESS] [CACHE_PATH]`
//!
//! Lines typed on stdin go to the server. Lines from the server are printed
//! and appended to a local cache, whose tail is shown on the next start.

use anyhow::Context as _;
use chatrelay::history::{FileHistory, HistoryProvider};
use chatrelay::signal::shutdown_signal;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDRESS: &str = "127.0.0.1:7000";
const DEFAULT_CACHE_PATH: &str = "messages.log";
const CACHE_REPLAY: usize = 5;
const INPUT_PROMPT: &str = ">> ";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Chat owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let address = args.next().unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    let cache_path = args
        .next()
        .unwrap_or_else(|| DEFAULT_CACHE_PATH.to_string());

    let stream = TcpStream::connect(&address)
        .await
        .with_context(|| format!("failed to connect to {address}"))?;
    let cache = FileHistory::open(&cache_path)
        .await
        .with_context(|| format!("failed to open message cache {cache_path}"))?;

    show_cache(&cache).await;
    let outcome = run(stream, &cache).await;
    let _ = std::io::stdout().flush();

    // A pending stdin read would keep the runtime from shutting down.
    match outcome {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    }
}

/// Print the newest cached lines between two rules.
async fn show_cache(cache: &FileHistory) {
    match cache.last_n(CACHE_REPLAY).await {
        Ok(lines) if !lines.is_empty() => {
            let rule = format!("|{}|", "-".repeat(58));
            println!("CLIENT CACHE");
            println!("{rule}");
            for line in &lines {
                println!("{line}");
            }
            println!("{rule}");
        }
        Ok(_) => println!("Client cache is empty"),
        Err(e) => {
            warn!(error = %e, "Failed to read message cache");
            println!("Client cache is empty");
        }
    }
}

async fn run(stream: TcpStream, cache: &FileHistory) -> anyhow::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut server = BufReader::new(read_half).lines();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    prompt();
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                println!("\nExiting chat...");
                break;
            }
            line = server.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if !line.is_empty()
                        && let Err(e) = cache.append(line).await
                    {
                        warn!(error = %e, "Failed to cache message");
                    }
                    print!("\r{line}\n");
                    prompt();
                }
                Ok(None) => {
                    println!("\nServer disconnected.");
                    return Ok(());
                }
                Err(e) => {
                    println!("\nServer disconnected.");
                    return Err(e).context("error reading from server");
                }
            },
            line = input.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        prompt();
                        continue;
                    }
                    let mut record = String::with_capacity(line.len() + 1);
                    record.push_str(line);
                    record.push('\n');
                    write_half
                        .write_all(record.as_bytes())
                        .await
                        .context("error sending message")?;
                    prompt();
                }
                Ok(None) => {
                    println!("\nExiting chat...");
                    break;
                }
                Err(e) => return Err(e).context("error reading input"),
            },
        }
    }

    if let Err(e) = write_half.shutdown().await {
        warn!(error = %e, "Failed to close connection");
    }
    Ok(())
}

fn prompt() {
    print!("{INPUT_PROMPT}");
    let _ = std::io::stdout().flush();
}
