//! ws76-echo: draft-76 WebSocket echo server.
//!
//! Accepts legacy (hixie-76) WebSocket clients, answers the key/challenge
//! handshake and echoes every text frame back to its sender with a prefix.
//!
//! # Usage
//!
//! ```text
//! ws76-echo [OPTIONS]
//!
//! Options:
//!   --port <PORT>                 Listener port [default: 8181]
//!   --bind <ADDR>                 Listener IP address [default: 0.0.0.0]
//!   --scheme <SCHEME>             Scheme in Sec-WebSocket-Location [default: ws]
//!   --max-message-size <BYTES>    Frame size limit [default: 5242880]
//!   --digest <sha256|md5>         Handshake token digest [default: sha256]
//!   --read-buffer-size <BYTES>    Socket read size [default: 4096]
//!   --echo-prefix <TEXT>          Prepended to echoed messages [default: "Echo: "]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                | Default   |
//! |-------------------------|-----------|
//! | `WS76_PORT`             | `8181`    |
//! | `WS76_BIND`             | `0.0.0.0` |
//! | `WS76_SCHEME`           | `ws`      |
//! | `WS76_MAX_MESSAGE_SIZE` | `5242880` |
//! | `WS76_DIGEST`           | `sha256`  |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::net::{IpAddr, SocketAddr};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ws76_core::{CodecConfig, DigestAlgorithm};
use ws76_echo::domain::EchoConfig;
use ws76_echo::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Draft-76 WebSocket echo server.
#[derive(Debug, Parser)]
#[command(
    name = "ws76-echo",
    about = "Echo server for draft-76 (hixie-76) WebSocket clients",
    version
)]
struct Cli {
    /// TCP port to listen on.
    #[arg(long, default_value_t = 8181, env = "WS76_PORT")]
    port: u16,

    /// IP address to bind to.
    #[arg(long, default_value = "0.0.0.0", env = "WS76_BIND")]
    bind: String,

    /// Scheme reported in `Sec-WebSocket-Location`.
    ///
    /// Use `wss` when TLS is terminated by a proxy in front of this server.
    #[arg(long, default_value = "ws", env = "WS76_SCHEME")]
    scheme: String,

    /// Largest accepted frame, in bytes.
    #[arg(long, default_value_t = ws76_core::protocol::MAX_MESSAGE_SIZE, env = "WS76_MAX_MESSAGE_SIZE")]
    max_message_size: usize,

    /// Digest for the handshake token: `sha256` or `md5`.
    ///
    /// Stock draft-76 browsers expect `md5`.
    #[arg(long, default_value = "sha256", env = "WS76_DIGEST")]
    digest: String,

    /// Bytes requested per socket read.
    #[arg(long, default_value_t = 4096)]
    read_buffer_size: usize,

    /// Text prepended to each echoed message.
    #[arg(long, default_value = "Echo: ")]
    echo_prefix: String,
}

impl Cli {
    /// Converts the parsed arguments into an [`EchoConfig`].
    ///
    /// `--bind` accepts IPv4 or IPv6 literals (`0.0.0.0`, `::`, `::1`).
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not an IP address or `--digest` names
    /// an unknown algorithm.
    fn into_echo_config(self) -> anyhow::Result<EchoConfig> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;
        let bind_addr = SocketAddr::new(ip, self.port);

        let digest: DigestAlgorithm = self
            .digest
            .parse()
            .with_context(|| format!("invalid --digest value '{}'", self.digest))?;

        Ok(EchoConfig {
            bind_addr,
            scheme: self.scheme,
            codec: CodecConfig::default()
                .with_max_message_size(self.max_message_size)
                .with_digest(digest),
            read_buffer_size: self.read_buffer_size,
            echo_prefix: self.echo_prefix,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_echo_config()?;

    info!(
        "ws76-echo starting: bind={}, digest={}, max_message_size={}",
        config.bind_addr, config.codec.digest, config.codec.max_message_size
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    // The accept loop polls `running` every 200 ms.
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("ws76-echo stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
