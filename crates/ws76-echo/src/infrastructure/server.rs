//! TCP accept loop and per-connection byte pump.
//!
//! Each accepted connection runs in its own Tokio task.  The task owns one
//! [`EchoSession`] and loops: read whatever bytes arrived, hand them to the
//! session, write back what it returns.  TCP may split or coalesce both the
//! upgrade request and frames arbitrarily; the session buffers across reads,
//! so this loop never needs to know where a message boundary is.
//!
//! A protocol error ends only the connection it happened on.  Shutdown is
//! cooperative: the accept loop checks a shared `AtomicBool` every 200 ms.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::application::EchoSession;
use crate::domain::EchoConfig;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Runs the accept loop until `running` is set to `false`.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.  Per-connection
/// failures are logged and never end the loop.
pub async fn run_server(config: EchoConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", config.bind_addr))?;

    info!(
        "draft-76 echo server listening on {}",
        listener.local_addr().unwrap_or(config.bind_addr)
    );

    let config = Arc::new(config);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("new connection from {peer_addr}");
                let cfg = Arc::clone(&config);
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, cfg).await;
                });
            }
            Ok(Err(e)) => {
                error!("accept error: {e}");
            }
            Err(_) => {
                // No connection within the poll interval; re-check the flag.
            }
        }
    }

    Ok(())
}

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, config: Arc<EchoConfig>) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("connection {peer_addr}: set_nodelay failed: {e}");
    }

    let conn_id = peer_addr.to_string();
    match serve_connection(stream, &config, &conn_id).await {
        Ok(()) => info!("connection {conn_id} closed normally"),
        Err(e) => warn!("connection {conn_id} closed with error: {e:#}"),
    }
}

/// Drives one connection to completion.
///
/// Returns `Ok(())` when the peer closes its side.  Generic over the stream
/// so tests can run it against an in-memory pipe.
///
/// # Errors
///
/// Returns an error on a read or write failure, or when the session rejects
/// the peer's bytes (bad handshake, malformed or oversized frame).
pub async fn serve_connection<S>(
    mut stream: S,
    config: &EchoConfig,
    conn_id: &str,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut session = EchoSession::new(config);
    let mut read_tmp = vec![0u8; config.read_buffer_size.max(1)];

    loop {
        let n = stream
            .read(&mut read_tmp)
            .await
            .with_context(|| format!("connection {conn_id}: read failed"))?;
        if n == 0 {
            debug!("connection {conn_id}: peer closed (EOF)");
            return Ok(());
        }

        let was_open = session.is_open();
        let outgoing = session
            .on_bytes(&read_tmp[..n])
            .with_context(|| format!("connection {conn_id}: protocol error"))?;

        if !was_open && session.is_open() {
            info!("connection {conn_id}: handshake complete");
        }

        for bytes in &outgoing {
            stream
                .write_all(bytes)
                .await
                .with_context(|| format!("connection {conn_id}: write failed"))?;
        }
        if !outgoing.is_empty() {
            stream
                .flush()
                .await
                .with_context(|| format!("connection {conn_id}: flush failed"))?;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
