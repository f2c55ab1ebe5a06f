//! Echo server configuration.
//!
//! [`EchoConfig`] holds every runtime setting.  `main.rs` fills it from CLI
//! arguments and environment variables; tests use [`EchoConfig::default`].

use std::net::SocketAddr;

use ws76_core::CodecConfig;

/// All runtime configuration for the echo server.
///
/// Built once at startup and shared across connection tasks behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use ws76_echo::domain::EchoConfig;
///
/// let cfg = EchoConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8181);
/// assert_eq!(cfg.echo_prefix, "Echo: ");
/// ```
#[derive(Debug, Clone)]
pub struct EchoConfig {
    /// Address the TCP listener binds to.
    pub bind_addr: SocketAddr,

    /// Scheme reported in `Sec-WebSocket-Location` (`"ws"`, or `"wss"` when
    /// TLS is terminated in front of this server).
    pub scheme: String,

    /// Frame size limit and handshake digest.
    pub codec: CodecConfig,

    /// Size of the per-connection socket read buffer.
    pub read_buffer_size: usize,

    /// Text prepended to every echoed message.
    pub echo_prefix: String,
}

impl Default for EchoConfig {
    /// | Field            | Default          |
    /// |------------------|------------------|
    /// | bind_addr        | `0.0.0.0:8181`   |
    /// | scheme           | `ws`             |
    /// | codec            | 5 MiB, SHA-256   |
    /// | read_buffer_size | 4096             |
    /// | echo_prefix      | `"Echo: "`       |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8181)),
            scheme: "ws".to_string(),
            codec: CodecConfig::default(),
            read_buffer_size: 4096,
            echo_prefix: "Echo: ".to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
