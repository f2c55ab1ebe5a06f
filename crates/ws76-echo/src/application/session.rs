//! Per-connection protocol state machine.
//!
//! ```text
//! AwaitingHandshake --request + challenge complete--> Open
//!         │                                            │
//!         └──────────── any protocol error ────────────┴──> Closed
//! ```
//!
//! Every call to [`EchoSession::on_bytes`] appends the newly read bytes to
//! the session's [`FrameBuffer`] and returns the byte sequences the host must
//! write, in order: the handshake response first (once), then one echo frame
//! per decoded message.  Bytes that arrive together with the upgrade request
//! are kept and decoded as frames right after the handshake.

use thiserror::Error;
use tracing::debug;

use ws76_core::protocol::frame::encode_text_frame;
use ws76_core::{
    build_response, CodecConfig, FrameBuffer, FrameError, HandshakeError, ParsedRequest,
    UpgradeRequest,
};

use crate::domain::EchoConfig;

/// Largest upgrade request (header block plus challenge) accepted.
pub const MAX_REQUEST_SIZE: usize = 16 * 1024;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the complete upgrade request.
    AwaitingHandshake,
    /// Handshake answered; exchanging frames.
    Open,
    /// A protocol error occurred.  Terminal.
    Closed,
}

/// Reasons a session ends.  All are fatal for that connection only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// An unterminated frame is already long enough that its end sentinel
    /// can only land past the limit.
    #[error("unterminated frame is already {pending} bytes, limit is {max}")]
    PendingFrameTooLarge { pending: usize, max: usize },

    /// The upgrade request grew past [`MAX_REQUEST_SIZE`] without completing.
    #[error("upgrade request exceeds {max} bytes")]
    RequestTooLarge { max: usize },

    /// Bytes were delivered after the session had already failed.
    #[error("session is closed")]
    Closed,
}

/// Handshake and echo logic for one connection.
#[derive(Debug)]
pub struct EchoSession {
    state: SessionState,
    scheme: String,
    codec: CodecConfig,
    echo_prefix: String,
    inbound: FrameBuffer,
}

impl EchoSession {
    /// Creates a session awaiting the upgrade request.
    ///
    /// # Parameters
    ///
    /// - `config` – supplies the scheme, codec limits, echo prefix and the
    ///   initial inbound buffer capacity.  Values are copied; the session does
    ///   not borrow `config`.
    pub fn new(config: &EchoConfig) -> Self {
        Self {
            state: SessionState::AwaitingHandshake,
            scheme: config.scheme.clone(),
            codec: config.codec.clone(),
            echo_prefix: config.echo_prefix.clone(),
            inbound: FrameBuffer::with_capacity(config.read_buffer_size),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` once the handshake response has been produced and
    /// until the first protocol error.
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Feeds newly received bytes and returns what to write back, in order.
    ///
    /// # Errors
    ///
    /// Any [`SessionError`] moves the session to [`SessionState::Closed`];
    /// later calls return [`SessionError::Closed`].  The host should drop
    /// the connection.
    pub fn on_bytes(&mut self, bytes: &[u8]) -> Result<Vec<Vec<u8>>, SessionError> {
        if self.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }

        self.inbound.extend_from_slice(bytes);
        let result = self.advance();
        if result.is_err() {
            self.state = SessionState::Closed;
            self.inbound.clear();
        }
        result
    }

    fn advance(&mut self) -> Result<Vec<Vec<u8>>, SessionError> {
        let mut outgoing = Vec::new();

        if self.state == SessionState::AwaitingHandshake {
            let Some(request) = ParsedRequest::parse(self.inbound.as_slice(), &self.scheme)? else {
                if self.inbound.len() > MAX_REQUEST_SIZE {
                    return Err(SessionError::RequestTooLarge {
                        max: MAX_REQUEST_SIZE,
                    });
                }
                return Ok(outgoing);
            };

            let response =
                build_response(&request, request.requested_subprotocol(), self.codec.digest)?;
            self.inbound.consume(request.consumed());
            self.state = SessionState::Open;
            debug!(path = %request.path(), digest = %self.codec.digest, "handshake answered");
            outgoing.push(response);
        }

        let prefix = &self.echo_prefix;
        self.inbound.decode_with(&self.codec, |message| {
            outgoing.push(encode_text_frame(&format!("{prefix}{message}")));
        })?;

        let pending = self.inbound.len();
        if pending > self.codec.max_message_size {
            return Err(SessionError::PendingFrameTooLarge {
                pending,
                max: self.codec.max_message_size,
            });
        }

        Ok(outgoing)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
