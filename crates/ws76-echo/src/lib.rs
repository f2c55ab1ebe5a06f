//! ws76-echo library crate.
//!
//! A small server that speaks the draft-76 WebSocket protocol through
//! `ws76-core` and echoes every text message back to the connection that
//! sent it.
//!
//! # Architecture
//!
//! ```text
//! TCP client (draft-76 WebSocket)
//!         ↕
//! [ws76-echo]
//!   ├── domain/          EchoConfig
//!   ├── application/     EchoSession: handshake + framing state machine (no I/O)
//!   └── infrastructure/  Tokio accept loop, per-connection read/write task
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `ws76-core` only; it turns
//!   received bytes into bytes to send.
//! - `infrastructure` owns sockets and Tokio tasks.

/// Domain layer: configuration types.
pub mod domain;

/// Application layer: the per-connection protocol state machine.
pub mod application;

/// Infrastructure layer: TCP listener and connection tasks.
pub mod infrastructure;
