//! # ws76-core
//!
//! Sans-I/O implementation of the draft-76 ("hixie-76") WebSocket protocol:
//! the sentinel framing codec and the key/challenge opening handshake.
//!
//! The crate never touches a socket.  A host reads bytes from its transport,
//! feeds them to this crate, and writes whatever bytes it gets back.
//!
//! # Connection lifecycle
//!
//! ```text
//! client bytes ──> ParsedRequest::parse ──> build_response ──> 101 + token
//!                                                   │
//! client bytes ──> FrameBuffer ──> decode_frames ──> text messages
//! text to send ──> encode_text_frame ──> 0x00 <utf8> 0xFF
//! ```
//!
//! - **`protocol::frame`** – `0x00`/`0xFF` delimited text frames, decoded
//!   incrementally from a per-connection [`FrameBuffer`].
//! - **`protocol::handshake`** – decodes the two obfuscated keys and digests
//!   them with the 8-byte challenge into the verification token.
//! - **`protocol::response`** – renders the `101` header block and appends
//!   the token.
//! - **`protocol::request`** – parses the raw upgrade request, challenge
//!   included.
//! - **`config`** – [`CodecConfig`], the per-host limits.
//!
//! Everything here is stateless apart from [`FrameBuffer`], which belongs to
//! a single connection.  The functions are safe to call from any number of
//! threads or tasks at once.

pub mod config;
pub mod protocol;

pub use config::CodecConfig;
pub use protocol::frame::{decode_frames, encode_text_frame, FrameBuffer, FrameError};
pub use protocol::handshake::{DigestAlgorithm, HandshakeError};
pub use protocol::request::ParsedRequest;
pub use protocol::response::{build_response, handshake, UpgradeRequest};
