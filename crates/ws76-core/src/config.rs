//! Codec configuration.
//!
//! [`CodecConfig`] is a plain struct with no global state: hosts build one at
//! startup (from CLI flags, a file, or defaults) and pass it by reference to
//! every connection.

use crate::protocol::frame::MAX_MESSAGE_SIZE;
use crate::protocol::handshake::DigestAlgorithm;

/// Limits and algorithm choices shared by every connection of a host.
///
/// # Example
///
/// ```rust
/// use ws76_core::{CodecConfig, DigestAlgorithm};
///
/// let cfg = CodecConfig::default();
/// assert_eq!(cfg.max_message_size, 5 * 1024 * 1024);
/// assert_eq!(cfg.digest, DigestAlgorithm::Sha256);
///
/// let legacy = CodecConfig::default().with_digest(DigestAlgorithm::Md5);
/// assert_eq!(legacy.digest, DigestAlgorithm::Md5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Largest allowed offset of a frame's end sentinel from its start
    /// sentinel.  Frames past this limit fail with `MessageTooBig`.
    pub max_message_size: usize,

    /// Digest used to compute the handshake verification token.
    pub digest: DigestAlgorithm,
}

impl CodecConfig {
    /// Returns `self` with the frame size limit replaced.
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Returns `self` with the handshake digest replaced.
    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }
}

impl Default for CodecConfig {
    /// | Field            | Default  |
    /// |------------------|----------|
    /// | max_message_size | 5 MiB    |
    /// | digest           | SHA-256  |
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            digest: DigestAlgorithm::default(),
        }
    }
}
