//! Sentinel-delimited text framing for the draft-76 WebSocket protocol.
//!
//! Wire format:
//! ```text
//! [0x00][utf8 payload:N][0xFF]
//! ```
//! There is no length prefix: a frame ends at the first `0xFF` after its
//! start byte.  `0xFF` never occurs in well-formed UTF-8, so text payloads
//! cannot contain the end sentinel.
//!
//! # Incremental decoding
//!
//! TCP delivers a byte stream, not messages.  One `read()` may return half a
//! frame, or three frames and the start of a fourth.  The host appends every
//! chunk it reads to a per-connection [`FrameBuffer`] and calls
//! [`decode_frames`] after each append.  Complete frames are removed from the
//! front of the buffer and handed to the callback in order; an unterminated
//! frame stays buffered until more bytes arrive.
//!
//! ```text
//! read #1: 00 68 69 FF 00 6F      -> emits "hi", buffer = [00 6F]
//! read #2: 6B FF                  -> emits "ok", buffer = []
//! ```

use thiserror::Error;
use tracing::{debug, trace};

use crate::config::CodecConfig;

/// First byte of every frame.
pub const FRAME_START: u8 = 0x00;

/// Last byte of every frame.
pub const FRAME_END: u8 = 0xFF;

/// Largest accepted offset of the end sentinel, counted from the start
/// sentinel (5 MiB).
pub const MAX_MESSAGE_SIZE: usize = 5 * 1024 * 1024;

/// Consumed prefix length past which [`FrameBuffer`] considers compacting.
const COMPACT_THRESHOLD: usize = 4096;

/// Fatal framing errors.  The connection that produced one must be closed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The next unread byte is not the start sentinel.
    #[error("malformed frame: expected start byte 0x00, found 0x{found:02X}")]
    MalformedFrame { found: u8 },

    /// The end sentinel sits further from the start sentinel than allowed.
    #[error("message too big: end sentinel at offset {length}, limit is {max}")]
    MessageTooBig { length: usize, max: usize },
}

// ── Incoming buffer ───────────────────────────────────────────────────────────

/// Growable buffer of received bytes that have not yet been decoded.
///
/// Consumed bytes are skipped with a read cursor instead of being shifted
/// out on every frame, so draining many small frames is linear in the
/// number of bytes.  The backing vector is compacted only once the consumed
/// prefix is both larger than a few KiB and larger than the unread tail.
///
/// A `FrameBuffer` belongs to exactly one connection.  It is `Send` but
/// decoding takes `&mut self`, so concurrent decodes on the same buffer are
/// ruled out by the borrow checker.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    bytes: Vec<u8>,
    /// Index of the first unread byte in `bytes`.
    start: usize,
    /// Number of unread bytes already searched for the end sentinel without
    /// a hit.  Lets a large partial frame be scanned once, not once per read.
    scanned: usize,
}

impl FrameBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            start: 0,
            scanned: 0,
        }
    }

    /// Appends newly received bytes at the back.
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// The unread bytes, oldest first.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[self.start..]
    }

    /// Number of unread bytes.
    pub fn len(&self) -> usize {
        self.bytes.len() - self.start
    }

    /// Returns `true` when every received byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes `n` bytes from the front.  `n` is clamped to [`len`](Self::len).
    pub fn consume(&mut self, n: usize) {
        self.start += n.min(self.len());
        self.scanned = 0;

        if self.start == self.bytes.len() {
            // Everything read: rewind instead of moving anything.
            self.bytes.clear();
            self.start = 0;
        } else if self.start >= COMPACT_THRESHOLD && self.start >= self.len() {
            self.bytes.drain(..self.start);
            self.start = 0;
        }
    }

    /// Drops every unread byte.
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.start = 0;
        self.scanned = 0;
    }

    /// Decodes all complete frames using the limits in `config`.
    ///
    /// See [`decode_frames`].
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] on a malformed or oversized frame.
    pub fn decode_with<F>(&mut self, config: &CodecConfig, emit: F) -> Result<usize, FrameError>
    where
        F: FnMut(String),
    {
        decode_frames(self, config.max_message_size, emit)
    }
}

impl From<Vec<u8>> for FrameBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            start: 0,
            scanned: 0,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `text` as a single frame: `0x00`, the UTF-8 bytes, `0xFF`.
///
/// # Examples
///
/// ```rust
/// use ws76_core::protocol::frame::encode_text_frame;
///
/// assert_eq!(encode_text_frame("hi"), vec![0x00, 0x68, 0x69, 0xFF]);
/// ```
pub fn encode_text_frame(text: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(text.len() + 2);
    encode_text_frame_into(text, &mut frame);
    frame
}

/// Appends the frame for `text` to `dst`.
///
/// Lets a host reuse one outgoing buffer for many writes; `dst` is never
/// cleared, so several frames can be batched into a single write.
pub fn encode_text_frame_into(text: &str, dst: &mut Vec<u8>) {
    dst.reserve(text.len() + 2);
    dst.push(FRAME_START);
    dst.extend_from_slice(text.as_bytes());
    dst.push(FRAME_END);
}

/// Decodes every complete frame at the front of `buf`.
///
/// Each payload is passed to `emit` in arrival order and its frame is
/// removed from the buffer.  Decoding stops without error when the buffer is
/// empty or holds only the beginning of a frame; call again after appending
/// more bytes.  Returns the number of messages emitted by this call.
///
/// Payload bytes that are not valid UTF-8 are replaced with U+FFFD.
///
/// # Errors
///
/// - [`FrameError::MalformedFrame`] if the next unread byte is not `0x00`.
/// - [`FrameError::MessageTooBig`] if the end sentinel is found more than
///   `max_message_size` bytes after the start sentinel.
///
/// Messages decoded before the failing frame have already been emitted.
///
/// # Examples
///
/// ```rust
/// use ws76_core::protocol::frame::{decode_frames, FrameBuffer, MAX_MESSAGE_SIZE};
///
/// let mut buf = FrameBuffer::new();
/// buf.extend_from_slice(&[0x00, b'h', b'i', 0xFF, 0x00, b'o']);
///
/// let mut messages = Vec::new();
/// let n = decode_frames(&mut buf, MAX_MESSAGE_SIZE, |m| messages.push(m)).unwrap();
/// assert_eq!(n, 1);
/// assert_eq!(messages, vec!["hi".to_string()]);
/// assert_eq!(buf.as_slice(), &[0x00, b'o']);
/// ```
pub fn decode_frames<F>(
    buf: &mut FrameBuffer,
    max_message_size: usize,
    mut emit: F,
) -> Result<usize, FrameError>
where
    F: FnMut(String),
{
    let mut emitted = 0;

    while !buf.is_empty() {
        let pending = buf.as_slice();
        if pending[0] != FRAME_START {
            return Err(FrameError::MalformedFrame { found: pending[0] });
        }

        let search_from = buf.scanned.max(1);
        let end = match pending[search_from..].iter().position(|&b| b == FRAME_END) {
            Some(offset) => search_from + offset,
            None => {
                let pending_len = pending.len();
                buf.scanned = pending_len;
                debug!(pending_len, "end sentinel not found, waiting for more data");
                return Ok(emitted);
            }
        };

        if end > max_message_size {
            return Err(FrameError::MessageTooBig {
                length: end,
                max: max_message_size,
            });
        }

        let message = String::from_utf8_lossy(&pending[1..end]).into_owned();
        buf.consume(end + 1);
        trace!(len = message.len(), "decoded text frame");
        emit(message);
        emitted += 1;
    }

    Ok(emitted)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(buf: &mut FrameBuffer) -> Result<Vec<String>, FrameError> {
        let mut out = Vec::new();
        decode_frames(buf, MAX_MESSAGE_SIZE, |m| out.push(m))?;
        Ok(out)
    }

    // ── Encoding ─────────────────────────────────────────────────────────────

    #[test]
    fn test_encode_hi_matches_wire_bytes() {
        assert_eq!(encode_text_frame("hi"), vec![0x00, 0x68, 0x69, 0xFF]);
    }

    #[test]
    fn test_encode_empty_string_is_two_sentinels() {
        assert_eq!(encode_text_frame(""), vec![FRAME_START, FRAME_END]);
    }

    #[test]
    fn test_encode_into_appends_without_clearing() {
        let mut out = vec![0xAA];
        encode_text_frame_into("a", &mut out);
        encode_text_frame_into("b", &mut out);
        assert_eq!(out, vec![0xAA, 0x00, b'a', 0xFF, 0x00, b'b', 0xFF]);
    }

    // ── Decoding ─────────────────────────────────────────────────────────────

    #[test]
    fn test_decode_single_frame_empties_buffer() {
        let mut buf = FrameBuffer::from(encode_text_frame("hi"));
        assert_eq!(decode_all(&mut buf).unwrap(), vec!["hi"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_empty_payload() {
        let mut buf = FrameBuffer::from(vec![FRAME_START, FRAME_END]);
        assert_eq!(decode_all(&mut buf).unwrap(), vec![""]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_multibyte_utf8() {
        let text = "héllo wörld ✓ 🚀";
        let mut buf = FrameBuffer::from(encode_text_frame(text));
        assert_eq!(decode_all(&mut buf).unwrap(), vec![text]);
    }

    #[test]
    fn test_decode_empty_buffer_emits_nothing() {
        let mut buf = FrameBuffer::new();
        let n = decode_frames(&mut buf, MAX_MESSAGE_SIZE, |_| panic!("no message expected"))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_decode_partial_frame_is_not_an_error() {
        // Arrange: start sentinel and payload, no end sentinel yet
        let mut buf = FrameBuffer::from(vec![0x00, b'a', b'b']);

        // Act
        let messages = decode_all(&mut buf).unwrap();

        // Assert: nothing emitted, buffer untouched
        assert!(messages.is_empty());
        assert_eq!(buf.as_slice(), &[0x00, b'a', b'b']);
    }

    #[test]
    fn test_decode_lone_start_byte_waits() {
        let mut buf = FrameBuffer::from(vec![0x00]);
        assert!(decode_all(&mut buf).unwrap().is_empty());
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_decode_resumes_after_more_bytes_arrive() {
        let mut buf = FrameBuffer::new();
        buf.extend_from_slice(&[0x00, b'h']);
        assert!(decode_all(&mut buf).unwrap().is_empty());

        buf.extend_from_slice(&[b'i', 0xFF]);
        assert_eq!(decode_all(&mut buf).unwrap(), vec!["hi"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_scan_hint_does_not_skip_end_sentinel() {
        // The end sentinel arrives as the very first byte of the second chunk,
        // right where the previous scan stopped.
        let mut buf = FrameBuffer::from(vec![0x00, b'x', b'y', b'z']);
        assert!(decode_all(&mut buf).unwrap().is_empty());
        buf.extend_from_slice(&[0xFF, 0x00, b'q']);
        assert_eq!(decode_all(&mut buf).unwrap(), vec!["xyz"]);
        assert_eq!(buf.as_slice(), &[0x00, b'q']);
        buf.extend_from_slice(&[0xFF]);
        assert_eq!(decode_all(&mut buf).unwrap(), vec!["q"]);
    }

    #[test]
    fn test_decode_several_frames_in_order() {
        let mut bytes = encode_text_frame("one");
        bytes.extend(encode_text_frame("two"));
        bytes.extend(encode_text_frame(""));
        bytes.extend(encode_text_frame("three"));
        let mut buf = FrameBuffer::from(bytes);

        let mut out = Vec::new();
        let n = decode_frames(&mut buf, MAX_MESSAGE_SIZE, |m| out.push(m)).unwrap();

        assert_eq!(n, 4);
        assert_eq!(out, vec!["one", "two", "", "three"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_leaves_trailing_partial_frame() {
        let mut bytes = encode_text_frame("done");
        bytes.extend_from_slice(&[0x00, b'n', b'o']);
        let mut buf = FrameBuffer::from(bytes);

        assert_eq!(decode_all(&mut buf).unwrap(), vec!["done"]);
        assert_eq!(buf.as_slice(), &[0x00, b'n', b'o']);
    }

    #[test]
    fn test_decode_nul_bytes_inside_payload_are_kept() {
        let mut buf = FrameBuffer::from(vec![0x00, b'a', 0x00, b'b', 0xFF]);
        assert_eq!(decode_all(&mut buf).unwrap(), vec!["a\0b"]);
    }

    #[test]
    fn test_decode_invalid_utf8_is_replaced() {
        let mut buf = FrameBuffer::from(vec![0x00, b'a', 0xC3, 0x28, 0xFF]);
        assert_eq!(decode_all(&mut buf).unwrap(), vec!["a\u{FFFD}("]);
    }

    // ── Errors ───────────────────────────────────────────────────────────────

    #[test]
    fn test_decode_wrong_start_byte_is_malformed() {
        let mut buf = FrameBuffer::from(vec![b'h', b'i', 0xFF]);
        let mut count = 0;
        let result = decode_frames(&mut buf, MAX_MESSAGE_SIZE, |_| count += 1);
        assert_eq!(result, Err(FrameError::MalformedFrame { found: b'h' }));
        assert_eq!(count, 0);
    }

    #[test]
    fn test_decode_stray_end_byte_is_malformed() {
        let mut buf = FrameBuffer::from(vec![0xFF]);
        assert_eq!(
            decode_all(&mut buf),
            Err(FrameError::MalformedFrame { found: 0xFF })
        );
    }

    #[test]
    fn test_decode_emits_good_frames_before_malformed_one() {
        let mut bytes = encode_text_frame("ok");
        bytes.extend_from_slice(&[0x7F, 0xFF]);
        let mut buf = FrameBuffer::from(bytes);

        let mut out = Vec::new();
        let result = decode_frames(&mut buf, MAX_MESSAGE_SIZE, |m| out.push(m));

        assert_eq!(result, Err(FrameError::MalformedFrame { found: 0x7F }));
        assert_eq!(out, vec!["ok"]);
    }

    #[test]
    fn test_decode_end_offset_at_limit_is_accepted() {
        // Limit 4: end sentinel at offset 4 means 3 payload bytes.
        let mut buf = FrameBuffer::from(vec![0x00, b'a', b'b', b'c', 0xFF]);
        let mut out = Vec::new();
        decode_frames(&mut buf, 4, |m| out.push(m)).unwrap();
        assert_eq!(out, vec!["abc"]);
    }

    #[test]
    fn test_decode_end_offset_past_limit_is_too_big() {
        let mut buf = FrameBuffer::from(vec![0x00, b'a', b'b', b'c', b'd', 0xFF]);
        let result = decode_frames(&mut buf, 4, |_| {});
        assert_eq!(result, Err(FrameError::MessageTooBig { length: 5, max: 4 }));
    }

    #[test]
    fn test_decode_with_uses_config_limit() {
        let config = CodecConfig::default().with_max_message_size(2);
        let mut buf = FrameBuffer::from(encode_text_frame("abc"));
        let result = buf.decode_with(&config, |_| {});
        assert!(matches!(result, Err(FrameError::MessageTooBig { .. })));
    }

    // ── FrameBuffer ──────────────────────────────────────────────────────────

    #[test]
    fn test_consume_clamps_to_len() {
        let mut buf = FrameBuffer::from(vec![1, 2, 3]);
        buf.consume(10);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_consume_then_append_keeps_order() {
        let mut buf = FrameBuffer::from(vec![1, 2, 3, 4]);
        buf.consume(2);
        buf.extend_from_slice(&[5, 6]);
        assert_eq!(buf.as_slice(), &[3, 4, 5, 6]);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_compaction_preserves_unread_bytes() {
        // Arrange: many small frames followed by a partial one
        let mut bytes = Vec::new();
        for _ in 0..2000 {
            bytes.extend(encode_text_frame("abc"));
        }
        bytes.extend_from_slice(&[0x00, b't', b'a', b'i', b'l']);
        let mut buf = FrameBuffer::from(bytes);

        // Act
        let messages = decode_all(&mut buf).unwrap();

        // Assert
        assert_eq!(messages.len(), 2000);
        assert_eq!(buf.as_slice(), &[0x00, b't', b'a', b'i', b'l']);
        buf.extend_from_slice(&[0xFF]);
        assert_eq!(decode_all(&mut buf).unwrap(), vec!["tail"]);
    }

    #[test]
    fn test_clear_discards_everything() {
        let mut buf = FrameBuffer::from(vec![0x00, b'a']);
        buf.clear();
        assert!(buf.is_empty());
        assert!(decode_all(&mut buf).unwrap().is_empty());
    }

    #[test]
    fn test_frame_error_display_shows_found_byte() {
        let err = FrameError::MalformedFrame { found: 0x0A };
        assert_eq!(
            err.to_string(),
            "malformed frame: expected start byte 0x00, found 0x0A"
        );
    }
}
