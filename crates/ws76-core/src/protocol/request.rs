//! Parser for the client's draft-76 upgrade request.
//!
//! A draft-76 request is an HTTP/1.1 `GET` whose header block is followed by
//! exactly 8 raw bytes (the challenge).  Nothing in the headers announces
//! those bytes, so the parser simply requires 8 more bytes after the blank
//! line before it reports the request as complete.
//!
//! ```text
//! GET /demo HTTP/1.1\r\n
//! Host: example.com\r\n
//! Sec-WebSocket-Key1: 4 @1  46546xW%0l 1 5\r\n
//! ...
//! \r\n
//! ^n:ds[4U                     <- challenge
//! ```

use httparse::Status;
use tracing::trace;

use crate::protocol::handshake::{HandshakeError, CHALLENGE_LEN};
use crate::protocol::response::{UpgradeRequest, PROTOCOL_HEADER};

/// Maximum number of request headers accepted.
pub const MAX_HEADERS: usize = 64;

/// An upgrade request whose header block and challenge have fully arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    scheme: String,
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    raw: Vec<u8>,
}

impl ParsedRequest {
    /// Parses the upgrade request at the start of `raw`.
    ///
    /// Returns `Ok(None)` while the header block or the challenge is still
    /// incomplete; call again once more bytes have been received.  Bytes
    /// after the challenge are not part of the request (they may already be
    /// frames); [`consumed`](Self::consumed) says where the request ends.
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError::MalformedRequest`] if the bytes are not a
    /// valid HTTP request, the method is not `GET`, or a header value is not
    /// UTF-8.
    pub fn parse(raw: &[u8], scheme: &str) -> Result<Option<Self>, HandshakeError> {
        let mut header_buf = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut header_buf);

        let head_len = match req.parse(raw) {
            Ok(Status::Complete(len)) => len,
            Ok(Status::Partial) => return Ok(None),
            Err(e) => return Err(HandshakeError::MalformedRequest(e.to_string())),
        };

        let consumed = head_len + CHALLENGE_LEN;
        if raw.len() < consumed {
            trace!(
                have = raw.len() - head_len,
                "header block complete, waiting for challenge bytes"
            );
            return Ok(None);
        }

        let method = req.method.unwrap_or_default();
        if !method.eq_ignore_ascii_case("GET") {
            return Err(HandshakeError::MalformedRequest(format!(
                "expected GET, got {method}"
            )));
        }

        let headers = req
            .headers
            .iter()
            .map(|h| {
                let value = std::str::from_utf8(h.value).map_err(|_| {
                    HandshakeError::MalformedRequest(format!("header {} is not UTF-8", h.name))
                })?;
                Ok((h.name.to_string(), value.to_string()))
            })
            .collect::<Result<Vec<_>, HandshakeError>>()?;

        Ok(Some(Self {
            scheme: scheme.to_string(),
            method: method.to_string(),
            path: req.path.unwrap_or("/").to_string(),
            headers,
            raw: raw[..consumed].to_vec(),
        }))
    }

    /// Number of bytes of the input that belong to this request, challenge
    /// included.
    pub fn consumed(&self) -> usize {
        self.raw.len()
    }

    /// Request method as sent by the client.  Always some casing of `GET`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// All headers in arrival order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// The client's `Sec-WebSocket-Protocol` header, if it sent one.
    pub fn requested_subprotocol(&self) -> Option<&str> {
        self.header(PROTOCOL_HEADER)
    }
}

impl UpgradeRequest for ParsedRequest {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
