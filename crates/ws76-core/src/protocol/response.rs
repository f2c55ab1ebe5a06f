//! Server response to a draft-76 upgrade request.
//!
//! The response is an ASCII header block followed directly by the raw
//! verification token, with no terminator after the token:
//!
//! ```text
//! HTTP/1.1 101 WebSocket Protocol Handshake\r\n
//! Upgrade: WebSocket\r\n
//! Connection: Upgrade\r\n
//! Sec-WebSocket-Origin: <Origin>\r\n
//! Sec-WebSocket-Location: <scheme>://<Host><path>\r\n
//! [Sec-WebSocket-Protocol: <subprotocol>\r\n]
//! \r\n
//! <token bytes>
//! ```

use tracing::debug;

use crate::protocol::handshake::{compute_token, DigestAlgorithm, HandshakeError, CHALLENGE_LEN};

/// Status line of a successful draft-76 upgrade.
pub const STATUS_LINE: &str = "HTTP/1.1 101 WebSocket Protocol Handshake";

/// Request header echoed back as `Sec-WebSocket-Origin`.
pub const ORIGIN_HEADER: &str = "Origin";
/// Request header that supplies the authority of `Sec-WebSocket-Location`.
pub const HOST_HEADER: &str = "Host";
/// First obfuscated key header.
pub const KEY1_HEADER: &str = "Sec-WebSocket-Key1";
/// Second obfuscated key header.
pub const KEY2_HEADER: &str = "Sec-WebSocket-Key2";
/// Subprotocol header, read from the request and echoed in the response.
pub const PROTOCOL_HEADER: &str = "Sec-WebSocket-Protocol";

/// The parts of an upgrade request the handshake needs.
///
/// Implemented by [`crate::protocol::request::ParsedRequest`]; hosts with
/// their own HTTP stack can implement it on their request type instead.
pub trait UpgradeRequest {
    /// URL scheme the connection was accepted on (`"ws"` or `"wss"`).
    fn scheme(&self) -> &str;

    /// Value of the header called `name`, compared ASCII case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;

    /// Request target, e.g. `"/chat"`.
    fn path(&self) -> &str;

    /// The raw request bytes, ending with the 8 challenge bytes.
    fn raw_bytes(&self) -> &[u8];

    /// The last 8 bytes of [`raw_bytes`](Self::raw_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError::ChallengeTooShort`] if fewer than 8 bytes
    /// are available.
    fn challenge(&self) -> Result<[u8; CHALLENGE_LEN], HandshakeError> {
        let raw = self.raw_bytes();
        let available = raw.len();
        if available < CHALLENGE_LEN {
            return Err(HandshakeError::ChallengeTooShort { available });
        }
        let mut challenge = [0u8; CHALLENGE_LEN];
        challenge.copy_from_slice(&raw[available - CHALLENGE_LEN..]);
        Ok(challenge)
    }
}

/// Builds the complete handshake response for `request`.
///
/// `subprotocol` is the protocol the host agreed to, if any; it is echoed in
/// a `Sec-WebSocket-Protocol` header.  Non-ASCII characters in header values
/// are written as `?`.
///
/// # Errors
///
/// - [`HandshakeError::MissingHeader`] if `Origin`, `Host` or either key
///   header is absent.
/// - [`HandshakeError::ChallengeTooShort`] if the raw request is shorter
///   than the challenge.
/// - [`HandshakeError::KeyDecode`] if a key cannot be decoded.
///
/// No bytes are returned unless the whole response could be built.
pub fn build_response<R>(
    request: &R,
    subprotocol: Option<&str>,
    digest: DigestAlgorithm,
) -> Result<Vec<u8>, HandshakeError>
where
    R: UpgradeRequest + ?Sized,
{
    let origin = require_header(request, ORIGIN_HEADER)?;
    let host = require_header(request, HOST_HEADER)?;
    let key1 = require_header(request, KEY1_HEADER)?;
    let key2 = require_header(request, KEY2_HEADER)?;
    let challenge = request.challenge()?;

    let token = compute_token(key1, key2, &challenge, digest)?;

    let mut head = format!(
        "{STATUS_LINE}\r\n\
         Upgrade: WebSocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Origin: {origin}\r\n\
         Sec-WebSocket-Location: {scheme}://{host}{path}\r\n",
        scheme = request.scheme(),
        path = request.path(),
    );
    if let Some(protocol) = subprotocol {
        head.push_str(PROTOCOL_HEADER);
        head.push_str(": ");
        head.push_str(protocol);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    let mut response = to_ascii_lossy(&head);
    response.extend_from_slice(&token);

    debug!(
        %digest,
        token_len = token.len(),
        response_len = response.len(),
        "built draft-76 handshake response"
    );
    Ok(response)
}

/// [`build_response`] with the default digest.
///
/// # Errors
///
/// Same as [`build_response`].
pub fn handshake<R>(request: &R, subprotocol: Option<&str>) -> Result<Vec<u8>, HandshakeError>
where
    R: UpgradeRequest + ?Sized,
{
    build_response(request, subprotocol, DigestAlgorithm::default())
}

fn require_header<'a, R>(request: &'a R, name: &'static str) -> Result<&'a str, HandshakeError>
where
    R: UpgradeRequest + ?Sized,
{
    request.header(name).ok_or(HandshakeError::MissingHeader(name))
}

fn to_ascii_lossy(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
