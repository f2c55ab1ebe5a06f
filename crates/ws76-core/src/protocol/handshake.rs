//! Key decoding and verification token computation for the draft-76
//! opening handshake.
//!
//! # How the handshake proves the server understood the request
//!
//! The client sends two obfuscated keys (`Sec-WebSocket-Key1` and
//! `Sec-WebSocket-Key2`) plus 8 raw bytes after the header block.  Each key
//! hides a number: take every decimal digit in order, read them as one
//! integer, and divide by the number of spaces in the key.
//!
//! ```text
//! "18x 6]8vM;54 *(5:  {   U1]8  z [  8"
//!   digits = 1868545188, spaces = 12  ->  155712099
//! ```
//!
//! The two numbers (4 bytes each, big-endian) and the 8 challenge bytes form
//! a 16-byte block.  Its digest is the verification token the server appends
//! to its response.
//!
//! ```text
//! [key1:4][key2:4][challenge:8] --digest--> token
//! ```
//!
//! Draft-76 peers expect an MD5 token (16 bytes).  [`DigestAlgorithm::Sha256`]
//! is the default here and yields a 32-byte token over the same input block.

use std::fmt;
use std::str::FromStr;

use md5::Md5;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Number of raw challenge bytes that follow the request header block.
pub const CHALLENGE_LEN: usize = 8;

/// Size of the block fed to the digest.
pub const TOKEN_INPUT_LEN: usize = 16;

/// Why a handshake key could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDecodeReason {
    /// The key contains no decimal digits.
    NoDigits,
    /// The key contains numeric characters outside `0-9`.
    NonNumeric,
    /// The concatenated digits do not fit in 64 bits.
    DigitOverflow,
    /// The key contains no space characters, so the divisor would be zero.
    NoSpaces,
}

impl fmt::Display for KeyDecodeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoDigits => "key contains no digits",
            Self::NonNumeric => "key contains non-ASCII numeric characters",
            Self::DigitOverflow => "key digits overflow a 64-bit integer",
            Self::NoSpaces => "key contains no spaces",
        };
        f.write_str(text)
    }
}

/// Errors raised while answering an upgrade request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    /// A `Sec-WebSocket-Key1`/`Key2` value is unusable.
    #[error("cannot decode handshake key {key:?}: {reason}")]
    KeyDecode { key: String, reason: KeyDecodeReason },

    /// A header needed to build the response is absent.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// The raw request is shorter than the 8-byte challenge.
    #[error("challenge needs 8 bytes, request has {available}")]
    ChallengeTooShort { available: usize },

    /// The request could not be parsed as an HTTP GET upgrade request.
    #[error("malformed upgrade request: {0}")]
    MalformedRequest(String),
}

/// Digest applied to the 16-byte token input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    /// SHA-256, 32-byte token.
    #[default]
    Sha256,
    /// MD5, 16-byte token.  Interoperates with draft-76 clients.
    Md5,
}

impl DigestAlgorithm {
    /// Length in bytes of the token this algorithm produces.
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Md5 => 16,
        }
    }

    /// Hashes `input`.
    pub fn digest(self, input: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(input).to_vec(),
            Self::Md5 => Md5::digest(input).to_vec(),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => f.write_str("sha256"),
            Self::Md5 => f.write_str("md5"),
        }
    }
}

/// Returned when a digest name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown digest algorithm {0:?} (expected \"sha256\" or \"md5\")")]
pub struct UnknownDigestError(pub String);

impl FromStr for DigestAlgorithm {
    type Err = UnknownDigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "md5" => Ok(Self::Md5),
            _ => Err(UnknownDigestError(s.to_string())),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes the number hidden in a handshake key.
///
/// The numeric characters of `key`, in order, form a `u64` that is divided
/// (truncating) by the count of `' '` characters.  The quotient is truncated
/// to its low 32 bits.
///
/// Every Unicode numeric character is gathered, not only `0-9`, so a key
/// carrying e.g. an Arabic-Indic digit is rejected instead of having that
/// digit silently dropped.
///
/// # Errors
///
/// Returns [`HandshakeError::KeyDecode`] when the key has no digits, when a
/// gathered digit is not ASCII, when the digits overflow `u64`, or when it
/// has no spaces.
///
/// # Examples
///
/// ```rust
/// use ws76_core::protocol::handshake::parse_key;
///
/// assert_eq!(parse_key("18x 6]8vM;54 *(5:  {   U1]8  z [  8").unwrap(), 155_712_099);
/// assert!(parse_key("12345").is_err());
/// ```
pub fn parse_key(key: &str) -> Result<u32, HandshakeError> {
    let fail = |reason| HandshakeError::KeyDecode {
        key: key.to_string(),
        reason,
    };

    let spaces = key.chars().filter(|&c| c == ' ').count() as u64;
    let digits: String = key.chars().filter(|c| c.is_numeric()).collect();

    if digits.is_empty() {
        return Err(fail(KeyDecodeReason::NoDigits));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(fail(KeyDecodeReason::NonNumeric));
    }
    let number: u64 = digits
        .parse()
        .map_err(|_| fail(KeyDecodeReason::DigitOverflow))?;
    if spaces == 0 {
        return Err(fail(KeyDecodeReason::NoSpaces));
    }

    Ok((number / spaces) as u32)
}

/// Builds the 16-byte digest input: key1 (big-endian), key2 (big-endian),
/// then the challenge.
///
/// # Errors
///
/// Propagates [`parse_key`] failures.
pub fn challenge_input(
    key1: &str,
    key2: &str,
    challenge: &[u8; CHALLENGE_LEN],
) -> Result<[u8; TOKEN_INPUT_LEN], HandshakeError> {
    let mut input = [0u8; TOKEN_INPUT_LEN];
    input[0..4].copy_from_slice(&parse_key(key1)?.to_be_bytes());
    input[4..8].copy_from_slice(&parse_key(key2)?.to_be_bytes());
    input[8..16].copy_from_slice(challenge);
    Ok(input)
}

/// Computes the verification token for a key pair and challenge.
///
/// # Errors
///
/// Propagates [`parse_key`] failures.
///
/// # Examples
///
/// ```rust
/// use ws76_core::protocol::handshake::{compute_token, DigestAlgorithm};
///
/// let token = compute_token(
///     "18x 6]8vM;54 *(5:  {   U1]8  z [  8",
///     "1_ tx7X d  <  nw  334J702) 7]o}` 0",
///     b"Tm[K T2u",
///     DigestAlgorithm::Md5,
/// )
/// .unwrap();
/// assert_eq!(token, b"fQJ,fN/4F4!~K~MH");
/// ```
pub fn compute_token(
    key1: &str,
    key2: &str,
    challenge: &[u8; CHALLENGE_LEN],
    digest: DigestAlgorithm,
) -> Result<Vec<u8>, HandshakeError> {
    let input = challenge_input(key1, key2, challenge)?;
    Ok(digest.digest(&input))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
