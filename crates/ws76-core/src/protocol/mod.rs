//! Protocol module: framing codec, handshake computation, response builder
//! and request parser.

pub mod frame;
pub mod handshake;
pub mod request;
pub mod response;

pub use frame::{
    decode_frames, encode_text_frame, encode_text_frame_into, FrameBuffer, FrameError, FRAME_END,
    FRAME_START, MAX_MESSAGE_SIZE,
};
pub use handshake::{
    challenge_input, compute_token, parse_key, DigestAlgorithm, HandshakeError, KeyDecodeReason,
    CHALLENGE_LEN,
};
pub use request::ParsedRequest;
pub use response::{build_response, handshake, UpgradeRequest};
