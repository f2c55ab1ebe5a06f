//! Application layer for ws76-echo.
//!
//! Decides what to send in reply to what was received, without doing any
//! I/O itself.  The infrastructure layer reads from the socket, hands the
//! bytes to an [`EchoSession`], and writes back whatever the session returns.

pub mod session;

pub use session::{EchoSession, SessionError, SessionState};
