//! Infrastructure layer: the TCP listener and the per-connection read/write
//! loop.  All protocol decisions are delegated to
//! [`crate::application::EchoSession`].

pub mod server;

pub use server::{run_server, serve_connection};
