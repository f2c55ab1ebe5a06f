//! Domain layer for ws76-echo.
//!
//! Plain configuration data.  Nothing here reads the environment, opens a
//! socket, or awaits.

pub mod config;

pub use config::EchoConfig;
