//! WebSocket protocol engine and session handling

pub mod codec;
pub mod handler;
pub mod handshake;
pub mod protocol;
