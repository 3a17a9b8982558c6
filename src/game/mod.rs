//! Lobby state, player records, and the broadcast relay

pub mod lobby;
pub mod player;
pub mod relay;

pub use lobby::Lobby;
