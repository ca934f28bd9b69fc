pub mod config;
pub mod error;
pub mod game;
pub mod lobby;
pub mod net;
pub mod run;
pub mod ui;

#[cfg(test)]
mod test_helpers;

pub use lobby::{LobbySession, SessionState};
pub use net::{LobbyTransport, RenetTransport};
