use std::fmt;

use common::protocol::RoomInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    ServerMultiplayer,
}

/// Everything a game session needs to take over from the lobby, including
/// ownership of the live room connection.
pub struct GameInit<T> {
    pub mode: GameMode,
    pub address: String,
    pub room: RoomInfo,
    pub transport: T,
}

impl<T> fmt::Debug for GameInit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameInit")
            .field("mode", &self.mode)
            .field("address", &self.address)
            .field("room", &self.room)
            .finish_non_exhaustive()
    }
}

/// A refused launch. The init parameters come back so the lobby keeps its
/// connection.
#[derive(Debug)]
pub struct Rejected<T> {
    pub reason: String,
    pub init: GameInit<T>,
}

impl<T> Rejected<T> {
    pub fn new(reason: impl Into<String>, init: GameInit<T>) -> Self {
        Self {
            reason: reason.into(),
            init,
        }
    }
}

pub trait GameLauncher<T> {
    fn launch(&mut self, init: GameInit<T>) -> Result<(), Rejected<T>>;
}
