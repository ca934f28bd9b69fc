use std::fmt;

use common::protocol::RoomInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected { room: RoomInfo },
    /// The link went away without an error, usually because the user left.
    ClosedClean,
    ClosedError { message: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Connected { .. } => "Connected",
            Self::ClosedClean => "ClosedClean",
            Self::ClosedError { .. } => "ClosedError",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ClosedClean | Self::ClosedError { .. })
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    pub fn room(&self) -> Option<&RoomInfo> {
        match self {
            Self::Connected { room } => Some(room),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::ClosedError { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected { room } => write!(f, "Connected to {}", room.name),
            Self::ClosedError { message } => write!(f, "Closed: {}", message),
            other => f.write_str(other.name()),
        }
    }
}
