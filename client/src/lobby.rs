pub mod latency;
pub mod session;
pub mod state;

pub use latency::{Latency, LatencyLevel, LatencySample};
pub use session::{LobbySession, LobbyView};
pub use state::SessionState;
