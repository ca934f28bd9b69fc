//! The lobby session: one connection attempt to one room, from `Idle` until a
//! closed state, with latency probing while connected.
//!
//! The session is driven by [`LobbySession::update`], called once per tick.
//! Each tick first evaluates the transport's status (which may move the
//! session to another state) and only then, if still connected, looks at the
//! latest latency sample.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::{
    config::LobbyConfig,
    error::{SessionError, StartGameError},
    game::{GameInit, GameLauncher, GameMode},
    lobby::{
        latency::{Latency, ProbeThrottle, SampleTracker},
        state::SessionState,
    },
    net::LobbyTransport,
    ui::LobbyUi,
};
use common::protocol::RoomInfo;

/// Read-only snapshot for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyView<'a> {
    pub state: &'a SessionState,
    pub latency: Option<Latency>,
    /// When the session took in the sample behind `latency`.
    pub latency_observed_at: Option<Instant>,
    pub can_start_game: bool,
}

impl LobbyView<'_> {
    pub fn room(&self) -> Option<&RoomInfo> {
        self.state.room()
    }
}

pub struct LobbySession<T: LobbyTransport> {
    address: String,
    config: LobbyConfig,
    state: SessionState,
    // `None` once a game has taken the connection over.
    transport: Option<T>,
    samples: SampleTracker,
    throttle: ProbeThrottle,
    latency: Option<Latency>,
}

impl<T: LobbyTransport> LobbySession<T> {
    pub fn new(address: impl Into<String>, transport: T, config: LobbyConfig) -> Self {
        Self {
            address: address.into(),
            config,
            state: SessionState::Idle,
            transport: Some(transport),
            samples: SampleTracker::new(),
            throttle: ProbeThrottle::new(config.min_probe_interval),
            latency: None,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn room(&self) -> Option<&RoomInfo> {
        self.state.room()
    }

    pub fn latency(&self) -> Option<Latency> {
        self.latency
    }

    pub fn is_handed_off(&self) -> bool {
        self.transport.is_none()
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    pub fn view(&self) -> LobbyView<'_> {
        LobbyView {
            state: &self.state,
            latency: self.latency,
            latency_observed_at: self.samples.current().map(|sample| sample.observed_at),
            can_start_game: self.state.is_connected()
                && self
                    .transport
                    .as_ref()
                    .is_some_and(|transport| transport.is_connected()),
        }
    }

    /// Starts the single connection attempt of this session.
    pub fn connect(&mut self, ui: &mut dyn LobbyUi) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::Idle) {
            return Err(SessionError::AlreadyStarted(self.state.name()));
        }
        let Some(transport) = self.transport.as_mut() else {
            return Err(SessionError::AlreadyStarted(self.state.name()));
        };

        info!("connecting to room at {}", self.address);
        transport.connect(&self.address);
        self.state = SessionState::Connecting;
        ui.state_changed(&self.state);
        Ok(())
    }

    pub fn update(&mut self, ui: &mut dyn LobbyUi, now: Instant) {
        if self.state.is_terminal() {
            return;
        }
        let Some(transport) = self.transport.as_ref() else {
            return;
        };

        if let Some(next_state) = evaluate(&self.state, transport) {
            self.apply_transition(next_state, ui, now);
        }

        if self.state.is_connected() {
            self.probe_latency(ui, now);
        }
    }

    pub fn start_game(
        &mut self,
        launcher: &mut dyn GameLauncher<T>,
        ui: &mut dyn LobbyUi,
    ) -> Result<(), StartGameError> {
        let Some(room) = self.state.room().cloned() else {
            return Err(StartGameError::NotConnected);
        };
        let Some(transport) = self.transport.take_if(|transport| transport.is_connected())
        else {
            return Err(if self.transport.is_none() {
                StartGameError::HandedOff
            } else {
                StartGameError::NotConnected
            });
        };

        let init = GameInit {
            mode: GameMode::ServerMultiplayer,
            address: self.address.clone(),
            room,
            transport,
        };

        match launcher.launch(init) {
            Ok(()) => {
                info!("game session took over the room connection");
                Ok(())
            }
            Err(rejected) => {
                info!("game start refused: {}", rejected.reason);
                self.transport = Some(rejected.init.transport);
                ui.show_advisory(&rejected.reason);
                Err(StartGameError::Rejected(rejected.reason))
            }
        }
    }

    /// Asks the transport to close. Safe to call at any time and any number
    /// of times; a session that never connected is left as it is.
    pub fn disconnect(&mut self, ui: &mut dyn LobbyUi) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        if transport.is_connected() || transport.is_connecting() {
            debug!("disconnecting from {}", self.address);
            transport.disconnect();
        }

        if matches!(
            self.state,
            SessionState::Connecting | SessionState::Connected { .. }
        ) {
            info!("lobby state {} -> ClosedClean", self.state.name());
            self.leave_connected();
            self.state = SessionState::ClosedClean;
            ui.state_changed(&self.state);
        }
    }

    fn apply_transition(&mut self, next_state: SessionState, ui: &mut dyn LobbyUi, now: Instant) {
        info!("lobby state {} -> {}", self.state.name(), next_state.name());

        if self.state.is_connected() {
            self.leave_connected();
        }
        if next_state.is_connected() {
            self.throttle.reset(now);
        }

        self.state = next_state;
        ui.state_changed(&self.state);
    }

    fn leave_connected(&mut self) {
        self.samples.clear();
        self.latency = None;
    }

    fn probe_latency(&mut self, ui: &mut dyn LobbyUi, now: Instant) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        let raw_millis = transport.last_ping_millis();
        let sequence = transport.ping_samples();
        let Some(sample) = self.samples.observe(raw_millis, sequence, now) else {
            return;
        };

        let latency = Latency::classify(sample.millis, self.config.high_latency_threshold_ms);
        if latency.is_high() {
            warn!("high latency to room: {} ms", latency.millis);
        } else {
            debug!("latency to room: {} ms", latency.millis);
        }
        self.latency = Some(latency);
        ui.latency_changed(latency);

        if self.throttle.try_acquire(now) {
            debug!("requesting latency probe");
            transport.request_ping();
        }
    }
}

impl<T: LobbyTransport> Drop for LobbySession<T> {
    fn drop(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            if transport.is_connected() || transport.is_connecting() {
                transport.disconnect();
            }
        }
    }
}

/// Decides the next state from the transport's flags. Checks run in a fixed
/// order and the first match wins: a failed connect is never read as a
/// disconnect, and "became connected" is checked before "is disconnected".
fn evaluate<T: LobbyTransport>(state: &SessionState, transport: &T) -> Option<SessionState> {
    match state {
        SessionState::Connecting => {
            if !transport.is_connecting() {
                if let Some(message) = transport.last_error_message() {
                    return Some(SessionState::ClosedError {
                        message: message.to_string(),
                    });
                }
            }

            if transport.is_connected() {
                match transport.room_info() {
                    Some(room) => {
                        return Some(SessionState::Connected { room: room.clone() });
                    }
                    None => warn!("transport connected without room info; still waiting"),
                }
            }

            None
        }
        SessionState::Connected { .. } if !transport.is_connected() => {
            match transport.last_error_message() {
                None => Some(SessionState::ClosedClean),
                Some(message) => Some(SessionState::ClosedError {
                    message: message.to_string(),
                }),
            }
        }
        // `Idle` never reacts to transport flags, and closed states are final.
        _ => None,
    }
}
