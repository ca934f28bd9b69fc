use std::{
    thread,
    time::{Duration, Instant},
};

use tracing::info;

use crate::{
    config::LobbyConfig,
    error::{SessionError, StartGameError},
    game::{GameInit, GameLauncher, Rejected},
    lobby::{LobbySession, SessionState},
    net::{LobbyTransport, RenetTransport},
    ui::{LobbyAction, LobbyInput, LobbyUi, UiInputError},
};
use common::protocol::RoomInfo;

const FRAME: Duration = Duration::from_millis(16);

/// A started game holding the room connection it inherited from the lobby.
pub struct GameSession<T> {
    pub address: String,
    pub room: RoomInfo,
    pub transport: T,
}

/// Accepts a start once the room's latency has been measured at least once.
pub struct RoomGameLauncher<T> {
    started: Option<GameSession<T>>,
}

impl<T> Default for RoomGameLauncher<T> {
    fn default() -> Self {
        Self { started: None }
    }
}

impl<T> RoomGameLauncher<T> {
    pub fn take_session(&mut self) -> Option<GameSession<T>> {
        self.started.take()
    }
}

impl<T: LobbyTransport> GameLauncher<T> for RoomGameLauncher<T> {
    fn launch(&mut self, init: GameInit<T>) -> Result<(), Rejected<T>> {
        if init.transport.last_ping_millis() < 0 {
            return Err(Rejected::new(
                "Still measuring latency to the room. Try again in a moment.",
                init,
            ));
        }

        info!("starting {:?} game in room \"{}\"", init.mode, init.room.name);
        self.started = Some(GameSession {
            address: init.address,
            room: init.room,
            transport: init.transport,
        });
        Ok(())
    }
}

pub enum LobbyExit<T> {
    GameStarted(GameSession<T>),
    Left,
    Closed(SessionState),
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Input(#[from] UiInputError),
}

/// Runs the lobby until a game starts, the user leaves, or the room goes away.
pub fn run_lobby<U>(address: &str, ui: &mut U) -> Result<LobbyExit<RenetTransport>, RunError>
where
    U: LobbyUi + LobbyInput,
{
    let client_id = rand::random::<u64>();
    let transport = RenetTransport::new(client_id, common::net::private_key());
    let mut session = LobbySession::new(address, transport, LobbyConfig::default());
    let mut launcher = RoomGameLauncher::default();

    info!("lobby client {} joining {}", client_id, address);
    session.connect(ui)?;

    let mut last_updated = Instant::now();
    loop {
        let now = Instant::now();
        let dt = now - last_updated;
        last_updated = now;

        if let Some(transport) = session.transport_mut() {
            transport.pump(dt);
        }
        session.update(ui, now);

        if session.state().is_terminal() {
            return Ok(LobbyExit::Closed(session.state().clone()));
        }

        match ui.poll_action() {
            Ok(Some(LobbyAction::StartGame)) => {
                match session.start_game(&mut launcher, ui) {
                    Ok(()) => {
                        if let Some(game) = launcher.take_session() {
                            return Ok(LobbyExit::GameStarted(game));
                        }
                    }
                    Err(StartGameError::Rejected(_)) => {}
                    Err(e) => ui.show_advisory(&e.to_string()),
                }
            }
            Ok(Some(LobbyAction::Leave)) => {
                session.disconnect(ui);
                if let Some(transport) = session.transport_mut() {
                    transport.pump(Duration::ZERO);
                }
                return Ok(LobbyExit::Left);
            }
            Ok(None) => {}
            Err(e) => {
                session.disconnect(ui);
                return Err(e.into());
            }
        }

        thread::sleep(FRAME);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{game::GameMode, test_helpers::MockTransport};

    fn init_with_ping(ping: i64) -> GameInit<MockTransport> {
        let mut transport = MockTransport::new();
        transport.ping = ping;
        GameInit {
            mode: GameMode::ServerMultiplayer,
            address: "room1".to_string(),
            room: RoomInfo::new("Arena"),
            transport,
        }
    }

    #[test]
    fn launcher_refuses_before_first_sample() {
        let mut launcher = RoomGameLauncher::default();
        let rejected = launcher
            .launch(init_with_ping(-1))
            .expect_err("no sample yet");

        assert!(rejected.reason.contains("measuring latency"));
        assert_eq!(rejected.init.room.name, "Arena");
        assert!(launcher.take_session().is_none());
    }

    #[test]
    fn launcher_keeps_started_game() {
        let mut launcher = RoomGameLauncher::default();
        launcher.launch(init_with_ping(30)).expect("accepted");

        let game = launcher.take_session().expect("game stored");
        assert_eq!(game.room.name, "Arena");
        assert_eq!(game.transport.ping, 30);
    }
}
