use std::fmt;
use std::io::{self, Stdout, Write, stdout};
use std::time::Duration;

use crossterm::{
    cursor::MoveToColumn,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use tracing::warn;

use crate::lobby::{Latency, SessionState};

/// Receives what the lobby session wants shown. Implementations render; they
/// never feed anything back into the session.
pub trait LobbyUi {
    fn state_changed(&mut self, state: &SessionState);
    fn latency_changed(&mut self, latency: Latency);
    /// A non-fatal notice, e.g. a refused game start.
    fn show_advisory(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyAction {
    StartGame,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiInputError {
    Disconnected,
}

impl fmt::Display for UiInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiInputError::Disconnected => write!(f, "input source disconnected"),
        }
    }
}

impl std::error::Error for UiInputError {}

pub trait LobbyInput {
    fn poll_action(&mut self) -> Result<Option<LobbyAction>, UiInputError>;
}

pub struct TerminalUi<W: Write> {
    out: W,
    is_raw_mode_owner: bool, // True except in tests.
}

impl TerminalUi<Stdout> {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self {
            out: stdout(),
            is_raw_mode_owner: true,
        })
    }
}

impl<W: Write> TerminalUi<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            is_raw_mode_owner: false,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn print_line(&mut self, text: &str) -> io::Result<()> {
        self.print_colored_line(None, text)
    }

    fn print_colored_line(&mut self, color: Option<Color>, text: &str) -> io::Result<()> {
        queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        match color {
            Some(color) => queue!(
                self.out,
                SetForegroundColor(color),
                Print(text),
                ResetColor
            )?,
            None => queue!(self.out, Print(text))?,
        }
        queue!(self.out, Print("\r\n"))?;
        self.out.flush()
    }

    fn draw_state(&mut self, state: &SessionState) -> io::Result<()> {
        match state {
            SessionState::Idle => Ok(()),
            SessionState::Connecting => self.print_line("Connecting to room..."),
            SessionState::Connected { room } => {
                self.print_line(&format!("Server: {}", room.name))?;
                if let Some(description) = &room.description {
                    self.print_line(description)?;
                }
                self.print_line("Press Enter to start the game, Esc to leave.")
            }
            SessionState::ClosedClean => self.print_line("Left the room."),
            SessionState::ClosedError { message } => {
                self.print_colored_line(Some(Color::Red), message)
            }
        }
    }
}

impl<W: Write> LobbyUi for TerminalUi<W> {
    fn state_changed(&mut self, state: &SessionState) {
        if let Err(e) = self.draw_state(state) {
            warn!("failed to draw lobby state: {}", e);
        }
    }

    fn latency_changed(&mut self, latency: Latency) {
        let result = if latency.is_high() {
            self.print_colored_line(
                Some(Color::Yellow),
                &format!("Ping: {} - high ping warning", latency.millis),
            )
        } else {
            self.print_line(&format!("Ping: {}", latency.millis))
        };

        if let Err(e) = result {
            warn!("failed to draw ping: {}", e);
        }
    }

    fn show_advisory(&mut self, message: &str) {
        if let Err(e) = self.print_colored_line(Some(Color::Yellow), message) {
            warn!("failed to draw advisory: {}", e);
        }
    }
}

impl<W: Write> LobbyInput for TerminalUi<W> {
    fn poll_action(&mut self) -> Result<Option<LobbyAction>, UiInputError> {
        if !self.is_raw_mode_owner {
            return Ok(None);
        }

        match event::poll(Duration::ZERO) {
            Ok(false) => Ok(None),
            Ok(true) => event::read()
                .map(|event| action_for(&event))
                .map_err(|_| UiInputError::Disconnected),
            Err(_) => Err(UiInputError::Disconnected),
        }
    }
}

impl<W: Write> Drop for TerminalUi<W> {
    fn drop(&mut self) {
        if self.is_raw_mode_owner {
            let _ = terminal::disable_raw_mode();
        }
    }
}

fn action_for(event: &Event) -> Option<LobbyAction> {
    let Event::Key(key_event) = event else {
        return None;
    };
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers == KeyModifiers::CONTROL {
        return match key_event.code {
            KeyCode::Char('c') | KeyCode::Char('d') => Some(LobbyAction::Leave),
            _ => None,
        };
    }

    match key_event.code {
        KeyCode::Enter => Some(LobbyAction::StartGame),
        KeyCode::Esc | KeyCode::Char('q') => Some(LobbyAction::Leave),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::LatencyLevel;
    use common::protocol::RoomInfo;
    use crossterm::event::KeyEvent;

    fn output(ui: &TerminalUi<Vec<u8>>) -> String {
        String::from_utf8_lossy(ui.writer()).into_owned()
    }

    #[test]
    fn connected_state_shows_room_and_description() {
        let mut ui = TerminalUi::with_writer(Vec::new());
        ui.state_changed(&SessionState::Connected {
            room: RoomInfo::new("Arena").with_description("Best of three."),
        });

        let text = output(&ui);
        assert!(text.contains("Server: Arena"));
        assert!(text.contains("Best of three."));
    }

    #[test]
    fn high_ping_is_flagged() {
        let mut ui = TerminalUi::with_writer(Vec::new());
        ui.latency_changed(Latency {
            millis: 75,
            level: LatencyLevel::High,
        });
        ui.latency_changed(Latency {
            millis: 45,
            level: LatencyLevel::Normal,
        });

        let text = output(&ui);
        assert!(text.contains("Ping: 75 - high ping warning"));
        assert!(text.contains("Ping: 45"));
        assert!(!text.contains("Ping: 45 - high"));
    }

    #[test]
    fn error_state_shows_message_verbatim() {
        let mut ui = TerminalUi::with_writer(Vec::new());
        ui.state_changed(&SessionState::ClosedError {
            message: "timeout".to_string(),
        });
        assert!(output(&ui).contains("timeout"));
    }

    #[test]
    fn keys_map_to_actions() {
        let enter = Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let esc = Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        let other = Event::Key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE));

        assert_eq!(action_for(&enter), Some(LobbyAction::StartGame));
        assert_eq!(action_for(&esc), Some(LobbyAction::Leave));
        assert_eq!(action_for(&ctrl_c), Some(LobbyAction::Leave));
        assert_eq!(action_for(&other), None);
    }

    #[test]
    fn writer_backed_ui_never_reads_terminal() {
        let mut ui = TerminalUi::with_writer(Vec::new());
        assert_eq!(ui.poll_action(), Ok(None));
    }
}
