use std::{cell::RefCell, rc::Rc};

use crate::{
    game::{GameInit, GameLauncher, Rejected},
    lobby::{Latency, SessionState},
    net::{LobbyTransport, NO_PING_SAMPLE},
    ui::LobbyUi,
};
use common::protocol::RoomInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect(String),
    RequestPing,
    Disconnect,
}

pub type CallLog = Rc<RefCell<Vec<TransportCall>>>;

/// A transport whose status flags are set directly by the test.
#[derive(Debug)]
pub struct MockTransport {
    pub connecting: bool,
    pub connected: bool,
    pub error: Option<String>,
    pub room: Option<RoomInfo>,
    pub ping: i64,
    pub samples: u64,
    calls: CallLog,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            connecting: false,
            connected: false,
            error: None,
            room: None,
            ping: NO_PING_SAMPLE,
            samples: 0,
            calls: Rc::default(),
        }
    }

    pub fn finish_connecting(&mut self, room: RoomInfo) {
        self.connecting = false;
        self.connected = true;
        self.room = Some(room);
    }

    /// Records a new measurement, even if it repeats the last value.
    pub fn measure(&mut self, millis: i64) {
        self.ping = millis;
        self.samples += 1;
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.borrow().clone()
    }

    /// Shared handle to the call log that outlives the transport.
    pub fn call_log(&self) -> CallLog {
        Rc::clone(&self.calls)
    }

    pub fn ping_requests(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| **call == TransportCall::RequestPing)
            .count()
    }
}

impl LobbyTransport for MockTransport {
    fn connect(&mut self, address: &str) {
        self.calls
            .borrow_mut()
            .push(TransportCall::Connect(address.to_string()));
        self.connecting = true;
    }

    fn is_connecting(&self) -> bool {
        self.connecting
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn last_error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn room_info(&self) -> Option<&RoomInfo> {
        self.room.as_ref()
    }

    fn last_ping_millis(&self) -> i64 {
        self.ping
    }

    fn ping_samples(&self) -> u64 {
        self.samples
    }

    fn request_ping(&mut self) {
        self.calls.borrow_mut().push(TransportCall::RequestPing);
    }

    fn disconnect(&mut self) {
        self.calls.borrow_mut().push(TransportCall::Disconnect);
        self.connecting = false;
        self.connected = false;
    }
}

#[derive(Default)]
pub struct MockUi {
    pub states: Vec<SessionState>,
    pub latencies: Vec<Latency>,
    pub advisories: Vec<String>,
}

impl LobbyUi for MockUi {
    fn state_changed(&mut self, state: &SessionState) {
        self.states.push(state.clone());
    }

    fn latency_changed(&mut self, latency: Latency) {
        self.latencies.push(latency);
    }

    fn show_advisory(&mut self, message: &str) {
        self.advisories.push(message.to_string());
    }
}

pub struct MockLauncher {
    rejection: Option<String>,
    pub launched: Option<GameInit<MockTransport>>,
}

impl MockLauncher {
    pub fn accepting() -> Self {
        Self {
            rejection: None,
            launched: None,
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            rejection: Some(reason.to_string()),
            launched: None,
        }
    }
}

impl GameLauncher<MockTransport> for MockLauncher {
    fn launch(&mut self, init: GameInit<MockTransport>) -> Result<(), Rejected<MockTransport>> {
        match &self.rejection {
            Some(reason) => Err(Rejected::new(reason.clone(), init)),
            None => {
                self.launched = Some(init);
                Ok(())
            }
        }
    }
}
