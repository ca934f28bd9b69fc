use std::collections::{HashMap, VecDeque};

use crate::net::{RoomEvent, RoomNetwork};

/// In-memory room network: tests queue events and payloads, then read back
/// what the room sent and whom it kicked.
#[derive(Default)]
pub struct MockRoomNetwork {
    events: VecDeque<RoomEvent>,
    inbox: HashMap<u64, VecDeque<Vec<u8>>>,
    outbox: HashMap<u64, Vec<Vec<u8>>>,
    clients: Vec<u64>,
    pub kicked: Vec<u64>,
}

impl MockRoomNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a join event and lists the client as connected.
    pub fn join(&mut self, client_id: u64) {
        self.clients.push(client_id);
        self.events.push_back(RoomEvent::Joined { client_id });
    }

    pub fn leave(&mut self, client_id: u64, reason: &str) {
        self.clients.retain(|&id| id != client_id);
        self.events.push_back(RoomEvent::Left {
            client_id,
            reason: reason.to_string(),
        });
    }

    pub fn deliver(&mut self, client_id: u64, payload: Vec<u8>) {
        self.inbox.entry(client_id).or_default().push_back(payload);
    }

    pub fn sent_to(&self, client_id: u64) -> &[Vec<u8>] {
        self.outbox.get(&client_id).map_or(&[], Vec::as_slice)
    }
}

impl RoomNetwork for MockRoomNetwork {
    fn next_event(&mut self) -> Option<RoomEvent> {
        self.events.pop_front()
    }

    fn clients(&self) -> Vec<u64> {
        self.clients.clone()
    }

    fn receive(&mut self, client_id: u64) -> Option<Vec<u8>> {
        self.inbox.get_mut(&client_id)?.pop_front()
    }

    fn send(&mut self, client_id: u64, payload: Vec<u8>) {
        self.outbox.entry(client_id).or_default().push(payload);
    }

    fn kick(&mut self, client_id: u64) {
        self.kicked.push(client_id);
        self.clients.retain(|&id| id != client_id);
    }
}
