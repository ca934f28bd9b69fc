//! The room's view of the network: who joined or left, and raw payloads on
//! the reliable channel. Everything a room says or hears goes through
//! [`RoomNetwork`], so room logic can run against a mock.

use std::net::SocketAddr;

use renet::{RenetServer, ServerEvent};
use renet_netcode::{ServerAuthentication, ServerConfig};

use common::{
    net::{self as common_net, AppChannel, MAX_CLIENTS},
    protocol,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    Joined { client_id: u64 },
    Left { client_id: u64, reason: String },
}

pub trait RoomNetwork {
    fn next_event(&mut self) -> Option<RoomEvent>;
    fn clients(&self) -> Vec<u64>;
    fn receive(&mut self, client_id: u64) -> Option<Vec<u8>>;
    fn send(&mut self, client_id: u64, payload: Vec<u8>);
    fn kick(&mut self, client_id: u64);
}

pub struct RenetRoomNetwork<'a> {
    server: &'a mut RenetServer,
}

impl<'a> RenetRoomNetwork<'a> {
    pub fn new(server: &'a mut RenetServer) -> Self {
        Self { server }
    }
}

impl RoomNetwork for RenetRoomNetwork<'_> {
    fn next_event(&mut self) -> Option<RoomEvent> {
        match self.server.get_event()? {
            ServerEvent::ClientConnected { client_id } => Some(RoomEvent::Joined { client_id }),
            ServerEvent::ClientDisconnected { client_id, reason } => Some(RoomEvent::Left {
                client_id,
                reason: reason.to_string(),
            }),
        }
    }

    fn clients(&self) -> Vec<u64> {
        self.server.clients_id()
    }

    fn receive(&mut self, client_id: u64) -> Option<Vec<u8>> {
        self.server
            .receive_message(client_id, AppChannel::ReliableOrdered)
            .map(|bytes| bytes.to_vec())
    }

    fn send(&mut self, client_id: u64, payload: Vec<u8>) {
        self.server
            .send_message(client_id, AppChannel::ReliableOrdered, payload);
    }

    fn kick(&mut self, client_id: u64) {
        self.server.disconnect(client_id);
    }
}

/// Netcode settings for a room advertised at `connectable_addr`.
pub fn room_server_config(connectable_addr: SocketAddr, private_key: [u8; 32]) -> ServerConfig {
    ServerConfig {
        current_time: common_net::current_time(),
        max_clients: MAX_CLIENTS,
        protocol_id: protocol::version(),
        public_addresses: vec![connectable_addr],
        authentication: ServerAuthentication::Secure { private_key },
    }
}
