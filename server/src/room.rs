use std::{collections::HashSet, env};

use tracing::{debug, info, warn};

use crate::net::{RoomEvent, RoomNetwork};
use common::protocol::{self, ClientMessage, ProtocolError, RoomInfo, ServerMessage};

pub const DEFAULT_ROOM_NAME: &str = "Lobby";

/// Reads `ROOM_NAME` and `ROOM_DESCRIPTION` (after loading `.env`, if any).
pub fn room_info_from_env() -> RoomInfo {
    dotenvy::dotenv().ok();

    let name = env::var("ROOM_NAME").unwrap_or_else(|_| DEFAULT_ROOM_NAME.to_string());
    let description = env::var("ROOM_DESCRIPTION")
        .ok()
        .filter(|text| !text.trim().is_empty());

    RoomInfo { name, description }
}

pub struct Room {
    info: RoomInfo,
    members: HashSet<u64>,
}

impl Room {
    pub fn new(info: RoomInfo) -> Self {
        Self {
            info,
            members: HashSet::new(),
        }
    }

    pub fn info(&self) -> &RoomInfo {
        &self.info
    }

    pub fn is_member(&self, client_id: u64) -> bool {
        self.members.contains(&client_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// One host tick: membership changes first, then client messages.
pub fn update_room(network: &mut dyn RoomNetwork, room: &mut Room) {
    process_events(network, room);
    handle_messages(network, room);
}

pub fn process_events(network: &mut dyn RoomNetwork, room: &mut Room) {
    while let Some(event) = network.next_event() {
        match event {
            RoomEvent::Joined { client_id } => {
                info!("client {} joined \"{}\"", client_id, room.info.name);
                room.members.insert(client_id);

                match protocol::encode(&ServerMessage::RoomInfo(room.info.clone())) {
                    Ok(payload) => network.send(client_id, payload),
                    Err(e) => warn!("failed to encode room info: {}", e),
                }
            }
            RoomEvent::Left { client_id, reason } => {
                info!("client {} left: {}", client_id, reason);
                room.members.remove(&client_id);
            }
        }
    }
}

pub fn handle_messages(network: &mut dyn RoomNetwork, room: &mut Room) {
    for client_id in network.clients() {
        while let Some(data) = network.receive(client_id) {
            if let Err(e) = answer(network, client_id, &data) {
                warn!("client {} sent malformed data ({}); disconnecting", client_id, e);
                network.kick(client_id);
                room.members.remove(&client_id);
                break;
            }
        }
    }
}

fn answer(
    network: &mut dyn RoomNetwork,
    client_id: u64,
    data: &[u8],
) -> Result<(), ProtocolError> {
    let message = protocol::decode::<ClientMessage>(data)?;
    debug!("client {} sent {}", client_id, message.variant_name());

    match message {
        ClientMessage::Ping { nonce } => {
            network.send(client_id, protocol::encode(&ServerMessage::Pong { nonce })?);
        }
    }

    Ok(())
}
