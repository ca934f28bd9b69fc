use std::{
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket},
    thread,
    time::{Duration, Instant},
};

use renet::RenetServer;
use renet_netcode::{NetcodeServerTransport, NetcodeTransportError};
use thiserror::Error;
use tracing::info;

use crate::{
    net::{self, RenetRoomNetwork},
    room::{self, Room},
};
use common::protocol::RoomInfo;

const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to create network transport: {0}")]
    Transport(#[from] io::Error),
    #[error("network transport failed: {0}")]
    Netcode(#[from] NetcodeTransportError),
}

/// Listens on every interface at the advertised port.
pub fn binding_address(connectable_addr: SocketAddr) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), connectable_addr.port())
}

pub fn run_server(
    socket: UdpSocket,
    connectable_addr: SocketAddr,
    private_key: [u8; 32],
    info: RoomInfo,
) -> Result<(), ServerError> {
    let server_config = net::room_server_config(connectable_addr, private_key);
    let protocol_id = server_config.protocol_id;
    let mut transport = NetcodeServerTransport::new(server_config, socket)?;
    let mut server = RenetServer::new(common::net::connection_config());
    let mut room = Room::new(info);

    print_server_banner(protocol_id, connectable_addr, &room);
    server_loop(&mut server, &mut transport, &mut room)
}

fn print_server_banner(protocol_id: u64, connectable_addr: SocketAddr, room: &Room) {
    println!("  Game version:   {}", protocol_id);
    println!("  Room address:   {}", connectable_addr);
    println!("  Room name:      {}", room.info().name);
    if let Some(description) = &room.info().description {
        println!("  Description:    {}", description);
    }
}

fn server_loop(
    server: &mut RenetServer,
    transport: &mut NetcodeServerTransport,
    room: &mut Room,
) -> Result<(), ServerError> {
    let mut last_updated = Instant::now();
    info!("room \"{}\" open", room.info().name);

    loop {
        let now = Instant::now();
        let duration = now - last_updated;
        last_updated = now;

        transport.update(duration, server)?;
        server.update(duration);

        room::update_room(&mut RenetRoomNetwork::new(server), room);

        transport.send_packets(server);
        thread::sleep(FRAME);
    }
}
