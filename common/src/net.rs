use std::{
    env, io,
    net::{SocketAddr, UdpSocket},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use renet::{ChannelConfig, ConnectionConfig, SendType};
use renet_netcode::{ConnectToken, TokenGenerationError};
use socket2::{Domain, Socket, Type};

pub const DEFAULT_IP: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const MAX_CLIENTS: usize = 10;

const TOKEN_EXPIRE_SECONDS: u64 = 3600;
const TOKEN_TIMEOUT_SECONDS: i32 = 15;

// Shared between host and client until a matchmaker hands out tokens.
const DEFAULT_PRIVATE_KEY: [u8; 32] = [
    211, 120, 2, 54, 202, 170, 80, 236, 225, 33, 220, 193, 223, 199, 20, 80, 202, 88, 77, 123, 88,
    129, 160, 222, 33, 251, 99, 37, 145, 18, 199, 199,
];

pub fn private_key() -> [u8; 32] {
    DEFAULT_PRIVATE_KEY
}

/// Reads `IP` and `PORT` from the environment (or a `.env` file), falling back
/// to the local default room.
pub fn get_connectable_address() -> Result<SocketAddr, std::net::AddrParseError> {
    dotenvy::dotenv().ok();

    let ip = env::var("IP").unwrap_or_else(|_| DEFAULT_IP.to_string());
    let port = env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());

    format!("{}:{}", ip, port).parse()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppChannel {
    ReliableOrdered,
    Unreliable,
}

impl From<AppChannel> for u8 {
    fn from(channel: AppChannel) -> Self {
        match channel {
            AppChannel::ReliableOrdered => 0,
            AppChannel::Unreliable => 1,
        }
    }
}

pub fn connection_config() -> ConnectionConfig {
    let reliable_config = ChannelConfig {
        channel_id: AppChannel::ReliableOrdered.into(),
        max_memory_usage_bytes: 1024 * 1024,
        send_type: SendType::ReliableOrdered {
            resend_time: Duration::from_millis(100),
        },
    };

    let unreliable_config = ChannelConfig {
        channel_id: AppChannel::Unreliable.into(),
        max_memory_usage_bytes: 1024 * 1024,
        send_type: SendType::Unreliable,
    };

    let channels = vec![reliable_config, unreliable_config];

    ConnectionConfig {
        client_channels_config: channels.clone(),
        server_channels_config: channels,
        ..Default::default()
    }
}

pub fn current_time() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}

pub fn create_connect_token(
    current_time: Duration,
    protocol_id: u64,
    client_id: u64,
    server_addr: SocketAddr,
    private_key: &[u8; 32],
) -> Result<ConnectToken, TokenGenerationError> {
    ConnectToken::generate(
        current_time,
        protocol_id,
        TOKEN_EXPIRE_SECONDS,
        client_id,
        TOKEN_TIMEOUT_SECONDS,
        vec![server_addr],
        None,
        private_key,
    )
}

pub fn bind_socket(addr: SocketAddr) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::DGRAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_ids_match_connection_config() {
        let config = connection_config();
        let ids: Vec<u8> = config
            .client_channels_config
            .iter()
            .map(|channel| channel.channel_id)
            .collect();
        assert_eq!(
            ids,
            vec![
                u8::from(AppChannel::ReliableOrdered),
                u8::from(AppChannel::Unreliable)
            ]
        );
        assert_eq!(config.server_channels_config.len(), 2);
    }

    #[test]
    fn connect_token_is_generated_for_local_room() {
        let addr: SocketAddr = "127.0.0.1:5000".parse().expect("valid address");
        let token = create_connect_token(current_time(), 0, 7, addr, &private_key());
        assert!(token.is_ok());
    }
}
