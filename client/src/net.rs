use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
    time::{Duration, Instant},
};

use renet::{DisconnectReason, RenetClient};
use renet_netcode::{ClientAuthentication, NetcodeClientTransport};
use tracing::{debug, info, warn};

use crate::error::TransportError;
use common::{
    net::{self as common_net, AppChannel},
    protocol::{self, ClientMessage, RoomInfo, ServerMessage},
};

/// Returned by [`LobbyTransport::last_ping_millis`] until a first sample exists.
pub const NO_PING_SAMPLE: i64 = -1;

/// How often [`RenetTransport`] re-measures the round trip on its own, so
/// that a fresh sample is always on the way.
pub const PING_REFRESH_INTERVAL: Duration = Duration::from_millis(1000);

/// The link to a room as the lobby session sees it. Every call is
/// fire-and-forget; outcomes show up in the status accessors on later ticks.
pub trait LobbyTransport {
    fn connect(&mut self, address: &str);
    fn is_connecting(&self) -> bool;
    fn is_connected(&self) -> bool;
    fn last_error_message(&self) -> Option<&str>;
    /// Only meaningful once `is_connected` is true.
    fn room_info(&self) -> Option<&RoomInfo>;
    /// Latest round-trip time in milliseconds, or [`NO_PING_SAMPLE`].
    fn last_ping_millis(&self) -> i64;
    /// Number of samples measured so far. A new measurement that repeats the
    /// previous value still bumps this count.
    fn ping_samples(&self) -> u64;
    fn request_ping(&mut self);
    /// Safe to call repeatedly and before any connection exists.
    fn disconnect(&mut self);
}

struct PendingPing {
    nonce: u32,
    sent_at: Instant,
}

pub struct RenetTransport {
    client_id: u64,
    private_key: [u8; 32],
    client: Option<RenetClient>,
    netcode: Option<NetcodeClientTransport>,
    room: Option<RoomInfo>,
    last_error: Option<String>,
    last_ping_millis: i64,
    ping_samples: u64,
    pending_ping: Option<PendingPing>,
    next_nonce: u32,
    // Link time, advanced by `pump`.
    clock: Duration,
    last_ping_sent: Option<Duration>,
    closed_by_user: bool,
    disconnect_recorded: bool,
}

impl RenetTransport {
    pub fn new(client_id: u64, private_key: [u8; 32]) -> Self {
        Self {
            client_id,
            private_key,
            client: None,
            netcode: None,
            room: None,
            last_error: None,
            last_ping_millis: NO_PING_SAMPLE,
            ping_samples: 0,
            pending_ping: None,
            next_nonce: 0,
            clock: Duration::ZERO,
            last_ping_sent: None,
            closed_by_user: false,
            disconnect_recorded: false,
        }
    }

    /// Wraps a client that is already linked to a server in the same process,
    /// e.g. one created with `RenetServer::new_local_client`.
    pub fn with_local_client(client: RenetClient) -> Self {
        let mut transport = Self::new(0, common_net::private_key());
        transport.client = Some(client);
        transport
    }

    pub fn renet_client_mut(&mut self) -> Option<&mut RenetClient> {
        self.client.as_mut()
    }

    /// Advances the link by `dt`: receives packets, handles server messages,
    /// keeps the ping sample current, notes disconnections and flushes
    /// outgoing packets.
    pub fn pump(&mut self, dt: Duration) {
        let Some(client) = self.client.as_mut() else {
            return;
        };
        self.clock += dt;

        if let Some(netcode) = self.netcode.as_mut() {
            if let Err(e) = netcode.update(dt, client) {
                debug!("netcode update reported: {}", e);
            }
        }
        client.update(dt);

        self.receive_messages();
        self.refresh_ping();
        self.record_disconnect();
        self.send_packets();
    }

    fn open(&self, address: &str) -> Result<(RenetClient, NetcodeClientTransport), TransportError> {
        let server_addr: SocketAddr =
            address
                .parse()
                .map_err(|source| TransportError::InvalidAddress {
                    address: address.to_string(),
                    source,
                })?;

        let bind_addr: SocketAddr = if server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_nonblocking(true)?;

        let current_time = common_net::current_time();
        let connect_token = common_net::create_connect_token(
            current_time,
            protocol::version(),
            self.client_id,
            server_addr,
            &self.private_key,
        )
        .map_err(|e| TransportError::Token(format!("{:?}", e)))?;

        let authentication = ClientAuthentication::Secure { connect_token };
        let netcode = NetcodeClientTransport::new(current_time, authentication, socket)
            .map_err(|e| TransportError::Netcode(e.to_string()))?;
        let client = RenetClient::new(common_net::connection_config());

        Ok((client, netcode))
    }

    fn receive_messages(&mut self) {
        loop {
            let Some(client) = self.client.as_mut() else {
                return;
            };
            let Some(bytes) = client.receive_message(AppChannel::ReliableOrdered) else {
                return;
            };

            match protocol::decode::<ServerMessage>(&bytes) {
                Ok(ServerMessage::RoomInfo(room)) => {
                    info!("joined room \"{}\"", room.name);
                    let first = self.room.is_none();
                    self.room = Some(room);
                    if first {
                        self.send_ping();
                    }
                }
                Ok(ServerMessage::Pong { nonce }) => self.complete_ping(nonce),
                Err(e) => warn!("ignoring malformed server message: {}", e),
            }
        }
    }

    fn complete_ping(&mut self, nonce: u32) {
        match self.pending_ping.take() {
            Some(pending) if pending.nonce == nonce => {
                let elapsed = pending.sent_at.elapsed();
                self.last_ping_millis = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
                self.ping_samples += 1;
                debug!(nonce, millis = self.last_ping_millis, "pong received");
            }
            other => {
                self.pending_ping = other;
                debug!(nonce, "ignoring stale pong");
            }
        }
    }

    fn refresh_ping(&mut self) {
        if self.room.is_none() {
            return;
        }
        let due = self
            .last_ping_sent
            .is_none_or(|sent| self.clock.saturating_sub(sent) >= PING_REFRESH_INTERVAL);
        if due {
            self.send_ping();
        }
    }

    /// Sends a ping, replacing any unanswered one.
    fn send_ping(&mut self) {
        let Some(client) = self.client.as_mut() else {
            return;
        };
        if !client.is_connected() {
            return;
        }

        let nonce = self.next_nonce;
        self.next_nonce = self.next_nonce.wrapping_add(1);

        match protocol::encode(&ClientMessage::Ping { nonce }) {
            Ok(payload) => {
                client.send_message(AppChannel::ReliableOrdered, payload);
                self.pending_ping = Some(PendingPing {
                    nonce,
                    sent_at: Instant::now(),
                });
                self.last_ping_sent = Some(self.clock);
                debug!(nonce, "ping sent");
            }
            Err(e) => warn!("failed to encode ping: {}", e),
        }
    }

    fn record_disconnect(&mut self) {
        let Some(client) = self.client.as_ref() else {
            return;
        };
        if self.disconnect_recorded || !client.is_disconnected() {
            return;
        }
        self.disconnect_recorded = true;

        if self.closed_by_user {
            info!("room connection closed by user");
            return;
        }

        let message = match self.describe_disconnect(client.disconnect_reason()) {
            Some(message) => Some(message),
            None if self.room.is_none() => {
                Some("Connection closed before the room answered.".to_string())
            }
            None => None,
        };

        match message {
            Some(message) => {
                warn!("room connection lost: {}", message);
                self.last_error = Some(message);
            }
            None => info!("room closed the connection"),
        }
    }

    /// `None` means a clean close.
    fn describe_disconnect(&self, reason: Option<DisconnectReason>) -> Option<String> {
        match reason {
            Some(DisconnectReason::DisconnectedByClient) => None,
            Some(DisconnectReason::DisconnectedByServer) => None,
            other => {
                let netcode_reason = self
                    .netcode
                    .as_ref()
                    .and_then(|netcode| netcode.disconnect_reason())
                    .map(|reason| format!("{:?}", reason));

                match (netcode_reason, other) {
                    (Some(raw), _) => humanize_netcode_reason(&raw),
                    (None, Some(reason)) => Some(reason.to_string()),
                    (None, None) => Some("Connection lost.".to_string()),
                }
            }
        }
    }

    fn send_packets(&mut self) {
        let (Some(client), Some(netcode)) = (self.client.as_mut(), self.netcode.as_mut()) else {
            return;
        };
        if client.is_disconnected() {
            return;
        }
        if let Err(e) = netcode.send_packets(client) {
            debug!("failed to send packets: {}", e);
        }
    }
}

fn humanize_netcode_reason(raw: &str) -> Option<String> {
    if raw.contains("DisconnectedByClient") || raw.contains("DisconnectedByServer") {
        None
    } else if raw.contains("TimedOut") {
        Some("Connection timed out: room not responding.".to_string())
    } else if raw.contains("Denied") {
        Some("Connection denied: room full or access restricted.".to_string())
    } else if raw.contains("Expired") {
        Some("Connect token expired.".to_string())
    } else {
        Some(format!("Connection failed: {}.", raw))
    }
}

impl LobbyTransport for RenetTransport {
    fn connect(&mut self, address: &str) {
        if self.client.is_some() {
            debug!("transport already linked; ignoring connect to {}", address);
            return;
        }

        match self.open(address) {
            Ok((client, netcode)) => {
                info!("connecting to room at {}", address);
                self.client = Some(client);
                self.netcode = Some(netcode);
            }
            Err(e) => {
                warn!("could not start connecting to {}: {}", address, e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn is_connecting(&self) -> bool {
        self.room.is_none()
            && self
                .client
                .as_ref()
                .is_some_and(|client| !client.is_disconnected())
    }

    fn is_connected(&self) -> bool {
        self.room.is_some() && self.client.as_ref().is_some_and(RenetClient::is_connected)
    }

    fn last_error_message(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn room_info(&self) -> Option<&RoomInfo> {
        self.room.as_ref()
    }

    fn last_ping_millis(&self) -> i64 {
        self.last_ping_millis
    }

    fn ping_samples(&self) -> u64 {
        self.ping_samples
    }

    fn request_ping(&mut self) {
        self.send_ping();
    }

    fn disconnect(&mut self) {
        let Some(client) = self.client.as_mut() else {
            return;
        };
        if client.is_disconnected() {
            return;
        }

        self.closed_by_user = true;
        client.disconnect();
        if let Some(netcode) = self.netcode.as_mut() {
            netcode.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_transport_is_idle() {
        let transport = RenetTransport::new(1, common_net::private_key());
        assert!(!transport.is_connecting());
        assert!(!transport.is_connected());
        assert_eq!(transport.last_ping_millis(), NO_PING_SAMPLE);
        assert!(transport.last_error_message().is_none());
    }

    #[test]
    fn invalid_address_is_reported_as_error() {
        let mut transport = RenetTransport::new(1, common_net::private_key());
        transport.connect("not an address");

        assert!(!transport.is_connecting());
        assert!(!transport.is_connected());
        let message = transport
            .last_error_message()
            .expect("connect failure should leave a message");
        assert!(message.contains("not an address"));
    }

    #[test]
    fn valid_address_starts_connecting() {
        let mut transport = RenetTransport::new(1, common_net::private_key());
        transport.connect("127.0.0.1:5999");

        assert!(transport.is_connecting());
        assert!(!transport.is_connected());
        assert!(transport.last_error_message().is_none());

        transport.disconnect();
        assert!(!transport.is_connecting());
        transport.disconnect();
    }

    #[test]
    fn disconnect_without_link_is_harmless() {
        let mut transport = RenetTransport::new(1, common_net::private_key());
        transport.disconnect();
        transport.request_ping();
        assert_eq!(transport.last_ping_millis(), NO_PING_SAMPLE);
    }

    #[test]
    fn netcode_reasons_are_readable() {
        assert_eq!(humanize_netcode_reason("DisconnectedByServer"), None);
        assert_eq!(
            humanize_netcode_reason("ConnectionRequestTimedOut").as_deref(),
            Some("Connection timed out: room not responding.")
        );
        assert_eq!(
            humanize_netcode_reason("ConnectionDenied").as_deref(),
            Some("Connection denied: room full or access restricted.")
        );
    }
}
