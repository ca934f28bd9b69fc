use bincode::{
    config::standard,
    error::{DecodeError, EncodeError},
    serde::{decode_from_slice, encode_to_vec},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use strum::IntoStaticStr;
use thiserror::Error;

/// What a room tells each client once it has joined.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub name: String,
    pub description: Option<String>,
}

impl RoomInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum ClientMessage {
    Ping { nonce: u32 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum ServerMessage {
    RoomInfo(RoomInfo),
    Pong { nonce: u32 },
}

impl ClientMessage {
    pub fn variant_name(&self) -> &'static str {
        self.into()
    }
}

impl ServerMessage {
    pub fn variant_name(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] EncodeError),
    #[error("failed to decode message: {0}")]
    Decode(#[from] DecodeError),
}

pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(encode_to_vec(message, standard())?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    let (message, _) = decode_from_slice::<T, _>(bytes, standard())?;
    Ok(message)
}

pub fn version() -> u64 {
    env!("CARGO_PKG_VERSION")
        .split('.')
        .next()
        .and_then(|major| major.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_info_survives_the_wire() {
        let info = RoomInfo::new("Arena").with_description("Fast rounds, no mercy.");
        let bytes = encode(&ServerMessage::RoomInfo(info.clone())).expect("encodes");
        let decoded: ServerMessage = decode(&bytes).expect("decodes");
        assert_eq!(decoded, ServerMessage::RoomInfo(info));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let result = decode::<ClientMessage>(&[0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn variant_names_are_static() {
        assert_eq!(ClientMessage::Ping { nonce: 1 }.variant_name(), "Ping");
        assert_eq!(ServerMessage::Pong { nonce: 1 }.variant_name(), "Pong");
    }

    #[test]
    fn version_comes_from_major_number() {
        assert_eq!(version(), 0);
    }
}
