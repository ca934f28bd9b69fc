use std::{io, net::AddrParseError};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot connect from state {0}")]
    AlreadyStarted(&'static str),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StartGameError {
    #[error("not connected to a room")]
    NotConnected,
    #[error("the connection already belongs to a running game")]
    HandedOff,
    #[error("{0}")]
    Rejected(String),
}

/// Failures while setting up a link; surfaced to the session as text.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid room address {address}: {source}")]
    InvalidAddress {
        address: String,
        source: AddrParseError,
    },
    #[error("failed to open socket: {0}")]
    Socket(#[from] io::Error),
    #[error("failed to create connect token: {0}")]
    Token(String),
    #[error("failed to create network transport: {0}")]
    Netcode(String),
}
