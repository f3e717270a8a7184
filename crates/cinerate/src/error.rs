//! Unified error type for the cinerate server.

use cinerate_presence::PresenceError;
use cinerate_protocol::ProtocolError;
use cinerate_room::RoomError;
use cinerate_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid room id).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A presence-level error (unknown participant).
    #[error(transparent)]
    Presence(#[from] PresenceError),

    /// A room-level error (not found, wrong password, already started).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The quote source could not be read.
    #[error("quote source unavailable: {0}")]
    QuoteSource(String),
}
