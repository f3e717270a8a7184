//! Error types for the room layer.

use cinerate_protocol::{ConnId, ProtocolError, RoomId};

/// Errors that can occur during room operations.
///
/// These are client-input errors, not faults: the connection handler
/// maps each to the matching notification text and carries on.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The supplied room id has the wrong shape.
    #[error(transparent)]
    InvalidId(#[from] ProtocolError),

    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// A room with this id already exists.
    #[error("room {0} already exists")]
    AlreadyExists(RoomId),

    /// The room's game is already in progress.
    #[error("room {0} has already started")]
    GameStarted(RoomId),

    /// The supplied password does not match the room's.
    #[error("wrong password for room {0}")]
    InvalidPassword(RoomId),

    /// The participant is already in a room.
    #[error("participant {0} already in room {1}")]
    AlreadyInRoom(ConnId, RoomId),

    /// The participant is not in any room.
    #[error("participant {0} not in any room")]
    NotInRoom(ConnId),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
