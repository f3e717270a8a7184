use thiserror::Error;

/// Errors from encoding, decoding, or validating wire data.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[cfg(feature = "json")]
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),

    #[cfg(feature = "json")]
    #[error("failed to decode event: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid room id: expected {expected} characters, got {0}", expected = crate::ROOM_ID_LEN)]
    InvalidRoomId(usize),
}
