//! Wire protocol for cinerate.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`RoomId`], [`Stage`], [`RoomSnapshot`], etc.) — the
//!   structures that travel on the wire.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) — the tagged frames
//!   built from those types.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how frames are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding,
//!   decoding, or validating.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! layer (game state). It doesn't know about connections or rooms — it
//! only knows how to name and serialize what flows between them.

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent};
pub use types::{
    ChatLine, ConnId, Guess, Movie, Participant, ROOM_ID_LEN, RoomId,
    RoomSnapshot, RoomSummary, Stage,
};
