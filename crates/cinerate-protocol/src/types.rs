//! Core wire types shared by the server and its clients.
//!
//! Everything here travels as JSON. Clients are stateless renderers of
//! the latest [`RoomSnapshot`], so the snapshot always carries the full
//! room — players with resolved profiles, chat, guesses, winners — never
//! a diff.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use cinerate_transport::ConnId;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// Length of a room identifier: 32 hex characters.
pub const ROOM_ID_LEN: usize = 32;

/// A room identifier: a fixed 32-hex-character digest.
///
/// Derived deterministically from the creator's connection id, so the
/// same creator always lands on the same room id within a process. Any
/// collision-resistant 32-hex digest is wire-compatible; this one is
/// SHA-256 truncated to 128 bits.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Derives the room id for a room created by `creator`.
    pub fn derived_from(creator: ConnId) -> Self {
        let digest = Sha256::digest(creator.to_string().as_bytes());
        Self(hex::encode(&digest[..ROOM_ID_LEN / 2]))
    }

    /// Validates the fixed 32-character shape of a client-supplied id.
    ///
    /// Only the length is checked; an id of the right shape that names no
    /// existing room is caught by the room-store lookup instead.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        if raw.len() != ROOM_ID_LEN {
            return Err(ProtocolError::InvalidRoomId(raw.len()));
        }
        Ok(Self(raw.to_owned()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The phase of a room's state machine, broadcast to drive client
/// presentation.
///
/// `Splash` is client-local (the pre-room screen); the server only ever
/// sends it to a participant who just left a room. `GameOver` is
/// terminal — the room is deleted immediately upon entering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Splash,
    AwaitPlayers,
    AssignMovie,
    CastVote,
    RoundOver,
    AssignDealer,
    GameOver,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Splash => "splash",
            Self::AwaitPlayers => "await-players",
            Self::AssignMovie => "assign-movie",
            Self::CastVote => "cast-vote",
            Self::RoundOver => "round-over",
            Self::AssignDealer => "assign-dealer",
            Self::GameOver => "game-over",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Game data
// ---------------------------------------------------------------------------

/// A round's chosen item. `rating` is the hidden target the players
/// guess against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    pub rating: f64,
}

/// A participant's profile as broadcast to clients.
///
/// The canonical record lives in the presence registry; everything on
/// the wire is a resolved copy of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ConnId,
    pub name: String,
    pub score: u32,
    pub turns: u32,
    /// Titles of items this participant has already played.
    pub history: Vec<String>,
}

/// One numeric guess submitted in the current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guess {
    pub player: ConnId,
    pub value: f64,
}

/// One line of room chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLine {
    pub name: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Room views
// ---------------------------------------------------------------------------

/// The full state of a room, broadcast whole after every mutation.
///
/// `players` order is meaningful: it is join order, and it breaks turn
/// ties when the next dealer is selected. `dealer`, `guesses`, and
/// `winners` reference players by id; clients resolve them against
/// `players`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub active: bool,
    pub host: ConnId,
    pub players: Vec<Participant>,
    pub chat: Vec<ChatLine>,
    pub dealer: Option<ConnId>,
    pub crit_movie: Option<Movie>,
    pub movies: Vec<Movie>,
    pub guesses: Vec<Guess>,
    pub winners: Vec<Guess>,
}

/// A room's entry in the public index shown on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub player_count: usize,
    pub active: bool,
    /// Whether joining requires a password.
    pub locked: bool,
}

// =========================================================================
// Tests
// =========================================================================
