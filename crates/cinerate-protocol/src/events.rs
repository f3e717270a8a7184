//! The inbound and outbound event vocabulary.
//!
//! Every client frame decodes to exactly one [`ClientEvent`] variant and
//! every server frame encodes from one [`ServerEvent`] variant. The
//! `event` tag carries the event name, so a frame looks like
//! `{"event":"cast_vote","id":3,"room":"…","vote":7.5,"item":{…}}` —
//! one explicit payload shape per event, dispatched with an exhaustive
//! match on the server side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ConnId, Movie, Participant, RoomId, RoomSummary, Stage};

/// Events a client sends to the server.
///
/// Field names mirror the established wire protocol: `id` is the sender's
/// connection id except in `start_game`/`send_message`, where it names
/// the room (a quirk the deployed clients rely on). `join_room` carries
/// the room id as a raw string because its shape still needs validating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    UpdateName {
        id: ConnId,
        name: String,
    },
    CreateRoom {
        id: ConnId,
        password: String,
    },
    JoinRoom {
        id: ConnId,
        room: String,
        password: String,
    },
    LeaveRoom {
        id: ConnId,
        room: RoomId,
    },
    /// `id` is the room to start.
    StartGame {
        id: RoomId,
    },
    MovieSelected {
        room: RoomId,
        item: Movie,
    },
    CastVote {
        id: ConnId,
        room: RoomId,
        vote: f64,
        item: Movie,
    },
    NextRound {
        room: RoomId,
    },
    AssignDealer {
        room: RoomId,
    },
    GameOver {
        room: RoomId,
    },
    /// `id` is the room the message is for.
    SendMessage {
        id: RoomId,
        name: String,
        message: String,
    },
    GetQuote {
        room: RoomId,
    },
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The recipient's own participant profile.
    Entry { player: Participant },
    /// The public room index (room id → summary).
    UpdatePublicRooms {
        rooms: BTreeMap<RoomId, RoomSummary>,
    },
    /// Full snapshot of a room the recipient is subscribed to.
    UpdateRoom { room: crate::RoomSnapshot },
    UpdateStage { stage: Stage },
    Notification { message: String },
    UpdateQuote { quote: String },
    /// A new chat line landed in the recipient's room.
    UpdateRoomChatNotification,
}

// =========================================================================
// Tests
// =========================================================================
