//! Room manager: creates, tracks, and routes participants to rooms.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use cinerate_presence::PresenceRegistry;
use cinerate_protocol::{ConnId, Movie, RoomId, RoomSummary};

use crate::room::spawn_room;
use crate::{RoomConfig, RoomError, RoomHandle, Subscriber};

/// Manages all active rooms and tracks which participant is in which.
///
/// This is the entry point for room operations from the server layer.
/// The `membership` index enforces the one-room-per-participant
/// invariant; room-internal state lives in the actors.
pub struct RoomManager {
    /// Active rooms, keyed by room id.
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each participant to the room they currently occupy.
    membership: HashMap<ConnId, RoomId>,

    registry: Arc<PresenceRegistry>,
    config: RoomConfig,
}

impl RoomManager {
    /// Creates a new, empty room manager.
    pub fn new(registry: Arc<PresenceRegistry>, config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            membership: HashMap::new(),
            registry,
            config,
        }
    }

    /// Creates a room with `creator` as host and sole player.
    ///
    /// The room id is derived from the creator's connection id.
    pub fn create_room(
        &mut self,
        creator: ConnId,
        subscriber: Subscriber,
        password: String,
    ) -> Result<RoomId, RoomError> {
        if let Some(current) = self.membership.get(&creator) {
            return Err(RoomError::AlreadyInRoom(creator, current.clone()));
        }

        let room_id = RoomId::derived_from(creator);
        if self.rooms.contains_key(&room_id) {
            // The creator left their previous room but others kept it
            // alive; the derived id is taken until they disband.
            return Err(RoomError::AlreadyExists(room_id));
        }

        let handle = spawn_room(
            room_id.clone(),
            creator,
            subscriber,
            password,
            Arc::clone(&self.registry),
            &self.config,
        );
        self.rooms.insert(room_id.clone(), handle);
        self.membership.insert(creator, room_id.clone());
        tracing::info!(%room_id, %creator, "room created");
        Ok(room_id)
    }

    /// Seats a participant in an existing room.
    ///
    /// Validates the id shape here; existence, active, and password
    /// checks happen in the room actor where they are race-free.
    pub async fn join_room(
        &mut self,
        conn: ConnId,
        raw_room: &str,
        password: String,
        subscriber: Subscriber,
    ) -> Result<RoomId, RoomError> {
        let room_id = RoomId::parse(raw_room)?;

        if let Some(current) = self.membership.get(&conn) {
            return Err(RoomError::AlreadyInRoom(conn, current.clone()));
        }

        let handle = self
            .rooms
            .get(&room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        handle.join(conn, subscriber, password).await?;
        self.membership.insert(conn, room_id.clone());
        Ok(room_id)
    }

    /// Removes a participant from their current room.
    ///
    /// Returns `true` if the room emptied and was deleted, so the caller
    /// knows to refresh the public index.
    pub async fn leave_room(
        &mut self,
        conn: ConnId,
    ) -> Result<bool, RoomError> {
        let room_id = self
            .membership
            .get(&conn)
            .cloned()
            .ok_or(RoomError::NotInRoom(conn))?;

        let closed = match self.rooms.get(&room_id) {
            Some(handle) => handle.leave(conn).await?.closed,
            // Actor already gone; just drop the stale index entry.
            None => true,
        };

        self.membership.remove(&conn);
        if closed {
            self.rooms.remove(&room_id);
            tracing::info!(%room_id, "room disbanded");
        }
        Ok(closed)
    }

    pub async fn start_game(
        &self,
        room_id: &RoomId,
    ) -> Result<(), RoomError> {
        self.handle(room_id)?.start_game().await
    }

    pub async fn movie_selected(
        &self,
        room_id: &RoomId,
        item: Movie,
    ) -> Result<(), RoomError> {
        self.handle(room_id)?.movie_selected(item).await
    }

    pub async fn cast_vote(
        &self,
        room_id: &RoomId,
        voter: ConnId,
        value: f64,
        item: Movie,
    ) -> Result<(), RoomError> {
        self.handle(room_id)?.cast_vote(voter, value, item).await
    }

    pub async fn next_round(&self, room_id: &RoomId) -> Result<(), RoomError> {
        self.handle(room_id)?.next_round().await
    }

    pub async fn assign_dealer(
        &self,
        room_id: &RoomId,
    ) -> Result<(), RoomError> {
        self.handle(room_id)?.assign_dealer().await
    }

    pub async fn send_message(
        &self,
        room_id: &RoomId,
        name: String,
        message: String,
    ) -> Result<(), RoomError> {
        self.handle(room_id)?.send_message(name, message).await
    }

    pub async fn share_quote(
        &self,
        room_id: &RoomId,
        quote: String,
    ) -> Result<(), RoomError> {
        self.handle(room_id)?.share_quote(quote).await
    }

    /// Ends a game: the room broadcasts its farewell, then is removed.
    pub async fn game_over(
        &mut self,
        room_id: &RoomId,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        handle.game_over().await?;
        self.membership.retain(|_, rid| rid != room_id);
        tracing::info!(%room_id, "game over, room removed");
        Ok(())
    }

    /// Builds the public room index.
    ///
    /// Queries each actor; rooms that fail to respond (shutting down)
    /// are silently skipped.
    pub async fn summaries(&self) -> BTreeMap<RoomId, RoomSummary> {
        let mut index = BTreeMap::new();
        for (room_id, handle) in &self.rooms {
            if let Ok(summary) = handle.summary().await {
                index.insert(room_id.clone(), summary);
            }
        }
        index
    }

    /// Returns the room a participant currently occupies, if any.
    pub fn member_room(&self, conn: ConnId) -> Option<&RoomId> {
        self.membership.get(&conn)
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn handle(&self, room_id: &RoomId) -> Result<&RoomHandle, RoomError> {
        self.rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }
}
