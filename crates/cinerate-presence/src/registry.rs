//! The presence registry: the single canonical record per participant.
//!
//! Every other layer holds only `ConnId`s. Rooms, the gateway, and the
//! server all resolve those ids against this registry, so a rename or a
//! score change made anywhere is immediately visible everywhere. There
//! is exactly one `Participant` record per connection, ever.
//!
//! # Concurrency note
//!
//! The registry is shared as `Arc<PresenceRegistry>` between the server
//! task and every room actor. A single `tokio::sync::Mutex` over the map
//! serializes all mutations. Hold times are tiny (a map lookup and a
//! field write), so contention is not a concern at this scale.

use std::collections::HashMap;

use tokio::sync::Mutex;

use cinerate_protocol::{ConnId, Participant};

use crate::PresenceError;

/// Tracks every connected participant's profile.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    participants: Mutex<HashMap<ConnId, Participant>>,
}

impl PresenceRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh participant for `conn` and returns the profile.
    ///
    /// Idempotent: registering an id that is already present returns the
    /// existing record untouched. The default name is derived from the
    /// connection id; clients rename via `update_name`.
    pub async fn register(&self, conn: ConnId) -> Participant {
        let mut participants = self.participants.lock().await;
        let participant =
            participants.entry(conn).or_insert_with(|| Participant {
                id: conn,
                name: conn.to_string(),
                score: 0,
                turns: 0,
                history: Vec::new(),
            });
        tracing::debug!(%conn, name = %participant.name, "participant registered");
        participant.clone()
    }

    /// Removes the participant for `conn`, returning the final profile.
    pub async fn unregister(&self, conn: ConnId) -> Option<Participant> {
        let removed = self.participants.lock().await.remove(&conn);
        if removed.is_some() {
            tracing::debug!(%conn, "participant unregistered");
        }
        removed
    }

    /// Replaces the participant's display name.
    ///
    /// # Errors
    /// Returns [`PresenceError::NotFound`] if `conn` is not registered.
    pub async fn rename(
        &self,
        conn: ConnId,
        name: String,
    ) -> Result<Participant, PresenceError> {
        let mut participants = self.participants.lock().await;
        let participant = participants
            .get_mut(&conn)
            .ok_or(PresenceError::NotFound(conn))?;
        participant.name = name;
        Ok(participant.clone())
    }

    /// Zeroes the participant's score. Called when they create or join
    /// a room, so stale points never leak across games.
    pub async fn reset_score(
        &self,
        conn: ConnId,
    ) -> Result<(), PresenceError> {
        self.with_mut(conn, |p| p.score = 0).await
    }

    /// Adds one point to the participant's score.
    pub async fn award_point(
        &self,
        conn: ConnId,
    ) -> Result<(), PresenceError> {
        self.with_mut(conn, |p| p.score += 1).await
    }

    /// Adds one turn to the participant's dealt-rounds count.
    pub async fn add_turn(&self, conn: ConnId) -> Result<(), PresenceError> {
        self.with_mut(conn, |p| p.turns += 1).await
    }

    /// Records a title the participant has dealt, so it can be filtered
    /// from their future picks.
    pub async fn push_history(
        &self,
        conn: ConnId,
        title: String,
    ) -> Result<(), PresenceError> {
        self.with_mut(conn, |p| p.history.push(title)).await
    }

    /// Looks up a single profile.
    pub async fn get(&self, conn: ConnId) -> Option<Participant> {
        self.participants.lock().await.get(&conn).cloned()
    }

    /// Resolves a seat list into profiles, preserving order.
    ///
    /// Ids with no record (a participant who vanished mid-broadcast) are
    /// skipped rather than erroring; the snapshot simply omits them.
    pub async fn profiles(&self, conns: &[ConnId]) -> Vec<Participant> {
        let participants = self.participants.lock().await;
        conns
            .iter()
            .filter_map(|conn| participants.get(conn).cloned())
            .collect()
    }

    /// Number of registered participants.
    pub async fn len(&self) -> usize {
        self.participants.lock().await.len()
    }

    /// Returns `true` if nobody is registered.
    pub async fn is_empty(&self) -> bool {
        self.participants.lock().await.is_empty()
    }

    async fn with_mut(
        &self,
        conn: ConnId,
        f: impl FnOnce(&mut Participant),
    ) -> Result<(), PresenceError> {
        let mut participants = self.participants.lock().await;
        let participant = participants
            .get_mut(&conn)
            .ok_or(PresenceError::NotFound(conn))?;
        f(participant);
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
