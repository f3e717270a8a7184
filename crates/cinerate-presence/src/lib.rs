//! Participant presence for cinerate.
//!
//! A thin layer with one job: own the canonical [`Participant`] record
//! for every live connection. Rooms and the server store `ConnId`s and
//! resolve them here, which is what keeps scores, turn counts, and
//! renames consistent across every view of a player.
//!
//! ```text
//! Transport (ConnId) → Presence (Participant) → Room (seats by ConnId)
//! ```

mod error;
mod registry;

pub use cinerate_protocol::Participant;
pub use error::PresenceError;
pub use registry::PresenceRegistry;
