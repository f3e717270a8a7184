//! # cinerate
//!
//! A WebSocket server for real-time movie-rating guessing games.
//!
//! Players gather in rooms. Each round one player is the dealer: they
//! pick a movie, everyone else guesses its critic rating, and the
//! guesses closest to the rating without going over win the round.
//!
//! This meta-crate wires the layers together:
//!
//! - [`cinerate-transport`](cinerate_transport) — WebSocket listener
//!   and framed connections
//! - [`cinerate-protocol`](cinerate_protocol) — wire events and the
//!   JSON codec
//! - [`cinerate-presence`](cinerate_presence) — connection-scoped
//!   player profiles
//! - [`cinerate-room`](cinerate_room) — room actors, game rules, and
//!   the room manager
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use cinerate::{CinerateServer, JsonCodec, StaticQuotes};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cinerate::ServerError> {
//!     let server = CinerateServer::<JsonCodec>::builder()
//!         .bind("127.0.0.1:3001")
//!         .build(StaticQuotes(vec!["I'll be back.".into()]))
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod gateway;
mod handler;
mod quotes;
mod server;

pub use error::ServerError;
pub use gateway::Gateway;
pub use quotes::{QuoteCache, QuoteSource, StaticQuotes};
pub use server::{CinerateServer, CinerateServerBuilder};

// Re-export the types callers need to configure a server or talk to
// one from Rust.
pub use cinerate_protocol::{
    ClientEvent, ConnId, Guess, JsonCodec, Movie, Participant, RoomId,
    RoomSnapshot, RoomSummary, ServerEvent, Stage,
};
pub use cinerate_room::RoomConfig;
