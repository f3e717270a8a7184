//! Room lifecycle and game rules for cinerate.
//!
//! Each room runs as an isolated Tokio task (actor model) owning one
//! guessing game: seating, stage transitions, vote collection, scoring,
//! chat, and the dealer-timeout deadline.
//!
//! # Key types
//!
//! - [`RoomManager`] — creates/disbands rooms, routes participants
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`logic`] — pure scoring and dealer-selection rules
//! - [`ChatLog`] — bounded FIFO room chat
//! - [`RoomConfig`] — room settings (dealer grace, channel size)

mod chat;
mod config;
mod error;
pub mod logic;
mod manager;
mod room;

pub use chat::{CHAT_CAPACITY, ChatLog};
pub use config::RoomConfig;
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{LeaveOutcome, RoomHandle, Subscriber};
