use cinerate_protocol::ConnId;
use thiserror::Error;

/// Errors from the presence registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresenceError {
    #[error("no participant registered for {0}")]
    NotFound(ConnId),
}
