use std::time::Duration;

/// Configuration for room actors.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long a forfeiting dealer's room sits in `assign-dealer`
    /// before the deal is handed to the next player.
    pub dealer_grace: Duration,
    /// Command channel size — senders wait when it fills (backpressure).
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            dealer_grace: Duration::from_secs(3),
            channel_size: 64,
        }
    }
}
