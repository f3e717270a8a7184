//! `CinerateServer` builder and accept loop.
//!
//! This is the entry point for running a cinerate server. It ties
//! together all the layers: transport → protocol → presence → room.

use std::sync::Arc;

use cinerate_presence::PresenceRegistry;
use cinerate_protocol::{Codec, JsonCodec};
use cinerate_room::{RoomConfig, RoomManager};
use cinerate_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::quotes::{QuoteCache, QuoteSource};
use crate::{Gateway, ServerError};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. Interior
/// mutability via `Mutex` where needed; the registry and gateway carry
/// their own locks.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Arc<PresenceRegistry>,
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) gateway: Gateway,
    pub(crate) quotes: QuoteCache,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a cinerate server.
///
/// # Example
///
/// ```rust,ignore
/// use cinerate::{CinerateServer, StaticQuotes};
///
/// let server = CinerateServer::builder()
///     .bind("0.0.0.0:3001")
///     .build(StaticQuotes(vec!["I'll be back.".into()]))
///     .await?;
/// server.run().await
/// ```
pub struct CinerateServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl CinerateServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room configuration (dealer grace period etc.).
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Builds the server, loading the quote cache from the given source.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`, which is what the
    /// browser clients speak.
    pub async fn build(
        self,
        quotes: impl QuoteSource,
    ) -> Result<CinerateServer<JsonCodec>, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let registry = Arc::new(PresenceRegistry::new());
        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(
                Arc::clone(&registry),
                self.room_config,
            )),
            registry,
            gateway: Gateway::new(),
            quotes: QuoteCache::load(&quotes).await,
            codec: JsonCodec,
        });

        Ok(CinerateServer { transport, state })
    }
}

impl Default for CinerateServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running cinerate server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct CinerateServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> CinerateServer<C> {
    /// Creates a new builder.
    pub fn builder() -> CinerateServerBuilder {
        CinerateServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("cinerate server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
