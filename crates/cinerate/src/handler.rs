//! Per-connection handler: registration and event routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Register with the gateway and the presence registry
//!   2. Send `entry` and the current public room index
//!   3. Loop: race inbound frames against the outbound event channel
//!
//! Client-input errors map to unicast notifications; nothing a client
//! sends is fatal to the process.

use std::sync::Arc;

use cinerate_protocol::{ClientEvent, Codec, ConnId, ServerEvent};
use cinerate_room::{RoomError, Subscriber};
use cinerate_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::ServerError;

/// Drop guard that cleans up a connection when the handler exits.
///
/// This ensures cleanup happens even if the handler errors or panics.
/// Since `Drop` is synchronous, it spawns a fire-and-forget task for
/// the async work: gateway deregistration, room removal (closing the
/// orphaned-player gap a plain socket drop would leave), and finally
/// the registry record.
struct ConnectionGuard<C: Codec> {
    conn_id: ConnId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.gateway.unregister(conn_id).await;

            let was_seated =
                state.rooms.lock().await.member_room(conn_id).is_some();
            if was_seated {
                let result = {
                    let mut rooms = state.rooms.lock().await;
                    rooms.leave_room(conn_id).await
                };
                if let Err(e) = result {
                    tracing::debug!(%conn_id, error = %e, "leave on disconnect failed");
                }
                refresh_public_rooms(&state).await;
            }

            state.registry.unregister(conn_id).await;
            tracing::info!(%conn_id, "connection cleaned up");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ServerError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, mut rx) = mpsc::unbounded_channel();
    state.gateway.register(conn_id, tx.clone()).await;
    let player = state.registry.register(conn_id).await;
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    // Greet: the client's own profile, then the room index for the
    // home screen.
    state
        .gateway
        .unicast(conn_id, ServerEvent::Entry { player })
        .await;
    let rooms = state.rooms.lock().await.summaries().await;
    state
        .gateway
        .unicast(conn_id, ServerEvent::UpdatePublicRooms { rooms })
        .await;

    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => {
                    match state.codec.decode::<ClientEvent>(&data) {
                        Ok(event) => {
                            dispatch(&state, conn_id, &tx, event).await;
                        }
                        Err(e) => {
                            tracing::debug!(
                                %conn_id, error = %e, "undecodable frame"
                            );
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!(%conn_id, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
            outbound = rx.recv() => match outbound {
                Some(event) => {
                    let bytes = state.codec.encode(&event)?;
                    conn.send(&bytes).await?;
                }
                None => break,
            },
        }
    }

    // _guard drops here → cleanup fires.
    Ok(())
}

/// Routes one decoded client event.
///
/// Payload ids are trusted as-is (no cross-check against the sending
/// socket); error notifications always go to the actual sender.
async fn dispatch<C: Codec>(
    state: &Arc<ServerState<C>>,
    conn_id: ConnId,
    tx: &Subscriber,
    event: ClientEvent,
) {
    match event {
        ClientEvent::UpdateName { id, name } => {
            match state.registry.rename(id, name).await {
                Ok(player) => {
                    state
                        .gateway
                        .unicast(id, ServerEvent::Entry { player })
                        .await;
                    notify(state, id, "Name updated.").await;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "rename failed");
                }
            }
        }

        ClientEvent::CreateRoom { id, password } => {
            // Lock only for the operation, drop before fan-out.
            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms.create_room(id, tx.clone(), password)
            };
            match result {
                Ok(room_id) => {
                    tracing::debug!(%conn_id, %room_id, "room created");
                    refresh_public_rooms(state).await;
                }
                Err(e) => notify_room_error(state, conn_id, &e).await,
            }
        }

        ClientEvent::JoinRoom { id, room, password } => {
            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms.join_room(id, &room, password, tx.clone()).await
            };
            match result {
                Ok(_) => refresh_public_rooms(state).await,
                Err(e) => notify_room_error(state, conn_id, &e).await,
            }
        }

        ClientEvent::LeaveRoom { id, room: _ } => {
            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms.leave_room(id).await
            };
            match result {
                Ok(_closed) => refresh_public_rooms(state).await,
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "leave failed");
                }
            }
        }

        ClientEvent::StartGame { id } => {
            let result = state.rooms.lock().await.start_game(&id).await;
            if let Err(e) = result {
                notify_room_error(state, conn_id, &e).await;
            }
        }

        ClientEvent::MovieSelected { room, item } => {
            let result =
                state.rooms.lock().await.movie_selected(&room, item).await;
            if let Err(e) = result {
                notify_room_error(state, conn_id, &e).await;
            }
        }

        ClientEvent::CastVote {
            id,
            room,
            vote,
            item,
        } => {
            let result = state
                .rooms
                .lock()
                .await
                .cast_vote(&room, id, vote, item)
                .await;
            if let Err(e) = result {
                notify_room_error(state, conn_id, &e).await;
            }
        }

        ClientEvent::NextRound { room } => {
            let result = state.rooms.lock().await.next_round(&room).await;
            if let Err(e) = result {
                notify_room_error(state, conn_id, &e).await;
            }
        }

        ClientEvent::AssignDealer { room } => {
            let result = state.rooms.lock().await.assign_dealer(&room).await;
            if let Err(e) = result {
                notify_room_error(state, conn_id, &e).await;
            }
        }

        ClientEvent::GameOver { room } => {
            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms.game_over(&room).await
            };
            match result {
                Ok(()) => refresh_public_rooms(state).await,
                Err(e) => notify_room_error(state, conn_id, &e).await,
            }
        }

        ClientEvent::SendMessage { id, name, message } => {
            let result = state
                .rooms
                .lock()
                .await
                .send_message(&id, name, message)
                .await;
            if let Err(e) = result {
                notify_room_error(state, conn_id, &e).await;
            }
        }

        ClientEvent::GetQuote { room } => {
            let quote = state.quotes.random().map(str::to_owned);
            match quote {
                Some(quote) => {
                    let result =
                        state.rooms.lock().await.share_quote(&room, quote).await;
                    if let Err(e) = result {
                        notify_room_error(state, conn_id, &e).await;
                    }
                }
                None => notify(state, conn_id, "No quotes available.").await,
            }
        }
    }
}

/// Rebuilds the public room index and pushes it to every client.
async fn refresh_public_rooms<C: Codec>(state: &Arc<ServerState<C>>) {
    let rooms = state.rooms.lock().await.summaries().await;
    state
        .gateway
        .broadcast_all(ServerEvent::UpdatePublicRooms { rooms })
        .await;
}

async fn notify<C: Codec>(
    state: &Arc<ServerState<C>>,
    conn: ConnId,
    message: &str,
) {
    state
        .gateway
        .unicast(
            conn,
            ServerEvent::Notification {
                message: message.to_owned(),
            },
        )
        .await;
}

/// Maps a rejected room operation to its client-facing notification.
async fn notify_room_error<C: Codec>(
    state: &Arc<ServerState<C>>,
    conn: ConnId,
    err: &RoomError,
) {
    tracing::debug!(%conn, error = %err, "room operation rejected");
    let message = match err {
        RoomError::InvalidPassword(_) => "Invalid password.",
        RoomError::GameStarted(_) => "Game already started.",
        _ => "Invalid room.",
    };
    notify(state, conn, message).await;
}
