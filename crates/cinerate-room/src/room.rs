//! Room actor: an isolated Tokio task that owns one game.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. This is the "actor model" — no shared
//! mutable state, just message passing. Because every command for a room
//! flows through one channel, mutations within a room are totally
//! ordered: two simultaneous final votes can never both observe an
//! incomplete round.
//!
//! The actor's select loop also races a [`RoundTimer`], which drives the
//! dealer-timeout reassignment without any detached timer task that
//! could fire against advanced or deleted state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cinerate_presence::PresenceRegistry;
use cinerate_protocol::{
    ChatLine, ConnId, Guess, Movie, RoomId, RoomSnapshot, RoomSummary,
    ServerEvent, Stage,
};
use cinerate_timer::RoundTimer;
use tokio::sync::{mpsc, oneshot};

use crate::{ChatLog, RoomConfig, RoomError, logic};

/// Channel sender for delivering server events to one participant's
/// connection handler.
pub type Subscriber = mpsc::UnboundedSender<ServerEvent>;

/// The result of a leave: whether the room emptied and shut down.
#[derive(Debug, Clone, Copy)]
pub struct LeaveOutcome {
    pub closed: bool,
}

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel — the
/// caller sends a command and waits for the response. Game-flow commands
/// are fire-and-forget; the channel's FIFO order makes their effects
/// observable through any later replied command.
pub(crate) enum RoomCommand {
    Join {
        conn: ConnId,
        subscriber: Subscriber,
        password: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        conn: ConnId,
        reply: oneshot::Sender<Result<LeaveOutcome, RoomError>>,
    },
    StartGame,
    MovieSelected {
        item: Movie,
    },
    CastVote {
        voter: ConnId,
        value: f64,
        item: Movie,
    },
    NextRound,
    AssignDealer,
    SendMessage {
        name: String,
        message: String,
    },
    ShareQuote {
        quote: String,
    },
    GameOver {
        reply: oneshot::Sender<()>,
    },
    Summary {
        reply: oneshot::Sender<RoomSummary>,
    },
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone — an `mpsc::Sender` wrapper. The `RoomManager` holds
/// one of these per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Seats a participant, subject to the active/password checks.
    pub async fn join(
        &self,
        conn: ConnId,
        subscriber: Subscriber,
        password: String,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            conn,
            subscriber,
            password,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    /// Unseats a participant, reporting whether the room closed.
    pub async fn leave(
        &self,
        conn: ConnId,
    ) -> Result<LeaveOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            conn,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    pub async fn start_game(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::StartGame).await
    }

    pub async fn movie_selected(&self, item: Movie) -> Result<(), RoomError> {
        self.send(RoomCommand::MovieSelected { item }).await
    }

    pub async fn cast_vote(
        &self,
        voter: ConnId,
        value: f64,
        item: Movie,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::CastVote { voter, value, item }).await
    }

    pub async fn next_round(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::NextRound).await
    }

    pub async fn assign_dealer(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::AssignDealer).await
    }

    pub async fn send_message(
        &self,
        name: String,
        message: String,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::SendMessage { name, message }).await
    }

    pub async fn share_quote(&self, quote: String) -> Result<(), RoomError> {
        self.send(RoomCommand::ShareQuote { quote }).await
    }

    /// Ends the game: final broadcasts, then the actor stops. Resolves
    /// once the farewell has been sent.
    pub async fn game_over(&self) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GameOver { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Requests the room's public-index summary.
    ///
    /// Also serves as a barrier: the reply proves every command queued
    /// before it has been processed.
    pub async fn summary(&self) -> Result<RoomSummary, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Summary { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// Whether the actor loop keeps running after a command.
#[derive(PartialEq)]
enum Flow {
    Continue,
    Stop,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    password: String,
    active: bool,
    host: ConnId,
    /// Seating order. Join order is meaningful: `seats[0]` is the host
    /// fallback and the turn scheduler tie-breaks by this order.
    seats: Vec<ConnId>,
    subscribers: HashMap<ConnId, Subscriber>,
    chat: ChatLog,
    dealer: Option<ConnId>,
    crit_movie: Option<Movie>,
    movies: Vec<Movie>,
    guesses: Vec<Guess>,
    winners: Vec<Guess>,
    registry: Arc<PresenceRegistry>,
    timer: RoundTimer,
    dealer_grace: Duration,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, racing commands against the dealer deadline.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        // The creator is seated by the constructor; greet them the same
        // way a join would, with the creation notification.
        if let Err(e) = self.registry.reset_score(self.host).await {
            tracing::warn!(room_id = %self.room_id, %e, "creator not registered");
        }
        self.broadcast_room().await;
        self.stage_to(self.host, Stage::AwaitPlayers);
        self.notify(self.host, "Room created.");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle(cmd).await == Flow::Stop {
                            break;
                        }
                    }
                    None => break,
                },
                _generation = self.timer.fired() => {
                    self.handle_dealer_deadline().await;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    async fn handle(&mut self, cmd: RoomCommand) -> Flow {
        match cmd {
            RoomCommand::Join {
                conn,
                subscriber,
                password,
                reply,
            } => {
                let result = self.handle_join(conn, subscriber, password).await;
                let _ = reply.send(result);
            }
            RoomCommand::Leave { conn, reply } => {
                let result = self.handle_leave(conn).await;
                let closed = matches!(
                    result,
                    Ok(LeaveOutcome { closed: true })
                );
                let _ = reply.send(result);
                if closed {
                    return Flow::Stop;
                }
            }
            RoomCommand::StartGame => self.handle_start_game().await,
            RoomCommand::MovieSelected { item } => {
                self.handle_movie_selected(item).await;
            }
            RoomCommand::CastVote { voter, value, item } => {
                self.handle_cast_vote(voter, value, item).await;
            }
            RoomCommand::NextRound => self.handle_next_round().await,
            RoomCommand::AssignDealer => self.handle_assign_dealer().await,
            RoomCommand::SendMessage { name, message } => {
                self.handle_send_message(name, message).await;
            }
            RoomCommand::ShareQuote { quote } => {
                self.broadcast(ServerEvent::UpdateQuote { quote });
            }
            RoomCommand::GameOver { reply } => {
                self.stage_all(Stage::GameOver);
                self.notify_all("Game over.");
                let _ = reply.send(());
                return Flow::Stop;
            }
            RoomCommand::Summary { reply } => {
                let _ = reply.send(self.summary());
            }
        }
        Flow::Continue
    }

    async fn handle_join(
        &mut self,
        conn: ConnId,
        subscriber: Subscriber,
        password: String,
    ) -> Result<(), RoomError> {
        if self.active {
            return Err(RoomError::GameStarted(self.room_id.clone()));
        }
        if password != self.password {
            return Err(RoomError::InvalidPassword(self.room_id.clone()));
        }
        if self.seats.contains(&conn) {
            return Err(RoomError::AlreadyInRoom(
                conn,
                self.room_id.clone(),
            ));
        }

        if let Err(e) = self.registry.reset_score(conn).await {
            tracing::warn!(room_id = %self.room_id, %e, "joiner not registered");
        }
        self.seats.push(conn);
        self.subscribers.insert(conn, subscriber);
        tracing::info!(
            room_id = %self.room_id,
            %conn,
            players = self.seats.len(),
            "player joined"
        );

        self.broadcast_room().await;
        self.stage_to(conn, Stage::AwaitPlayers);
        self.notify(conn, "Joined room.");
        Ok(())
    }

    async fn handle_leave(
        &mut self,
        conn: ConnId,
    ) -> Result<LeaveOutcome, RoomError> {
        let Some(position) = self.seats.iter().position(|s| *s == conn)
        else {
            return Err(RoomError::NotInRoom(conn));
        };
        self.seats.remove(position);
        let leaver = self.subscribers.remove(&conn);

        if self.dealer == Some(conn) {
            self.dealer = None;
        }

        tracing::info!(
            room_id = %self.room_id,
            %conn,
            players = self.seats.len(),
            "player left"
        );

        let closed = self.seats.is_empty();
        if !closed {
            self.host = self.seats[0];
            let host_name = match self.registry.get(self.host).await {
                Some(p) => p.name,
                None => self.host.to_string(),
            };
            self.notify_all(&format!("New host assigned: {host_name}"));
            self.broadcast_room().await;
        }

        // The leaving client lands back on the home screen.
        if let Some(subscriber) = leaver {
            let _ = subscriber.send(ServerEvent::UpdateStage {
                stage: Stage::Splash,
            });
            let _ = subscriber.send(ServerEvent::Notification {
                message: "Left room.".to_owned(),
            });
        }

        Ok(LeaveOutcome { closed })
    }

    async fn handle_start_game(&mut self) {
        self.active = true;
        // The opening dealer is a free pick; the turn-fair rotation only
        // starts counting from the first next_round.
        self.dealer = logic::random_first_dealer(&self.seats);

        self.broadcast_room().await;
        self.stage_all(Stage::AssignMovie);
        self.notify_all("Game started.");
    }

    async fn handle_movie_selected(&mut self, item: Movie) {
        self.crit_movie = Some(item.clone());
        self.movies.push(item);

        self.broadcast_room().await;
        self.stage_all(Stage::CastVote);
        self.notify_all("Movie selected. Cast Vote.");
    }

    async fn handle_cast_vote(
        &mut self,
        voter: ConnId,
        value: f64,
        item: Movie,
    ) {
        if !self.seats.contains(&voter) {
            tracing::warn!(
                room_id = %self.room_id,
                %voter,
                "vote from non-member, ignoring"
            );
            return;
        }
        if self.guesses.iter().any(|g| g.player == voter) {
            tracing::debug!(
                room_id = %self.room_id,
                %voter,
                "duplicate vote ignored"
            );
            return;
        }

        self.guesses.push(Guess {
            player: voter,
            value,
        });
        if let Err(e) = self.registry.push_history(voter, item.title).await {
            tracing::debug!(room_id = %self.room_id, %e, "voter not registered");
        }

        if self.guesses.len() < self.seats.len() {
            // Private acknowledgement; the room learns nothing until the
            // final vote lands.
            self.notify(voter, "Vote cast.");
            return;
        }

        if let Some(movie) = &self.crit_movie {
            self.winners = logic::round_winners(&self.guesses, movie.rating);
            for winner in &self.winners {
                if let Err(e) = self.registry.award_point(winner.player).await
                {
                    tracing::debug!(
                        room_id = %self.room_id,
                        %e,
                        "winner not registered"
                    );
                }
            }
        }

        self.broadcast_room().await;
        self.stage_all(Stage::RoundOver);
        self.notify_all("Round over.");
    }

    async fn handle_next_round(&mut self) {
        // Advancing the round supersedes any pending dealer deadline.
        self.timer.disarm();
        self.rotate_dealer().await;

        self.winners.clear();
        self.guesses.clear();
        self.crit_movie = None;

        self.stage_all(Stage::AssignMovie);
        self.broadcast_room().await;
        self.notify_all("Next round.");
    }

    async fn handle_assign_dealer(&mut self) {
        self.stage_all(Stage::AssignDealer);
        self.notify_all("Dealer time expired.");

        // Penalty turn for the forfeiting dealer, on top of the turn the
        // reassignment will cost its pick.
        if let Some(dealer) = self.dealer {
            if let Err(e) = self.registry.add_turn(dealer).await {
                tracing::debug!(
                    room_id = %self.room_id,
                    %e,
                    "forfeiting dealer not registered"
                );
            }
        }

        self.timer.arm(self.dealer_grace);
    }

    async fn handle_dealer_deadline(&mut self) {
        tracing::debug!(room_id = %self.room_id, "dealer grace elapsed");
        self.rotate_dealer().await;

        self.stage_all(Stage::AssignMovie);
        self.broadcast_room().await;
        self.notify_all("New dealer.");
    }

    async fn handle_send_message(&mut self, name: String, message: String) {
        self.chat.push(ChatLine { name, message });

        self.broadcast_room().await;
        self.broadcast(ServerEvent::UpdateRoomChatNotification);
    }

    /// Hands the deal to the seat with the fewest turns and charges the
    /// pick one turn.
    async fn rotate_dealer(&mut self) {
        let profiles = self.registry.profiles(&self.seats).await;
        if let Some(index) = logic::next_dealer(&profiles) {
            let next = profiles[index].id;
            if let Err(e) = self.registry.add_turn(next).await {
                tracing::debug!(
                    room_id = %self.room_id,
                    %e,
                    "next dealer not registered"
                );
            }
            self.dealer = Some(next);
        } else {
            self.dealer = None;
        }
    }

    async fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.room_id.clone(),
            active: self.active,
            host: self.host,
            players: self.registry.profiles(&self.seats).await,
            chat: self.chat.lines(),
            dealer: self.dealer,
            crit_movie: self.crit_movie.clone(),
            movies: self.movies.clone(),
            guesses: self.guesses.clone(),
            winners: self.winners.clone(),
        }
    }

    fn summary(&self) -> RoomSummary {
        RoomSummary {
            player_count: self.seats.len(),
            active: self.active,
            locked: !self.password.is_empty(),
        }
    }

    async fn broadcast_room(&self) {
        let room = self.snapshot().await;
        self.broadcast(ServerEvent::UpdateRoom { room });
    }

    fn stage_all(&self, stage: Stage) {
        self.broadcast(ServerEvent::UpdateStage { stage });
    }

    fn stage_to(&self, conn: ConnId, stage: Stage) {
        self.send_to(conn, ServerEvent::UpdateStage { stage });
    }

    fn notify_all(&self, message: &str) {
        self.broadcast(ServerEvent::Notification {
            message: message.to_owned(),
        });
    }

    fn notify(&self, conn: ConnId, message: &str) {
        self.send_to(
            conn,
            ServerEvent::Notification {
                message: message.to_owned(),
            },
        );
    }

    fn broadcast(&self, event: ServerEvent) {
        for conn in &self.seats {
            self.send_to(*conn, event.clone());
        }
    }

    /// Sends an event to a single seat. Silently drops if the receiver
    /// is gone (participant disconnected).
    fn send_to(&self, conn: ConnId, event: ServerEvent) {
        if let Some(subscriber) = self.subscribers.get(&conn) {
            let _ = subscriber.send(event);
        }
    }
}

/// Spawns a new room actor with `creator` as the sole seated player and
/// host, and returns a handle to communicate with it.
pub(crate) fn spawn_room(
    room_id: RoomId,
    creator: ConnId,
    subscriber: Subscriber,
    password: String,
    registry: Arc<PresenceRegistry>,
    config: &RoomConfig,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let actor = RoomActor {
        room_id: room_id.clone(),
        password,
        active: false,
        host: creator,
        seats: vec![creator],
        subscribers: HashMap::from([(creator, subscriber)]),
        chat: ChatLog::new(),
        dealer: None,
        crit_movie: None,
        movies: Vec::new(),
        guesses: Vec::new(),
        winners: Vec::new(),
        registry,
        timer: RoundTimer::new(),
        dealer_grace: config.dealer_grace,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
