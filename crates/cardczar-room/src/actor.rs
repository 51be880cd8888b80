//! Room actor: one Tokio task per live room, and the room's only writer.
//!
//! Every command and every timer firing runs as one transaction against
//! the store: load the room, let the orchestrator change it, save it, and
//! only then tell the players. Commands for the same room queue up on the
//! actor's channel, so two transactions on one room never overlap; rooms
//! never wait on each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cardczar_game::orchestrator::{self, Context};
use cardczar_game::{CardCatalog, GameRules, OpResult, Rejection, Room, Transition};
use cardczar_protocol::{GameId, PlayerAction, PlayerId, Recipient, SessionId};
use cardczar_timer::{Fired, PhaseTimer};
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};

use crate::{Clock, Emitter, RoomError, RoomStore};

/// Counter for telling successive actors of the same room apart.
static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// What became of a request to a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The room changed and the change was committed and broadcast.
    Applied,
    /// The request did not fit the room's state; nothing changed.
    Rejected(Rejection),
    /// No such room (or it was deleted meanwhile).
    NotFound,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

type Reply = oneshot::Sender<Result<Outcome, RoomError>>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        session: SessionId,
        player_id: Option<PlayerId>,
        reply: Reply,
    },
    Action {
        player_id: PlayerId,
        action: PlayerAction,
        reply: Reply,
    },
    Disconnect {
        session: SessionId,
        reply: Reply,
    },
    /// Sent to itself after the last connection dropped.
    InactivityCheck,
    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone; the directory holds one per live room.
#[derive(Clone)]
pub struct RoomHandle {
    game_id: GameId,
    instance: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    /// Whether the actor behind this handle has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub(crate) fn instance(&self) -> u64 {
        self.instance
    }

    async fn request(&self, command: impl FnOnce(Reply) -> RoomCommand) -> Result<Outcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.game_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.game_id.clone()))?
    }

    pub async fn join(&self, session: SessionId, player_id: Option<PlayerId>) -> Result<Outcome, RoomError> {
        self.request(|reply| RoomCommand::Join {
            session,
            player_id,
            reply,
        })
        .await
    }

    pub async fn act(&self, player_id: PlayerId, action: PlayerAction) -> Result<Outcome, RoomError> {
        self.request(|reply| RoomCommand::Action {
            player_id,
            action,
            reply,
        })
        .await
    }

    pub async fn disconnect(&self, session: SessionId) -> Result<Outcome, RoomError> {
        self.request(|reply| RoomCommand::Disconnect { session, reply })
            .await
    }

    /// Tells the actor to stop. The room stays in the store.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.game_id.clone()))
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// What every actor of one directory shares.
pub(crate) struct Shared<S, E> {
    pub store: Arc<S>,
    pub emitter: Arc<E>,
    pub catalog: Arc<CardCatalog>,
    pub rules: Arc<GameRules>,
    pub clock: Clock,
    pub registry: Arc<DashMap<GameId, RoomHandle>>,
}

impl<S, E> Clone for Shared<S, E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            emitter: Arc::clone(&self.emitter),
            catalog: Arc::clone(&self.catalog),
            rules: Arc::clone(&self.rules),
            clock: self.clock,
            registry: Arc::clone(&self.registry),
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct RoomActor<S, E> {
    game_id: GameId,
    instance: u64,
    shared: Shared<S, E>,
    timer: PhaseTimer<Transition>,
    /// Generation of the last firing, never re-armed.
    last_fired: Option<u64>,
    receiver: mpsc::Receiver<RoomCommand>,
    inbox: mpsc::WeakSender<RoomCommand>,
    deleted: bool,
}

impl<S: RoomStore, E: Emitter> RoomActor<S, E> {
    async fn run(mut self) {
        tracing::info!(game_id = %self.game_id, "room actor started");
        self.resume_timer().await;

        while !self.deleted {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd).await {
                        break;
                    }
                }
                fired = self.timer.wait() => self.on_timer(fired).await,
            }
        }

        let instance = self.instance;
        self.shared
            .registry
            .remove_if(&self.game_id, |_, handle| handle.instance() == instance);
        let metrics = self.timer.metrics();
        tracing::info!(
            game_id = %self.game_id,
            deleted = self.deleted,
            timers_armed = metrics.total_armed,
            timers_fired = metrics.total_fired,
            timers_superseded = metrics.total_superseded,
            timers_cancelled = metrics.total_cancelled,
            "room actor stopped"
        );
    }

    /// Handles one command. Returns `false` when the actor should stop.
    async fn handle(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                session,
                player_id,
                reply,
            } => {
                let result = self
                    .transact(|room, ctx| orchestrator::join(room, ctx, session, player_id.as_ref()))
                    .await;
                let _ = reply.send(result);
            }
            RoomCommand::Action {
                player_id,
                action,
                reply,
            } => {
                let name = action.name();
                tracing::trace!(game_id = %self.game_id, %player_id, action = name, "action");
                let result = self
                    .transact(|room, ctx| orchestrator::apply(room, ctx, &player_id, action))
                    .await;
                let _ = reply.send(result);
            }
            RoomCommand::Disconnect { session, reply } => {
                let result = self
                    .transact(|room, ctx| orchestrator::disconnect(room, ctx, session))
                    .await;
                let _ = reply.send(result);
            }
            RoomCommand::InactivityCheck => {
                if let Err(err) = self.transact(orchestrator::check_inactivity).await {
                    tracing::error!(game_id = %self.game_id, error = %err, "inactivity check failed");
                }
            }
            RoomCommand::Shutdown => {
                tracing::info!(game_id = %self.game_id, "room shutting down");
                return false;
            }
        }
        true
    }

    async fn on_timer(&mut self, fired: Fired<Transition>) {
        let Fired {
            key: transition,
            generation,
            late_by,
        } = fired;
        tracing::debug!(
            game_id = %self.game_id,
            %transition,
            generation,
            late_ms = late_by.as_millis() as u64,
            "timer due"
        );
        self.last_fired = Some(generation);
        let result = self
            .transact(|room, ctx| orchestrator::fire_timer(room, ctx, transition, generation))
            .await;
        if let Err(err) = result {
            tracing::error!(game_id = %self.game_id, %transition, error = %err, "timer transaction failed");
        }
    }

    /// Runs `op` as one transaction: load, mutate, commit, then emit.
    ///
    /// A rejected operation commits nothing. A failed commit emits
    /// nothing: the working copy is dropped and the stored room stays as
    /// it was.
    async fn transact<F>(&mut self, op: F) -> Result<Outcome, RoomError>
    where
        F: FnOnce(&mut Room, &mut Context<'_>) -> OpResult,
    {
        let Some(mut room) = self.shared.store.load(&self.game_id).await? else {
            tracing::debug!(game_id = %self.game_id, "room no longer stored");
            self.deleted = true;
            return Ok(Outcome::NotFound);
        };

        let now_ms = self.shared.clock.now_ms();
        let result = {
            let mut ctx = Context::new(&self.shared.catalog, &self.shared.rules, now_ms);
            op(&mut room, &mut ctx)
        };
        let outbox = match result {
            Ok(outbox) => outbox,
            Err(rejection) => {
                tracing::debug!(game_id = %self.game_id, phase = %room.phase, %rejection, "rejected");
                self.sync_timer(&room);
                return Ok(Outcome::Rejected(rejection));
            }
        };

        if outbox.delete_room {
            if let Err(err) = self.shared.store.delete(&self.game_id).await {
                tracing::error!(game_id = %self.game_id, error = %err, "room delete failed");
                return Err(err.into());
            }
            self.timer.cancel();
            self.deleted = true;
            tracing::info!(game_id = %self.game_id, "room deleted");

            let mut sessions = room.players.all_sessions();
            sessions.extend_from_slice(&outbox.close);
            self.shared.emitter.close(&sessions);
            return Ok(Outcome::Applied);
        }

        if let Err(err) = self.shared.store.save(&room).await {
            tracing::error!(game_id = %self.game_id, error = %err, "commit failed, nothing sent");
            return Err(err.into());
        }
        self.sync_timer(&room);
        if outbox.inactivity_check {
            self.schedule_inactivity_check();
        }

        for (recipient, event) in outbox.render(&room, &self.shared.rules, now_ms) {
            let sessions = sessions_for(&room, recipient);
            if !sessions.is_empty() {
                self.shared.emitter.emit(&self.game_id, &sessions, &event);
            }
        }
        if !outbox.close.is_empty() {
            self.shared.emitter.close(&outbox.close);
        }
        Ok(Outcome::Applied)
    }

    /// Matches the local deadline to the room's committed pending timer.
    fn sync_timer(&mut self, room: &Room) {
        let Some(pending) = room.timer else {
            self.timer.cancel();
            return;
        };
        if self.timer.generation() == Some(pending.generation) || self.last_fired == Some(pending.generation) {
            return;
        }
        let grace_ms = self.shared.rules.grace_period.as_millis() as u64;
        let deadline = self.shared.clock.instant_at(pending.deadline_ms(grace_ms));
        self.timer
            .arm_at(pending.transition, pending.generation, deadline);
    }

    /// Re-arms a timer persisted by an earlier actor of this room.
    async fn resume_timer(&mut self) {
        match self.shared.store.load(&self.game_id).await {
            Ok(Some(room)) => self.sync_timer(&room),
            Ok(None) => self.deleted = true,
            Err(err) => tracing::error!(game_id = %self.game_id, error = %err, "could not resume room"),
        }
    }

    fn schedule_inactivity_check(&self) {
        let inbox = self.inbox.clone();
        let delay = self.shared.rules.inactive_room_ttl;
        tracing::debug!(game_id = %self.game_id, delay_s = delay.as_secs(), "inactivity check scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(sender) = inbox.upgrade() {
                let _ = sender.send(RoomCommand::InactivityCheck).await;
            }
        });
    }
}

/// The sessions an outbound event goes to, resolved against the committed
/// room.
fn sessions_for(room: &Room, recipient: Recipient) -> Vec<SessionId> {
    match recipient {
        Recipient::Room => room.players.all_sessions(),
        Recipient::Player(id) => room
            .player(&id)
            .map(|p| p.sessions.clone())
            .unwrap_or_default(),
        Recipient::Sessions(sessions) => sessions,
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `channel_size` controls backpressure: if the channel fills up, senders
/// wait.
pub(crate) fn spawn_room<S: RoomStore, E: Emitter>(
    game_id: GameId,
    shared: Shared<S, E>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);

    let actor = RoomActor {
        game_id: game_id.clone(),
        instance,
        timer: PhaseTimer::new(),
        shared,
        last_fired: None,
        receiver: rx,
        inbox: tx.downgrade(),
        deleted: false,
    };
    tokio::spawn(actor.run());

    RoomHandle {
        game_id,
        instance,
        sender: tx,
    }
}
