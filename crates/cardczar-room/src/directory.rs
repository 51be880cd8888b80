//! Room directory: creates rooms and routes requests to their actors.

use std::future::Future;
use std::sync::Arc;

use cardczar_game::{CardCatalog, Decks, GameRules, Room, clamp_options};
use cardczar_protocol::{GameId, GameOptions, PlayerAction, PlayerId, SessionId};
use dashmap::DashMap;

use crate::actor::{Shared, spawn_room};
use crate::{Clock, DirectoryConfig, Emitter, Outcome, RoomError, RoomHandle, RoomStore};

/// Process-wide registry of rooms.
///
/// Rooms live in the store; an actor is spawned for a room the first time
/// a request reaches it and stops when the room is deleted. Requests for
/// unknown rooms resolve to [`Outcome::NotFound`].
pub struct RoomDirectory<S, E> {
    shared: Shared<S, E>,
    config: DirectoryConfig,
}

impl<S: RoomStore, E: Emitter> RoomDirectory<S, E> {
    pub fn new(store: Arc<S>, emitter: Arc<E>, catalog: Arc<CardCatalog>, config: DirectoryConfig) -> Self {
        Self::with_clock(store, emitter, catalog, config, Clock::system())
    }

    pub fn with_clock(
        store: Arc<S>,
        emitter: Arc<E>,
        catalog: Arc<CardCatalog>,
        config: DirectoryConfig,
        clock: Clock,
    ) -> Self {
        let shared = Shared {
            store,
            emitter,
            catalog,
            rules: Arc::new(config.rules.clone()),
            clock,
            registry: Arc::new(DashMap::new()),
        };
        Self { shared, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.shared.store
    }

    pub fn catalog(&self) -> &Arc<CardCatalog> {
        &self.shared.catalog
    }

    pub fn rules(&self) -> &GameRules {
        &self.shared.rules
    }

    /// Creates an empty room with every card pack selected and returns its
    /// id. No actor runs until somebody joins.
    pub async fn create_room(&self) -> Result<GameId, RoomError> {
        let mut game_id = GameId::generate();
        while self.shared.store.contains(&game_id).await? {
            game_id = GameId::generate();
        }

        let catalog = &self.shared.catalog;
        let requested = GameOptions {
            card_packs: catalog.pack_ids(),
            ..GameOptions::default()
        };
        let options = clamp_options(requested, &self.shared.rules, catalog);
        let decks = Decks::from_catalog(catalog, &options.card_packs, &mut rand::rng());
        let room = Room::new(game_id.clone(), options, decks, self.shared.clock.now_ms());

        self.shared.store.save(&room).await?;
        tracing::info!(%game_id, "room created");
        Ok(game_id)
    }

    /// Attaches `session` to a room.
    ///
    /// With a game id the session joins that room, reclaiming `player_id`'s
    /// seat if it is there. Without one, the room is looked up from the
    /// player id.
    pub async fn join(
        &self,
        session: SessionId,
        game_id: Option<GameId>,
        player_id: Option<PlayerId>,
    ) -> Result<Outcome, RoomError> {
        let target = match (game_id, &player_id) {
            (Some(game_id), _) => Some(game_id),
            (None, Some(player_id)) => self.shared.store.find_by_player(player_id).await?,
            (None, None) => None,
        };
        let Some(game_id) = target else {
            tracing::debug!(%session, "join without a known room");
            return Ok(Outcome::NotFound);
        };
        tracing::debug!(%game_id, %session, "join");

        self.with_room(&game_id, |handle| {
            let player_id = player_id.clone();
            async move { handle.join(session, player_id).await }
        })
        .await
    }

    /// Applies a player's action in their room.
    pub async fn act(&self, game_id: &GameId, player_id: PlayerId, action: PlayerAction) -> Result<Outcome, RoomError> {
        self.with_room(game_id, |handle| {
            let player_id = player_id.clone();
            let action = action.clone();
            async move { handle.act(player_id, action).await }
        })
        .await
    }

    /// A connection closed. Finds the session's room through the store.
    pub async fn disconnect(&self, session: SessionId) -> Result<Outcome, RoomError> {
        let Some(game_id) = self.shared.store.find_by_session(session).await? else {
            return Ok(Outcome::NotFound);
        };
        tracing::debug!(%game_id, %session, "disconnect");
        self.with_room(&game_id, |handle| async move { handle.disconnect(session).await })
            .await
    }

    /// Number of rooms with a running actor.
    pub fn live_rooms(&self) -> usize {
        self.shared.registry.len()
    }

    /// Stops every running actor. Rooms stay in the store.
    pub async fn shutdown(&self) {
        let handles: Vec<RoomHandle> = self
            .shared
            .registry
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for handle in handles {
            let _ = handle.shutdown().await;
        }
    }

    /// Sends a request to the room's actor, spawning it if needed. A
    /// request that meets a stopping actor is retried once on a fresh one.
    async fn with_room<F, Fut>(&self, game_id: &GameId, send: F) -> Result<Outcome, RoomError>
    where
        F: Fn(RoomHandle) -> Fut,
        Fut: Future<Output = Result<Outcome, RoomError>>,
    {
        for _ in 0..2 {
            let Some(handle) = self.handle(game_id).await? else {
                return Ok(Outcome::NotFound);
            };
            let instance = handle.instance();
            match send(handle).await {
                Err(RoomError::Unavailable(_)) => {
                    tracing::debug!(%game_id, "room actor gone, retrying");
                    self.shared
                        .registry
                        .remove_if(game_id, |_, h| h.instance() == instance);
                }
                other => return other,
            }
        }
        Err(RoomError::Unavailable(game_id.clone()))
    }

    /// The live actor for `game_id`, spawned on demand. `None` when the
    /// room is not stored.
    async fn handle(&self, game_id: &GameId) -> Result<Option<RoomHandle>, RoomError> {
        if let Some(handle) = self.shared.registry.get(game_id) {
            if !handle.is_closed() {
                return Ok(Some(handle.clone()));
            }
        }
        if !self.shared.store.contains(game_id).await? {
            return Ok(None);
        }

        let spawn = || spawn_room(game_id.clone(), self.shared.clone(), self.config.channel_size);
        let handle = self
            .shared
            .registry
            .entry(game_id.clone())
            .and_modify(|h| {
                if h.is_closed() {
                    *h = spawn();
                }
            })
            .or_insert_with(spawn)
            .clone();
        Ok(Some(handle))
    }
}
