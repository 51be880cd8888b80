//! Persistence for room aggregates.
//!
//! The directory never keeps a room in memory between commands: every
//! command loads the room, mutates it and saves it back. A [`RoomStore`]
//! only has to provide whole-record reads and writes plus the two
//! reconnect lookups (by player id and by session id).

use std::future::Future;

use cardczar_game::Room;
use cardczar_protocol::{GameId, PlayerId, SessionId};
use dashmap::DashMap;
use serde_json::Value;

use crate::StoreError;

/// Storage for room records, keyed by game id.
///
/// Implementations must keep the player and session indices in step with
/// the records they save: after `save(room)`, every player id and session
/// id in `room` resolves to `room.id`, and ids that left the room no
/// longer do.
pub trait RoomStore: Send + Sync + 'static {
    fn load(&self, game_id: &GameId) -> impl Future<Output = Result<Option<Room>, StoreError>> + Send;

    fn save(&self, room: &Room) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes the record and its index entries. Deleting a missing room
    /// is not an error.
    fn delete(&self, game_id: &GameId) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn contains(&self, game_id: &GameId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// The room a player belongs to.
    fn find_by_player(
        &self,
        player_id: &PlayerId,
    ) -> impl Future<Output = Result<Option<GameId>, StoreError>> + Send;

    /// The room holding a live session.
    fn find_by_session(
        &self,
        session: SessionId,
    ) -> impl Future<Output = Result<Option<GameId>, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// What a saved room contributed to the lookup indices.
#[derive(Debug, Default)]
struct Indexed {
    players: Vec<PlayerId>,
    sessions: Vec<SessionId>,
}

/// Rooms kept as JSON documents in concurrent maps.
///
/// Records are stored serialized so that a load always hands out a fresh
/// copy; nothing a caller does to a loaded room is visible until it saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: DashMap<GameId, Value>,
    indexed: DashMap<GameId, Indexed>,
    players: DashMap<PlayerId, GameId>,
    sessions: DashMap<SessionId, GameId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn unindex(&self, game_id: &GameId) {
        let Some((_, old)) = self.indexed.remove(game_id) else {
            return;
        };
        for player in old.players {
            self.players.remove_if(&player, |_, owner| owner == game_id);
        }
        for session in old.sessions {
            self.sessions.remove_if(&session, |_, owner| owner == game_id);
        }
    }

    fn index(&self, room: &Room) {
        let indexed = Indexed {
            players: room.players.iter().map(|p| p.id.clone()).collect(),
            sessions: room.players.all_sessions(),
        };
        for player in &indexed.players {
            self.players.insert(player.clone(), room.id.clone());
        }
        for session in &indexed.sessions {
            self.sessions.insert(*session, room.id.clone());
        }
        self.indexed.insert(room.id.clone(), indexed);
    }
}

impl RoomStore for MemoryStore {
    async fn load(&self, game_id: &GameId) -> Result<Option<Room>, StoreError> {
        let Some(doc) = self.rooms.get(game_id).map(|doc| doc.value().clone()) else {
            return Ok(None);
        };
        serde_json::from_value(doc)
            .map(Some)
            .map_err(|e| StoreError::Corrupt(game_id.clone(), e))
    }

    async fn save(&self, room: &Room) -> Result<(), StoreError> {
        let doc = serde_json::to_value(room).map_err(|e| StoreError::Encode(room.id.clone(), e))?;
        self.unindex(&room.id);
        self.rooms.insert(room.id.clone(), doc);
        self.index(room);
        Ok(())
    }

    async fn delete(&self, game_id: &GameId) -> Result<(), StoreError> {
        self.unindex(game_id);
        self.rooms.remove(game_id);
        Ok(())
    }

    async fn contains(&self, game_id: &GameId) -> Result<bool, StoreError> {
        Ok(self.rooms.contains_key(game_id))
    }

    async fn find_by_player(&self, player_id: &PlayerId) -> Result<Option<GameId>, StoreError> {
        Ok(self.players.get(player_id).map(|g| g.value().clone()))
    }

    async fn find_by_session(&self, session: SessionId) -> Result<Option<GameId>, StoreError> {
        Ok(self.sessions.get(&session).map(|g| g.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use cardczar_game::{CardCatalog, Decks, Player, PlayerState};
    use cardczar_protocol::GameOptions;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn room(id: &str) -> Room {
        let catalog = CardCatalog::builtin().unwrap();
        let packs = catalog.pack_ids();
        let decks = Decks::from_catalog(&catalog, &packs, &mut StdRng::seed_from_u64(1));
        let options = GameOptions {
            card_packs: packs,
            ..GameOptions::default()
        };
        Room::new(GameId::from(id), options, decks, 0)
    }

    #[tokio::test]
    async fn test_save_then_load_returns_equal_room() {
        let store = MemoryStore::new();
        let mut original = room("a");
        original.players.push(Player::new(SessionId(1), PlayerState::PickingName));
        store.save(&original).await.unwrap();

        let loaded = store.load(&original.id).await.unwrap();
        assert_eq!(loaded, Some(original));
    }

    #[tokio::test]
    async fn test_load_missing_room_is_none() {
        let store = MemoryStore::new();
        assert!(store.load(&GameId::from("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_reindexes_players_and_sessions() {
        let store = MemoryStore::new();
        let mut r = room("a");
        let player = Player::new(SessionId(7), PlayerState::PickingName);
        let player_id = player.id.clone();
        r.players.push(player);
        store.save(&r).await.unwrap();
        assert_eq!(store.find_by_session(SessionId(7)).await.unwrap(), Some(r.id.clone()));
        assert_eq!(store.find_by_player(&player_id).await.unwrap(), Some(r.id.clone()));

        r.players.remove(&player_id);
        store.save(&r).await.unwrap();
        assert_eq!(store.find_by_session(SessionId(7)).await.unwrap(), None);
        assert_eq!(store.find_by_player(&player_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_clears_record_and_indices() {
        let store = MemoryStore::new();
        let mut r = room("a");
        r.players.push(Player::new(SessionId(3), PlayerState::PickingName));
        store.save(&r).await.unwrap();

        store.delete(&r.id).await.unwrap();
        assert!(store.is_empty());
        assert!(!store.contains(&r.id).await.unwrap());
        assert_eq!(store.find_by_session(SessionId(3)).await.unwrap(), None);
        store.delete(&r.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_loaded_copy_is_detached_from_store() {
        let store = MemoryStore::new();
        let r = room("a");
        store.save(&r).await.unwrap();

        let mut copy = store.load(&r.id).await.unwrap().unwrap();
        copy.last_activity_ms = 99;
        let again = store.load(&r.id).await.unwrap().unwrap();
        assert_eq!(again.last_activity_ms, 0);
    }
}
