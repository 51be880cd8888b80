//! Integration tests for the room directory with a recording emitter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cardczar_game::{CardCatalog, Phase, Rejection, Room};
use cardczar_protocol::{CardId, GameId, PlayerAction, PlayerId, ServerEvent, SessionId};
use cardczar_room::{
    Clock, DirectoryConfig, Emitter, MemoryStore, Outcome, RoomDirectory, RoomError, RoomStore,
    StoreError,
};

// =========================================================================
// Recording emitter
// =========================================================================

#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<(SessionId, ServerEvent)>>,
    closed: Mutex<Vec<SessionId>>,
}

impl Emitter for Recorder {
    fn emit(&self, _game_id: &GameId, sessions: &[SessionId], event: &ServerEvent) {
        let mut sent = self.sent.lock().unwrap();
        for session in sessions {
            sent.push((*session, event.clone()));
        }
    }

    fn close(&self, sessions: &[SessionId]) {
        self.closed.lock().unwrap().extend_from_slice(sessions);
    }
}

impl Recorder {
    fn take(&self) -> Vec<(SessionId, ServerEvent)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    fn closed(&self) -> Vec<SessionId> {
        self.closed.lock().unwrap().clone()
    }
}

// =========================================================================
// Store that can be told to fail
// =========================================================================

#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_saves: AtomicBool,
}

impl RoomStore for FlakyStore {
    async fn load(&self, game_id: &GameId) -> Result<Option<Room>, StoreError> {
        self.inner.load(game_id).await
    }

    async fn save(&self, room: &Room) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk on fire".into()));
        }
        self.inner.save(room).await
    }

    async fn delete(&self, game_id: &GameId) -> Result<(), StoreError> {
        self.inner.delete(game_id).await
    }

    async fn contains(&self, game_id: &GameId) -> Result<bool, StoreError> {
        self.inner.contains(game_id).await
    }

    async fn find_by_player(&self, player_id: &PlayerId) -> Result<Option<GameId>, StoreError> {
        self.inner.find_by_player(player_id).await
    }

    async fn find_by_session(&self, session: SessionId) -> Result<Option<GameId>, StoreError> {
        self.inner.find_by_session(session).await
    }
}

// =========================================================================
// Helpers
// =========================================================================

type Directory = RoomDirectory<FlakyStore, Recorder>;

fn directory() -> (Directory, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let catalog = Arc::new(CardCatalog::builtin().unwrap());
    let dir = RoomDirectory::with_clock(
        Arc::new(FlakyStore::default()),
        Arc::clone(&recorder),
        catalog,
        DirectoryConfig::default(),
        Clock::starting_at(1_700_000_000_000),
    );
    (dir, recorder)
}

async fn load(dir: &Directory, game: &GameId) -> Room {
    dir.store().load(game).await.unwrap().expect("room stored")
}

async fn player_of(dir: &Directory, game: &GameId, session: u64) -> PlayerId {
    let room = load(dir, game).await;
    room.player_by_session(SessionId(session)).unwrap().id.clone()
}

async fn seat(dir: &Directory, game: &GameId, session: u64, name: &str) -> PlayerId {
    let outcome = dir.join(SessionId(session), Some(game.clone()), None).await.unwrap();
    assert!(outcome.is_applied());
    let id = player_of(dir, game, session).await;
    let outcome = dir
        .act(game, id.clone(), PlayerAction::SetPlayerName(name.into()))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Applied);
    id
}

/// A room with three named players; the first is host.
async fn table() -> (Directory, Arc<Recorder>, GameId, Vec<PlayerId>) {
    let (dir, recorder) = directory();
    let game = dir.create_room().await.unwrap();
    let mut ids = Vec::new();
    for (session, name) in [(1, "Ada"), (2, "Bob"), (3, "Cy")] {
        ids.push(seat(&dir, &game, session, name).await);
    }
    recorder.take();
    (dir, recorder, game, ids)
}

fn events_for(sent: &[(SessionId, ServerEvent)], session: u64) -> Vec<&ServerEvent> {
    sent.iter()
        .filter(|(s, _)| *s == SessionId(session))
        .map(|(_, e)| e)
        .collect()
}

// =========================================================================
// Creating and joining
// =========================================================================

#[tokio::test]
async fn test_create_room_stores_room_without_actor() {
    let (dir, _) = directory();
    let game = dir.create_room().await.unwrap();

    let room = load(&dir, &game).await;
    assert_eq!(room.phase, Phase::Lobby);
    assert_eq!(room.options.card_packs.len(), dir.catalog().pack_ids().len());
    assert_eq!(dir.live_rooms(), 0);
}

#[tokio::test]
async fn test_create_room_returns_unique_ids() {
    let (dir, _) = directory();
    let a = dir.create_room().await.unwrap();
    let b = dir.create_room().await.unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn test_join_sends_snapshot_and_makes_first_player_host() {
    let (dir, recorder) = directory();
    let game = dir.create_room().await.unwrap();

    let outcome = dir.join(SessionId(1), Some(game.clone()), None).await.unwrap();
    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(dir.live_rooms(), 1);

    let sent = recorder.take();
    let mine = events_for(&sent, 1);
    assert_eq!(mine.len(), 1);
    match mine[0] {
        ServerEvent::UpdateGameAndPlayers { player, .. } => assert!(player.is_host),
        other => panic!("expected snapshot, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_unknown_room_is_not_found() {
    let (dir, recorder) = directory();
    let outcome = dir
        .join(SessionId(1), Some(GameId::from("missing")), None)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::NotFound);
    assert_eq!(dir.live_rooms(), 0);
    assert!(recorder.take().is_empty());
}

#[tokio::test]
async fn test_rejoin_by_player_id_finds_room() {
    let (dir, recorder, game, ids) = table().await;
    dir.disconnect(SessionId(2)).await.unwrap();
    recorder.take();

    let outcome = dir.join(SessionId(20), None, Some(ids[1].clone())).await.unwrap();
    assert_eq!(outcome, Outcome::Applied);

    let room = load(&dir, &game).await;
    assert_eq!(room.player(&ids[1]).unwrap().sessions, vec![SessionId(20)]);
    assert!(!events_for(&recorder.take(), 20).is_empty());
}

// =========================================================================
// Actions
// =========================================================================

#[tokio::test]
async fn test_start_game_deals_choices_to_czar_only() {
    let (dir, recorder, game, ids) = table().await;

    let outcome = dir.act(&game, ids[0].clone(), PlayerAction::StartGame).await.unwrap();
    assert_eq!(outcome, Outcome::Applied);

    let sent = recorder.take();
    let dealt: Vec<SessionId> = sent
        .iter()
        .filter(|(_, e)| matches!(e, ServerEvent::DealBlackCards { .. }))
        .map(|(s, _)| *s)
        .collect();
    assert_eq!(dealt, vec![SessionId(1)]);
    for session in 1..=3 {
        assert!(
            events_for(&sent, session)
                .iter()
                .any(|e| matches!(e, ServerEvent::UpdateGameAndPlayers { .. }))
        );
    }
}

#[tokio::test]
async fn test_rejected_action_changes_and_sends_nothing() {
    let (dir, recorder, game, ids) = table().await;
    let before = load(&dir, &game).await;

    let outcome = dir.act(&game, ids[1].clone(), PlayerAction::StartGame).await.unwrap();
    assert_eq!(outcome, Outcome::Rejected(Rejection::NotHost));
    assert!(recorder.take().is_empty());
    assert_eq!(load(&dir, &game).await, before);
}

#[tokio::test]
async fn test_concurrent_submissions_reach_reading_once() {
    let (dir, recorder, game, ids) = table().await;
    dir.act(&game, ids[0].clone(), PlayerAction::StartGame).await.unwrap();

    let room = load(&dir, &game).await;
    let offered: Vec<CardId> = room.decks.offered.iter().map(|c| c.id.clone()).collect();
    dir.act(
        &game,
        ids[0].clone(),
        PlayerAction::SelectBlackCard {
            selected: offered[0].clone(),
            discarded: offered[1..].to_vec(),
        },
    )
    .await
    .unwrap();

    let room = load(&dir, &game).await;
    let blanks = room.current_round.as_ref().unwrap().black_card.blanks;
    let cards = |id: &PlayerId| -> Vec<CardId> {
        room.player(id).unwrap().hand.iter().take(blanks).map(|c| c.id.clone()).collect()
    };
    let (first, second) = (cards(&ids[1]), cards(&ids[2]));
    recorder.take();

    let (a, b) = tokio::join!(
        dir.act(&game, ids[1].clone(), PlayerAction::PlayWhiteCards(first)),
        dir.act(&game, ids[2].clone(), PlayerAction::PlayWhiteCards(second)),
    );
    assert_eq!(a.unwrap(), Outcome::Applied);
    assert_eq!(b.unwrap(), Outcome::Applied);

    let room = load(&dir, &game).await;
    assert_eq!(room.phase, Phase::ReadingCards);
    assert_eq!(room.current_round.as_ref().unwrap().submissions.len(), 2);
}

#[tokio::test]
async fn test_failed_commit_sends_nothing_and_keeps_stored_room() {
    let (dir, recorder, game, ids) = table().await;
    let before = load(&dir, &game).await;

    dir.store().fail_saves.store(true, Ordering::SeqCst);
    let result = dir.act(&game, ids[0].clone(), PlayerAction::StartGame).await;
    assert!(matches!(result, Err(RoomError::Persistence(_))));
    assert!(recorder.take().is_empty());
    assert_eq!(load(&dir, &game).await, before);

    dir.store().fail_saves.store(false, Ordering::SeqCst);
    let outcome = dir.act(&game, ids[0].clone(), PlayerAction::StartGame).await.unwrap();
    assert_eq!(outcome, Outcome::Applied);
}

#[tokio::test]
async fn test_kick_closes_target_sessions() {
    let (dir, recorder, game, ids) = table().await;
    let target = load(&dir, &game).await.player(&ids[2]).unwrap().public_id.clone();

    dir.act(
        &game,
        ids[0].clone(),
        PlayerAction::KickPlayer {
            target,
            remove_from_game: true,
        },
    )
    .await
    .unwrap();

    assert_eq!(recorder.closed(), vec![SessionId(3)]);
    let sent = recorder.take();
    assert!(
        events_for(&sent, 3)
            .iter()
            .any(|e| matches!(e, ServerEvent::Notification { .. }))
    );
    assert!(load(&dir, &game).await.player(&ids[2]).is_none());
}

// =========================================================================
// Timers
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_black_card_timeout_fires_through_actor() {
    let (dir, _recorder, game, ids) = table().await;
    dir.act(&game, ids[0].clone(), PlayerAction::StartGame).await.unwrap();

    // 30 s selection timer plus 2 s grace.
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(load(&dir, &game).await.phase, Phase::PickingBlackCard);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let room = load(&dir, &game).await;
    assert_eq!(room.phase, Phase::PlayingWhiteCards);
    assert_eq!(room.player(&ids[0]).unwrap().score, -1);
}

#[tokio::test(start_paused = true)]
async fn test_player_action_supersedes_pending_timer() {
    let (dir, _recorder, game, ids) = table().await;
    dir.act(&game, ids[0].clone(), PlayerAction::StartGame).await.unwrap();

    tokio::time::sleep(Duration::from_secs(20)).await;
    let room = load(&dir, &game).await;
    let offered: Vec<CardId> = room.decks.offered.iter().map(|c| c.id.clone()).collect();
    dir.act(
        &game,
        ids[0].clone(),
        PlayerAction::SelectBlackCard {
            selected: offered[1].clone(),
            discarded: vec![offered[0].clone(), offered[2].clone()],
        },
    )
    .await
    .unwrap();

    // Past the old deadline but well before the white-card one.
    tokio::time::sleep(Duration::from_secs(20)).await;
    let room = load(&dir, &game).await;
    assert_eq!(room.phase, Phase::PlayingWhiteCards);
    assert_eq!(room.player(&ids[0]).unwrap().score, 0);
    assert_eq!(room.current_round.as_ref().unwrap().black_card.id, offered[1]);
}

#[tokio::test(start_paused = true)]
async fn test_restarted_actor_resumes_persisted_timer() {
    let (dir, _recorder, game, ids) = table().await;
    dir.act(&game, ids[0].clone(), PlayerAction::StartGame).await.unwrap();

    dir.shutdown().await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(load(&dir, &game).await.phase, Phase::PickingBlackCard);
    assert_eq!(dir.live_rooms(), 0);

    dir.join(SessionId(9), Some(game.clone()), None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(load(&dir, &game).await.phase, Phase::PlayingWhiteCards);
}

// =========================================================================
// Deletion
// =========================================================================

#[tokio::test]
async fn test_last_player_leaving_deletes_room() {
    let (dir, recorder) = directory();
    let game = dir.create_room().await.unwrap();
    let id = seat(&dir, &game, 1, "Ada").await;

    let outcome = dir.act(&game, id, PlayerAction::Leave).await.unwrap();
    assert_eq!(outcome, Outcome::Applied);
    assert!(dir.store().load(&game).await.unwrap().is_none());
    assert_eq!(recorder.closed(), vec![SessionId(1)]);

    let outcome = dir.join(SessionId(2), Some(game), None).await.unwrap();
    assert_eq!(outcome, Outcome::NotFound);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_room_deleted_after_inactivity_period() {
    let (dir, _recorder) = directory();
    let game = dir.create_room().await.unwrap();
    seat(&dir, &game, 1, "Ada").await;

    dir.disconnect(SessionId(1)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(299)).await;
    assert!(dir.store().load(&game).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(dir.store().load(&game).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reconnected_room_survives_inactivity_check() {
    let (dir, _recorder) = directory();
    let game = dir.create_room().await.unwrap();
    let id = seat(&dir, &game, 1, "Ada").await;

    dir.disconnect(SessionId(1)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;
    dir.join(SessionId(2), None, Some(id)).await.unwrap();

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert!(dir.store().load(&game).await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_room_emptied_again_gets_a_full_inactivity_period() {
    let (dir, _recorder) = directory();
    let game = dir.create_room().await.unwrap();
    let id = seat(&dir, &game, 1, "Ada").await;

    dir.disconnect(SessionId(1)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(290)).await;
    dir.join(SessionId(2), None, Some(id)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    dir.disconnect(SessionId(2)).await.unwrap();

    // The check armed by the first disconnect comes due here.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(dir.store().load(&game).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_secs(291)).await;
    assert!(dir.store().load(&game).await.unwrap().is_none());
}

#[tokio::test]
async fn test_disconnect_of_unknown_session_is_not_found() {
    let (dir, _recorder) = directory();
    assert_eq!(dir.disconnect(SessionId(42)).await.unwrap(), Outcome::NotFound);
}
