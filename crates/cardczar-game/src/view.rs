//! Projections from the internal room onto the outward view types.
//!
//! Redaction rules for the round in progress:
//!
//! | phase               | submissions shown           | owners shown |
//! |---------------------|-----------------------------|--------------|
//! | `playingWhiteCards` | none (count only)           | no           |
//! | `readingCards`      | revealed so far             | no           |
//! | `showingCards`      | all                         | no           |
//! | `roundEnd`          | all                         | yes          |
//!
//! Completed rounds show everything. Hands only ever appear in
//! [`OwnPlayerView`], which is sent to its owner alone.

use cardczar_protocol::{
    GameView, OwnPlayerView, PlayerId, PlayerView, RoundView, ServerEvent, SubmissionView,
    TimerView,
};

use crate::{Phase, Player, Room, Round};

/// How much of a round an observer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disclosure {
    CountOnly,
    Revealed,
    Anonymous,
    Full,
}

impl Disclosure {
    fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Lobby | Phase::PickingBlackCard | Phase::PlayingWhiteCards => Self::CountOnly,
            Phase::ReadingCards => Self::Revealed,
            Phase::ShowingCards => Self::Anonymous,
            Phase::RoundEnd => Self::Full,
        }
    }
}

fn round_view(room: &Room, round: &Round, disclosure: Disclosure) -> RoundView {
    let public_id = |id: &PlayerId| room.players.get(id).map(|p| p.public_id.clone());

    let submissions = round
        .submissions
        .iter()
        .enumerate()
        .filter(|(i, _)| match disclosure {
            Disclosure::CountOnly => false,
            Disclosure::Revealed => round.is_revealed(*i),
            Disclosure::Anonymous | Disclosure::Full => true,
        })
        .map(|(_, s)| SubmissionView {
            player: match disclosure {
                Disclosure::Full => public_id(&s.player_id),
                _ => None,
            },
            white_cards: s.white_cards.clone(),
            won_round: s.won_round,
            popular_vote: s.popular_vote,
        })
        .collect();

    RoundView {
        round: round.number,
        black_card: round.black_card.clone(),
        card_czar: public_id(&round.card_czar),
        submission_count: round.submissions.len(),
        submissions,
    }
}

pub fn timer_view(room: &Room, now_ms: u64) -> TimerView {
    match room.timer {
        Some(timer) => TimerView {
            duration: Some(timer.duration_secs),
            passed_time: Some((now_ms.saturating_sub(timer.armed_at_ms) / 1000) as u32),
        },
        None => TimerView::default(),
    }
}

pub fn game_view(room: &Room, now_ms: u64) -> GameView {
    GameView {
        id: room.id.clone(),
        state: room.phase.into(),
        options: room.options.clone(),
        rounds: room
            .rounds
            .iter()
            .map(|round| round_view(room, round, Disclosure::Full))
            .collect(),
        current_round: room
            .current_round
            .as_ref()
            .map(|round| round_view(room, round, Disclosure::for_phase(room.phase))),
        timers: timer_view(room, now_ms),
    }
}

pub fn player_view(player: &Player) -> PlayerView {
    PlayerView {
        public_id: player.public_id.clone(),
        name: player.name.clone(),
        state: player.state.into(),
        score: player.score,
        is_card_czar: player.is_card_czar,
        is_host: player.is_host,
    }
}

pub fn player_views(room: &Room) -> Vec<PlayerView> {
    room.players.iter().map(player_view).collect()
}

pub fn own_player_view(player: &Player) -> OwnPlayerView {
    OwnPlayerView {
        id: player.id.clone(),
        public_id: player.public_id.clone(),
        name: player.name.clone(),
        state: player.state.into(),
        score: player.score,
        popular_vote_score: player.popular_vote_score,
        is_card_czar: player.is_card_czar,
        is_host: player.is_host,
        white_cards: player.hand.clone(),
    }
}

/// The full snapshot for one player.
pub fn snapshot(room: &Room, player: &Player, now_ms: u64) -> ServerEvent {
    ServerEvent::UpdateGameAndPlayers {
        game: game_view(room, now_ms),
        players: player_views(room),
        player: own_player_view(player),
    }
}

#[cfg(test)]
mod tests {
    use cardczar_protocol::{BlackCard, CardId, GameId, GameOptions, SessionId, WhiteCard};

    use super::*;
    use crate::{Decks, PlayerState, Submission};

    fn room_in(phase: Phase) -> Room {
        let mut room = Room::new(GameId::from("g"), GameOptions::default(), Decks::default(), 0);
        for i in 0..3 {
            let mut player = Player::new(SessionId(i), PlayerState::Active);
            player.name = format!("p{i}");
            player.hand = vec![WhiteCard {
                id: CardId(format!("secret-{i}")),
                text: "in hand".into(),
            }];
            room.players.push(player);
        }
        let ids: Vec<_> = room.players.iter().map(|p| p.id.clone()).collect();
        let black = BlackCard {
            id: CardId::from("b"),
            text: "____".into(),
            blanks: 1,
        };
        let mut round = Round::new(1, black, ids[0].clone());
        for (i, id) in ids.iter().enumerate().skip(1) {
            round.submissions.push(Submission::new(
                id.clone(),
                vec![WhiteCard {
                    id: CardId(format!("played-{i}")),
                    text: "played".into(),
                }],
            ));
        }
        round.reveal_cursor = 1;
        room.current_round = Some(round);
        room.phase = phase;
        room
    }

    fn current(room: &Room) -> RoundView {
        game_view(room, 0).current_round.unwrap()
    }

    #[test]
    fn test_game_view_playing_shows_count_only() {
        let view = current(&room_in(Phase::PlayingWhiteCards));
        assert_eq!(view.submission_count, 2);
        assert!(view.submissions.is_empty());
    }

    #[test]
    fn test_game_view_reading_shows_revealed_without_owner() {
        let view = current(&room_in(Phase::ReadingCards));
        assert_eq!(view.submissions.len(), 1);
        assert!(view.submissions[0].player.is_none());
    }

    #[test]
    fn test_game_view_showing_hides_owners() {
        let view = current(&room_in(Phase::ShowingCards));
        assert_eq!(view.submissions.len(), 2);
        assert!(view.submissions.iter().all(|s| s.player.is_none()));
    }

    #[test]
    fn test_game_view_round_end_shows_owners() {
        let room = room_in(Phase::RoundEnd);
        let view = current(&room);
        let owner = room.players.iter().nth(1).unwrap().public_id.clone();
        assert_eq!(view.submissions[0].player, Some(owner));
    }

    #[test]
    fn test_snapshot_never_leaks_other_hands_or_tokens() {
        let room = room_in(Phase::ShowingCards);
        let me = room.players.iter().next().unwrap();
        let json = serde_json::to_string(&snapshot(&room, me, 0)).unwrap();
        assert!(json.contains("secret-0"));
        assert!(!json.contains("secret-1"));
        assert!(!json.contains("secret-2"));
        for other in room.players.iter().skip(1) {
            assert!(!json.contains(&other.id.0));
        }
    }

    #[test]
    fn test_timer_view_reports_elapsed_seconds() {
        let mut room = room_in(Phase::PlayingWhiteCards);
        room.arm_timer(crate::Transition::StartReading, Some(60), 10_000);
        let timers = timer_view(&room, 14_500);
        assert_eq!(timers.duration, Some(60));
        assert_eq!(timers.passed_time, Some(4));
    }
}
