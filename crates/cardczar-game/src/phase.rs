//! The room state machine.
//!
//! ```text
//!            StartGame                StartPlayingWhiteCards
//!  Lobby ─────────────▶ PickingBlackCard ──────────────────▶ PlayingWhiteCards
//!    ▲                    ▲  ▲                                      │
//!    │ ReturnToLobby      │  │ StartRound                           │ StartReading
//!    │ (from any phase)   │  └──────────── ReadingCards ◀───────────┘
//!    │                    │ StartRound         │ ShowCards
//!    │                 RoundEnd ◀───────── ShowingCards
//!    │                           EndRound
//!    │
//!  SkipRound: any in-game phase ─▶ PickingBlackCard
//! ```
//!
//! [`Phase::next`] is the whole transition table. Illegal pairs yield
//! `None`, and callers treat that as "nothing happens": a late timer or a
//! duplicate click can never move a room somewhere it should not be.

use std::fmt;

use cardczar_protocol::GamePhase;
use serde::{Deserialize, Serialize};

/// Where a room is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Lobby,
    PickingBlackCard,
    PlayingWhiteCards,
    ReadingCards,
    ShowingCards,
    RoundEnd,
}

/// A named edge of the state machine. Timers carry one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transition {
    StartGame,
    StartPlayingWhiteCards,
    StartReading,
    ShowCards,
    EndRound,
    StartRound,
    SkipRound,
    ReturnToLobby,
}

impl Phase {
    /// The phase `transition` leads to from here, or `None` if the
    /// transition is not legal in this phase.
    pub fn next(self, transition: Transition) -> Option<Phase> {
        use Phase::*;
        use Transition::*;

        match (self, transition) {
            (Lobby, StartGame) => Some(PickingBlackCard),
            (PickingBlackCard, StartPlayingWhiteCards) => Some(PlayingWhiteCards),
            (PlayingWhiteCards, StartReading) => Some(ReadingCards),
            (ReadingCards, ShowCards) => Some(ShowingCards),
            (ReadingCards, StartRound) => Some(PickingBlackCard),
            (ShowingCards, EndRound) => Some(RoundEnd),
            (RoundEnd, StartRound) => Some(PickingBlackCard),
            (phase, SkipRound) if phase.is_in_game() => Some(PickingBlackCard),
            (phase, ReturnToLobby) if phase.is_in_game() => Some(Lobby),
            _ => None,
        }
    }

    pub fn can(self, transition: Transition) -> bool {
        self.next(transition).is_some()
    }

    /// Every phase except the lobby.
    pub fn is_in_game(self) -> bool {
        self != Phase::Lobby
    }

    /// The transition a timer armed in this phase fires, if any.
    pub fn timeout_transition(self) -> Option<Transition> {
        match self {
            Phase::Lobby => None,
            Phase::PickingBlackCard => Some(Transition::StartPlayingWhiteCards),
            Phase::PlayingWhiteCards => Some(Transition::StartReading),
            Phase::ReadingCards => Some(Transition::ShowCards),
            Phase::ShowingCards => Some(Transition::EndRound),
            Phase::RoundEnd => Some(Transition::StartRound),
        }
    }
}

impl From<Phase> for GamePhase {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Lobby => GamePhase::Lobby,
            Phase::PickingBlackCard => GamePhase::PickingBlackCard,
            Phase::PlayingWhiteCards => GamePhase::PlayingWhiteCards,
            Phase::ReadingCards => GamePhase::ReadingCards,
            Phase::ShowingCards => GamePhase::ShowingCards,
            Phase::RoundEnd => GamePhase::RoundEnd,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lobby => "lobby",
            Phase::PickingBlackCard => "pickingBlackCard",
            Phase::PlayingWhiteCards => "playingWhiteCards",
            Phase::ReadingCards => "readingCards",
            Phase::ShowingCards => "showingCards",
            Phase::RoundEnd => "roundEnd",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PHASES: [Phase; 6] = [
        Phase::Lobby,
        Phase::PickingBlackCard,
        Phase::PlayingWhiteCards,
        Phase::ReadingCards,
        Phase::ShowingCards,
        Phase::RoundEnd,
    ];

    #[test]
    fn test_next_follows_round_cycle() {
        let mut phase = Phase::Lobby;
        for transition in [
            Transition::StartGame,
            Transition::StartPlayingWhiteCards,
            Transition::StartReading,
            Transition::ShowCards,
            Transition::EndRound,
            Transition::StartRound,
        ] {
            phase = phase.next(transition).unwrap();
        }
        assert_eq!(phase, Phase::PickingBlackCard);
    }

    #[test]
    fn test_next_reading_with_nothing_to_reveal_starts_round() {
        assert_eq!(Phase::ReadingCards.next(Transition::StartRound), Some(Phase::PickingBlackCard));
    }

    #[test]
    fn test_next_illegal_pairs_are_none() {
        assert_eq!(Phase::Lobby.next(Transition::StartReading), None);
        assert_eq!(Phase::PlayingWhiteCards.next(Transition::StartGame), None);
        assert_eq!(Phase::ShowingCards.next(Transition::StartRound), None);
        assert_eq!(Phase::RoundEnd.next(Transition::EndRound), None);
        assert_eq!(Phase::Lobby.next(Transition::SkipRound), None);
        assert_eq!(Phase::Lobby.next(Transition::ReturnToLobby), None);
    }

    #[test]
    fn test_skip_and_return_legal_from_every_game_phase() {
        for phase in ALL_PHASES.into_iter().filter(|p| p.is_in_game()) {
            assert_eq!(phase.next(Transition::SkipRound), Some(Phase::PickingBlackCard));
            assert_eq!(phase.next(Transition::ReturnToLobby), Some(Phase::Lobby));
        }
    }

    #[test]
    fn test_timeout_transition_is_legal_in_its_phase() {
        for phase in ALL_PHASES {
            if let Some(transition) = phase.timeout_transition() {
                assert!(phase.can(transition), "{phase} cannot fire {transition}");
            }
        }
        assert_eq!(Phase::Lobby.timeout_transition(), None);
    }

    #[test]
    fn test_display_matches_wire_names() {
        for phase in ALL_PHASES {
            let wire = serde_json::to_value(GamePhase::from(phase)).unwrap();
            assert_eq!(wire, phase.to_string());
        }
    }
}
