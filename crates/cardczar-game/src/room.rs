//! The room aggregate: everything persisted under one game id.

use cardczar_protocol::{GameId, GameOptions, PlayerId, SessionId};
use serde::{Deserialize, Serialize};

use crate::{Decks, Phase, Player, Roster, Round, Transition};

/// The deferred transition a room is waiting on.
///
/// A room holds at most one. Arming a new one bumps the room's generation,
/// so a scheduler still holding an older generation fires into nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTimer {
    pub transition: Transition,
    pub generation: u64,
    pub duration_secs: u32,
    pub armed_at_ms: u64,
}

impl PendingTimer {
    /// When the timer fires, counting the grace period.
    pub fn deadline_ms(&self, grace_ms: u64) -> u64 {
        self.armed_at_ms + u64::from(self.duration_secs) * 1000 + grace_ms
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: GameId,
    pub phase: Phase,
    pub options: GameOptions,
    pub players: Roster,
    pub decks: Decks,
    pub current_round: Option<Round>,
    /// The most recent completed rounds of the current game, oldest
    /// first. Capped at `GameRules::round_history_limit`.
    pub rounds: Vec<Round>,
    /// Completed rounds of the current game, including any dropped from
    /// `rounds`.
    #[serde(default)]
    pub rounds_played: u32,
    pub timer: Option<PendingTimer>,
    pub timer_generation: u64,
    /// Players removed by the host who may not come back.
    pub banned: Vec<PlayerId>,
    pub last_activity_ms: u64,
}

impl Room {
    pub fn new(id: GameId, options: GameOptions, decks: Decks, now_ms: u64) -> Self {
        Self {
            id,
            phase: Phase::Lobby,
            options,
            players: Roster::default(),
            decks,
            current_round: None,
            rounds: Vec::new(),
            rounds_played: 0,
            timer: None,
            timer_generation: 0,
            banned: Vec::new(),
            last_activity_ms: now_ms,
        }
    }

    /// Moves along `transition` if it is legal from the current phase.
    pub fn transition(&mut self, transition: Transition) -> bool {
        match self.phase.next(transition) {
            Some(next) => {
                tracing::debug!(game_id = %self.id, from = %self.phase, to = %next, "phase change");
                self.phase = next;
                true
            }
            None => false,
        }
    }

    /// Replaces any pending timer. `duration_secs` of `None` (timer
    /// switched off) leaves the room without one.
    pub fn arm_timer(&mut self, transition: Transition, duration_secs: Option<u32>, now_ms: u64) {
        self.timer_generation += 1;
        self.timer = duration_secs.map(|duration_secs| PendingTimer {
            transition,
            generation: self.timer_generation,
            duration_secs,
            armed_at_ms: now_ms,
        });
    }

    pub fn clear_timer(&mut self) {
        self.timer_generation += 1;
        self.timer = None;
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_by_session(&self, session: SessionId) -> Option<&Player> {
        self.players.by_session(session)
    }

    pub fn is_banned(&self, id: &PlayerId) -> bool {
        self.banned.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new(GameId::from("g"), GameOptions::default(), Decks::default(), 0)
    }

    #[test]
    fn test_transition_illegal_leaves_phase() {
        let mut room = room();
        assert!(!room.transition(Transition::EndRound));
        assert_eq!(room.phase, Phase::Lobby);
        assert!(room.transition(Transition::StartGame));
        assert_eq!(room.phase, Phase::PickingBlackCard);
    }

    #[test]
    fn test_arm_timer_supersedes_previous() {
        let mut room = room();
        room.arm_timer(Transition::StartPlayingWhiteCards, Some(30), 1_000);
        let first = room.timer.unwrap();
        room.arm_timer(Transition::StartReading, Some(60), 2_000);
        let second = room.timer.unwrap();
        assert!(second.generation > first.generation);
        assert_eq!(second.transition, Transition::StartReading);
        assert_eq!(second.deadline_ms(2_000), 2_000 + 60_000 + 2_000);
    }

    #[test]
    fn test_arm_timer_disabled_clears() {
        let mut room = room();
        room.arm_timer(Transition::StartReading, Some(60), 0);
        room.arm_timer(Transition::ShowCards, None, 0);
        assert!(room.timer.is_none());
        assert_eq!(room.timer_generation, 2);
    }

    #[test]
    fn test_room_round_trips_through_json() {
        let room = room();
        let json = serde_json::to_value(&room).unwrap();
        let back: Room = serde_json::from_value(json).unwrap();
        assert_eq!(back, room);
    }
}
