//! The ordered player list of a room and role assignment.
//!
//! Roster order is join order and never changes; it is the order the czar
//! role rotates in.

use cardczar_protocol::{PlayerId, PublicId, SessionId};
use serde::{Deserialize, Serialize};

use crate::{Phase, Player, PlayerState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn push(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    pub fn by_session(&self, session: SessionId) -> Option<&Player> {
        self.players.iter().find(|p| p.sessions.contains(&session))
    }

    pub fn by_public_id(&self, public_id: &PublicId) -> Option<&Player> {
        self.players.iter().find(|p| &p.public_id == public_id)
    }

    pub fn card_czar(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_card_czar)
    }

    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    pub fn is_card_czar(&self, id: &PlayerId) -> bool {
        self.get(id).is_some_and(|p| p.is_card_czar)
    }

    pub fn is_host(&self, id: &PlayerId) -> bool {
        self.get(id).is_some_and(|p| p.is_host)
    }

    /// Players taking part in the current game.
    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.state.is_active()).count()
    }

    /// Players with at least one live session.
    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_connected()).count()
    }

    /// Every session of every player.
    pub fn all_sessions(&self) -> Vec<SessionId> {
        self.players.iter().flat_map(|p| p.sessions.iter().copied()).collect()
    }

    // -----------------------------------------------------------------------
    // Card czar rotation
    // -----------------------------------------------------------------------

    /// The player after `previous` in roster order who may be czar,
    /// wrapping to the first such player. `previous` itself is chosen only
    /// when nobody else is eligible.
    pub fn next_card_czar(&self, previous: Option<&PlayerId>) -> Option<PlayerId> {
        let eligible: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.state.is_czar_eligible())
            .map(|(i, _)| i)
            .collect();

        let after = previous.and_then(|id| self.players.iter().position(|p| &p.id == id));
        let next = match after {
            Some(at) => eligible.iter().find(|&&i| i > at).or(eligible.first()),
            None => eligible.first(),
        };
        next.map(|&i| self.players[i].id.clone())
    }

    /// Moves the czar role to `winner` if given and eligible, otherwise to
    /// the next player after `previous`. Returns the new czar.
    pub fn appoint_next_card_czar(
        &mut self,
        previous: Option<&PlayerId>,
        winner: Option<&PlayerId>,
    ) -> Option<PlayerId> {
        let winner = winner
            .filter(|id| self.get(id).is_some_and(|p| p.state.is_czar_eligible()))
            .cloned();
        let next = winner.or_else(|| self.next_card_czar(previous))?;
        for player in &mut self.players {
            player.is_card_czar = player.id == next;
        }
        Some(next)
    }

    // -----------------------------------------------------------------------
    // Round states
    // -----------------------------------------------------------------------

    /// Everyone but the czar owes a submission; the czar waits.
    pub fn set_playing(&mut self) {
        for player in &mut self.players {
            if player.is_card_czar && player.state.is_active() {
                player.state = PlayerState::Waiting;
            } else if matches!(player.state, PlayerState::Active | PlayerState::Waiting) {
                player.state = PlayerState::Playing;
            }
        }
    }

    /// Back to plain `active` between phases.
    pub fn set_active(&mut self) {
        for player in &mut self.players {
            if matches!(player.state, PlayerState::Playing | PlayerState::Waiting) {
                player.state = PlayerState::Active;
            }
        }
    }

    /// Named mid-game joiners take their seat.
    pub fn activate_joining(&mut self) {
        for player in &mut self.players {
            if player.state == PlayerState::Joining {
                player.state = PlayerState::Active;
            }
        }
    }

    /// No non-czar player still owes a submission.
    pub fn everyone_has_played(&self) -> bool {
        !self
            .players
            .iter()
            .any(|p| !p.is_card_czar && p.state == PlayerState::Playing)
    }

    // -----------------------------------------------------------------------
    // Host
    // -----------------------------------------------------------------------

    /// Moves the host role away from `departing` to the first remaining
    /// player who is present: anyone named or naming while in the lobby,
    /// active players during a game. Returns the new host, or `None` when
    /// nobody can take over.
    pub fn transfer_host(&mut self, departing: &PlayerId, phase: Phase) -> Option<PlayerId> {
        if let Some(player) = self.get_mut(departing) {
            player.is_host = false;
        }
        let candidate = self
            .players
            .iter_mut()
            .filter(|p| &p.id != departing)
            .find(|p| {
                if phase.is_in_game() {
                    p.state.is_active()
                } else {
                    p.state.is_lobby_present()
                }
            })?;
        candidate.is_host = true;
        Some(candidate.id.clone())
    }

    /// Drops the player from the room entirely.
    pub fn remove(&mut self, id: &PlayerId) -> Option<Player> {
        let at = self.players.iter().position(|p| &p.id == id)?;
        Some(self.players.remove(at))
    }

    /// Clears scores, hands and roles for a new game. Players without a
    /// seat keep their state.
    pub fn reset_for_game(&mut self) {
        for player in &mut self.players {
            player.score = 0;
            player.popular_vote_score = 0;
            player.is_card_czar = false;
            player.hand.clear();
            player.state = match player.state {
                PlayerState::Disconnected | PlayerState::Spectating => player.state,
                _ if player.has_name() => PlayerState::Active,
                _ => PlayerState::PickingName,
            };
        }
    }
}
