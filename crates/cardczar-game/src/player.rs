//! Player records and their lifecycle states.

use cardczar_protocol::{CardId, PlayerId, PlayerStatus, PublicId, SessionId, WhiteCard};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a player within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerState {
    /// Connected, but has not chosen a name yet.
    PickingName,
    /// Named mid-game; becomes active when the next round begins.
    Joining,
    Active,
    /// Owes a submission this round.
    Playing,
    /// Has submitted this round.
    Waiting,
    Spectating,
    Disconnected,
}

impl PlayerState {
    /// Takes part in the current game.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active | Self::Playing | Self::Waiting)
    }

    /// May be appointed card czar.
    pub fn is_czar_eligible(self) -> bool {
        self.is_active() || self == Self::Joining
    }

    /// Counts as present while the room sits in the lobby.
    pub fn is_lobby_present(self) -> bool {
        self.is_active() || self == Self::PickingName
    }
}

impl From<PlayerState> for PlayerStatus {
    fn from(state: PlayerState) -> Self {
        match state {
            PlayerState::PickingName => PlayerStatus::PickingName,
            PlayerState::Joining => PlayerStatus::Joining,
            PlayerState::Active => PlayerStatus::Active,
            PlayerState::Playing => PlayerStatus::Playing,
            PlayerState::Waiting => PlayerStatus::Waiting,
            PlayerState::Spectating => PlayerStatus::Spectating,
            PlayerState::Disconnected => PlayerStatus::Disconnected,
        }
    }
}

/// One seat in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub public_id: PublicId,
    /// Live connections. Empty once the player has disconnected.
    pub sessions: Vec<SessionId>,
    pub name: String,
    pub state: PlayerState,
    pub score: i32,
    pub popular_vote_score: u32,
    pub is_card_czar: bool,
    pub is_host: bool,
    pub hand: Vec<WhiteCard>,
}

impl Player {
    /// A freshly joined player with new ids.
    pub fn new(session: SessionId, state: PlayerState) -> Self {
        Self {
            id: PlayerId::generate(),
            public_id: PublicId::generate(),
            sessions: vec![session],
            name: String::new(),
            state,
            score: 0,
            popular_vote_score: 0,
            is_card_czar: false,
            is_host: false,
            hand: Vec::new(),
        }
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn is_connected(&self) -> bool {
        !self.sessions.is_empty()
    }

    /// Adds `session` unless already attached.
    pub fn attach(&mut self, session: SessionId) {
        if !self.sessions.contains(&session) {
            self.sessions.push(session);
        }
    }

    /// Removes `session`, returning whether it was attached.
    pub fn detach(&mut self, session: SessionId) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| *s != session);
        self.sessions.len() != before
    }

    /// The state a returning player resumes in.
    pub fn rejoin_state(&self, in_game: bool) -> PlayerState {
        match (self.has_name(), in_game) {
            (false, _) => PlayerState::PickingName,
            (true, false) => PlayerState::Active,
            (true, true) => PlayerState::Joining,
        }
    }

    /// Removes exactly the cards with `ids` from the hand, in the order
    /// given. Returns `None` (hand untouched) if any id is missing or
    /// repeated.
    pub fn take_cards(&mut self, ids: &[CardId]) -> Option<Vec<WhiteCard>> {
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) || !self.hand.iter().any(|card| &card.id == id) {
                return None;
            }
        }
        let taken = ids
            .iter()
            .filter_map(|id| {
                let at = self.hand.iter().position(|card| &card.id == id)?;
                Some(self.hand.remove(at))
            })
            .collect();
        Some(taken)
    }
}
