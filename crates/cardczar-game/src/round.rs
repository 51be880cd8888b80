//! One round: the chosen prompt and everybody's answers to it.

use std::collections::HashSet;

use cardczar_protocol::{BlackCard, CardId, PlayerId, WhiteCard};
use serde::{Deserialize, Serialize};

/// One player's answer to the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub player_id: PlayerId,
    pub white_cards: Vec<WhiteCard>,
    pub won_round: bool,
    pub popular_vote: u32,
    /// Who has given this submission a popular vote.
    pub voters: Vec<PlayerId>,
}

impl Submission {
    pub fn new(player_id: PlayerId, white_cards: Vec<WhiteCard>) -> Self {
        Self {
            player_id,
            white_cards,
            won_round: false,
            popular_vote: 0,
            voters: Vec::new(),
        }
    }

    /// Holds exactly the cards in `ids`, in any order.
    pub fn matches(&self, ids: &[CardId]) -> bool {
        let wanted: HashSet<&CardId> = ids.iter().collect();
        let held: HashSet<&CardId> = self.white_cards.iter().map(|card| &card.id).collect();
        wanted.len() == ids.len() && wanted == held
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// 1-based, counting completed rounds of the current game.
    pub number: u32,
    pub black_card: BlackCard,
    pub card_czar: PlayerId,
    pub submissions: Vec<Submission>,
    /// Index of the next submission to reveal. Never exceeds
    /// `submissions.len()`.
    pub reveal_cursor: usize,
    pub winner: Option<PlayerId>,
}

impl Round {
    pub fn new(number: u32, black_card: BlackCard, card_czar: PlayerId) -> Self {
        Self {
            number,
            black_card,
            card_czar,
            submissions: Vec::new(),
            reveal_cursor: 0,
            winner: None,
        }
    }

    /// Index of the single submission holding exactly `ids`. Ambiguous or
    /// absent matches give `None`.
    pub fn find_submission(&self, ids: &[CardId]) -> Option<usize> {
        let mut matching = self
            .submissions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.matches(ids))
            .map(|(i, _)| i);
        match (matching.next(), matching.next()) {
            (Some(i), None) => Some(i),
            _ => None,
        }
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        index < self.reveal_cursor
    }

    pub fn fully_revealed(&self) -> bool {
        self.reveal_cursor >= self.submissions.len()
    }

    /// Reveals the next submission and returns its cards.
    pub fn reveal_next(&mut self) -> Option<Vec<WhiteCard>> {
        let cards = self.submissions.get(self.reveal_cursor)?.white_cards.clone();
        self.reveal_cursor += 1;
        Some(cards)
    }

    pub fn reveal_all(&mut self) {
        self.reveal_cursor = self.submissions.len();
    }

    /// Marks the submission at `index` as the winner. Only one submission
    /// can ever be marked.
    pub fn mark_winner(&mut self, index: usize) -> Option<PlayerId> {
        if self.winner.is_some() {
            return None;
        }
        let submission = self.submissions.get_mut(index)?;
        submission.won_round = true;
        self.winner = Some(submission.player_id.clone());
        self.winner.clone()
    }
}
