//! Draw and discard piles.
//!
//! Every card of a room is always in exactly one place: a draw pile, a
//! discard pile, the czar's offered prompts, a player's hand, or the
//! current round's submissions. The operations here only ever move cards
//! between places, never create or drop them.

use cardczar_protocol::{BlackCard, PackId, WhiteCard};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::CardCatalog;

/// A draw pile plus its discard pile. The top of the draw pile is the end
/// of the vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck<C> {
    draw_pile: Vec<C>,
    discard_pile: Vec<C>,
}

impl<C> Default for Deck<C> {
    fn default() -> Self {
        Self {
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
        }
    }
}

impl<C> Deck<C> {
    /// A shuffled deck with an empty discard pile.
    pub fn new<R: Rng + ?Sized>(mut cards: Vec<C>, rng: &mut R) -> Self {
        cards.shuffle(rng);
        Self {
            draw_pile: cards,
            discard_pile: Vec::new(),
        }
    }

    /// Draws up to `n` cards.
    ///
    /// When the draw pile runs short, everything left is taken, the discard
    /// pile is shuffled into a fresh draw pile, and the shortfall is drawn
    /// from it. If both piles run dry the result is shorter than `n`.
    pub fn draw<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Vec<C> {
        let mut drawn = self.take(n);
        if drawn.len() < n && !self.discard_pile.is_empty() {
            self.draw_pile.append(&mut self.discard_pile);
            self.draw_pile.shuffle(rng);
            let shortfall = n - drawn.len();
            drawn.extend(self.take(shortfall));
        }
        drawn
    }

    fn take(&mut self, n: usize) -> Vec<C> {
        let at = self.draw_pile.len().saturating_sub(n);
        let mut taken = self.draw_pile.split_off(at);
        taken.reverse();
        taken
    }

    /// Puts played cards on the discard pile.
    pub fn discard(&mut self, cards: impl IntoIterator<Item = C>) {
        self.discard_pile.extend(cards);
    }

    /// Returns cards to the draw pile, each at its own random position, so
    /// recently returned cards are not favored on the next draw.
    pub fn recycle<R: Rng + ?Sized>(&mut self, cards: impl IntoIterator<Item = C>, rng: &mut R) {
        for card in cards {
            let at = rng.random_range(0..=self.draw_pile.len());
            self.draw_pile.insert(at, card);
        }
    }

    pub fn draw_len(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn discard_len(&self) -> usize {
        self.discard_pile.len()
    }

    /// Cards available to draw without running dry.
    pub fn len(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The card state of one room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decks {
    pub black: Deck<BlackCard>,
    pub white: Deck<WhiteCard>,
    /// Prompt choices currently dealt to the czar.
    pub offered: Vec<BlackCard>,
}

impl Decks {
    /// Fresh, shuffled decks holding every card of the selected packs.
    pub fn from_catalog<R: Rng + ?Sized>(catalog: &CardCatalog, packs: &[PackId], rng: &mut R) -> Self {
        let (black, white) = catalog.cards_for(packs);
        Self {
            black: Deck::new(black, rng),
            white: Deck::new(white, rng),
            offered: Vec::new(),
        }
    }

    pub fn draw_prompt_cards<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Vec<BlackCard> {
        self.black.draw(n, rng)
    }

    pub fn draw_answer_cards<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Vec<WhiteCard> {
        self.white.draw(n, rng)
    }

    pub fn recycle_prompt<R: Rng + ?Sized>(&mut self, cards: impl IntoIterator<Item = BlackCard>, rng: &mut R) {
        self.black.recycle(cards, rng);
    }

    pub fn recycle_answer<R: Rng + ?Sized>(&mut self, cards: impl IntoIterator<Item = WhiteCard>, rng: &mut R) {
        self.white.recycle(cards, rng);
    }

    /// Sends any outstanding prompt choices back into the draw pile.
    pub fn recycle_offered<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let offered = std::mem::take(&mut self.offered);
        self.black.recycle(offered, rng);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn numbers(n: u32) -> Vec<u32> {
        (0..n).collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_draw_takes_from_draw_pile() {
        let mut rng = rng();
        let mut deck = Deck::new(numbers(10), &mut rng);
        let drawn = deck.draw(4, &mut rng);
        assert_eq!(drawn.len(), 4);
        assert_eq!(deck.draw_len(), 6);
    }

    #[test]
    fn test_draw_reshuffles_discard_when_short() {
        let mut rng = rng();
        let mut deck = Deck::new(numbers(3), &mut rng);
        deck.discard(vec![100, 101, 102]);
        let drawn = deck.draw(5, &mut rng);
        assert_eq!(drawn.len(), 5);
        assert_eq!(deck.draw_len(), 1);
        assert_eq!(deck.discard_len(), 0);
        // The three original cards come first.
        let mut head = drawn[..3].to_vec();
        head.sort();
        assert_eq!(head, vec![0, 1, 2]);
    }

    #[test]
    fn test_draw_returns_fewer_when_both_piles_exhausted() {
        let mut rng = rng();
        let mut deck = Deck::new(numbers(2), &mut rng);
        deck.discard(vec![9]);
        let drawn = deck.draw(5, &mut rng);
        assert_eq!(drawn.len(), 3);
        assert!(deck.is_empty());
        assert!(deck.draw(1, &mut rng).is_empty());
    }

    #[test]
    fn test_recycle_inserts_into_draw_pile() {
        let mut rng = rng();
        let mut deck = Deck::new(numbers(20), &mut rng);
        deck.recycle(vec![500, 501], &mut rng);
        assert_eq!(deck.draw_len(), 22);
        let mut all = deck.draw(22, &mut rng);
        all.sort();
        assert!(all.ends_with(&[500, 501]));
    }

    #[test]
    fn test_recycle_positions_are_not_always_on_top() {
        let mut rng = rng();
        let mut on_top = 0;
        for _ in 0..50 {
            let mut deck = Deck::new(numbers(30), &mut rng);
            deck.recycle(vec![999], &mut rng);
            if deck.draw(1, &mut rng) == vec![999] {
                on_top += 1;
            }
        }
        assert!(on_top < 10, "recycled card landed on top {on_top} times out of 50");
    }

    #[test]
    fn test_draw_discard_recycle_conserves_cards() {
        let mut rng = rng();
        let mut deck = Deck::new(numbers(40), &mut rng);
        let mut hand: Vec<u32> = Vec::new();
        let mut played: Vec<u32> = Vec::new();

        for step in 0..200u32 {
            match step % 4 {
                0 => hand.extend(deck.draw(7, &mut rng)),
                1 => {
                    let n = hand.len().min(3);
                    played.extend(hand.drain(..n));
                }
                2 => deck.discard(played.drain(..)),
                _ => {
                    let n = hand.len().min(2);
                    deck.recycle(hand.drain(..n), &mut rng);
                }
            }
            assert_eq!(deck.len() + hand.len() + played.len(), 40);
        }

        let mut everything = deck.draw(usize::MAX / 2, &mut rng);
        everything.extend(hand);
        everything.extend(played);
        everything.sort();
        assert_eq!(everything, numbers(40));
    }
}
