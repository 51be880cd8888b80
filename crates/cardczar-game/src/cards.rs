//! Static card data.
//!
//! A [`CardCatalog`] is loaded once at startup and shared read-only by
//! every room. Rooms copy the cards of their selected packs into their own
//! decks; card content never changes after loading.

use std::collections::HashSet;

use cardczar_protocol::{BlackCard, CardId, PackId, WhiteCard};
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// The pack compiled into the binary, used when no pack file is given.
const BUILTIN_PACKS: &str = include_str!("../data/base_pack.json");

/// One named set of cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPack {
    pub id: PackId,
    pub name: String,
    pub black_cards: Vec<BlackCard>,
    pub white_cards: Vec<WhiteCard>,
}

/// Every pack the server knows about.
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    packs: Vec<CardPack>,
}

impl CardCatalog {
    /// Validates the packs and namespaces every card id as `pack/card`,
    /// so ids stay unique when several packs are mixed into one deck.
    pub fn new(packs: Vec<CardPack>) -> Result<Self, CatalogError> {
        let mut seen_packs = HashSet::new();
        let mut namespaced = Vec::with_capacity(packs.len());

        for mut pack in packs {
            if !seen_packs.insert(pack.id.clone()) {
                return Err(CatalogError::DuplicatePack(pack.id));
            }

            let mut seen_cards = HashSet::new();
            for card in &pack.black_cards {
                if card.blanks == 0 {
                    return Err(CatalogError::NoBlanks {
                        pack: pack.id.clone(),
                        card: card.id.clone(),
                    });
                }
                if !seen_cards.insert(card.id.clone()) {
                    return Err(CatalogError::DuplicateCard {
                        pack: pack.id.clone(),
                        card: card.id.clone(),
                    });
                }
            }
            for card in &pack.white_cards {
                if !seen_cards.insert(card.id.clone()) {
                    return Err(CatalogError::DuplicateCard {
                        pack: pack.id.clone(),
                        card: card.id.clone(),
                    });
                }
            }

            let prefix = pack.id.clone();
            for card in &mut pack.black_cards {
                card.id = CardId(format!("{prefix}/{}", card.id));
            }
            for card in &mut pack.white_cards {
                card.id = CardId(format!("{prefix}/{}", card.id));
            }
            namespaced.push(pack);
        }

        Ok(Self { packs: namespaced })
    }

    /// Parses a JSON array of packs.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let packs: Vec<CardPack> = serde_json::from_str(json)?;
        Self::new(packs)
    }

    /// The pack set shipped with the server.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_PACKS)
    }

    pub fn pack(&self, id: &PackId) -> Option<&CardPack> {
        self.packs.iter().find(|pack| &pack.id == id)
    }

    pub fn contains(&self, id: &PackId) -> bool {
        self.pack(id).is_some()
    }

    pub fn pack_ids(&self) -> Vec<PackId> {
        self.packs.iter().map(|pack| pack.id.clone()).collect()
    }

    /// All cards of the selected packs, in catalog order. Unknown pack ids
    /// are skipped.
    pub fn cards_for(&self, selected: &[PackId]) -> (Vec<BlackCard>, Vec<WhiteCard>) {
        let mut black = Vec::new();
        let mut white = Vec::new();
        for pack in self.packs.iter().filter(|pack| selected.contains(&pack.id)) {
            black.extend(pack.black_cards.iter().cloned());
            white.extend(pack.white_cards.iter().cloned());
        }
        (black, white)
    }
}
