//! What an applied operation wants the outside world to hear.
//!
//! Game operations only record intents here. Views are rendered after the
//! room has been persisted, from the committed state, so nothing that was
//! rolled back is ever sent.

use cardczar_protocol::{
    Notification, NotificationKind, PlayerId, Recipient, ServerEvent, SessionId, WhiteCard,
};

use crate::{GameRules, Room, view};

/// One message to produce once the room is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Personalised `update_game_and_players` to every player.
    Snapshot,
    /// `update_game` to the whole room.
    Game,
    /// The czar's outstanding prompt choices, to the czar only.
    DealBlackCards(PlayerId),
    /// One reveal step, to the whole room.
    ShowWhiteCard(Vec<WhiteCard>),
    UpgradedToHost(PlayerId),
    Notify {
        to: Recipient,
        text: String,
        kind: NotificationKind,
    },
}

/// Side effects of one applied operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outbox {
    pub intents: Vec<Intent>,
    /// Sessions to disconnect (players who left or were kicked).
    pub close: Vec<SessionId>,
    /// The room should be removed from the directory.
    pub delete_room: bool,
    /// Nobody is connected; check again after the inactivity period.
    pub inactivity_check: bool,
}

impl Outbox {
    pub fn snapshot(&mut self) {
        if !self.intents.contains(&Intent::Snapshot) {
            self.intents.push(Intent::Snapshot);
        }
    }

    pub fn game(&mut self) {
        self.intents.push(Intent::Game);
    }

    pub fn deal_black_cards(&mut self, czar: PlayerId) {
        self.intents.push(Intent::DealBlackCards(czar));
    }

    pub fn show_white_card(&mut self, cards: Vec<WhiteCard>) {
        self.intents.push(Intent::ShowWhiteCard(cards));
    }

    pub fn upgraded_to_host(&mut self, player: PlayerId) {
        self.intents.push(Intent::UpgradedToHost(player));
    }

    pub fn notify(&mut self, to: Recipient, text: impl Into<String>, kind: NotificationKind) {
        self.intents.push(Intent::Notify {
            to,
            text: text.into(),
            kind,
        });
    }

    pub fn is_silent(&self) -> bool {
        self.intents.is_empty() && self.close.is_empty()
    }

    /// Builds the outbound events from the committed room.
    pub fn render(&self, room: &Room, rules: &GameRules, now_ms: u64) -> Vec<(Recipient, ServerEvent)> {
        let mut events = Vec::new();
        if self.delete_room {
            return events;
        }

        for intent in &self.intents {
            match intent {
                Intent::Snapshot => {
                    for player in room.players.iter().filter(|p| p.is_connected()) {
                        events.push((
                            Recipient::Player(player.id.clone()),
                            view::snapshot(room, player, now_ms),
                        ));
                    }
                }
                Intent::Game => events.push((
                    Recipient::Room,
                    ServerEvent::UpdateGame {
                        game: view::game_view(room, now_ms),
                    },
                )),
                Intent::DealBlackCards(czar) => events.push((
                    Recipient::Player(czar.clone()),
                    ServerEvent::DealBlackCards {
                        black_cards: room.decks.offered.clone(),
                    },
                )),
                Intent::ShowWhiteCard(cards) => events.push((
                    Recipient::Room,
                    ServerEvent::ShowWhiteCard {
                        white_cards: cards.clone(),
                    },
                )),
                Intent::UpgradedToHost(player) => events.push((
                    Recipient::Player(player.clone()),
                    ServerEvent::UpgradedToHost {
                        notification: Notification::new(
                            "You are now the host",
                            NotificationKind::Default,
                            rules.notification_ms,
                        ),
                    },
                )),
                Intent::Notify { to, text, kind } => events.push((
                    to.clone(),
                    ServerEvent::Notification {
                        notification: Notification::new(text.clone(), *kind, rules.notification_ms),
                        kind: *kind,
                    },
                )),
            }
        }
        events
    }
}
