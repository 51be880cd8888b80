//! Players going away, and keeping the round playable afterwards.

use cardczar_protocol::{NotificationKind, PlayerId, Recipient, SessionId};

use super::round_flow::{restart_round, start_reading};
use super::{Context, OpResult, lobby, punish_card_czar};
use crate::{Outbox, Phase, PlayerState, Rejection, Room, Transition};

/// How a player is leaving their seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Departure {
    /// Their last connection dropped.
    Disconnect,
    /// They asked to leave.
    Leave,
    /// The host removed them.
    Kick,
    /// They stay connected but stop playing.
    Spectate,
}

impl Departure {
    /// Czars who walk away are punished; czars moved by the host or by
    /// their own mode switch are not.
    fn punishes(self) -> bool {
        matches!(self, Self::Disconnect | Self::Leave)
    }
}

/// Handles a dropped session. Only the last session of a player counts
/// as the player leaving.
pub fn disconnect(room: &mut Room, ctx: &mut Context<'_>, session: SessionId) -> OpResult {
    let player_id = room
        .player_by_session(session)
        .map(|p| p.id.clone())
        .ok_or(Rejection::UnknownSession)?;

    let mut out = Outbox::default();
    room.last_activity_ms = ctx.now_ms;
    if let Some(player) = room.players.get_mut(&player_id) {
        player.detach(session);
        if player.is_connected() {
            return Ok(out);
        }
    }
    depart(room, ctx, &player_id, Departure::Disconnect, &mut out);
    Ok(out)
}

pub(super) fn leave(room: &mut Room, ctx: &mut Context<'_>, player_id: &PlayerId) -> OpResult {
    let mut out = Outbox::default();
    depart(room, ctx, player_id, Departure::Leave, &mut out);
    Ok(out)
}

/// Takes a player out of play and repairs whatever their absence broke.
pub(super) fn depart(
    room: &mut Room,
    ctx: &mut Context<'_>,
    player_id: &PlayerId,
    departure: Departure,
    out: &mut Outbox,
) {
    let Some(player) = room.players.get_mut(player_id) else {
        return;
    };

    let removing = match departure {
        Departure::Leave | Departure::Kick => true,
        Departure::Disconnect => player.state == PlayerState::Spectating,
        Departure::Spectate => false,
    };
    if matches!(departure, Departure::Leave | Departure::Kick) {
        out.close.append(&mut player.sessions);
    }
    let was_host = player.is_host;
    let was_czar = player.is_card_czar;
    player.state = match departure {
        Departure::Spectate => PlayerState::Spectating,
        _ => PlayerState::Disconnected,
    };
    let returned_hand = if removing || departure == Departure::Spectate {
        std::mem::take(&mut player.hand)
    } else {
        Vec::new()
    };
    room.decks.recycle_answer(returned_hand, &mut ctx.rng);
    tracing::info!(game_id = %room.id, %player_id, ?departure, phase = %room.phase, "player departed");

    if room.players.connected_count() == 0 {
        if departure == Departure::Leave {
            tracing::info!(game_id = %room.id, "last player left");
            out.delete_room = true;
        } else {
            out.inactivity_check = true;
        }
        if removing {
            room.players.remove(player_id);
        }
        return;
    }

    if was_host {
        match room.players.transfer_host(player_id, room.phase) {
            Some(new_host) => {
                tracing::info!(game_id = %room.id, player_id = %new_host, "host transferred");
                out.upgraded_to_host(new_host);
            }
            None if departure == Departure::Spectate => {
                if let Some(player) = room.players.get_mut(player_id) {
                    player.is_host = true;
                }
            }
            None => {
                tracing::info!(game_id = %room.id, "no player can take over as host");
                out.delete_room = true;
                return;
            }
        }
    }

    reconcile(room, ctx, out, was_czar, departure.punishes());

    // A skipped round hands submissions back to their owners, the leaver
    // included.
    if removing {
        if let Some(player) = room.players.remove(player_id) {
            room.decks.recycle_answer(player.hand, &mut ctx.rng);
        }
    }
}

/// The in-progress round can no longer finish on its own: nothing
/// submitted by a player still at the table is left to judge.
fn round_unresolvable(room: &Room) -> bool {
    let Some(round) = &room.current_round else {
        return false;
    };
    let judgeable = round.submissions.iter().any(|submission| {
        room.players
            .get(&submission.player_id)
            .is_some_and(|owner| owner.state != PlayerState::Disconnected)
    });
    match room.phase {
        Phase::PlayingWhiteCards => !judgeable && room.players.everyone_has_played(),
        Phase::ReadingCards | Phase::ShowingCards => !judgeable,
        _ => false,
    }
}

/// Repairs the game after a player left, applying the first rule that
/// matches:
///
/// 1. the round cannot finish: skip it;
/// 2. too few active players: back to the lobby;
/// 3. the czar left: rotate the czar and restart the round;
/// 4. the last outstanding submitter left: start reading.
fn reconcile(room: &mut Room, ctx: &mut Context<'_>, out: &mut Outbox, was_czar: bool, punish: bool) {
    if !room.phase.is_in_game() {
        out.snapshot();
        return;
    }

    let enough_players = room.players.active_count() >= ctx.rules.minimum_players;

    if enough_players && round_unresolvable(room) {
        if was_czar && punish {
            punish_card_czar(room, ctx);
        }
        restart_round(room, ctx, out, Transition::SkipRound);
        return;
    }

    if !enough_players {
        lobby::return_to_lobby(room, ctx, out);
        out.notify(
            Recipient::Room,
            "Not enough players to continue",
            NotificationKind::Default,
        );
        return;
    }

    if was_czar {
        if punish {
            punish_card_czar(room, ctx);
        }
        restart_round(room, ctx, out, Transition::SkipRound);
        return;
    }

    if room.phase == Phase::PlayingWhiteCards && room.players.everyone_has_played() {
        start_reading(room, ctx, out);
        return;
    }

    out.snapshot();
}
