//! Deferred transitions coming due.

use super::round_flow::{advance_round, end_round, show_cards, start_playing, start_reading};
use super::{Context, OpResult, lobby, punish_card_czar};
use crate::{Outbox, Rejection, Room, Transition};

/// Fires the timer armed as `generation` for `transition`.
///
/// A timer only counts if it is still the room's pending timer and the
/// room is still in the phase that armed it. Anything else means a player
/// action or a newer timer got there first, and the firing is dropped
/// without touching the room.
pub fn fire_timer(room: &mut Room, ctx: &mut Context<'_>, transition: Transition, generation: u64) -> OpResult {
    let current = room
        .timer
        .filter(|t| t.generation == generation && t.transition == transition);
    if current.is_none() || room.phase.timeout_transition() != Some(transition) {
        return Err(Rejection::StaleTimer);
    }
    room.timer = None;
    tracing::debug!(game_id = %room.id, %transition, generation, "timer fired");

    let mut out = Outbox::default();
    match transition {
        Transition::StartPlayingWhiteCards => {
            punish_card_czar(room, ctx);
            if room.decks.offered.is_empty() {
                room.decks.offered = room
                    .decks
                    .draw_prompt_cards(ctx.rules.black_cards_to_choose_from, &mut ctx.rng);
            }
            if room.decks.offered.is_empty() {
                lobby::return_to_lobby(room, ctx, &mut out);
                return Ok(out);
            }
            let card = room.decks.offered.remove(0);
            room.decks.recycle_offered(&mut ctx.rng);
            start_playing(room, ctx, &mut out, card);
        }
        Transition::StartReading => start_reading(room, ctx, &mut out),
        Transition::ShowCards => show_cards(room, ctx, &mut out),
        Transition::EndRound => {
            punish_card_czar(room, ctx);
            end_round(room, ctx, &mut out);
        }
        Transition::StartRound => advance_round(room, ctx, &mut out),
        Transition::StartGame | Transition::SkipRound | Transition::ReturnToLobby => {
            return Err(Rejection::StaleTimer);
        }
    }
    Ok(out)
}

/// Deletes the room once it has sat without connections for the whole
/// inactivity period. A check scheduled by an earlier disconnect that
/// comes due while the room has been empty for less than that is a no-op;
/// the latest disconnect scheduled its own.
pub fn check_inactivity(room: &mut Room, ctx: &mut Context<'_>) -> OpResult {
    if room.players.connected_count() > 0 {
        return Err(Rejection::RoomInUse);
    }
    let idle_ms = ctx.now_ms.saturating_sub(room.last_activity_ms);
    if idle_ms < ctx.rules.inactive_room_ttl.as_millis() as u64 {
        return Err(Rejection::RoomInUse);
    }
    tracing::info!(game_id = %room.id, idle_ms, "deleting inactive room");
    Ok(Outbox {
        delete_room: true,
        ..Outbox::default()
    })
}
