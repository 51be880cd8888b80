//! The round orchestrator: every way a room can change.
//!
//! Each entry point takes the room by `&mut`, validates first, mutates
//! second, and returns an [`Outbox`] describing what to tell whom. A
//! [`Rejection`] means the room was not touched at all, so callers can
//! drop the working copy without rolling anything back.
//!
//! Entry points:
//! - [`join`]: a session attaches to the room.
//! - [`apply`]: a seated player acts.
//! - [`disconnect`]: a session went away.
//! - [`fire_timer`]: a deferred transition came due.
//! - [`check_inactivity`]: the room sat without connections.

mod disconnect;
mod lobby;
mod round_flow;
mod timeouts;

use cardczar_protocol::{PlayerAction, PlayerId};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{CardCatalog, GameRules, Outbox, Phase, Rejection, Room, options};

pub use disconnect::disconnect;
pub use lobby::join;
pub use timeouts::{check_inactivity, fire_timer};

/// The result of one orchestrator call.
pub type OpResult = Result<Outbox, Rejection>;

/// Everything an operation needs besides the room itself.
pub struct Context<'a> {
    pub catalog: &'a CardCatalog,
    pub rules: &'a GameRules,
    /// Wall-clock time of the operation, in milliseconds.
    pub now_ms: u64,
    pub rng: StdRng,
}

impl<'a> Context<'a> {
    pub fn new(catalog: &'a CardCatalog, rules: &'a GameRules, now_ms: u64) -> Self {
        Self {
            catalog,
            rules,
            now_ms,
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// A context with reproducible shuffles.
    pub fn seeded(catalog: &'a CardCatalog, rules: &'a GameRules, now_ms: u64, seed: u64) -> Self {
        Self {
            catalog,
            rules,
            now_ms,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

/// Applies one action by `player_id`.
pub fn apply(room: &mut Room, ctx: &mut Context<'_>, player_id: &PlayerId, action: PlayerAction) -> OpResult {
    if room.player(player_id).is_none() {
        return Err(Rejection::UnknownPlayer);
    }

    let outbox = match action {
        PlayerAction::Leave => disconnect::leave(room, ctx, player_id),
        PlayerAction::StartGame => lobby::start_game(room, ctx, player_id),
        PlayerAction::SetPlayerName(name) => lobby::set_player_name(room, ctx, player_id, &name),
        PlayerAction::TogglePlayerMode => lobby::toggle_player_mode(room, ctx, player_id),
        PlayerAction::UpdateGameOptions(options) => lobby::update_game_options(room, ctx, player_id, options),
        PlayerAction::AddCardPack(pack) => lobby::add_card_pack(room, ctx, player_id, pack),
        PlayerAction::RemoveCardPack(pack) => lobby::remove_card_pack(room, ctx, player_id, &pack),
        PlayerAction::KickPlayer {
            target,
            remove_from_game,
        } => lobby::kick_player(room, ctx, player_id, &target, remove_from_game),
        PlayerAction::ReturnToLobby => lobby::return_to_lobby_by_host(room, ctx, player_id),
        PlayerAction::DrawBlackCards => round_flow::draw_black_cards(room, ctx, player_id),
        PlayerAction::SelectBlackCard { selected, discarded } => {
            round_flow::select_black_card(room, ctx, player_id, &selected, &discarded)
        }
        PlayerAction::PlayWhiteCards(cards) => round_flow::play_white_cards(room, ctx, player_id, &cards),
        PlayerAction::ShowNextWhiteCard => round_flow::show_next_white_card(room, ctx, player_id),
        PlayerAction::PickWinningCard(cards) => round_flow::select_winner(room, ctx, player_id, &cards),
        PlayerAction::GivePopularVote(cards) => round_flow::give_popular_vote(room, player_id, &cards),
        PlayerAction::StartRound => round_flow::start_round(room, ctx, player_id),
    }?;

    room.last_activity_ms = ctx.now_ms;
    Ok(outbox)
}

// ---------------------------------------------------------------------------
// Guards shared by the operations
// ---------------------------------------------------------------------------

fn require_phase(room: &Room, allowed: &[Phase]) -> Result<(), Rejection> {
    if allowed.contains(&room.phase) {
        Ok(())
    } else {
        Err(Rejection::IllegalPhase(room.phase))
    }
}

fn require_host(room: &Room, player_id: &PlayerId) -> Result<(), Rejection> {
    if room.players.is_host(player_id) {
        Ok(())
    } else {
        Err(Rejection::NotHost)
    }
}

fn require_card_czar(room: &Room, player_id: &PlayerId) -> Result<(), Rejection> {
    if room.players.is_card_czar(player_id) {
        Ok(())
    } else {
        Err(Rejection::NotCardCzar)
    }
}

// ---------------------------------------------------------------------------
// Helpers shared by the operations
// ---------------------------------------------------------------------------

/// Arms the timer belonging to the room's current phase, or clears it
/// when that phase has none or its timer is switched off.
fn arm_phase_timer(room: &mut Room, ctx: &Context<'_>) {
    match room.phase.timeout_transition() {
        Some(transition) => {
            let seconds = options::timer_seconds(&room.options.timers, room.phase);
            room.arm_timer(transition, seconds, ctx.now_ms);
        }
        None => room.clear_timer(),
    }
}

/// Docks points from a czar who let a decision lapse. Round end is not a
/// decision, so it never punishes.
fn punish_card_czar(room: &mut Room, ctx: &Context<'_>) {
    if room.phase == Phase::RoundEnd {
        return;
    }
    if let Some(czar) = room.players.iter_mut().find(|p| p.is_card_czar) {
        czar.score -= ctx.rules.card_czar_punishment;
        tracing::debug!(game_id = %room.id, player_id = %czar.id, score = czar.score, "card czar punished");
    }
}
