//! Joining, naming, options, and everything else the host controls.

use cardczar_protocol::{
    GameOptions, NotificationKind, PackId, PlayerId, PublicId, Recipient, SessionId,
};

use super::disconnect::{Departure, depart};
use super::round_flow::begin_prompt_selection;
use super::{Context, OpResult, require_host, require_phase};
use crate::{Decks, Outbox, Phase, Player, PlayerState, Rejection, Room, Transition, options};

// ---------------------------------------------------------------------------
// Joining
// ---------------------------------------------------------------------------

/// Attaches `session` to the room.
///
/// A known `player_id` reclaims its seat; a disconnected player comes
/// back as `active`, `joining`, or `pickingName` depending on the phase
/// and whether they have a name. Anyone else gets a new seat, or a
/// spectator seat when the room is full. The first seated player of a
/// room without a host becomes host.
pub fn join(
    room: &mut Room,
    ctx: &mut Context<'_>,
    session: SessionId,
    player_id: Option<&PlayerId>,
) -> OpResult {
    let mut out = Outbox::default();
    let in_game = room.phase.is_in_game();

    if let Some(id) = player_id {
        if let Some(player) = room.players.get_mut(id) {
            player.attach(session);
            if player.state == PlayerState::Disconnected {
                player.state = player.rejoin_state(in_game);
                tracing::info!(game_id = %room.id, player_id = %player.id, state = ?player.state, "player rejoined");
            }
            if room.players.host().is_none() && player_is_seated(room, id) {
                if let Some(player) = room.players.get_mut(id) {
                    player.is_host = true;
                }
            }
            room.last_activity_ms = ctx.now_ms;
            out.snapshot();
            return Ok(out);
        }
        if room.is_banned(id) {
            return Err(Rejection::Banned);
        }
    }

    if room.player_by_session(session).is_some() {
        out.snapshot();
        return Ok(out);
    }

    let state = if seated_count(room) >= room.options.maximum_players {
        PlayerState::Spectating
    } else {
        PlayerState::PickingName
    };
    let mut player = Player::new(session, state);
    player.is_host = room.players.host().is_none() && state != PlayerState::Spectating;
    tracing::info!(
        game_id = %room.id,
        player_id = %player.id,
        %session,
        host = player.is_host,
        "player joined"
    );
    room.players.push(player);
    room.last_activity_ms = ctx.now_ms;
    out.snapshot();
    Ok(out)
}

fn player_is_seated(room: &Room, id: &PlayerId) -> bool {
    room.player(id)
        .is_some_and(|p| !matches!(p.state, PlayerState::Spectating | PlayerState::Disconnected))
}

/// Players holding a seat, connected or not.
fn seated_count(room: &Room) -> usize {
    room.players
        .iter()
        .filter(|p| p.state != PlayerState::Spectating)
        .count()
}

// ---------------------------------------------------------------------------
// Player settings
// ---------------------------------------------------------------------------

/// Trims, strips control characters and angle brackets, and caps the
/// length.
fn clean_name(raw: &str, max_len: usize) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .take(max_len)
        .collect();
    cleaned.trim().to_string()
}

pub(super) fn set_player_name(
    room: &mut Room,
    ctx: &mut Context<'_>,
    player_id: &PlayerId,
    raw: &str,
) -> OpResult {
    let name = clean_name(raw, ctx.rules.player_name_max_len);
    if name.is_empty() {
        return Err(Rejection::InvalidName);
    }
    let in_game = room.phase.is_in_game();
    let player = room.players.get_mut(player_id).ok_or(Rejection::UnknownPlayer)?;
    player.name = name;
    if player.state == PlayerState::PickingName {
        player.state = if in_game {
            PlayerState::Joining
        } else {
            PlayerState::Active
        };
    }

    let mut out = Outbox::default();
    out.snapshot();
    Ok(out)
}

/// Switches between playing and spectating.
pub(super) fn toggle_player_mode(room: &mut Room, ctx: &mut Context<'_>, player_id: &PlayerId) -> OpResult {
    let state = room.player(player_id).ok_or(Rejection::UnknownPlayer)?.state;
    let mut out = Outbox::default();

    match state {
        PlayerState::Disconnected => return Err(Rejection::WrongPlayerState),
        PlayerState::Spectating => {
            if seated_count(room) >= room.options.maximum_players {
                return Err(Rejection::RequirementsNotMet("room is full"));
            }
            let in_game = room.phase.is_in_game();
            let player = room.players.get_mut(player_id).ok_or(Rejection::UnknownPlayer)?;
            player.state = player.rejoin_state(in_game);
            out.snapshot();
        }
        _ => depart(room, ctx, player_id, Departure::Spectate, &mut out),
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Options and packs
// ---------------------------------------------------------------------------

fn rebuild_decks(room: &mut Room, ctx: &mut Context<'_>) {
    room.decks = Decks::from_catalog(ctx.catalog, &room.options.card_packs, &mut ctx.rng);
}

pub(super) fn update_game_options(
    room: &mut Room,
    ctx: &mut Context<'_>,
    player_id: &PlayerId,
    requested: GameOptions,
) -> OpResult {
    require_host(room, player_id)?;
    require_phase(room, &[Phase::Lobby])?;

    let clamped = options::clamp_options(requested, ctx.rules, ctx.catalog);
    let packs_changed = clamped.card_packs != room.options.card_packs;
    room.options = clamped;
    if packs_changed {
        rebuild_decks(room, ctx);
    }

    let mut out = Outbox::default();
    out.game();
    Ok(out)
}

pub(super) fn add_card_pack(
    room: &mut Room,
    ctx: &mut Context<'_>,
    player_id: &PlayerId,
    pack: PackId,
) -> OpResult {
    require_host(room, player_id)?;
    require_phase(room, &[Phase::Lobby])?;
    if !ctx.catalog.contains(&pack) {
        return Err(Rejection::UnknownPack(pack));
    }

    if !room.options.card_packs.contains(&pack) {
        room.options.card_packs.push(pack);
        rebuild_decks(room, ctx);
    }
    let mut out = Outbox::default();
    out.game();
    Ok(out)
}

pub(super) fn remove_card_pack(
    room: &mut Room,
    ctx: &mut Context<'_>,
    player_id: &PlayerId,
    pack: &PackId,
) -> OpResult {
    require_host(room, player_id)?;
    require_phase(room, &[Phase::Lobby])?;

    let before = room.options.card_packs.len();
    room.options.card_packs.retain(|p| p != pack);
    if room.options.card_packs.len() != before {
        rebuild_decks(room, ctx);
    }
    let mut out = Outbox::default();
    out.game();
    Ok(out)
}

// ---------------------------------------------------------------------------
// Game start and stop
// ---------------------------------------------------------------------------

/// Starts a game from the lobby once enough named players and cards are
/// available.
pub(super) fn start_game(room: &mut Room, ctx: &mut Context<'_>, player_id: &PlayerId) -> OpResult {
    require_host(room, player_id)?;
    require_phase(room, &[Phase::Lobby])?;

    let active = room.players.active_count();
    if active < ctx.rules.minimum_players {
        return Err(Rejection::RequirementsNotMet("not enough players"));
    }
    if active > room.options.maximum_players {
        return Err(Rejection::RequirementsNotMet("too many players"));
    }
    if room.options.card_packs.is_empty() {
        return Err(Rejection::RequirementsNotMet("no card packs selected"));
    }
    let (black, white) = ctx.catalog.cards_for(&room.options.card_packs);
    if white.len() < ctx.rules.starting_white_card_count * active
        || black.len() < ctx.rules.black_cards_to_choose_from
    {
        return Err(Rejection::RequirementsNotMet("not enough cards"));
    }

    room.players.reset_for_game();
    room.rounds.clear();
    room.rounds_played = 0;
    room.current_round = None;
    rebuild_decks(room, ctx);
    room.players.appoint_next_card_czar(None, None);
    room.transition(Transition::StartGame);
    tracing::info!(game_id = %room.id, players = active, "game started");

    let mut out = Outbox::default();
    begin_prompt_selection(room, ctx, &mut out);
    Ok(out)
}

/// Stops the game: no timer, no round, no czar, every card back in the
/// decks. Scores and history stay visible until the next start.
pub(super) fn return_to_lobby(room: &mut Room, ctx: &mut Context<'_>, out: &mut Outbox) {
    room.clear_timer();
    room.current_round = None;
    for player in room.players.iter_mut() {
        player.hand.clear();
        player.is_card_czar = false;
        if matches!(
            player.state,
            PlayerState::Playing | PlayerState::Waiting | PlayerState::Joining
        ) {
            player.state = PlayerState::Active;
        }
    }
    rebuild_decks(room, ctx);
    room.transition(Transition::ReturnToLobby);
    tracing::info!(game_id = %room.id, "returned to lobby");
    out.snapshot();
}

pub(super) fn return_to_lobby_by_host(
    room: &mut Room,
    ctx: &mut Context<'_>,
    player_id: &PlayerId,
) -> OpResult {
    require_host(room, player_id)?;
    if !room.phase.is_in_game() {
        return Err(Rejection::IllegalPhase(room.phase));
    }
    let mut out = Outbox::default();
    return_to_lobby(room, ctx, &mut out);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Kicking
// ---------------------------------------------------------------------------

/// Removes a player from the room or moves them to the spectators.
pub(super) fn kick_player(
    room: &mut Room,
    ctx: &mut Context<'_>,
    player_id: &PlayerId,
    target: &PublicId,
    remove_from_game: bool,
) -> OpResult {
    require_host(room, player_id)?;
    let target = room.players.by_public_id(target).ok_or(Rejection::UnknownPlayer)?;
    if &target.id == player_id {
        return Err(Rejection::InvalidSelection);
    }
    let target_id = target.id.clone();
    let target_sessions = target.sessions.clone();
    let target_state = target.state;

    let mut out = Outbox::default();
    if remove_from_game {
        if !room.options.allow_kicked_player_join {
            room.banned.push(target_id.clone());
        }
        out.notify(
            Recipient::Sessions(target_sessions),
            "You were removed from the game",
            NotificationKind::Error,
        );
        depart(room, ctx, &target_id, Departure::Kick, &mut out);
    } else {
        if target_state == PlayerState::Spectating {
            return Err(Rejection::WrongPlayerState);
        }
        out.notify(
            Recipient::Player(target_id.clone()),
            "You were moved to the spectators",
            NotificationKind::Default,
        );
        depart(room, ctx, &target_id, Departure::Spectate, &mut out);
    }
    tracing::info!(game_id = %room.id, player_id = %target_id, remove_from_game, "player kicked");
    Ok(out)
}
