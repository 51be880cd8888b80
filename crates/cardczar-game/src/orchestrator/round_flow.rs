//! One round from prompt selection to the next czar.

use std::collections::HashSet;

use cardczar_protocol::{BlackCard, CardId, NotificationKind, PlayerId, Recipient};
use rand::seq::SliceRandom;

use super::{Context, OpResult, arm_phase_timer, lobby, require_card_czar, require_phase};
use crate::{Outbox, Phase, PlayerState, Rejection, Room, Round, Submission, Transition};

// ---------------------------------------------------------------------------
// Prompt selection
// ---------------------------------------------------------------------------

/// Starts `pickingBlackCard`: seats joiners, tops up hands, and deals the
/// czar fresh prompt choices. The room must already be in that phase with
/// its czar appointed.
pub(super) fn begin_prompt_selection(room: &mut Room, ctx: &mut Context<'_>, out: &mut Outbox) {
    room.current_round = None;
    room.players.activate_joining();
    room.players.set_active();
    deal_hands(room, ctx);

    let Some(czar) = room.players.card_czar().map(|p| p.id.clone()) else {
        tracing::warn!(game_id = %room.id, "nobody can be card czar");
        lobby::return_to_lobby(room, ctx, out);
        return;
    };

    room.decks.recycle_offered(&mut ctx.rng);
    let offered = room
        .decks
        .draw_prompt_cards(ctx.rules.black_cards_to_choose_from, &mut ctx.rng);
    if offered.is_empty() {
        tracing::warn!(game_id = %room.id, "no black cards left");
        lobby::return_to_lobby(room, ctx, out);
        return;
    }
    room.decks.offered = offered;

    arm_phase_timer(room, ctx);
    out.snapshot();
    out.deal_black_cards(czar);
}

/// Tops every active player's hand up to the starting size.
fn deal_hands(room: &mut Room, ctx: &mut Context<'_>) {
    let target = ctx.rules.starting_white_card_count;
    for player in room.players.iter_mut().filter(|p| p.state.is_active()) {
        let missing = target.saturating_sub(player.hand.len());
        if missing == 0 {
            continue;
        }
        let drawn = room.decks.draw_answer_cards(missing, &mut ctx.rng);
        if drawn.len() < missing {
            tracing::warn!(
                game_id = %room.id,
                player_id = %player.id,
                wanted = missing,
                got = drawn.len(),
                "short draw of white cards"
            );
        }
        player.hand.extend(drawn);
    }
}

/// Re-sends the czar's outstanding prompt choices, drawing them only if
/// none are out.
pub(super) fn draw_black_cards(room: &mut Room, ctx: &mut Context<'_>, player_id: &PlayerId) -> OpResult {
    require_phase(room, &[Phase::PickingBlackCard])?;
    require_card_czar(room, player_id)?;

    if room.decks.offered.is_empty() {
        room.decks.offered = room
            .decks
            .draw_prompt_cards(ctx.rules.black_cards_to_choose_from, &mut ctx.rng);
    }
    let mut out = Outbox::default();
    out.deal_black_cards(player_id.clone());
    Ok(out)
}

pub(super) fn select_black_card(
    room: &mut Room,
    ctx: &mut Context<'_>,
    player_id: &PlayerId,
    selected: &CardId,
    discarded: &[CardId],
) -> OpResult {
    require_phase(room, &[Phase::PickingBlackCard])?;
    require_card_czar(room, player_id)?;

    let offered = &room.decks.offered;
    let position = offered
        .iter()
        .position(|card| &card.id == selected)
        .ok_or(Rejection::InvalidSelection)?;
    let distinct: HashSet<&CardId> = discarded.iter().collect();
    let valid_discards = discarded.len() == offered.len() - 1
        && distinct.len() == discarded.len()
        && !distinct.contains(selected)
        && discarded.iter().all(|id| offered.iter().any(|card| &card.id == id));
    if !valid_discards {
        return Err(Rejection::InvalidSelection);
    }

    let card = room.decks.offered.remove(position);
    room.decks.recycle_offered(&mut ctx.rng);

    let mut out = Outbox::default();
    start_playing(room, ctx, &mut out, card);
    Ok(out)
}

/// Opens `playingWhiteCards` with `card` as the prompt.
pub(super) fn start_playing(room: &mut Room, ctx: &mut Context<'_>, out: &mut Outbox, card: BlackCard) {
    let Some(czar) = room.players.card_czar().map(|p| p.id.clone()) else {
        room.decks.recycle_prompt([card], &mut ctx.rng);
        lobby::return_to_lobby(room, ctx, out);
        return;
    };

    let number = room.rounds_played + 1;
    room.current_round = Some(Round::new(number, card, czar));
    room.transition(Transition::StartPlayingWhiteCards);
    room.players.set_playing();

    if room.players.everyone_has_played() {
        start_reading(room, ctx, out);
        return;
    }
    arm_phase_timer(room, ctx);
    out.snapshot();
}

// ---------------------------------------------------------------------------
// Submissions and reveal
// ---------------------------------------------------------------------------

pub(super) fn play_white_cards(
    room: &mut Room,
    ctx: &mut Context<'_>,
    player_id: &PlayerId,
    card_ids: &[CardId],
) -> OpResult {
    require_phase(room, &[Phase::PlayingWhiteCards])?;
    let blanks = match &room.current_round {
        Some(round) => round.black_card.blanks,
        None => return Err(Rejection::IllegalPhase(room.phase)),
    };

    let player = room.players.get_mut(player_id).ok_or(Rejection::UnknownPlayer)?;
    if player.is_card_czar || player.state != PlayerState::Playing {
        return Err(Rejection::WrongPlayerState);
    }
    if card_ids.len() != blanks {
        return Err(Rejection::InvalidSelection);
    }
    let cards = player.take_cards(card_ids).ok_or(Rejection::UnknownCards)?;
    player.state = PlayerState::Waiting;

    if let Some(round) = room.current_round.as_mut() {
        round.submissions.push(Submission::new(player_id.clone(), cards));
    }

    let mut out = Outbox::default();
    if room.players.everyone_has_played() {
        start_reading(room, ctx, &mut out);
    } else {
        out.snapshot();
    }
    Ok(out)
}

/// Closes submissions. With nothing submitted the round is skipped;
/// otherwise submissions are shuffled so their order says nothing about
/// who played when.
pub(super) fn start_reading(room: &mut Room, ctx: &mut Context<'_>, out: &mut Outbox) {
    let nothing_submitted = room
        .current_round
        .as_ref()
        .is_none_or(|round| round.submissions.is_empty());
    room.transition(Transition::StartReading);

    if nothing_submitted {
        tracing::debug!(game_id = %room.id, "no submissions, skipping round");
        restart_round(room, ctx, out, Transition::StartRound);
        return;
    }

    if let Some(round) = room.current_round.as_mut() {
        round.submissions.shuffle(&mut ctx.rng);
        round.reveal_cursor = 0;
    }
    room.players.set_active();
    arm_phase_timer(room, ctx);
    out.snapshot();
}

pub(super) fn show_next_white_card(room: &mut Room, ctx: &mut Context<'_>, player_id: &PlayerId) -> OpResult {
    require_phase(room, &[Phase::ReadingCards])?;
    require_card_czar(room, player_id)?;
    let round = room
        .current_round
        .as_mut()
        .ok_or(Rejection::IllegalPhase(room.phase))?;

    let mut out = Outbox::default();
    if let Some(cards) = round.reveal_next() {
        out.show_white_card(cards);
    }
    if round.fully_revealed() {
        show_cards(room, ctx, &mut out);
    } else {
        out.game();
    }
    Ok(out)
}

/// Reveals whatever is left and opens `showingCards`.
pub(super) fn show_cards(room: &mut Room, ctx: &mut Context<'_>, out: &mut Outbox) {
    if let Some(round) = room.current_round.as_mut() {
        round.reveal_all();
    }
    room.transition(Transition::ShowCards);
    arm_phase_timer(room, ctx);
    out.game();
}

// ---------------------------------------------------------------------------
// Winner and votes
// ---------------------------------------------------------------------------

pub(super) fn select_winner(
    room: &mut Room,
    ctx: &mut Context<'_>,
    player_id: &PlayerId,
    card_ids: &[CardId],
) -> OpResult {
    require_phase(room, &[Phase::ShowingCards])?;
    require_card_czar(room, player_id)?;
    let round = room
        .current_round
        .as_mut()
        .ok_or(Rejection::IllegalPhase(room.phase))?;

    let index = round.find_submission(card_ids).ok_or(Rejection::NoMatch)?;
    let winner = round.mark_winner(index).ok_or(Rejection::NoMatch)?;
    let number = round.number;

    if let Some(player) = room.players.get_mut(&winner) {
        player.score += ctx.rules.points_per_round;
        tracing::info!(game_id = %room.id, player_id = %player.id, round = number, score = player.score, "round won");
    }

    let mut out = Outbox::default();
    end_round(room, ctx, &mut out);
    Ok(out)
}

/// Opens `roundEnd`, with or without a winner.
pub(super) fn end_round(room: &mut Room, ctx: &mut Context<'_>, out: &mut Outbox) {
    room.transition(Transition::EndRound);
    room.players.set_active();
    arm_phase_timer(room, ctx);
    out.snapshot();
}

pub(super) fn give_popular_vote(room: &mut Room, voter_id: &PlayerId, card_ids: &[CardId]) -> OpResult {
    require_phase(room, &[Phase::ReadingCards, Phase::ShowingCards, Phase::RoundEnd])?;

    let voter = room.players.get(voter_id).ok_or(Rejection::UnknownPlayer)?;
    if voter.is_card_czar && !room.options.allow_card_czar_popular_vote {
        return Err(Rejection::NotCardCzar);
    }
    if !voter.is_card_czar && !voter.state.is_active() {
        return Err(Rejection::WrongPlayerState);
    }

    let round = room
        .current_round
        .as_mut()
        .ok_or(Rejection::IllegalPhase(room.phase))?;
    let index = round.find_submission(card_ids).ok_or(Rejection::NoMatch)?;
    if !round.is_revealed(index) {
        return Err(Rejection::NoMatch);
    }
    let submission = &mut round.submissions[index];
    if &submission.player_id == voter_id {
        return Err(Rejection::InvalidSelection);
    }
    if submission.voters.contains(voter_id) {
        return Err(Rejection::AlreadyVoted);
    }
    submission.voters.push(voter_id.clone());
    submission.popular_vote += 1;
    let owner = submission.player_id.clone();

    if let Some(player) = room.players.get_mut(&owner) {
        player.popular_vote_score += 1;
    }

    let mut out = Outbox::default();
    out.snapshot();
    Ok(out)
}

// ---------------------------------------------------------------------------
// Between rounds
// ---------------------------------------------------------------------------

/// The czar moves on from `roundEnd` without waiting for the timer.
pub(super) fn start_round(room: &mut Room, ctx: &mut Context<'_>, player_id: &PlayerId) -> OpResult {
    require_phase(room, &[Phase::RoundEnd])?;
    require_card_czar(room, player_id)?;
    let mut out = Outbox::default();
    advance_round(room, ctx, &mut out);
    Ok(out)
}

/// Archives the finished round, then either ends the game or hands the
/// czar role on and starts the next round.
pub(super) fn advance_round(room: &mut Room, ctx: &mut Context<'_>, out: &mut Outbox) {
    let winner = archive_round(room, ctx);

    if let Some(reason) = game_over(room) {
        tracing::info!(game_id = %room.id, rounds = room.rounds_played, reason, "game over");
        let leader = room
            .players
            .iter()
            .max_by_key(|p| p.score)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        lobby::return_to_lobby(room, ctx, out);
        out.notify(
            Recipient::Room,
            format!("Game over! {leader} wins"),
            NotificationKind::Default,
        );
        return;
    }

    let previous = room.players.card_czar().map(|p| p.id.clone());
    let winner = winner.filter(|_| room.options.winner_becomes_card_czar);
    room.players
        .appoint_next_card_czar(previous.as_ref(), winner.as_ref());
    room.transition(Transition::StartRound);
    begin_prompt_selection(room, ctx, out);
}

/// Moves the current round into history and its cards onto the discard
/// piles. Returns the round's winner.
fn archive_round(room: &mut Room, ctx: &Context<'_>) -> Option<PlayerId> {
    let round = room.current_round.take()?;
    room.decks.black.discard([round.black_card.clone()]);
    room.decks.white.discard(
        round
            .submissions
            .iter()
            .flat_map(|s| s.white_cards.iter().cloned()),
    );
    let winner = round.winner.clone();
    room.rounds.push(round);
    room.rounds_played += 1;
    let overflow = room.rounds.len().saturating_sub(ctx.rules.round_history_limit);
    room.rounds.drain(..overflow);
    winner
}

fn game_over(room: &Room) -> Option<&'static str> {
    let win = &room.options.win_conditions;
    let top_score = room.players.iter().map(|p| p.score).max().unwrap_or(0);
    if win.use_score_limit && top_score >= win.score_limit as i32 {
        return Some("score limit");
    }
    if win.use_round_limit && room.rounds_played >= win.round_limit {
        return Some("round limit");
    }
    None
}

/// Abandons the current round and starts prompt selection with the next
/// czar. Submitted cards go back to their owners; a round already in
/// `roundEnd` is archived as played.
pub(super) fn restart_round(room: &mut Room, ctx: &mut Context<'_>, out: &mut Outbox, transition: Transition) {
    if room.phase == Phase::RoundEnd {
        archive_round(room, ctx);
    } else if let Some(round) = room.current_round.take() {
        for submission in round.submissions {
            match room.players.get_mut(&submission.player_id) {
                Some(owner) => owner.hand.extend(submission.white_cards),
                None => room.decks.recycle_answer(submission.white_cards, &mut ctx.rng),
            }
        }
        room.decks.recycle_prompt([round.black_card], &mut ctx.rng);
    }
    room.decks.recycle_offered(&mut ctx.rng);

    let previous = room.players.card_czar().map(|p| p.id.clone());
    room.players.appoint_next_card_czar(previous.as_ref(), None);
    room.transition(transition);
    begin_prompt_selection(room, ctx, out);
}
