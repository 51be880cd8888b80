//! Clamping host-supplied options into legal ranges.

use std::ops::RangeInclusive;

use cardczar_protocol::{GameOptions, TimerOptions};

use crate::{CardCatalog, GameRules, Phase};

const SCORE_LIMIT: RangeInclusive<u32> = 1..=100;
const ROUND_LIMIT: RangeInclusive<u32> = 1..=100;
const DECISION_SECONDS: RangeInclusive<u32> = 10..=300;
const ROUND_END_SECONDS: RangeInclusive<u32> = 5..=120;

fn clamp<T: Ord + Copy>(value: T, range: &RangeInclusive<T>) -> T {
    value.clamp(*range.start(), *range.end())
}

/// Returns `options` with every number forced into its legal range and
/// unknown card packs dropped.
pub fn clamp_options(mut options: GameOptions, rules: &GameRules, catalog: &CardCatalog) -> GameOptions {
    options.maximum_players = options
        .maximum_players
        .clamp(rules.minimum_players, rules.maximum_players);

    let win = &mut options.win_conditions;
    win.score_limit = clamp(win.score_limit, &SCORE_LIMIT);
    win.round_limit = clamp(win.round_limit, &ROUND_LIMIT);

    let timers = &mut options.timers;
    timers.select_black_card = clamp(timers.select_black_card, &DECISION_SECONDS);
    timers.select_white_cards = clamp(timers.select_white_cards, &DECISION_SECONDS);
    timers.read_black_card = clamp(timers.read_black_card, &DECISION_SECONDS);
    timers.select_winner = clamp(timers.select_winner, &DECISION_SECONDS);
    timers.round_end = clamp(timers.round_end, &ROUND_END_SECONDS);

    options.card_packs.retain(|pack| catalog.contains(pack));
    options.card_packs.dedup();
    options
}

/// The time limit for `phase` in seconds, or `None` when that phase's
/// timer is switched off (or the phase has none).
pub fn timer_seconds(timers: &TimerOptions, phase: Phase) -> Option<u32> {
    let (enabled, seconds) = match phase {
        Phase::Lobby => return None,
        Phase::PickingBlackCard => (timers.use_select_black_card, timers.select_black_card),
        Phase::PlayingWhiteCards => (timers.use_select_white_cards, timers.select_white_cards),
        Phase::ReadingCards => (timers.use_read_black_card, timers.read_black_card),
        Phase::ShowingCards => (timers.use_select_winner, timers.select_winner),
        Phase::RoundEnd => (timers.use_round_end, timers.round_end),
    };
    enabled.then_some(seconds)
}
