/// Property-based tests for the match state machine using proptest
///
/// A single-player match is simulated with the computer opponent's mirror
/// deck, and the card-flow invariants are checked after every round.
use dev_trumps::{
    MatchError, MatchState, MatchStatus, RoundOutcome, Side, Stat,
    bot::LocalOpponent,
    constants::{MAX_SCORE, STAT_COUNT},
    entities::{Card, Score},
};
use proptest::prelude::*;

const MAX_ROUNDS: usize = 2_000;

fn stat_strategy() -> impl Strategy<Value = Stat> {
    (0..STAT_COUNT).prop_map(|i| Stat::ALL[i])
}

fn card(login: String, scores: [Score; STAT_COUNT]) -> Card {
    Card::new(&login, scores).unwrap()
}

// Strategy for an even-sized deck of distinct logins
fn deck_strategy(max_hand: usize) -> impl Strategy<Value = Vec<Card>> {
    (1..=max_hand).prop_flat_map(|hand_size| {
        prop::collection::vec(prop::array::uniform6(0..=MAX_SCORE), 2 * hand_size).prop_map(
            |all_scores| {
                all_scores
                    .into_iter()
                    .enumerate()
                    .map(|(i, scores)| card(format!("dev{i}"), scores))
                    .collect()
            },
        )
    })
}

fn tied_deck(cards: usize) -> Vec<Card> {
    (0..cards).map(|i| card(format!("tie{i}"), [50; STAT_COUNT])).collect()
}

/// Deal a solo match. The opponent is seeded so failures reproduce.
fn solo(full: Vec<Card>, turn: Side, seed: u64) -> (MatchState, LocalOpponent) {
    let mut state = MatchState::with_seed(seed);
    let hand = state.deal_split(full, turn).unwrap();
    let opponent = LocalOpponent::with_seed(hand, seed).unwrap();
    (state, opponent)
}

/// Play one round: the player leads with `stat`, the computer picks its own.
fn play_round(state: &mut MatchState, opponent: &mut LocalOpponent, stat: Stat) -> RoundOutcome {
    let trigger = if state.turn() == Side::Me {
        opponent.respond(stat).unwrap()
    } else {
        opponent.lead().unwrap()
    };
    let (report, settlement) = state
        .reveal_and_resolve(trigger.stat, trigger.opponent_card)
        .unwrap();
    opponent.absorb(&settlement, state);
    report.outcome
}

proptest! {
    #[test]
    fn test_cards_are_conserved(
        full in deck_strategy(10),
        stats in prop::collection::vec(stat_strategy(), 1..64),
        seed in any::<u64>(),
    ) {
        let total = full.len();
        let (mut state, mut opponent) = solo(full, Side::Me, seed);
        prop_assert_eq!(state.cards_in_play(), total);

        for round in 0..MAX_ROUNDS {
            if state.is_terminal() {
                break;
            }
            play_round(&mut state, &mut opponent, stats[round % stats.len()]);
            if state.is_live() {
                prop_assert_eq!(state.cards_in_play(), total);
                prop_assert_eq!(state.opponent_deck_count(), opponent.deck_count());
            } else {
                // The loser's last card went to the winner or the pot.
                prop_assert_eq!(state.self_remaining() + opponent.deck_count() + state.pot().len(), total);
            }
        }
    }

    #[test]
    fn test_turn_goes_to_round_winner(
        full in deck_strategy(8),
        stats in prop::collection::vec(stat_strategy(), 1..32),
        seed in any::<u64>(),
    ) {
        let (mut state, mut opponent) = solo(full, Side::Opponent, seed);
        for round in 0..MAX_ROUNDS {
            if state.is_terminal() {
                break;
            }
            let before = state.turn();
            let outcome = play_round(&mut state, &mut opponent, stats[round % stats.len()]);
            if state.is_live() {
                prop_assert_eq!(state.turn(), outcome.winner().unwrap_or(before));
            }
        }
    }

    #[test]
    fn test_draws_accumulate_into_pot(draws in 1usize..8, seed in any::<u64>()) {
        // `draws` tied rounds, then one the player wins with the last card.
        let hand_size = draws + 1;
        let mut full = tied_deck(2 * hand_size);
        full[draws] = card("winner".to_string(), [90; STAT_COUNT]);
        let (mut state, mut opponent) = solo(full, Side::Me, seed);

        for round in 1..=draws {
            let outcome = play_round(&mut state, &mut opponent, Stat::Activity);
            prop_assert_eq!(outcome, RoundOutcome::Draw);
            prop_assert_eq!(state.pot().len(), 2 * round);
            prop_assert_eq!(state.turn(), Side::Me);
        }

        let outcome = play_round(&mut state, &mut opponent, Stat::Activity);
        prop_assert_eq!(outcome, RoundOutcome::Won(Side::Me));
        prop_assert!(state.pot().is_empty());
        prop_assert_eq!(state.self_remaining(), 2 * draws + 2);
        prop_assert_eq!(state.ending().unwrap().winner, Some(Side::Me));
    }

    #[test]
    fn test_comparison_is_antisymmetric(
        a in prop::array::uniform6(0..=MAX_SCORE),
        b in prop::array::uniform6(0..=MAX_SCORE),
        stat in stat_strategy(),
    ) {
        let mine = card("mine".to_string(), a);
        let theirs = card("theirs".to_string(), b);
        let forward = RoundOutcome::compare(stat, &mine, &theirs);
        prop_assert_eq!(forward, RoundOutcome::compare(stat, &theirs, &mine).mirrored());
        prop_assert_eq!(forward == RoundOutcome::Draw, a[stat.index()] == b[stat.index()]);
        prop_assert_eq!(forward, RoundOutcome::compare(stat, &mine, &theirs));
    }

    #[test]
    fn test_terminal_state_is_absorbing(full in deck_strategy(6), seed in any::<u64>()) {
        let (mut state, mut opponent) = solo(full, Side::Me, seed);
        for round in 0..MAX_ROUNDS {
            if state.is_terminal() {
                break;
            }
            play_round(&mut state, &mut opponent, Stat::ALL[round % STAT_COUNT]);
        }
        prop_assume!(state.is_terminal());

        let view = state.view();
        let spare = card("spare".to_string(), [1; STAT_COUNT]);
        prop_assert_eq!(state.reveal(spare), Err(MatchError::MatchOver));
        prop_assert_eq!(state.compare(Stat::Followers), Err(MatchError::MatchOver));
        prop_assert_eq!(state.advance().map(|_| ()), Err(MatchError::MatchOver));
        prop_assert!(!state.sync_opponent_count(99));
        prop_assert_eq!(state.status(), MatchStatus::Terminal);
        prop_assert_eq!(state.view(), view);
    }
}

#[test]
fn test_all_ties_bankrupt_the_player_first() {
    let (mut state, mut opponent) = solo(tied_deck(8), Side::Me, 7);
    for _ in 0..4 {
        assert_eq!(
            play_round(&mut state, &mut opponent, Stat::Influence),
            RoundOutcome::Draw
        );
    }
    let ending = state.ending().unwrap();
    assert_eq!(ending.winner, Some(Side::Opponent));
    assert_eq!(state.pot().len(), 8);
}
