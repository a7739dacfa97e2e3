use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::time::Duration;

use crate::game::{
    MatchError, MatchState, RoundSettlement, RoundTrigger,
    constants::{DEFAULT_THINK_TIME, STAT_COUNT},
    entities::{Card, Deck, RoundOutcome, Side, Stat},
};

/// Single-player opponent with its own mirror deck.
#[derive(Debug)]
pub struct LocalOpponent {
    mirror: Deck,
    current: Option<Card>,
    think_time: Duration,
    rng: StdRng,
}

impl LocalOpponent {
    /// Take the opponent's dealt hand. Its first card goes face-up.
    pub fn new(hand: Vec<Card>) -> Result<Self, MatchError> {
        Self::with_rng(hand, StdRng::from_os_rng())
    }

    /// An opponent whose stat choices are reproducible.
    pub fn with_seed(hand: Vec<Card>, seed: u64) -> Result<Self, MatchError> {
        Self::with_rng(hand, StdRng::seed_from_u64(seed))
    }

    fn with_rng(hand: Vec<Card>, rng: StdRng) -> Result<Self, MatchError> {
        let mut mirror = Deck::from(hand);
        let current = mirror.draw().ok_or(MatchError::EmptyHand)?;
        Ok(Self {
            mirror,
            current: Some(current),
            think_time: DEFAULT_THINK_TIME,
            rng,
        })
    }

    #[must_use]
    pub fn with_think_time(mut self, think_time: Duration) -> Self {
        self.think_time = think_time;
        self
    }

    #[must_use]
    pub fn think_time(&self) -> Duration {
        self.think_time
    }

    /// Uniform over every stat.
    pub fn choose_stat(&mut self) -> Stat {
        Stat::ALL[self.rng.random_range(0..STAT_COUNT)]
    }

    #[must_use]
    pub fn face_up(&self) -> Option<&Card> {
        self.current.as_ref()
    }

    /// Mirror deck size, not counting the face-up card.
    #[must_use]
    pub fn deck_count(&self) -> usize {
        self.mirror.len()
    }

    /// Lead a round: pick a stat and show the face-up card.
    pub fn lead(&mut self) -> Result<RoundTrigger, MatchError> {
        let opponent_card = self.current.clone().ok_or(MatchError::NoSelfCard)?;
        let stat = self.choose_stat();
        debug!("computer leads {stat} with {opponent_card}");
        Ok(RoundTrigger {
            stat,
            opponent_card,
            initiator: Side::Opponent,
        })
    }

    /// Answer a round the player led with the face-up card.
    pub fn respond(&self, stat: Stat) -> Result<RoundTrigger, MatchError> {
        let opponent_card = self.current.clone().ok_or(MatchError::NoSelfCard)?;
        Ok(RoundTrigger {
            stat,
            opponent_card,
            initiator: Side::Me,
        })
    }

    /// Apply a settled round to the mirror deck and make its size the
    /// authoritative opponent count in `state`.
    pub fn absorb(&mut self, settlement: &RoundSettlement, state: &mut MatchState) {
        self.current = None;
        if settlement.outcome == RoundOutcome::Won(Side::Opponent) {
            self.mirror.append(settlement.opponent_loot.iter().cloned());
        }
        if settlement.ending.is_some() {
            return;
        }
        self.current = self.mirror.draw();
        state.sync_opponent_count(self.mirror.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Score;
    use std::collections::HashSet;

    fn hand(prefix: &str, scores: &[Score]) -> Vec<Card> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| Card::new(&format!("{prefix}{i}"), [score; STAT_COUNT]).unwrap())
            .collect()
    }

    #[test]
    fn test_new_puts_first_card_face_up() {
        let bot = LocalOpponent::with_seed(hand("cpu", &[1, 2, 3]), 1).unwrap();
        assert_eq!(bot.face_up().map(|c| c.login.as_str()), Some("cpu0"));
        assert_eq!(bot.deck_count(), 2);
        assert_eq!(bot.think_time(), DEFAULT_THINK_TIME);
    }

    #[test]
    fn test_new_rejects_empty_hand() {
        assert_eq!(
            LocalOpponent::new(Vec::new()).unwrap_err(),
            MatchError::EmptyHand
        );
    }

    #[test]
    fn test_choose_stat_covers_all_stats() {
        let mut bot = LocalOpponent::with_seed(hand("cpu", &[1]), 7).unwrap();
        let chosen: HashSet<Stat> = (0..300).map(|_| bot.choose_stat()).collect();
        assert_eq!(chosen.len(), STAT_COUNT);
    }

    #[test]
    fn test_lead_is_initiated_by_opponent() {
        let mut bot = LocalOpponent::with_seed(hand("cpu", &[5, 6]), 3).unwrap();
        let trigger = bot.lead().unwrap();
        assert_eq!(trigger.initiator, Side::Opponent);
        assert_eq!(trigger.opponent_card.login, "cpu0");
        let answer = bot.respond(Stat::Activity).unwrap();
        assert_eq!(answer.initiator, Side::Me);
        assert_eq!(answer.stat, Stat::Activity);
    }

    #[test]
    fn test_absorb_tracks_state_after_win() {
        let mut state = MatchState::with_seed(1);
        let theirs = state
            .deal_split(
                [hand("me", &[10, 10]), hand("cpu", &[90, 90])].concat(),
                Side::Me,
            )
            .unwrap();
        let mut bot = LocalOpponent::with_seed(theirs, 2).unwrap();
        let trigger = bot.respond(Stat::Followers).unwrap();
        let (_, settlement) = state
            .reveal_and_resolve(trigger.stat, trigger.opponent_card)
            .unwrap();
        bot.absorb(&settlement, &mut state);
        assert_eq!(bot.deck_count(), 2);
        assert_eq!(state.opponent_deck_count(), 2);
        assert_eq!(bot.face_up().map(|c| c.login.as_str()), Some("cpu1"));
        assert_eq!(state.cards_in_play(), 4);
    }

    #[test]
    fn test_absorb_stops_at_match_end() {
        let mut state = MatchState::with_seed(1);
        let theirs = state
            .deal_split([hand("me", &[90]), hand("cpu", &[10])].concat(), Side::Me)
            .unwrap();
        let mut bot = LocalOpponent::with_seed(theirs, 2).unwrap();
        let trigger = bot.respond(Stat::Influence).unwrap();
        let (_, settlement) = state
            .reveal_and_resolve(trigger.stat, trigger.opponent_card)
            .unwrap();
        bot.absorb(&settlement, &mut state);
        assert!(state.is_terminal());
        assert!(bot.face_up().is_none());
    }
}
