//! Match state machine.
//!
//! Each client owns exactly one [`MatchState`]: its own deck and face-up card,
//! a count of the opponent's deck, the pot of drawn rounds and whose turn it
//! is. Single-player and peer-to-peer matches drive the same transitions:
//!
//! ```text
//! AwaitingDeal -> InProgress <-> RoundResolving -> ... -> Terminal
//! ```
//!
//! A round is resolved in three steps so the orchestrator can pace them:
//! [`MatchState::reveal`] records the opponent's card, [`MatchState::compare`]
//! decides the round and [`MatchState::advance`] moves cards and starts the
//! next round. [`MatchState::reveal_and_resolve`] runs all three at once.

use log::{debug, info, warn};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::constants::MIN_HAND_SIZE;
use super::entities::{Card, Deck, DeckError, RoundOutcome, Score, Side, Stat, shuffle_loot, split_deck};

/// Contract violations of the match state machine.
///
/// These are never expected during a healthy match; callers treat them as a
/// fatal desync for the current match.
#[derive(Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum MatchError {
    #[error("match hasn't been dealt")]
    NotDealt,
    #[error("match was already dealt")]
    AlreadyDealt,
    #[error("match is over")]
    MatchOver,
    #[error("can't deal an empty hand")]
    EmptyHand,
    #[error("no face-up card to play")]
    NoSelfCard,
    #[error("opponent card already revealed")]
    AlreadyRevealed,
    #[error("opponent card hasn't been revealed")]
    NotRevealed,
    #[error("round was already compared")]
    AlreadyCompared,
    #[error("round hasn't been compared")]
    NotCompared,
    #[error("invalid deck: {0}")]
    InvalidDeck(String),
}

impl From<DeckError> for MatchError {
    fn from(value: DeckError) -> Self {
        Self::InvalidDeck(value.to_string())
    }
}

/// Lifecycle of a match as seen by one client.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum MatchStatus {
    AwaitingDeal,
    InProgress,
    RoundResolving,
    Terminal,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AwaitingDeal => "awaiting deal",
            Self::InProgress => "in progress",
            Self::RoundResolving => "resolving round",
            Self::Terminal => "over",
        };
        write!(f, "{repr}")
    }
}

/// Why a match reached [`MatchStatus::Terminal`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum EndReason {
    /// A side ran out of cards.
    Bankruptcy,
    /// The peer reported its own bankruptcy.
    Concession,
    /// The peer's connection closed mid-match.
    Disconnect,
    /// The peers' views diverged and the match was abandoned.
    Desync,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Bankruptcy => "bankruptcy",
            Self::Concession => "opponent conceded",
            Self::Disconnect => "opponent disconnected",
            Self::Desync => "match desynchronized",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchEnding {
    /// `None` when the match was abandoned without a winner.
    pub winner: Option<Side>,
    pub reason: EndReason,
}

/// Everything needed to start a round: the lead's stat, the opponent's
/// face-up card and which side led.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundTrigger {
    pub stat: Stat,
    pub opponent_card: Card,
    pub initiator: Side,
}

/// The comparison half of a round, produced by [`MatchState::compare`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundReport {
    pub round: u32,
    pub stat: Stat,
    pub self_card: Card,
    pub opponent_card: Card,
    pub outcome: RoundOutcome,
}

impl RoundReport {
    #[must_use]
    pub fn self_score(&self) -> Score {
        self.self_card.score(self.stat)
    }

    #[must_use]
    pub fn opponent_score(&self) -> Score {
        self.opponent_card.score(self.stat)
    }

    /// `(winner, loser)` cards, or `None` on a draw.
    #[must_use]
    pub fn winner_and_loser(&self) -> Option<(&Card, &Card)> {
        match self.outcome {
            RoundOutcome::Won(Side::Me) => Some((&self.self_card, &self.opponent_card)),
            RoundOutcome::Won(Side::Opponent) => Some((&self.opponent_card, &self.self_card)),
            RoundOutcome::Draw => None,
        }
    }
}

/// The deck-flow half of a round, produced by [`MatchState::advance`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundSettlement {
    pub outcome: RoundOutcome,
    /// Two played cards plus the previous pot.
    pub loot_size: usize,
    /// Loot that now belongs to the opponent's deck, already reordered.
    /// Empty unless the opponent won the round.
    pub opponent_loot: Vec<Card>,
    pub ending: Option<MatchEnding>,
}

#[derive(Clone, Copy, Debug)]
struct PendingRound {
    stat: Stat,
    outcome: RoundOutcome,
}

/// Serializable snapshot of a [`MatchState`] for UIs.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchView {
    pub status: MatchStatus,
    pub turn: Side,
    pub round: u32,
    pub self_card: Option<Card>,
    pub opponent_card: Option<Card>,
    pub self_deck_size: usize,
    pub opponent_deck_count: usize,
    pub pot_size: usize,
    pub last_outcome: Option<RoundOutcome>,
    pub ending: Option<MatchEnding>,
}

/// Canonical per-client view of a match.
#[derive(Debug)]
pub struct MatchState {
    status: MatchStatus,
    turn: Side,
    self_card: Option<Card>,
    opponent_card: Option<Card>,
    self_deck: Deck,
    /// Size of the opponent's draw deck, not counting its face-up card.
    opponent_deck_count: usize,
    /// Cards held back by drawn rounds.
    pot: Vec<Card>,
    last_outcome: Option<RoundOutcome>,
    pending: Option<PendingRound>,
    round: u32,
    dealt_total: usize,
    ending: Option<MatchEnding>,
    rng: StdRng,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchState {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// A state whose loot reordering is reproducible.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            status: MatchStatus::AwaitingDeal,
            turn: Side::Me,
            self_card: None,
            opponent_card: None,
            self_deck: Deck::new(),
            opponent_deck_count: 0,
            pot: Vec::new(),
            last_outcome: None,
            pending: None,
            round: 0,
            dealt_total: 0,
            ending: None,
            rng,
        }
    }

    /// Deal `hand` to this client and record the opponent's hand size.
    ///
    /// The first card of `hand` becomes the face-up card.
    pub fn deal(
        &mut self,
        hand: Vec<Card>,
        opponent_hand_size: usize,
        turn: Side,
    ) -> Result<(), MatchError> {
        if self.status != MatchStatus::AwaitingDeal {
            return Err(MatchError::AlreadyDealt);
        }
        if hand.len() < MIN_HAND_SIZE || opponent_hand_size < MIN_HAND_SIZE {
            return Err(MatchError::EmptyHand);
        }
        let hand_size = hand.len();
        let mut deck = Deck::from(hand);
        self.self_card = deck.draw();
        self.self_deck = deck;
        self.opponent_card = None;
        self.opponent_deck_count = opponent_hand_size - 1;
        self.pot.clear();
        self.turn = turn;
        self.last_outcome = None;
        self.pending = None;
        self.round = 0;
        self.ending = None;
        self.dealt_total = hand_size + opponent_hand_size;
        self.status = MatchStatus::InProgress;
        info!(
            "dealt {hand_size} cards vs {opponent_hand_size}, {turn} lead{}",
            if turn == Side::Me { "" } else { "s" }
        );
        Ok(())
    }

    /// Split a freshly generated deck, deal the first half to this client and
    /// hand back the second half for the opponent.
    pub fn deal_split(&mut self, full: Vec<Card>, turn: Side) -> Result<Vec<Card>, MatchError> {
        if self.status != MatchStatus::AwaitingDeal {
            return Err(MatchError::AlreadyDealt);
        }
        let (mine, theirs) = split_deck(full)?;
        self.deal(mine, theirs.len(), turn)?;
        Ok(theirs)
    }

    /// Reveal phase: the opponent's face-up card becomes known.
    pub fn reveal(&mut self, opponent_card: Card) -> Result<(), MatchError> {
        match self.status {
            MatchStatus::AwaitingDeal => return Err(MatchError::NotDealt),
            MatchStatus::Terminal => return Err(MatchError::MatchOver),
            MatchStatus::RoundResolving => return Err(MatchError::AlreadyRevealed),
            MatchStatus::InProgress => {}
        }
        if self.self_card.is_none() {
            return Err(MatchError::NoSelfCard);
        }
        debug!("revealed opponent card {opponent_card}");
        self.opponent_card = Some(opponent_card);
        self.pending = None;
        self.status = MatchStatus::RoundResolving;
        Ok(())
    }

    /// Decide the revealed round on `stat`. No cards move yet.
    pub fn compare(&mut self, stat: Stat) -> Result<RoundReport, MatchError> {
        self.expect_resolving()?;
        if self.pending.is_some() {
            return Err(MatchError::AlreadyCompared);
        }
        let self_card = self.self_card.as_ref().ok_or(MatchError::NoSelfCard)?;
        let opponent_card = self.opponent_card.as_ref().ok_or(MatchError::NotRevealed)?;
        let outcome = RoundOutcome::compare(stat, self_card, opponent_card);
        self.round += 1;
        let report = RoundReport {
            round: self.round,
            stat,
            self_card: self_card.clone(),
            opponent_card: opponent_card.clone(),
            outcome,
        };
        debug!(
            "round {}: {stat} {}({}) vs {}({}) -> {outcome}",
            report.round,
            report.self_card,
            report.self_score(),
            report.opponent_card,
            report.opponent_score()
        );
        self.pending = Some(PendingRound { stat, outcome });
        self.last_outcome = Some(outcome);
        Ok(report)
    }

    /// Move the round's loot, check bankruptcy and start the next round.
    pub fn advance(&mut self) -> Result<RoundSettlement, MatchError> {
        self.expect_resolving()?;
        let PendingRound { stat, outcome } = self.pending.take().ok_or(MatchError::NotCompared)?;
        let self_card = self.self_card.take().ok_or(MatchError::NoSelfCard)?;
        let opponent_card = self.opponent_card.take().ok_or(MatchError::NotRevealed)?;

        let mut loot = Vec::with_capacity(2 + self.pot.len());
        loot.push(self_card);
        loot.push(opponent_card);
        loot.append(&mut self.pot);
        shuffle_loot(&mut loot, &mut self.rng);
        let loot_size = loot.len();

        let mut opponent_loot = Vec::new();
        match outcome {
            RoundOutcome::Won(Side::Me) => self.self_deck.append(loot),
            RoundOutcome::Won(Side::Opponent) => {
                self.opponent_deck_count += loot_size;
                opponent_loot = loot;
            }
            RoundOutcome::Draw => self.pot = loot,
        }

        // Both face-up cards were just spent, so an empty deck means nothing
        // is left to play.
        let ending = if self.self_deck.is_empty() {
            Some(self.end(Some(Side::Opponent), EndReason::Bankruptcy))
        } else if self.opponent_deck_count == 0 {
            Some(self.end(Some(Side::Me), EndReason::Bankruptcy))
        } else {
            self.self_card = self.self_deck.draw();
            self.opponent_deck_count -= 1;
            if let Some(winner) = outcome.winner() {
                self.turn = winner;
            }
            self.status = MatchStatus::InProgress;
            None
        };

        debug!(
            "settled {stat} round with {loot_size} cards, deck {} vs {}, pot {}",
            self.self_deck.len(),
            self.opponent_deck_count,
            self.pot.len()
        );

        Ok(RoundSettlement {
            outcome,
            loot_size,
            opponent_loot,
            ending,
        })
    }

    /// Reveal, compare and advance in one step.
    pub fn reveal_and_resolve(
        &mut self,
        stat: Stat,
        opponent_card: Card,
    ) -> Result<(RoundReport, RoundSettlement), MatchError> {
        self.reveal(opponent_card)?;
        let report = self.compare(stat)?;
        let settlement = self.advance()?;
        Ok((report, settlement))
    }

    /// End the match for a reason outside of round resolution.
    ///
    /// Returns `false` if the match had already ended.
    pub fn conclude(&mut self, winner: Option<Side>, reason: EndReason) -> bool {
        if self.status == MatchStatus::Terminal {
            return false;
        }
        self.end(winner, reason);
        true
    }

    /// Throw the match away and wait for a new deal.
    pub fn reset(&mut self) {
        *self = Self::with_rng(self.rng.clone());
    }

    /// Adopt the opponent's deck count as reported over the wire.
    ///
    /// Returns `true` if the locally derived count disagreed.
    pub fn sync_opponent_count(&mut self, reported: usize) -> bool {
        if !self.is_live() || reported == self.opponent_deck_count {
            return false;
        }
        warn!(
            "opponent deck count drifted: derived {}, reported {reported}",
            self.opponent_deck_count
        );
        self.opponent_deck_count = reported;
        true
    }

    fn end(&mut self, winner: Option<Side>, reason: EndReason) -> MatchEnding {
        let ending = MatchEnding { winner, reason };
        info!(
            "match over ({reason}), winner: {}",
            winner.map_or_else(|| "none".to_string(), |side| side.to_string())
        );
        self.pending = None;
        self.ending = Some(ending);
        self.status = MatchStatus::Terminal;
        ending
    }

    fn expect_resolving(&self) -> Result<(), MatchError> {
        match self.status {
            MatchStatus::RoundResolving => Ok(()),
            MatchStatus::AwaitingDeal => Err(MatchError::NotDealt),
            MatchStatus::InProgress => Err(MatchError::NotRevealed),
            MatchStatus::Terminal => Err(MatchError::MatchOver),
        }
    }

    /// Whether a match is being played (dealt and not over).
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(
            self.status,
            MatchStatus::InProgress | MatchStatus::RoundResolving
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status == MatchStatus::Terminal
    }

    /// Whether the local player may pick a stat right now.
    #[must_use]
    pub fn awaits_my_move(&self) -> bool {
        self.status == MatchStatus::InProgress && self.turn == Side::Me && self.self_card.is_some()
    }

    #[must_use]
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    #[must_use]
    pub fn turn(&self) -> Side {
        self.turn
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn self_card(&self) -> Option<&Card> {
        self.self_card.as_ref()
    }

    #[must_use]
    pub fn opponent_card(&self) -> Option<&Card> {
        self.opponent_card.as_ref()
    }

    #[must_use]
    pub fn self_deck(&self) -> &Deck {
        &self.self_deck
    }

    #[must_use]
    pub fn opponent_deck_count(&self) -> usize {
        self.opponent_deck_count
    }

    #[must_use]
    pub fn pot(&self) -> &[Card] {
        &self.pot
    }

    #[must_use]
    pub fn last_outcome(&self) -> Option<RoundOutcome> {
        self.last_outcome
    }

    #[must_use]
    pub fn ending(&self) -> Option<MatchEnding> {
        self.ending
    }

    #[must_use]
    pub fn dealt_total(&self) -> usize {
        self.dealt_total
    }

    /// Cards this client still owns: draw deck plus face-up card.
    #[must_use]
    pub fn self_remaining(&self) -> usize {
        self.self_deck.len() + usize::from(self.self_card.is_some())
    }

    /// Cards the opponent still owns, counting its face-up card while the
    /// match is live.
    #[must_use]
    pub fn opponent_remaining(&self) -> usize {
        self.opponent_deck_count + usize::from(self.is_live())
    }

    /// Every card accounted for by this view. Equal to [`Self::dealt_total`]
    /// for as long as the match is live.
    #[must_use]
    pub fn cards_in_play(&self) -> usize {
        self.self_remaining() + self.opponent_remaining() + self.pot.len()
    }

    #[must_use]
    pub fn view(&self) -> MatchView {
        MatchView {
            status: self.status,
            turn: self.turn,
            round: self.round,
            self_card: self.self_card.clone(),
            opponent_card: self.opponent_card.clone(),
            self_deck_size: self.self_deck.len(),
            opponent_deck_count: self.opponent_deck_count,
            pot_size: self.pot.len(),
            last_outcome: self.last_outcome,
            ending: self.ending,
        }
    }
}
