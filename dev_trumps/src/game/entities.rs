use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashSet, VecDeque},
    fmt,
    str::FromStr,
};
use thiserror::Error;

use super::constants::{MAX_SCORE, MIN_HAND_SIZE, STAT_COUNT};

/// Placeholder for stat scores.
pub type Score = u8;

/// One of the six comparable stats printed on every card.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Stat {
    Followers,
    Repositories,
    Influence,
    Activity,
    TechBreadth,
    Seniority,
}

impl Stat {
    pub const ALL: [Stat; STAT_COUNT] = [
        Self::Followers,
        Self::Repositories,
        Self::Influence,
        Self::Activity,
        Self::TechBreadth,
        Self::Seniority,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Followers => 0,
            Self::Repositories => 1,
            Self::Influence => 2,
            Self::Activity => 3,
            Self::TechBreadth => 4,
            Self::Seniority => 5,
        }
    }

    /// Short token accepted by [`Stat::from_str`].
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Followers => "followers",
            Self::Repositories => "repos",
            Self::Influence => "influence",
            Self::Activity => "activity",
            Self::TechBreadth => "tech",
            Self::Seniority => "seniority",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Followers => "FOLLOWERS",
            Self::Repositories => "REPOSITORIES",
            Self::Influence => "INFLUENCE",
            Self::Activity => "ACTIVITY",
            Self::TechBreadth => "TECH BREADTH",
            Self::Seniority => "SENIORITY",
        };
        write!(f, "{repr}")
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown stat '{0}'")]
pub struct UnknownStat(pub String);

impl FromStr for Stat {
    type Err = UnknownStat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "followers" | "f" => Ok(Self::Followers),
            "repos" | "repositories" | "r" => Ok(Self::Repositories),
            "influence" | "i" => Ok(Self::Influence),
            "activity" | "a" => Ok(Self::Activity),
            "tech" | "techbreadth" | "tech_breadth" | "t" => Ok(Self::TechBreadth),
            "seniority" | "s" => Ok(Self::Seniority),
            _ => Err(UnknownStat(s.to_string())),
        }
    }
}

/// A card score was outside of `0..=MAX_SCORE`.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("{stat} score {value} exceeds {MAX_SCORE}")]
pub struct InvalidScore {
    pub stat: Stat,
    pub value: Score,
}

/// The six normalized scores of a card, indexed by [`Stat`].
///
/// Deserializing goes through [`StatScores::new`], so a card received from a
/// peer is held to the same range as one built locally.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "[Score; STAT_COUNT]")]
pub struct StatScores([Score; STAT_COUNT]);

impl TryFrom<[Score; STAT_COUNT]> for StatScores {
    type Error = InvalidScore;

    fn try_from(scores: [Score; STAT_COUNT]) -> Result<Self, Self::Error> {
        Self::new(scores)
    }
}

impl StatScores {
    /// Scores in [`Stat::ALL`] order.
    pub fn new(scores: [Score; STAT_COUNT]) -> Result<Self, InvalidScore> {
        for stat in Stat::ALL {
            let value = scores[stat.index()];
            if value > MAX_SCORE {
                return Err(InvalidScore { stat, value });
            }
        }
        Ok(Self(scores))
    }

    #[must_use]
    pub const fn get(&self, stat: Stat) -> Score {
        self.0[stat.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, Score)> + '_ {
        Stat::ALL.into_iter().map(|stat| (stat, self.get(stat)))
    }
}

/// A collectible card built from a developer profile.
///
/// `login` is the card's identity and is unique within a deck. The other
/// profile fields are presentational only and never affect a round.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Card {
    pub login: String,
    pub name: String,
    pub avatar_url: String,
    pub bio: String,
    pub stats: StatScores,
}

impl Card {
    pub fn new(login: &str, scores: [Score; STAT_COUNT]) -> Result<Self, InvalidScore> {
        Ok(Self {
            login: login.to_string(),
            name: login.to_string(),
            avatar_url: String::new(),
            bio: String::new(),
            stats: StatScores::new(scores)?,
        })
    }

    #[must_use]
    pub fn with_profile(mut self, name: &str, avatar_url: &str, bio: &str) -> Self {
        self.name = name.to_string();
        self.avatar_url = avatar_url.to_string();
        self.bio = bio.to_string();
        self
    }

    #[must_use]
    pub const fn score(&self, stat: Stat) -> Score {
        self.stats.get(stat)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.login)
    }
}

/// A FIFO deck: cards are drawn from the front and won cards are appended
/// to the back.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    pub fn append<I: IntoIterator<Item = Card>>(&mut self, cards: I) {
        self.cards.extend(cards);
    }

    #[must_use]
    pub fn peek(&self) -> Option<&Card> {
        self.cards.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}

impl From<Vec<Card>> for Deck {
    fn from(value: Vec<Card>) -> Self {
        Self {
            cards: VecDeque::from(value),
        }
    }
}

impl FromIterator<Card> for Deck {
    fn from_iter<T: IntoIterator<Item = Card>>(iter: T) -> Self {
        Self {
            cards: iter.into_iter().collect(),
        }
    }
}

/// A participant as seen from the local client.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Side {
    Me,
    Opponent,
}

impl Side {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Me => Self::Opponent,
            Self::Opponent => Self::Me,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Me => "you",
            Self::Opponent => "opponent",
        };
        write!(f, "{repr}")
    }
}

/// Result of comparing one stat between the two face-up cards.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum RoundOutcome {
    Won(Side),
    Draw,
}

impl RoundOutcome {
    /// Strictly greater wins; equal scores are always a draw.
    #[must_use]
    pub fn compare(stat: Stat, mine: &Card, theirs: &Card) -> Self {
        let (my_score, their_score) = (mine.score(stat), theirs.score(stat));
        if my_score > their_score {
            Self::Won(Side::Me)
        } else if their_score > my_score {
            Self::Won(Side::Opponent)
        } else {
            Self::Draw
        }
    }

    #[must_use]
    pub const fn winner(self) -> Option<Side> {
        match self {
            Self::Won(side) => Some(side),
            Self::Draw => None,
        }
    }

    /// The same outcome from the other client's point of view.
    #[must_use]
    pub const fn mirrored(self) -> Self {
        match self {
            Self::Won(side) => Self::Won(side.other()),
            Self::Draw => Self::Draw,
        }
    }
}

impl fmt::Display for RoundOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Won(Side::Me) => "WIN",
            Self::Won(Side::Opponent) => "LOSS",
            Self::Draw => "DRAW",
        };
        write!(f, "{repr}")
    }
}

/// Themed profile pool a deck is generated from.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum DeckSelection {
    #[default]
    Standard,
    Legends,
    Frontend,
    Systems,
}

impl DeckSelection {
    pub const ALL: [DeckSelection; 4] = [
        Self::Standard,
        Self::Legends,
        Self::Frontend,
        Self::Systems,
    ];

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Standard => "A balanced mix of well-known developers",
            Self::Legends => "Early GitHub pioneers with long track records",
            Self::Frontend => "Framework authors and web platform folks",
            Self::Systems => "Kernel, compiler and runtime hackers",
        }
    }
}

impl fmt::Display for DeckSelection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Standard => "standard",
            Self::Legends => "legends",
            Self::Frontend => "frontend",
            Self::Systems => "systems",
        };
        write!(f, "{repr}")
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown deck '{0}'")]
pub struct UnknownDeck(pub String);

impl FromStr for DeckSelection {
    type Err = UnknownDeck;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|selection| selection.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownDeck(s.to_string()))
    }
}

/// Errors in a generated deck that make it impossible to start a match.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum DeckError {
    #[error("deck of {0} cards can't be split into two equal hands")]
    OddLength(usize),
    #[error("deck of {0} cards is too short to deal")]
    TooShort(usize),
    #[error("card '{0}' appears more than once")]
    DuplicateCard(String),
    #[error("deck generation failed: {0}")]
    Generation(String),
}

/// Split a generated deck into two equal hands, preserving order.
///
/// The first card of each hand becomes that side's face-up card when the
/// hand is dealt.
pub fn split_deck(mut full: Vec<Card>) -> Result<(Vec<Card>, Vec<Card>), DeckError> {
    let len = full.len();
    if len < 2 * MIN_HAND_SIZE {
        return Err(DeckError::TooShort(len));
    }
    if len % 2 != 0 {
        return Err(DeckError::OddLength(len));
    }
    let duplicate = {
        let mut seen = HashSet::with_capacity(len);
        full.iter()
            .find(|card| !seen.insert(card.login.as_str()))
            .map(|card| card.login.clone())
    };
    if let Some(login) = duplicate {
        return Err(DeckError::DuplicateCard(login));
    }
    let second = full.split_off(len / 2);
    Ok((full, second))
}

/// Reorder loot uniformly (Fisher-Yates via [`SliceRandom::shuffle`]) so an
/// opponent can't predict future draws by tracking card order.
pub fn shuffle_loot<R: Rng + ?Sized>(loot: &mut [Card], rng: &mut R) {
    loot.shuffle(rng);
}
