//! Deck generation.
//!
//! [`DeckGenerator`] is the collaborator a session awaits before dealing. The
//! built-in [`RosterDeckGenerator`] works offline from fixed profile pools and
//! tops short pools up with simulated `dev_bot_<n>` profiles.

use async_trait::async_trait;
use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::ops::RangeInclusive;

use super::constants::{MAX_SCORE, STAT_COUNT};
use super::entities::{Card, DeckError, DeckSelection, Score, Stat};

/// Produces the full deck for a match.
#[async_trait]
pub trait DeckGenerator: Send + Sync {
    /// Generate `2 * hand_size` distinct cards for `selection`.
    async fn generate_deck(
        &self,
        hand_size: usize,
        selection: DeckSelection,
    ) -> Result<Vec<Card>, DeckError>;
}

const STANDARD_POOL: &[&str] = &[
    "torvalds", "gaearon", "yyx990803", "sindresorhus", "tj", "addyosmani",
    "paulirish", "mattn", "mojombo", "defunkt", "pjhyett", "wycats",
    "ezmobius", "ivey", "evanphx", "vanpelt", "wayneeseguin", "brynary",
    "kevinclark", "technoweenie", "macournoyer", "takeo", "caged", "topfunky",
    "anotherjesse", "roland", "lukas", "fanvsfan", "tomtt", "railsjitsu",
];

const LEGENDS_POOL: &[&str] = &[
    "mojombo", "defunkt", "pjhyett", "wycats", "ezmobius", "ivey", "evanphx",
    "vanpelt", "wayneeseguin", "brynary", "kevinclark", "technoweenie",
    "macournoyer", "takeo", "caged", "topfunky", "anotherjesse", "roland",
];

const FRONTEND_POOL: &[&str] = &[
    "gaearon", "yyx990803", "sindresorhus", "addyosmani", "paulirish", "tj",
    "developit", "rich-harris", "kentcdodds", "sebmarkbage", "acdlite",
    "wesbos", "jaffathecake", "feross",
];

const SYSTEMS_POOL: &[&str] = &[
    "torvalds", "mattn", "gregkh", "antirez", "bradfitz", "rsc", "robpike",
    "fabpot", "brson", "graydon", "alexcrichton", "jart",
];

impl DeckSelection {
    /// Profile logins this selection draws from.
    #[must_use]
    pub fn pool(self) -> &'static [&'static str] {
        match self {
            Self::Standard => STANDARD_POOL,
            Self::Legends => LEGENDS_POOL,
            Self::Frontend => FRONTEND_POOL,
            Self::Systems => SYSTEMS_POOL,
        }
    }

    /// Score range each stat is drawn from, so themed decks feel different.
    fn score_range(self, stat: Stat) -> RangeInclusive<Score> {
        match (self, stat) {
            (Self::Legends, Stat::Seniority) => 60..=MAX_SCORE,
            (Self::Frontend, Stat::Followers | Stat::Influence) => 40..=MAX_SCORE,
            (Self::Systems, Stat::TechBreadth | Stat::Activity) => 40..=MAX_SCORE,
            _ => 0..=MAX_SCORE,
        }
    }
}

/// Offline deck generator backed by fixed profile pools.
#[derive(Debug, Default)]
pub struct RosterDeckGenerator {
    seed: Option<u64>,
}

impl RosterDeckGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose decks are reproducible.
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng(&self) -> StdRng {
        self.seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
    }

    /// Synchronous core of [`DeckGenerator::generate_deck`].
    pub fn build(&self, hand_size: usize, selection: DeckSelection) -> Result<Vec<Card>, DeckError> {
        if hand_size == 0 {
            return Err(DeckError::TooShort(0));
        }
        let total = 2 * hand_size;
        let mut rng = self.rng();
        let mut logins = selection.pool().to_vec();
        logins.shuffle(&mut rng);
        logins.truncate(total);

        let mut deck = Vec::with_capacity(total);
        for login in logins {
            let scores = random_scores(selection, &mut rng);
            let card = Card::new(login, scores)
                .map_err(|error| DeckError::Generation(error.to_string()))?
                .with_profile(login, &format!("https://github.com/{login}.png"), "");
            deck.push(card);
        }
        while deck.len() < total {
            deck.push(mock_card(deck.len(), selection, &mut rng)?);
        }

        debug!("generated {selection} deck of {} cards", deck.len());
        Ok(deck)
    }
}

#[async_trait]
impl DeckGenerator for RosterDeckGenerator {
    async fn generate_deck(
        &self,
        hand_size: usize,
        selection: DeckSelection,
    ) -> Result<Vec<Card>, DeckError> {
        self.build(hand_size, selection)
    }
}

fn random_scores<R: Rng + ?Sized>(selection: DeckSelection, rng: &mut R) -> [Score; STAT_COUNT] {
    let mut scores = [0; STAT_COUNT];
    for stat in Stat::ALL {
        scores[stat.index()] = rng.random_range(selection.score_range(stat));
    }
    scores
}

fn mock_card<R: Rng + ?Sized>(
    index: usize,
    selection: DeckSelection,
    rng: &mut R,
) -> Result<Card, DeckError> {
    let login = format!("dev_bot_{index}");
    let card = Card::new(&login, random_scores(selection, rng))
        .map_err(|error| DeckError::Generation(error.to_string()))?;
    Ok(card.with_profile(
        &format!("Bot Developer {index}"),
        &format!("https://picsum.photos/seed/{index}/200"),
        "A simulated developer for when no real profile is available.",
    ))
}

/// Hands out the same prepared deck every time. Useful for scripted matches.
#[derive(Clone, Debug)]
pub struct FixedDeckGenerator {
    deck: Vec<Card>,
}

impl FixedDeckGenerator {
    #[must_use]
    pub fn new(deck: Vec<Card>) -> Self {
        Self { deck }
    }
}

#[async_trait]
impl DeckGenerator for FixedDeckGenerator {
    async fn generate_deck(
        &self,
        _hand_size: usize,
        _selection: DeckSelection,
    ) -> Result<Vec<Card>, DeckError> {
        Ok(self.deck.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::split_deck;
    use std::collections::HashSet;

    #[test]
    fn test_build_returns_two_hands() {
        let deck = RosterDeckGenerator::with_seed(1)
            .build(8, DeckSelection::Standard)
            .unwrap();
        assert_eq!(deck.len(), 16);
        let (a, b) = split_deck(deck).unwrap();
        assert_eq!((a.len(), b.len()), (8, 8));
    }

    #[test]
    fn test_build_fills_with_mock_profiles() {
        let pool = DeckSelection::Systems.pool().len();
        let deck = RosterDeckGenerator::with_seed(2)
            .build(pool, DeckSelection::Systems)
            .unwrap();
        assert_eq!(deck.len(), 2 * pool);
        assert!(deck.iter().any(|card| card.login.starts_with("dev_bot_")));
        let logins: HashSet<&str> = deck.iter().map(|card| card.login.as_str()).collect();
        assert_eq!(logins.len(), deck.len());
    }

    #[test]
    fn test_build_scores_in_range() {
        let deck = RosterDeckGenerator::with_seed(3)
            .build(6, DeckSelection::Legends)
            .unwrap();
        for card in &deck {
            for (stat, score) in card.stats.iter() {
                assert!(score <= MAX_SCORE);
                if stat == Stat::Seniority {
                    assert!(score >= 60);
                }
            }
        }
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let first = RosterDeckGenerator::with_seed(4).build(5, DeckSelection::Frontend);
        let second = RosterDeckGenerator::with_seed(4).build(5, DeckSelection::Frontend);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_hand_size_fails() {
        assert_eq!(
            RosterDeckGenerator::new().build(0, DeckSelection::Standard),
            Err(DeckError::TooShort(0))
        );
    }

    #[tokio::test]
    async fn test_fixed_generator_returns_deck() {
        let deck = vec![Card::new("a", [1; STAT_COUNT]).unwrap()];
        let generator = FixedDeckGenerator::new(deck.clone());
        let generated = generator.generate_deck(8, DeckSelection::Standard).await;
        assert_eq!(generated, Ok(deck));
    }
}
