//! Round commentary.
//!
//! Commentary is cosmetic. Sessions bound the wait on a provider and carry on
//! without a line when it fails.

use async_trait::async_trait;
use thiserror::Error;

use super::entities::{Card, Stat};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CommentaryError {
    #[error("commentary unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CommentaryProvider: Send + Sync {
    /// One line describing a resolved round. On a draw the two cards tie on
    /// `stat`.
    async fn commentary(
        &self,
        winner: &Card,
        loser: &Card,
        stat: Stat,
        winner_label: &str,
    ) -> Result<String, CommentaryError>;
}

const WIN_TEMPLATES: &[&str] = &[
    "crushed the competition with superior",
    "dominated this commit with better",
    "merged successfully thanks to higher",
    "outperformed the opponent with massive",
    "is the clear maintainer here with more",
];

const DRAW_TEMPLATES: &[&str] = &[
    "It's a merge conflict! Identical",
    "No changes detected. Tied on",
    "Evenly matched branches on",
];

/// Picks a canned line at random.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateCommentary;

impl TemplateCommentary {
    /// Synchronous core of [`CommentaryProvider::commentary`].
    #[must_use]
    pub fn line(winner: &Card, loser: &Card, stat: Stat, winner_label: &str) -> String {
        let stat_name = stat.to_string().to_lowercase();
        let (winning, losing) = (winner.score(stat), loser.score(stat));
        if winning == losing {
            let template = DRAW_TEMPLATES[rand::random_range(0..DRAW_TEMPLATES.len())];
            return format!("{template} {stat_name}.");
        }
        let template = WIN_TEMPLATES[rand::random_range(0..WIN_TEMPLATES.len())];
        format!(
            "{} ({winner_label}) {template} {stat_name} ({winning} vs {losing}).",
            winner.login
        )
    }
}

#[async_trait]
impl CommentaryProvider for TemplateCommentary {
    async fn commentary(
        &self,
        winner: &Card,
        loser: &Card,
        stat: Stat,
        winner_label: &str,
    ) -> Result<String, CommentaryError> {
        Ok(Self::line(winner, loser, stat, winner_label))
    }
}
