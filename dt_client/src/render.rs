//! Plain-text rendering of session events.

use dev_trumps::{
    Card, EndReason, MatchEnding, MatchStatus, MatchView, SessionEvent, Side, Stat,
    session::{LogEntry, MatchMode},
};
use std::fmt::Write;

/// Session log kept by the client, plus the lines to print for each event.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<LogEntry>,
    view: Option<MatchView>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every log entry seen so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Latest match snapshot.
    #[must_use]
    pub fn view(&self) -> Option<&MatchView> {
        self.view.as_ref()
    }

    /// Record `event` and return what to print for it.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<String> {
        match event {
            SessionEvent::Hosting { peer_id } => vec![format!(
                "Hosting. Share your peer id: {peer_id}\nWaiting for an opponent..."
            )],
            SessionEvent::Connecting(peer) => vec![format!("Connecting to {peer}...")],
            SessionEvent::Connected { peer, .. } => vec![format!("Connected to {peer}.")],
            SessionEvent::Loading { deck } => vec![format!("Shuffling the {deck} deck...")],
            SessionEvent::MatchStarted { deck, mode, .. } => {
                let against = match mode {
                    MatchMode::Solo => "the computer",
                    MatchMode::Duel(_) => "your opponent",
                };
                vec![format!("Match on! {deck} deck, against {against}.")]
            }
            SessionEvent::StateChanged(view) => {
                let lines = self.describe_change(&view);
                self.view = Some(view);
                lines
            }
            SessionEvent::AwaitingReveal { stat } => {
                vec![format!("You picked {stat}. Waiting for your opponent's card...")]
            }
            SessionEvent::Revealed {
                stat,
                opponent_card,
                initiator,
            } => {
                let mut lines = Vec::new();
                if initiator == Side::Opponent {
                    lines.push(format!("Your opponent picked {stat}."));
                }
                lines.push(format!("They play: {}", card_line(&opponent_card, Some(stat))));
                lines
            }
            SessionEvent::Logged(entry) => {
                let line = match &entry {
                    LogEntry::Round(round) => match &round.commentary {
                        Some(commentary) => format!("{round}\n  {commentary}"),
                        None => round.to_string(),
                    },
                    LogEntry::System { message, .. } => format!("* {message}"),
                };
                self.entries.push(entry);
                vec![line]
            }
            SessionEvent::MatchOver(ending) => vec![ending_line(ending)],
            SessionEvent::Notice {
                message,
                persistent,
            } => {
                let marker = if persistent { "!!" } else { "!" };
                vec![format!("{marker} {message}")]
            }
            SessionEvent::NoticeCleared => Vec::new(),
            SessionEvent::Lobby => {
                self.view = None;
                vec!["Back in the lobby. Type 'help' for commands.".to_string()]
            }
            SessionEvent::Closed => vec!["Goodbye.".to_string()],
        }
    }

    fn describe_change(&self, view: &MatchView) -> Vec<String> {
        let mut lines = Vec::new();
        let previous = self.view.as_ref();
        if view.status != MatchStatus::InProgress {
            return lines;
        }
        // Only announce the start of a round once
        if previous.is_some_and(|p| p.status == MatchStatus::InProgress && p.round == view.round) {
            return lines;
        }
        lines.push(format!(
            "You hold {} cards, your opponent {}{}.",
            view.self_deck_size + usize::from(view.self_card.is_some()),
            view.opponent_deck_count + 1,
            if view.pot_size > 0 {
                format!(", {} in the pot", view.pot_size)
            } else {
                String::new()
            }
        ));
        if let Some(card) = &view.self_card {
            lines.push(format!("Your card: {}", card_line(card, None)));
        }
        lines.push(match view.turn {
            Side::Me => "Your turn. Pick a stat.".to_string(),
            Side::Opponent => "Your opponent is picking...".to_string(),
        });
        lines
    }
}

/// One-line card summary, highlighting `stat` when given.
#[must_use]
pub fn card_line(card: &Card, stat: Option<Stat>) -> String {
    let mut line = card.login.clone();
    if card.name != card.login {
        let _ = write!(line, " ({})", card.name);
    }
    for (i, candidate) in Stat::ALL.into_iter().enumerate() {
        let separator = if i == 0 { " | " } else { ", " };
        let score = card.score(candidate);
        if Some(candidate) == stat {
            let _ = write!(line, "{separator}[{} {score}]", candidate.token());
        } else {
            let _ = write!(line, "{separator}{} {score}", candidate.token());
        }
    }
    line
}

#[must_use]
pub fn ending_line(ending: MatchEnding) -> String {
    let verdict = match ending.winner {
        Some(Side::Me) => "You win!",
        Some(Side::Opponent) => "You lose.",
        None => "No contest.",
    };
    let why = match (ending.reason, ending.winner) {
        (EndReason::Bankruptcy, Some(Side::Me)) => "your opponent is out of cards".to_string(),
        (EndReason::Bankruptcy, _) => "you are out of cards".to_string(),
        (reason, _) => reason.to_string(),
    };
    format!("{verdict} ({why}) Type 'restart' or 'leave'.")
}
