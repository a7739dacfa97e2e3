//! Cancellable scheduling of round phases.

use log::warn;
use std::future;
use tokio::time::{Duration, Instant, sleep_until};

use crate::game::entities::{Side, Stat};

/// A deferred step of the round pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PhaseStep {
    /// The computer opponent has finished thinking and leads.
    OpponentLead,
    /// The reveal dwell is over; compare the round.
    Resolve { stat: Stat, initiator: Side },
    /// The result has been shown; move cards and start the next round.
    Advance,
}

/// Holds at most one pending [`PhaseStep`].
#[derive(Debug, Default)]
pub struct PhaseScheduler {
    pending: Option<(Instant, PhaseStep)>,
}

impl PhaseScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay: Duration, step: PhaseStep) {
        if let Some((_, replaced)) = self.pending.replace((Instant::now() + delay, step)) {
            warn!("{step:?} replaced pending {replaced:?}");
        }
    }

    /// Drop the pending step, if any.
    pub fn cancel(&mut self) -> Option<PhaseStep> {
        self.pending.take().map(|(_, step)| step)
    }

    #[must_use]
    pub fn pending(&self) -> Option<PhaseStep> {
        self.pending.map(|(_, step)| step)
    }

    /// Wait for the pending step to come due. Never resolves while nothing is
    /// scheduled. Cancel safe: dropping the future keeps the step pending.
    pub async fn due(&mut self) -> PhaseStep {
        let Some((deadline, _)) = self.pending else {
            return future::pending().await;
        };
        sleep_until(deadline).await;
        match self.pending.take() {
            Some((_, step)) => step,
            None => future::pending().await,
        }
    }
}
