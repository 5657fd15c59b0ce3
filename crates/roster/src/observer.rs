use crate::outcome::Outcome;
use std::time::Duration;

/// Progress callbacks for a batch run.
///
/// The engine reports through this seam instead of printing; presentation
/// lives entirely with the implementor. Callbacks fire from worker tasks,
/// so implementations must be cheap and non-blocking.
pub trait BatchObserver: Send + Sync {
    /// An account's slot started: it passed admission and is about to
    /// sign in. `index` is the account's position in the input roster.
    fn on_account_started(&self, _index: usize, _total: usize, _identifier: &str) {}

    /// An account finished, with its final outcome recorded.
    fn on_account_finished(&self, _index: usize, _total: usize, _outcome: &Outcome) {}

    /// One tick of the countdown between sequential accounts.
    fn on_countdown_tick(&self, _remaining: Duration) {}

    /// Admission stopped early; no further accounts will start.
    fn on_cancelled(&self) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}
