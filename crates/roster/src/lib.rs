// Batch engine for account maintenance runs.
//
// `orchestrator` schedules the roster, `retry` guards the sign-in phase,
// `outcome`/`summary` carry the results out, and `observer` is the
// progress seam for front-ends. `rotation` cycles parameter pools that
// are smaller than the roster.

pub mod observer;
pub mod orchestrator;
pub mod outcome;
pub mod retry;
pub mod rotation;
pub mod summary;

pub use observer::{BatchObserver, NoopObserver};
pub use orchestrator::{BatchConfig, BatchRunner};
pub use outcome::{FailureKind, Outcome, OutcomeDetail};
pub use retry::{RetryAction, RetryError, RetryPolicy, retry_with_backoff};
pub use rotation::Rotation;
pub use summary::{Summary, aggregate};
