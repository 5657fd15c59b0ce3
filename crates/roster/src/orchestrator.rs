// Batch scheduling over a roster of credentials.
//
// Two modes share the same per-account pipeline (sign in with retry,
// settle, act once, sign out): a strictly ordered sequential walk with a
// countdown between accounts, and a semaphore-gated concurrent mode for
// rosters where ordering matters less than wall time.

use std::sync::Arc;
use std::time::Duration;

use account_client::{AccountBackend, ActionRequest, Credential};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::observer::{BatchObserver, NoopObserver};
use crate::outcome::{FailureKind, Outcome};
use crate::retry::{RetryAction, RetryError, RetryPolicy, retry_with_backoff};

/// Knobs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Parallel session budget. `1` (the default) processes the roster
    /// strictly in input order.
    pub concurrency: usize,
    /// Pause between accounts in sequential runs. Skipped after the last.
    pub inter_account_delay: Duration,
    /// Pause between a successful sign-in and the action, giving the
    /// service time to settle the fresh session.
    pub post_login_delay: Duration,
    /// Retry budget for sign-in. Actions are never retried: they are not
    /// idempotent, and a retried gift is a double send.
    pub login_retry: RetryPolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            inter_account_delay: Duration::from_secs(5),
            post_login_delay: Duration::from_secs(2),
            login_retry: RetryPolicy::default(),
        }
    }
}

/// Drives one action across a roster of accounts.
pub struct BatchRunner {
    backend: Arc<dyn AccountBackend>,
    config: BatchConfig,
    observer: Arc<dyn BatchObserver>,
}

impl BatchRunner {
    pub fn new(backend: Arc<dyn AccountBackend>, config: BatchConfig) -> Self {
        Self {
            backend,
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Process the roster, producing one [`Outcome`] per account that was
    /// admitted. `request_for` supplies the action for each slot, keyed by
    /// the account's input position.
    ///
    /// Outcomes come back in input order in both modes. Cancelling the
    /// token stops admitting new accounts immediately; accounts already
    /// past admission finish (or fail) and keep their outcomes, while the
    /// rest produce none.
    pub async fn run<F>(
        &self,
        credentials: Vec<Credential>,
        request_for: F,
        token: CancellationToken,
    ) -> Vec<Outcome>
    where
        F: Fn(usize, &Credential) -> ActionRequest + Send + Sync + 'static,
    {
        info!(
            total = credentials.len(),
            concurrency = self.config.concurrency.max(1),
            "starting batch run"
        );
        if self.config.concurrency <= 1 {
            self.run_sequential(credentials, &request_for, &token).await
        } else {
            self.run_concurrent(credentials, request_for, token).await
        }
    }

    async fn run_sequential<F>(
        &self,
        credentials: Vec<Credential>,
        request_for: &F,
        token: &CancellationToken,
    ) -> Vec<Outcome>
    where
        F: Fn(usize, &Credential) -> ActionRequest,
    {
        let total = credentials.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, credential) in credentials.into_iter().enumerate() {
            if token.is_cancelled() {
                self.observer.on_cancelled();
                break;
            }

            self.observer
                .on_account_started(index, total, &credential.identifier);
            let request = request_for(index, &credential);
            let outcome = self.spawn_account(credential, request, token.clone()).await;
            self.observer.on_account_finished(index, total, &outcome);
            outcomes.push(outcome);

            let more_to_come = index + 1 < total;
            if more_to_come
                && !self.config.inter_account_delay.is_zero()
                && !countdown(self.config.inter_account_delay, token, self.observer.as_ref()).await
            {
                self.observer.on_cancelled();
                break;
            }
        }
        outcomes
    }

    async fn run_concurrent<F>(
        &self,
        credentials: Vec<Credential>,
        request_for: F,
        token: CancellationToken,
    ) -> Vec<Outcome>
    where
        F: Fn(usize, &Credential) -> ActionRequest + Send + Sync + 'static,
    {
        let total = credentials.len();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let request_for = Arc::new(request_for);
        let mut handles: Vec<(usize, String, JoinHandle<Outcome>)> = Vec::with_capacity(total);

        for (index, credential) in credentials.into_iter().enumerate() {
            // The permit is taken before spawning, so cancellation stops
            // admission while in-flight accounts keep their permits. The
            // select is biased: a cancelled token wins over a free permit.
            let permit = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    self.observer.on_cancelled();
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let backend = Arc::clone(&self.backend);
            let observer = Arc::clone(&self.observer);
            let request_for = Arc::clone(&request_for);
            let policy = self.config.login_retry.clone();
            let post_login_delay = self.config.post_login_delay;
            let task_token = token.clone();
            let identifier = credential.identifier.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                observer.on_account_started(index, total, &credential.identifier);
                let request = request_for(index, &credential);
                let outcome = process_account(
                    backend.as_ref(),
                    &policy,
                    post_login_delay,
                    &credential,
                    &request,
                    &task_token,
                )
                .await;
                observer.on_account_finished(index, total, &outcome);
                outcome
            });
            handles.push((index, identifier, handle));
        }

        let mut indexed = Vec::with_capacity(handles.len());
        for (index, identifier, handle) in handles {
            indexed.push((index, settle_account(identifier, handle).await));
        }
        // Spawn completion order is arbitrary; reports read better in
        // roster order.
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }

    /// Run one account in its own task and wait for it. Sequential mode
    /// goes through here so a panicking backend is contained the same way
    /// the concurrent join contains it.
    async fn spawn_account(
        &self,
        credential: Credential,
        request: ActionRequest,
        token: CancellationToken,
    ) -> Outcome {
        let backend = Arc::clone(&self.backend);
        let policy = self.config.login_retry.clone();
        let post_login_delay = self.config.post_login_delay;
        let identifier = credential.identifier.clone();

        let handle = tokio::spawn(async move {
            process_account(
                backend.as_ref(),
                &policy,
                post_login_delay,
                &credential,
                &request,
                &token,
            )
            .await
        });
        settle_account(identifier, handle).await
    }
}

/// Convert a finished account task into its outcome. A panic becomes an
/// `Internal` failure for that account; it never unwinds into the batch.
async fn settle_account(identifier: String, handle: JoinHandle<Outcome>) -> Outcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(join_error) if join_error.is_cancelled() => Outcome::failed(
            identifier,
            FailureKind::Cancelled,
            "task aborted before completion",
        ),
        Err(join_error) => {
            error!(identifier = %identifier, "account task panicked: {join_error}");
            Outcome::failed(
                identifier,
                FailureKind::Internal,
                format!("account task panicked: {join_error}"),
            )
        }
    }
}

/// The per-account pipeline. Always yields exactly one outcome and always
/// releases the session, whatever the exit path.
async fn process_account(
    backend: &dyn AccountBackend,
    policy: &RetryPolicy,
    post_login_delay: Duration,
    credential: &Credential,
    request: &ActionRequest,
    token: &CancellationToken,
) -> Outcome {
    let identifier = credential.identifier.clone();

    let login = retry_with_backoff(policy, token, |_attempt| async move {
        match backend.login(credential).await {
            Ok(session) => RetryAction::Success(session),
            Err(err) if err.is_retryable() => RetryAction::Retry(err),
            Err(err) => RetryAction::Fail(err),
        }
    })
    .await;

    let mut session = match login {
        Ok(session) => session,
        Err(RetryError::Cancelled) => {
            debug!(identifier = %identifier, "cancelled during sign-in");
            return Outcome::failed(
                identifier,
                FailureKind::Cancelled,
                "cancelled before sign-in completed",
            );
        }
        Err(RetryError::Inner(err)) => {
            warn!(identifier = %identifier, error = %err, "sign-in failed");
            return Outcome::failed(identifier, FailureKind::from(&err), err.to_string());
        }
    };

    if !post_login_delay.is_zero() {
        tokio::select! {
            _ = token.cancelled() => {
                session.logout().await;
                return Outcome::failed(
                    identifier,
                    FailureKind::Cancelled,
                    "cancelled before the action ran",
                );
            }
            _ = sleep(post_login_delay) => {}
        }
    }

    // The action itself is never raced against the token: once it starts,
    // interrupting it could leave a half-applied change.
    let outcome = match session.perform(request).await {
        Ok(result) => Outcome::from_action_result(identifier.clone(), result),
        Err(err) => {
            warn!(identifier = %identifier, action = request.kind(), error = %err, "action failed");
            Outcome::failed(identifier.clone(), FailureKind::from(&err), err.to_string())
        }
    };

    session.logout().await;
    debug!(identifier = %outcome.identifier(), "account finished: {}", outcome.describe());
    outcome
}

/// Interruptible pause between sequential accounts, ticking once per
/// second for progress displays. Returns `false` when cancelled mid-wait.
async fn countdown(
    total: Duration,
    token: &CancellationToken,
    observer: &dyn BatchObserver,
) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        observer.on_countdown_tick(remaining);
        let step = remaining.min(Duration::from_secs(1));
        tokio::select! {
            _ = token.cancelled() => return false,
            _ = sleep(step) => {}
        }
        remaining = remaining.saturating_sub(step);
    }
    true
}
