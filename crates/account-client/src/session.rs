use async_trait::async_trait;

use crate::action::{ActionRequest, ActionResult};
use crate::credential::Credential;
use crate::error::{ActionError, AuthError};

/// Lifecycle of a session after a successful sign-in.
///
/// The pre-authentication states never escape `login`: a failed sign-in
/// returns an error instead of a session, so every live session starts out
/// `Authenticated`. From there:
///
/// `Authenticated -> ActionInFlight -> { Authenticated, Invalid }`
/// and any state `-> LoggedOut` via `logout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    ActionInFlight,
    /// The service revoked the session mid-run.
    Invalid,
    LoggedOut,
}

/// Opens authenticated sessions from credentials.
#[async_trait]
pub trait AccountBackend: Send + Sync {
    /// Sign one account in. A failed sign-in never yields a session and
    /// holds no server-side state worth releasing.
    async fn login(&self, credential: &Credential)
    -> Result<Box<dyn AccountSession>, AuthError>;
}

/// One authenticated connection to the service.
///
/// A session is exclusively owned by the task processing its account; it is
/// never shared. Callers must invoke `logout` on every exit path, including
/// after failed actions.
#[async_trait]
pub trait AccountSession: Send {
    /// Login name this session belongs to.
    fn identifier(&self) -> &str;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Apply one maintenance action. Only legal while `Authenticated`;
    /// anything else fails with [`ActionError::NotAuthenticated`] without
    /// touching the network.
    async fn perform(&mut self, request: &ActionRequest) -> Result<ActionResult, ActionError>;

    /// Release the session. Idempotent and infallible: release problems are
    /// logged, not propagated, so cleanup can run unconditionally.
    async fn logout(&mut self);
}
