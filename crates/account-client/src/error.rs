use reqwest::StatusCode;

/// Failure to establish an authenticated session.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The service rejected the credentials. Terminal for the account.
    #[error("credentials rejected for `{identifier}`")]
    InvalidCredentials { identifier: String },

    /// A guard code was required but could not be produced, or the one
    /// produced was refused. Terminal for the account.
    #[error("second factor unavailable: {reason}")]
    MissingSecondFactor { reason: String },

    /// Connectivity-level failure before a usable response arrived.
    #[error("network error during sign-in: {reason}")]
    TransientNetwork { reason: String },

    /// The service answered with something the client could not interpret.
    #[error("unexpected sign-in response: {reason}")]
    Protocol { reason: String },
}

impl AuthError {
    pub fn invalid_credentials(identifier: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            identifier: identifier.into(),
        }
    }

    pub fn missing_second_factor(reason: impl Into<String>) -> Self {
        Self::MissingSecondFactor {
            reason: reason.into(),
        }
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        Self::TransientNetwork {
            reason: reason.into(),
        }
    }

    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    /// Map a transport failure to the sign-in taxonomy.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        Self::TransientNetwork {
            reason: err.to_string(),
        }
    }

    /// Whether another sign-in attempt can reasonably succeed. Credential
    /// and second-factor rejections are final; network trouble and garbled
    /// responses are worth a bounded number of retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidCredentials { .. } | Self::MissingSecondFactor { .. } => false,
            Self::TransientNetwork { .. } | Self::Protocol { .. } => true,
        }
    }
}

/// Failure to apply an action on an authenticated session.
///
/// Actions are not idempotent, so callers never retry these; each one maps
/// straight to a failed outcome for the account.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The session is no longer valid: the service revoked it mid-run or
    /// logout already happened.
    #[error("session is not authenticated")]
    NotAuthenticated,

    /// The action's target does not exist (recipient, reward item).
    #[error("target not found: {reason}")]
    TargetNotFound { reason: String },

    /// The service understood the request and refused it.
    #[error("rejected by service: {reason}")]
    RemoteRejected { reason: String },

    /// The request deadline passed with the result unknown.
    #[error("timed out waiting for the service")]
    Timeout,

    /// Transport or server failure with no usable response.
    #[error("network error during action: {reason}")]
    Network { reason: String },
}

impl ActionError {
    pub fn target_not_found(reason: impl Into<String>) -> Self {
        Self::TargetNotFound {
            reason: reason.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::RemoteRejected {
            reason: reason.into(),
        }
    }

    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    /// Map a transport failure to the action taxonomy. Timeouts are kept
    /// distinct because the request may still have landed.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network {
                reason: err.to_string(),
            }
        }
    }

    /// Map a non-2xx action response to the taxonomy. 401/403 mean the
    /// session died under us; 404 is a missing target; server-side trouble
    /// is transport-level; anything else is an explicit refusal.
    pub fn from_status(status: StatusCode, body_preview: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::NotAuthenticated,
            StatusCode::NOT_FOUND => Self::TargetNotFound {
                reason: format!("HTTP 404: {body_preview}"),
            },
            s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => Self::Network {
                reason: format!("HTTP {s}: {body_preview}"),
            },
            s => Self::RemoteRejected {
                reason: format!("HTTP {s}: {body_preview}"),
            },
        }
    }
}
