use account_client::{ActionError, ActionReceipt, ActionResult, AuthError};
use serde::Serialize;

/// Why an account failed, flattened for reports and result files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidCredentials,
    MissingSecondFactor,
    Network,
    Protocol,
    NotAuthenticated,
    TargetNotFound,
    RemoteRejected,
    Timeout,
    Cancelled,
    Internal,
}

impl From<&AuthError> for FailureKind {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials { .. } => FailureKind::InvalidCredentials,
            AuthError::MissingSecondFactor { .. } => FailureKind::MissingSecondFactor,
            AuthError::TransientNetwork { .. } => FailureKind::Network,
            AuthError::Protocol { .. } => FailureKind::Protocol,
        }
    }
}

impl From<&ActionError> for FailureKind {
    fn from(err: &ActionError) -> Self {
        match err {
            ActionError::NotAuthenticated => FailureKind::NotAuthenticated,
            ActionError::TargetNotFound { .. } => FailureKind::TargetNotFound,
            ActionError::RemoteRejected { .. } => FailureKind::RemoteRejected,
            ActionError::Timeout => FailureKind::Timeout,
            ActionError::Network { .. } => FailureKind::Network,
        }
    }
}

/// How one account ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeDetail {
    /// The service confirmed the change.
    Applied { receipt: ActionReceipt },
    /// The service accepted the change but its confirmation was unreadable.
    /// Neither a success nor a failure; aggregation keeps it separate.
    AppliedUnconfirmed { receipt: ActionReceipt },
    Failed { kind: FailureKind, message: String },
}

/// Per-account report entry. Exactly one exists for every account whose
/// processing started; accounts never admitted have none.
///
/// Construction goes through the constructors so `succeeded` always agrees
/// with the detail: only a confirmed application counts as success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    identifier: String,
    succeeded: bool,
    detail: OutcomeDetail,
}

impl Outcome {
    pub fn applied(identifier: impl Into<String>, receipt: ActionReceipt) -> Self {
        Self {
            identifier: identifier.into(),
            succeeded: true,
            detail: OutcomeDetail::Applied { receipt },
        }
    }

    pub fn applied_unconfirmed(identifier: impl Into<String>, receipt: ActionReceipt) -> Self {
        Self {
            identifier: identifier.into(),
            succeeded: false,
            detail: OutcomeDetail::AppliedUnconfirmed { receipt },
        }
    }

    pub fn failed(
        identifier: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            succeeded: false,
            detail: OutcomeDetail::Failed {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn from_action_result(identifier: impl Into<String>, result: ActionResult) -> Self {
        match result {
            ActionResult::Applied(receipt) => Self::applied(identifier, receipt),
            ActionResult::AppliedUnconfirmed(receipt) => {
                Self::applied_unconfirmed(identifier, receipt)
            }
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn detail(&self) -> &OutcomeDetail {
        &self.detail
    }

    pub fn is_unconfirmed(&self) -> bool {
        matches!(self.detail, OutcomeDetail::AppliedUnconfirmed { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.detail {
            OutcomeDetail::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// One-line rendering for logs and progress output.
    pub fn describe(&self) -> String {
        match &self.detail {
            OutcomeDetail::Applied { receipt } => describe_receipt(receipt),
            OutcomeDetail::AppliedUnconfirmed { receipt } => {
                format!("{} (unconfirmed)", describe_receipt(receipt))
            }
            OutcomeDetail::Failed { message, .. } => message.clone(),
        }
    }
}

fn describe_receipt(receipt: &ActionReceipt) -> String {
    match receipt {
        ActionReceipt::AvatarChanged { image } => format!("avatar set to {image}"),
        ActionReceipt::ProfileUpdated { fields } => {
            format!("profile updated: {}", fields.join(", "))
        }
        ActionReceipt::GiftSent { item, cost } => {
            format!("sent {item} ({cost} points)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeded_agrees_with_the_detail() {
        let receipt = ActionReceipt::AvatarChanged {
            image: "cat.png".into(),
        };
        assert!(Outcome::applied("a", receipt.clone()).succeeded());
        assert!(!Outcome::applied_unconfirmed("a", receipt.clone()).succeeded());
        assert!(!Outcome::failed("a", FailureKind::Timeout, "slow").succeeded());

        assert!(Outcome::applied_unconfirmed("a", receipt).is_unconfirmed());
        assert_eq!(
            Outcome::failed("a", FailureKind::Timeout, "slow").failure_kind(),
            Some(FailureKind::Timeout)
        );
    }

    #[test]
    fn action_results_convert_without_losing_the_confirmation_split() {
        let receipt = ActionReceipt::GiftSent {
            item: "Trophy".into(),
            cost: 500,
        };
        let confirmed =
            Outcome::from_action_result("a", ActionResult::Applied(receipt.clone()));
        assert!(confirmed.succeeded());

        let unconfirmed =
            Outcome::from_action_result("a", ActionResult::AppliedUnconfirmed(receipt));
        assert!(!unconfirmed.succeeded());
        assert!(unconfirmed.is_unconfirmed());
    }

    #[test]
    fn error_kinds_flatten_by_variant() {
        assert_eq!(
            FailureKind::from(&AuthError::invalid_credentials("a")),
            FailureKind::InvalidCredentials
        );
        assert_eq!(
            FailureKind::from(&AuthError::transient("reset")),
            FailureKind::Network
        );
        assert_eq!(
            FailureKind::from(&ActionError::Timeout),
            FailureKind::Timeout
        );
        assert_eq!(
            FailureKind::from(&ActionError::rejected("no")),
            FailureKind::RemoteRejected
        );
    }

    #[test]
    fn serialized_outcomes_tag_their_status() {
        let json = serde_json::to_value(Outcome::failed(
            "bob",
            FailureKind::InvalidCredentials,
            "credentials rejected",
        ))
        .unwrap();
        assert_eq!(json["identifier"], "bob");
        assert_eq!(json["succeeded"], false);
        assert_eq!(json["detail"]["status"], "failed");
        assert_eq!(json["detail"]["kind"], "invalid_credentials");
    }
}
