use crate::outcome::{Outcome, OutcomeDetail};
use account_client::ActionReceipt;
use serde::Serialize;

/// Aggregate figures for one batch run. Computed once from the outcome
/// list and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    /// Confirmed applications only.
    pub succeeded: usize,
    /// Accepted by the service with an unreadable confirmation.
    pub unconfirmed: usize,
    pub failed: usize,
    /// Percentage of confirmed successes over the whole run; exactly 0.0
    /// for an empty run.
    pub success_rate: f64,
    /// Loyalty points spent across gift sends, unconfirmed ones included
    /// since the points are likely gone either way.
    pub points_spent: u64,
}

/// Fold outcomes into a [`Summary`]. Pure: no I/O, input untouched.
pub fn aggregate(outcomes: &[Outcome]) -> Summary {
    let total = outcomes.len();
    let mut succeeded = 0usize;
    let mut unconfirmed = 0usize;
    let mut points_spent = 0u64;

    for outcome in outcomes {
        match outcome.detail() {
            OutcomeDetail::Applied { receipt } => {
                succeeded += 1;
                points_spent += gift_cost(receipt);
            }
            OutcomeDetail::AppliedUnconfirmed { receipt } => {
                unconfirmed += 1;
                points_spent += gift_cost(receipt);
            }
            OutcomeDetail::Failed { .. } => {}
        }
    }

    let failed = total - succeeded - unconfirmed;
    let success_rate = if total == 0 {
        0.0
    } else {
        succeeded as f64 / total as f64 * 100.0
    };

    Summary {
        total,
        succeeded,
        unconfirmed,
        failed,
        success_rate,
        points_spent,
    }
}

fn gift_cost(receipt: &ActionReceipt) -> u64 {
    match receipt {
        ActionReceipt::GiftSent { cost, .. } => *cost,
        _ => 0,
    }
}
