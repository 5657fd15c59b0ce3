//! Response envelopes for the service's private API.
//!
//! Every struct defaults its optional fields so a half-filled body still
//! deserializes; callers decide whether the missing pieces matter.

use serde::Deserialize;

/// Service error code for rejected credentials.
pub(crate) const ERR_BAD_CREDENTIALS: i32 = 5;
/// Service error code when a guard code is required but absent.
pub(crate) const ERR_CODE_REQUIRED: i32 = 85;
/// Service error code when the supplied guard code was refused.
pub(crate) const ERR_CODE_MISMATCH: i32 = 88;

/// Reward catalog `kind` for entries that can be sent to another account.
pub(crate) const GIFTABLE_KIND: u32 = 10;

#[derive(Debug, Deserialize)]
pub(crate) struct ChallengeResponse {
    pub challenge_id: String,
    #[serde(default)]
    pub requires_code: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error_code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Plain acknowledgement returned by mutating endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct AckResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PointsSummaryResponse {
    pub summary: PointsSummary,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PointsSummary {
    pub points: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RewardCatalogResponse {
    #[serde(default)]
    pub definitions: Vec<RewardDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RewardDefinition {
    pub id: String,
    pub name: String,
    pub cost: u64,
    #[serde(default)]
    pub kind: u32,
}

/// Pick the most expensive giftable reward the balance covers.
pub(crate) fn pick_gift(definitions: &[RewardDefinition], balance: u64) -> Option<&RewardDefinition> {
    definitions
        .iter()
        .filter(|d| d.kind == GIFTABLE_KIND && d.cost <= balance)
        .max_by_key(|d| d.cost)
}
