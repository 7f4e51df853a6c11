use crate::domain::consolidation::{GroupOutcome, ResolveReport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    /// Overrides the configured orphaned-message policy for this run.
    #[serde(default)]
    pub reassign_messages: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroupSummary {
    pub key: String,
    pub kept_id: String,
    pub deleted_ids: Vec<String>,
    pub failed_ids: Vec<String>,
}

impl From<GroupOutcome> for DuplicateGroupSummary {
    fn from(outcome: GroupOutcome) -> Self {
        Self {
            key: outcome.key,
            kept_id: outcome.kept_id,
            deleted_ids: outcome.deleted_ids,
            failed_ids: outcome.failed_ids,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    pub deleted_count: usize,
    pub failed_count: usize,
    pub reassigned_messages: u64,
    pub dry_run: bool,
    pub message: String,
    pub groups: Vec<DuplicateGroupSummary>,
}

impl From<ResolveReport> for CleanupResponse {
    fn from(report: ResolveReport) -> Self {
        Self {
            success: true,
            message: report.summary(),
            deleted_count: report.deleted_count,
            failed_count: report.failed_count,
            reassigned_messages: report.reassigned_messages,
            dry_run: report.dry_run,
            groups: report.groups.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupFailureBody {
    pub success: bool,
    pub error: String,
}
