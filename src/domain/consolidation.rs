use crate::config::OrphanedMessagePolicy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Plan only; nothing is written.
    pub dry_run: bool,
    pub orphaned_messages: OrphanedMessagePolicy,
}

/// Outcome for one participant set that had more than one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupOutcome {
    pub key: String,
    pub kept_id: String,
    pub deleted_ids: Vec<String>,
    pub failed_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub user_id: String,
    pub dry_run: bool,
    pub deleted_count: usize,
    pub failed_count: usize,
    pub reassigned_messages: u64,
    pub groups: Vec<GroupOutcome>,
}

impl ResolveReport {
    /// Some deletions succeeded or were planned while others failed.
    #[must_use]
    pub const fn is_partial_failure(&self) -> bool {
        self.failed_count > 0
    }

    #[must_use]
    pub fn summary(&self) -> String {
        if self.groups.is_empty() {
            return "No duplicates found".to_string();
        }
        if self.dry_run {
            let planned: usize = self.groups.iter().map(|g| g.deleted_ids.len()).sum();
            return format!("Found {planned} duplicate conversation(s)");
        }
        let mut summary = format!("Deleted {} duplicate conversation(s)", self.deleted_count);
        if self.failed_count > 0 {
            summary.push_str(&format!(", {} failed", self.failed_count));
        }
        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationOutcome {
    /// Legacy record ids merged into the canonical record and removed.
    pub migrated_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_without_groups() {
        let report = ResolveReport::default();
        assert_eq!(report.summary(), "No duplicates found");
        assert!(!report.is_partial_failure());
    }

    #[test]
    fn test_summary_reports_failures() {
        let report = ResolveReport {
            deleted_count: 2,
            failed_count: 1,
            groups: vec![GroupOutcome::default()],
            ..ResolveReport::default()
        };
        assert_eq!(report.summary(), "Deleted 2 duplicate conversation(s), 1 failed");
        assert!(report.is_partial_failure());
    }

    #[test]
    fn test_summary_for_dry_run() {
        let report = ResolveReport {
            dry_run: true,
            groups: vec![GroupOutcome {
                deleted_ids: vec!["a".to_string(), "b".to_string()],
                ..GroupOutcome::default()
            }],
            ..ResolveReport::default()
        };
        assert_eq!(report.summary(), "Found 2 duplicate conversation(s)");
    }
}
