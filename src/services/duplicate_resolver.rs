use crate::config::{ConsolidationConfig, OrphanedMessagePolicy};
use crate::domain::consolidation::{GroupOutcome, ResolveOptions, ResolveReport};
use crate::domain::conversation::{DuplicateGroup, plan_duplicates};
use crate::error::{AppError, Result};
use crate::services::store::{ConversationStore, MessageStore};
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    deleted_total: Counter<u64>,
    failures_total: Counter<u64>,
    reassigned_messages_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("consolidation-server");
        Self {
            deleted_total: meter
                .u64_counter("duplicate_conversations_deleted_total")
                .with_description("Total duplicate conversations removed")
                .build(),
            failures_total: meter
                .u64_counter("duplicate_conversation_delete_failures_total")
                .with_description("Total duplicate conversations that could not be removed")
                .build(),
            reassigned_messages_total: meter
                .u64_counter("duplicate_conversation_messages_reassigned_total")
                .with_description("Total messages moved onto a surviving conversation")
                .build(),
        }
    }
}

/// Restores the one-conversation-per-participant-set invariant for a user.
#[derive(Clone, Debug)]
pub struct DuplicateResolver {
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    config: ConsolidationConfig,
    metrics: Metrics,
}

impl DuplicateResolver {
    #[must_use]
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        config: ConsolidationConfig,
    ) -> Self {
        Self { conversations, messages, config, metrics: Metrics::new() }
    }

    /// Options using the configured message policy.
    #[must_use]
    pub const fn default_options(&self) -> ResolveOptions {
        ResolveOptions { dry_run: false, orphaned_messages: self.config.orphaned_messages }
    }

    /// Removes every non-canonical conversation among the user's duplicate groups.
    ///
    /// A failed removal is recorded against its group and processing moves on;
    /// only the initial scan can fail the whole run.
    ///
    /// # Errors
    /// Returns `AppError::NotAuthenticated` if `user_id` is blank.
    /// Returns a store error if the conversations cannot be listed.
    #[tracing::instrument(
        skip(self, user_id),
        fields(user_id = %user_id, dry_run = options.dry_run, deleted = tracing::field::Empty, failed = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn resolve(&self, user_id: &str, options: ResolveOptions) -> Result<ResolveReport> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::NotAuthenticated);
        }

        let conversations = self.conversations.find_by_participant(user_id).await?;
        let scanned = conversations.len();
        let plan = plan_duplicates(conversations);
        tracing::debug!(scanned, groups = plan.len(), "Planned duplicate cleanup");

        let mut report =
            ResolveReport { user_id: user_id.to_string(), dry_run: options.dry_run, ..ResolveReport::default() };

        for group in plan {
            if options.dry_run {
                report.groups.push(GroupOutcome {
                    key: group.key.to_string(),
                    kept_id: group.kept_id,
                    deleted_ids: group.duplicate_ids,
                    failed_ids: Vec::new(),
                });
                continue;
            }

            let (outcome, reassigned) = self.resolve_group(group, options.orphaned_messages).await;
            report.deleted_count += outcome.deleted_ids.len();
            report.failed_count += outcome.failed_ids.len();
            report.reassigned_messages += reassigned;
            report.groups.push(outcome);
        }

        let span = tracing::Span::current();
        span.record("deleted", report.deleted_count);
        span.record("failed", report.failed_count);

        if !report.dry_run {
            self.metrics.deleted_total.add(report.deleted_count as u64, &[]);
            self.metrics.failures_total.add(report.failed_count as u64, &[]);
            self.metrics.reassigned_messages_total.add(report.reassigned_messages, &[]);
        }

        if report.is_partial_failure() {
            tracing::warn!(deleted = report.deleted_count, failed = report.failed_count, "Duplicate cleanup partially failed");
        } else if report.deleted_count > 0 {
            tracing::info!(deleted = report.deleted_count, "Duplicate conversations removed");
        }

        Ok(report)
    }

    #[tracing::instrument(level = "debug", skip(self, group), fields(key = %group.key, kept_id = %group.kept_id))]
    async fn resolve_group(&self, group: DuplicateGroup, policy: OrphanedMessagePolicy) -> (GroupOutcome, u64) {
        let mut outcome = GroupOutcome {
            key: group.key.to_string(),
            kept_id: group.kept_id.clone(),
            deleted_ids: Vec::new(),
            failed_ids: Vec::new(),
        };
        let mut reassigned = 0;

        for duplicate_id in group.duplicate_ids {
            match self.remove_duplicate(&duplicate_id, &group.kept_id, policy).await {
                Ok(moved) => {
                    reassigned += moved;
                    outcome.deleted_ids.push(duplicate_id);
                }
                Err(e) => {
                    tracing::warn!(error = %e, duplicate_id = %duplicate_id, "Failed to remove duplicate conversation");
                    outcome.failed_ids.push(duplicate_id);
                }
            }
        }

        (outcome, reassigned)
    }

    async fn remove_duplicate(&self, duplicate_id: &str, kept_id: &str, policy: OrphanedMessagePolicy) -> Result<u64> {
        let moved = match policy {
            OrphanedMessagePolicy::Retain => 0,
            OrphanedMessagePolicy::Reassign => self.messages.reassign(duplicate_id, kept_id).await?,
        };

        if !self.conversations.delete(duplicate_id).await? {
            // Removed concurrently; the invariant holds either way.
            tracing::debug!(duplicate_id, "Duplicate conversation already gone");
        }

        Ok(moved)
    }
}
