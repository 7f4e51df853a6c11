use crate::domain::consolidation::MigrationOutcome;
use crate::domain::user::{SignInEvent, UserRecord};
use crate::error::Result;
use crate::services::store::UserStore;
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Clone, Debug)]
struct Metrics {
    migrated_total: Counter<u64>,
    failures_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("consolidation-server");
        Self {
            migrated_total: meter
                .u64_counter("legacy_user_records_migrated_total")
                .with_description("Total legacy user records merged into a canonical record")
                .build(),
            failures_total: meter
                .u64_counter("user_reconciliation_failures_total")
                .with_description("Total sign-in reconciliations that ended with an error")
                .build(),
        }
    }
}

/// Keeps exactly one user record per identity, keyed by uid, folding legacy
/// records that share the email into it.
#[derive(Clone, Debug)]
pub struct UserMigrationService {
    users: Arc<dyn UserStore>,
    metrics: Metrics,
}

impl UserMigrationService {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users, metrics: Metrics::new() }
    }

    /// Sign-in hook. Failures are logged and dropped so they never block a login;
    /// the next sign-in retries from scratch.
    #[tracing::instrument(skip(self, event), fields(uid = %event.uid))]
    pub async fn reconcile(&self, event: SignInEvent) {
        match self.try_reconcile(event).await {
            Ok(outcome) => {
                if !outcome.migrated_ids.is_empty() {
                    tracing::info!(count = outcome.migrated_ids.len(), "Legacy user records migrated");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "User record reconciliation failed");
                self.metrics.failures_total.add(1, &[]);
            }
        }
    }

    /// Upserts the canonical record, then merges and deletes every legacy record
    /// sharing the email. Stops at the first store error.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if the uid is blank, or the first store error hit.
    pub async fn try_reconcile(&self, event: SignInEvent) -> Result<MigrationOutcome> {
        let event = event.validate()?;
        let now = OffsetDateTime::now_utc();

        let profile = event.profile_patch(now);
        self.users.merge(&event.uid, &profile).await?;

        let Some(email) = event.email.as_deref() else {
            tracing::debug!("No email on sign-in, skipping legacy lookup");
            return Ok(MigrationOutcome::default());
        };

        let mut legacy: Vec<UserRecord> =
            self.users.find_by_email(email).await?.into_iter().filter(|r| r.id != event.uid).collect();
        if legacy.is_empty() {
            return Ok(MigrationOutcome::default());
        }
        legacy.sort_by(|a, b| a.id.cmp(&b.id));

        let mut canonical = if let Some(record) = self.users.get(&event.uid).await? {
            record
        } else {
            // Upsert not yet visible to this read.
            let mut record = UserRecord::new(event.uid.clone());
            record.apply(&profile);
            record
        };

        let mut outcome = MigrationOutcome::default();
        for record in legacy {
            let mut patch = canonical.gap_fill_from(&record);
            patch.migrated_from_doc_id = Some(record.id.clone());
            patch.migrated_at = Some(now);

            self.users.merge(&event.uid, &patch).await?;
            canonical.apply(&patch);

            self.users.delete(&record.id).await?;
            tracing::info!(legacy_id = %record.id, "Merged legacy user record");
            self.metrics.migrated_total.add(1, &[]);
            outcome.migrated_ids.push(record.id);
        }

        Ok(outcome)
    }
}
