use crate::adapters::database::DbPool;
use crate::adapters::database::records::UserRow;
use crate::domain::user::{UserPatch, UserRecord};
use crate::error::Result;
use crate::services::store::UserStore;
use async_trait::async_trait;
use sqlx::types::Json;

const USER_COLUMNS: &str = "id, uid, email, display_name, photo_url, provider, role, created_at, updated_at, \
                            last_login_at, migrated_from_doc_id, migrated_at, attributes";

#[derive(Clone, Debug)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Creates or merges a user document. Absent patch fields keep their stored value.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the upsert fails.
    #[tracing::instrument(level = "debug", skip(self, patch))]
    async fn merge(&self, id: &str, patch: &UserPatch) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, uid, email, display_name, photo_url, provider, role,
                created_at, updated_at, last_login_at, migrated_from_doc_id, migrated_at, attributes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, NOW()), $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                uid = COALESCE($2, users.uid),
                email = COALESCE($3, users.email),
                display_name = COALESCE($4, users.display_name),
                photo_url = COALESCE($5, users.photo_url),
                provider = COALESCE($6, users.provider),
                role = COALESCE($7, users.role),
                created_at = COALESCE($8, users.created_at),
                updated_at = COALESCE($9, users.updated_at),
                last_login_at = COALESCE($10, users.last_login_at),
                migrated_from_doc_id = COALESCE($11, users.migrated_from_doc_id),
                migrated_at = COALESCE($12, users.migrated_at),
                attributes = users.attributes || EXCLUDED.attributes
            "#,
        )
        .bind(id)
        .bind(&patch.uid)
        .bind(&patch.email)
        .bind(&patch.display_name)
        .bind(&patch.photo_url)
        .bind(&patch.provider)
        .bind(&patch.role)
        .bind(patch.created_at)
        .bind(patch.updated_at)
        .bind(patch.last_login_at)
        .bind(&patch.migrated_from_doc_id)
        .bind(patch.migrated_at)
        .bind(Json(&patch.attributes))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
