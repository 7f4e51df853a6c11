use crate::adapters::database::DbPool;
use crate::adapters::database::records::ConversationRow;
use crate::domain::conversation::Conversation;
use crate::error::Result;
use crate::services::store::ConversationStore;
use async_trait::async_trait;

#[derive(Clone, Debug)]
pub struct ConversationRepository {
    pool: DbPool,
}

impl ConversationRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for ConversationRepository {
    /// Fetches every conversation the user participates in.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_by_participant(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let rows = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT id, participants, last_message_at, created_at
            FROM conversations
            WHERE $1 = ANY(participants)
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT id, participants, last_message_at, created_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    #[tracing::instrument(level = "debug", skip(self, conversation), fields(conversation_id = %conversation.id))]
    async fn insert(&self, conversation: &Conversation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, participants, last_message_at, created_at)
            VALUES ($1, $2, $3, COALESCE($4, NOW()))
            ON CONFLICT (id) DO UPDATE SET
                participants = EXCLUDED.participants,
                last_message_at = EXCLUDED.last_message_at,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&conversation.id)
        .bind(&conversation.participants)
        .bind(conversation.last_message_at)
        .bind(conversation.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
