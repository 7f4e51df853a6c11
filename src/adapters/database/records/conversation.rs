use crate::domain::conversation::Conversation;
use time::OffsetDateTime;

#[derive(Debug, sqlx::FromRow)]
pub struct ConversationRow {
    pub(crate) id: String,
    pub(crate) participants: Vec<String>,
    pub(crate) last_message_at: Option<OffsetDateTime>,
    pub(crate) created_at: Option<OffsetDateTime>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: row.id,
            participants: row.participants,
            last_message_at: row.last_message_at,
            created_at: row.created_at,
        }
    }
}
