use crate::domain::message::Message;
use time::OffsetDateTime;

#[derive(Debug, sqlx::FromRow)]
pub struct MessageRow {
    pub(crate) id: String,
    pub(crate) conversation_id: String,
    pub(crate) sender_id: String,
    pub(crate) body: String,
    pub(crate) created_at: OffsetDateTime,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            conversation_id: row.conversation_id,
            sender_id: row.sender_id,
            body: row.body,
            created_at: row.created_at,
        }
    }
}
