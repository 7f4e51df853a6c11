use crate::domain::user::{Attributes, UserRecord};
use sqlx::types::Json;
use time::OffsetDateTime;

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub(crate) id: String,
    pub(crate) uid: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) display_name: Option<String>,
    pub(crate) photo_url: Option<String>,
    pub(crate) provider: Option<String>,
    pub(crate) role: Option<String>,
    pub(crate) created_at: Option<OffsetDateTime>,
    pub(crate) updated_at: Option<OffsetDateTime>,
    pub(crate) last_login_at: Option<OffsetDateTime>,
    pub(crate) migrated_from_doc_id: Option<String>,
    pub(crate) migrated_at: Option<OffsetDateTime>,
    pub(crate) attributes: Json<Attributes>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            uid: row.uid,
            email: row.email,
            display_name: row.display_name,
            photo_url: row.photo_url,
            provider: row.provider,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_login_at: row.last_login_at,
            migrated_from_doc_id: row.migrated_from_doc_id,
            migrated_at: row.migrated_at,
            attributes: row.attributes.0,
        }
    }
}
