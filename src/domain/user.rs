use crate::error::{AppError, Result};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Free-form profile fields that have no named column, mostly carried over from legacy records.
pub type Attributes = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    /// Document key. Canonical records use the identity provider's uid.
    pub id: String,
    pub uid: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub provider: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    pub last_login_at: Option<OffsetDateTime>,
    pub migrated_from_doc_id: Option<String>,
    pub migrated_at: Option<OffsetDateTime>,
    pub attributes: Attributes,
}

/// Partial update applied with merge semantics: `Some` overwrites, `None` leaves
/// the stored value alone, attributes merge key by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub uid: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub provider: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    pub last_login_at: Option<OffsetDateTime>,
    pub migrated_from_doc_id: Option<String>,
    pub migrated_at: Option<OffsetDateTime>,
    pub attributes: Attributes,
}

fn overwrite<T: Clone>(slot: &mut Option<T>, value: Option<&T>) {
    if let Some(v) = value {
        *slot = Some(v.clone());
    }
}

fn fill_gap<T: Clone>(current: Option<&T>, legacy: Option<&T>) -> Option<T> {
    match current {
        Some(_) => None,
        None => legacy.cloned(),
    }
}

impl UserRecord {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    pub fn apply(&mut self, patch: &UserPatch) {
        overwrite(&mut self.uid, patch.uid.as_ref());
        overwrite(&mut self.email, patch.email.as_ref());
        overwrite(&mut self.display_name, patch.display_name.as_ref());
        overwrite(&mut self.photo_url, patch.photo_url.as_ref());
        overwrite(&mut self.provider, patch.provider.as_ref());
        overwrite(&mut self.role, patch.role.as_ref());
        overwrite(&mut self.created_at, patch.created_at.as_ref());
        overwrite(&mut self.updated_at, patch.updated_at.as_ref());
        overwrite(&mut self.last_login_at, patch.last_login_at.as_ref());
        overwrite(&mut self.migrated_from_doc_id, patch.migrated_from_doc_id.as_ref());
        overwrite(&mut self.migrated_at, patch.migrated_at.as_ref());
        for (key, value) in &patch.attributes {
            self.attributes.insert(key.clone(), value.clone());
        }
    }

    /// Builds the patch that carries `legacy`'s data into this record without
    /// overriding anything this record already holds.
    ///
    /// `uid` and migration provenance are never taken from the legacy side.
    #[must_use]
    pub fn gap_fill_from(&self, legacy: &Self) -> UserPatch {
        let attributes = legacy
            .attributes
            .iter()
            .filter(|(key, _)| !self.attributes.contains_key(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        UserPatch {
            uid: None,
            email: fill_gap(self.email.as_ref(), legacy.email.as_ref()),
            display_name: fill_gap(self.display_name.as_ref(), legacy.display_name.as_ref()),
            photo_url: fill_gap(self.photo_url.as_ref(), legacy.photo_url.as_ref()),
            provider: fill_gap(self.provider.as_ref(), legacy.provider.as_ref()),
            role: fill_gap(self.role.as_ref(), legacy.role.as_ref()),
            created_at: fill_gap(self.created_at.as_ref(), legacy.created_at.as_ref()),
            updated_at: None,
            last_login_at: fill_gap(self.last_login_at.as_ref(), legacy.last_login_at.as_ref()),
            migrated_from_doc_id: None,
            migrated_at: None,
            attributes,
        }
    }
}

/// Identity and profile supplied by the authentication provider on sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInEvent {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub provider: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl SignInEvent {
    /// Normalizes the event and rejects it when the uid is missing.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if `uid` is blank.
    pub fn validate(self) -> Result<Self> {
        let uid = self.uid.trim().to_string();
        if uid.is_empty() {
            return Err(AppError::BadRequest("uid is required".to_string()));
        }
        Ok(Self {
            uid,
            email: non_blank(self.email),
            display_name: non_blank(self.display_name),
            photo_url: non_blank(self.photo_url),
            provider: non_blank(self.provider),
        })
    }

    #[must_use]
    pub fn profile_patch(&self, now: OffsetDateTime) -> UserPatch {
        UserPatch {
            uid: Some(self.uid.clone()),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
            provider: self.provider.clone(),
            updated_at: Some(now),
            last_login_at: Some(now),
            ..UserPatch::default()
        }
    }
}
