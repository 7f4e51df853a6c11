//! Document store ports consumed by the consolidation services.
//!
//! Every handle is injected as an `Arc<dyn …>` built once at boot. Deleting an id
//! that does not exist is not an error, so concurrent cleanups racing on the same
//! record stay benign.

use crate::domain::conversation::Conversation;
use crate::domain::message::Message;
use crate::domain::user::{UserPatch, UserRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

#[async_trait]
pub trait ConversationStore: Send + Sync + Debug {
    /// All conversations whose participant list contains `user_id`.
    async fn find_by_participant(&self, user_id: &str) -> Result<Vec<Conversation>>;

    async fn get(&self, id: &str) -> Result<Option<Conversation>>;

    async fn insert(&self, conversation: &Conversation) -> Result<()>;

    /// Returns `true` if a record was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait MessageStore: Send + Sync + Debug {
    async fn insert(&self, message: &Message) -> Result<()>;

    async fn list_for_conversation(&self, conversation_id: &str) -> Result<Vec<Message>>;

    /// Points every message of `from` at `to`. Returns the number of messages moved.
    async fn reassign(&self, from: &str, to: &str) -> Result<u64>;
}

#[async_trait]
pub trait UserStore: Send + Sync + Debug {
    async fn get(&self, id: &str) -> Result<Option<UserRecord>>;

    async fn find_by_email(&self, email: &str) -> Result<Vec<UserRecord>>;

    /// Creates the record at `id` or merges `patch` into it.
    async fn merge(&self, id: &str, patch: &UserPatch) -> Result<()>;

    /// Returns `true` if a record was removed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync + Debug {
    async fn ping(&self) -> Result<()>;
}

/// Client handles for one document store backend.
#[derive(Clone, Debug)]
pub struct Stores {
    pub conversations: Arc<dyn ConversationStore>,
    pub messages: Arc<dyn MessageStore>,
    pub users: Arc<dyn UserStore>,
    pub health: Arc<dyn StoreHealth>,
}
