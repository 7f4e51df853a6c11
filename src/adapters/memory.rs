use crate::domain::conversation::Conversation;
use crate::domain::message::Message;
use crate::domain::user::{UserPatch, UserRecord};
use crate::error::Result;
use crate::services::store::{ConversationStore, MessageStore, StoreHealth, Stores, UserStore};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Documents {
    conversations: BTreeMap<String, Conversation>,
    messages: BTreeMap<String, Message>,
    users: BTreeMap<String, UserRecord>,
}

/// Process-local document store with the same semantics as the database adapter.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<Documents>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stores(&self) -> Stores {
        let handle = Arc::new(self.clone());
        Stores {
            conversations: Arc::clone(&handle) as Arc<dyn ConversationStore>,
            messages: Arc::clone(&handle) as Arc<dyn MessageStore>,
            users: Arc::clone(&handle) as Arc<dyn UserStore>,
            health: handle,
        }
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn find_by_participant(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let docs = self.documents.read().await;
        Ok(docs.conversations.values().filter(|c| c.has_participant(user_id)).cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        Ok(self.documents.read().await.conversations.get(id).cloned())
    }

    async fn insert(&self, conversation: &Conversation) -> Result<()> {
        let mut stored = conversation.clone();
        // Matches the database default for a missing creation time.
        stored.created_at = stored.created_at.or_else(|| Some(OffsetDateTime::now_utc()));
        let mut docs = self.documents.write().await;
        docs.conversations.insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.documents.write().await.conversations.remove(id).is_some())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, message: &Message) -> Result<()> {
        let mut docs = self.documents.write().await;
        docs.messages.insert(message.id.clone(), message.clone());
        Ok(())
    }

    async fn list_for_conversation(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let docs = self.documents.read().await;
        let mut messages: Vec<Message> =
            docs.messages.values().filter(|m| m.conversation_id == conversation_id).cloned().collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn reassign(&self, from: &str, to: &str) -> Result<u64> {
        let mut docs = self.documents.write().await;
        let mut moved = 0;
        for message in docs.messages.values_mut().filter(|m| m.conversation_id == from) {
            message.conversation_id = to.to_string();
            moved += 1;
        }
        Ok(moved)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self.documents.read().await.users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<UserRecord>> {
        let docs = self.documents.read().await;
        Ok(docs.users.values().filter(|u| u.email.as_deref() == Some(email)).cloned().collect())
    }

    async fn merge(&self, id: &str, patch: &UserPatch) -> Result<()> {
        let mut docs = self.documents.write().await;
        let record = docs.users.entry(id.to_string()).or_insert_with(|| UserRecord {
            created_at: Some(OffsetDateTime::now_utc()),
            ..UserRecord::new(id)
        });
        record.apply(patch);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.documents.write().await.users.remove(id).is_some())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
