#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc, unreachable_pub)]

use async_trait::async_trait;
use clap::Parser;
use consolidation_server::adapters::database::{self, DbPool};
use consolidation_server::adapters::memory::MemoryStore;
use consolidation_server::api::{self, MgmtState};
use consolidation_server::config::Config;
use consolidation_server::domain::conversation::Conversation;
use consolidation_server::domain::message::Message;
use consolidation_server::domain::user::{UserPatch, UserRecord};
use consolidation_server::error::{AppError, Result};
use consolidation_server::services::store::{ConversationStore, MessageStore, StoreHealth, Stores, UserStore};
use consolidation_server::AppBuilder;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use time::{Duration, OffsetDateTime};

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("consolidation_server=debug".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

pub fn get_test_config() -> Config {
    Config::try_parse_from(["consolidation-server", "--host", "127.0.0.1", "--port", "0", "--mgmt-port", "0"]).unwrap()
}

/// Connects to the Postgres instance named by `DATABASE_URL` and applies the
/// migrations. Returns `None` when no database is configured for the run.
pub async fn get_test_pool() -> Option<DbPool> {
    setup_tracing();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL not set, skipping database-backed test");
        return None;
    };

    let config = get_test_config();
    let pool = database::init_pool(&database_url, &config.database)
        .await
        .expect("Failed to connect to DB. Is Postgres running?");
    consolidation_server::run_migrations(&pool).await.expect("Failed to run migrations");

    Some(pool)
}

/// Suffix that keeps ids from different test runs apart in a shared database.
pub fn run_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Wraps the in-memory store with operation counters and injectable failures.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing_conversation_deletes: Mutex<HashSet<String>>,
    failing_reassigns: Mutex<HashSet<String>>,
    failing_user_deletes: Mutex<HashSet<String>>,
    failing_user_merges: AtomicBool,
    failing_scans: AtomicBool,
    failing_ping: AtomicBool,
    pub conversation_deletes: AtomicUsize,
    pub user_merges: AtomicUsize,
    pub user_deletes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn stores(store: &Arc<Self>) -> Stores {
        Stores {
            conversations: Arc::clone(store) as Arc<dyn ConversationStore>,
            messages: Arc::clone(store) as Arc<dyn MessageStore>,
            users: Arc::clone(store) as Arc<dyn UserStore>,
            health: Arc::clone(store) as Arc<dyn StoreHealth>,
        }
    }

    pub fn fail_conversation_delete(&self, id: &str) {
        self.failing_conversation_deletes.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_reassign_from(&self, id: &str) {
        self.failing_reassigns.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_user_delete(&self, id: &str) {
        self.failing_user_deletes.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_user_merges(&self, fail: bool) {
        self.failing_user_merges.store(fail, Ordering::SeqCst);
    }

    pub fn fail_scans(&self, fail: bool) {
        self.failing_scans.store(fail, Ordering::SeqCst);
    }

    pub fn fail_ping(&self, fail: bool) {
        self.failing_ping.store(fail, Ordering::SeqCst);
    }

    pub fn clear_failures(&self) {
        self.failing_conversation_deletes.lock().unwrap().clear();
        self.failing_reassigns.lock().unwrap().clear();
        self.failing_user_deletes.lock().unwrap().clear();
        self.fail_user_merges(false);
        self.fail_scans(false);
        self.fail_ping(false);
    }

    pub fn reset_counters(&self) {
        self.conversation_deletes.store(0, Ordering::SeqCst);
        self.user_merges.store(0, Ordering::SeqCst);
        self.user_deletes.store(0, Ordering::SeqCst);
    }

    pub async fn seed_conversation(&self, conversation: Conversation) {
        ConversationStore::insert(&self.inner, &conversation).await.unwrap();
    }

    pub async fn seed_message(&self, message: Message) {
        MessageStore::insert(&self.inner, &message).await.unwrap();
    }

    pub async fn seed_user(&self, record: UserRecord) {
        let patch = UserPatch {
            uid: record.uid,
            email: record.email,
            display_name: record.display_name,
            photo_url: record.photo_url,
            provider: record.provider,
            role: record.role,
            created_at: record.created_at,
            updated_at: record.updated_at,
            last_login_at: record.last_login_at,
            migrated_from_doc_id: record.migrated_from_doc_id,
            migrated_at: record.migrated_at,
            attributes: record.attributes,
        };
        UserStore::merge(&self.inner, &record.id, &patch).await.unwrap();
    }

    pub async fn conversation(&self, id: &str) -> Option<Conversation> {
        ConversationStore::get(&self.inner, id).await.unwrap()
    }

    pub async fn user(&self, id: &str) -> Option<UserRecord> {
        UserStore::get(&self.inner, id).await.unwrap()
    }

    pub async fn messages_of(&self, conversation_id: &str) -> Vec<Message> {
        self.inner.list_for_conversation(conversation_id).await.unwrap()
    }
}

fn injected(what: &str, id: &str) -> AppError {
    AppError::Store(format!("injected {what} failure for {id}"))
}

#[async_trait]
impl ConversationStore for FlakyStore {
    async fn find_by_participant(&self, user_id: &str) -> Result<Vec<Conversation>> {
        if self.failing_scans.load(Ordering::SeqCst) {
            return Err(injected("scan", user_id));
        }
        self.inner.find_by_participant(user_id).await
    }

    async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        ConversationStore::get(&self.inner, id).await
    }

    async fn insert(&self, conversation: &Conversation) -> Result<()> {
        ConversationStore::insert(&self.inner, conversation).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if self.failing_conversation_deletes.lock().unwrap().contains(id) {
            return Err(injected("conversation delete", id));
        }
        self.conversation_deletes.fetch_add(1, Ordering::SeqCst);
        ConversationStore::delete(&self.inner, id).await
    }
}

#[async_trait]
impl MessageStore for FlakyStore {
    async fn insert(&self, message: &Message) -> Result<()> {
        MessageStore::insert(&self.inner, message).await
    }

    async fn list_for_conversation(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.inner.list_for_conversation(conversation_id).await
    }

    async fn reassign(&self, from: &str, to: &str) -> Result<u64> {
        if self.failing_reassigns.lock().unwrap().contains(from) {
            return Err(injected("reassign", from));
        }
        self.inner.reassign(from, to).await
    }
}

#[async_trait]
impl UserStore for FlakyStore {
    async fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        UserStore::get(&self.inner, id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<UserRecord>> {
        self.inner.find_by_email(email).await
    }

    async fn merge(&self, id: &str, patch: &UserPatch) -> Result<()> {
        if self.failing_user_merges.load(Ordering::SeqCst) {
            return Err(injected("user merge", id));
        }
        self.user_merges.fetch_add(1, Ordering::SeqCst);
        self.inner.merge(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if self.failing_user_deletes.lock().unwrap().contains(id) {
            return Err(injected("user delete", id));
        }
        self.user_deletes.fetch_add(1, Ordering::SeqCst);
        UserStore::delete(&self.inner, id).await
    }
}

#[async_trait]
impl StoreHealth for FlakyStore {
    async fn ping(&self) -> Result<()> {
        if self.failing_ping.load(Ordering::SeqCst) {
            return Err(injected("ping", "store"));
        }
        self.inner.ping().await
    }
}

pub fn at_hour(hour: i64) -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::days(20_000) + Duration::hours(hour)
}

pub fn conversation(id: &str, participants: &[&str], last_message_hour: Option<i64>) -> Conversation {
    Conversation {
        id: id.to_string(),
        participants: participants.iter().map(ToString::to_string).collect(),
        last_message_at: last_message_hour.map(at_hour),
        created_at: Some(at_hour(0)),
    }
}

pub fn message(id: &str, conversation_id: &str, sender_id: &str) -> Message {
    Message {
        id: id.to_string(),
        conversation_id: conversation_id.to_string(),
        sender_id: sender_id.to_string(),
        body: format!("body of {id}"),
        created_at: at_hour(1),
    }
}

pub struct TestApp {
    pub api_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub store: Arc<FlakyStore>,
    pub config: Config,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        setup_tracing();

        let store = FlakyStore::new();
        let app = AppBuilder::new(config.clone()).with_stores(FlakyStore::stores(&store)).build();

        let app_router = api::app_router(config.clone(), app.services);
        let mgmt_router = api::mgmt_router(MgmtState { health_service: app.health_service });

        let api_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let api_addr = api_listener.local_addr().unwrap();
        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(api_listener, app_router).await.unwrap();
        });
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt_router).await.unwrap();
        });

        Self {
            api_url: format!("http://{api_addr}"),
            mgmt_url: format!("http://{mgmt_addr}"),
            client: reqwest::Client::new(),
            store,
            config,
        }
    }
}
