//! SQLite-backed conversation store.
//!
//! Uses SqlitePoolManager and MessageRecord. Every conversation lives under the namespace
//! `chats/{conversation_id}`; appends publish on the change feed so live subscriptions refresh.

use async_trait::async_trait;
use mirror_core::{ConversationId, ConversationStore, Message, MessageList, NewMessage, StoreError, Subscription};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::error::unavailable;
use crate::feed::{spawn_snapshots, ChangeFeed};
use crate::models::MessageRecord;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct SqliteConversationStore {
    pool_manager: SqlitePoolManager,
    feed: ChangeFeed,
}

impl SqliteConversationStore {
    /// Connects and creates the `messages` table if needed. Connection failures are `StoreUnavailable`.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool_manager = SqlitePoolManager::new(database_url)
            .await
            .map_err(unavailable)?;
        let store = Self {
            pool_manager,
            feed: ChangeFeed::new(),
        };
        store.init().await.map_err(unavailable)?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        info!("Creating database tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                namespace TEXT NOT NULL,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_namespace_timestamp ON messages(namespace, timestamp);
            "#,
        )
        .execute(pool)
        .await?;

        info!("Database tables created successfully");
        Ok(())
    }

    /// The most recent `limit` messages of a conversation, oldest first.
    pub async fn recent(
        &self,
        conversation: &ConversationId,
        limit: usize,
    ) -> Result<MessageList, StoreError> {
        fetch_recent(self.pool_manager.pool(), &conversation.path(), limit).await
    }

    /// Number of messages stored for a conversation.
    pub async fn count(&self, conversation: &ConversationId) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE namespace = ?")
            .bind(conversation.path())
            .fetch_one(self.pool_manager.pool())
            .await
            .map_err(unavailable)?;
        Ok(count)
    }

    /// Closes the pool. Subsequent appends and subscriptions fail with `StoreUnavailable`.
    pub async fn close(&self) {
        self.pool_manager.close().await;
    }
}

async fn fetch_recent(
    pool: &SqlitePool,
    namespace: &str,
    limit: usize,
) -> Result<MessageList, StoreError> {
    let records: Vec<MessageRecord> = sqlx::query_as::<_, MessageRecord>(
        r#"
        SELECT id, namespace, conversation_id, role, content, timestamp
        FROM (
            SELECT seq, id, namespace, conversation_id, role, content, timestamp
            FROM messages
            WHERE namespace = ?
            ORDER BY timestamp DESC, seq DESC
            LIMIT ?
        )
        ORDER BY timestamp ASC, seq ASC
        "#,
    )
    .bind(namespace)
    .bind(limit as i64)
    .fetch_all(pool)
    .await
    .map_err(unavailable)?;

    let messages = records
        .into_iter()
        .map(MessageRecord::into_message)
        .collect::<Result<Vec<Message>, StoreError>>()?;
    Ok(MessageList::new(messages))
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    #[instrument(skip(self, message), fields(conversation = %conversation, role = %message.role))]
    async fn append(
        &self,
        conversation: &ConversationId,
        message: NewMessage,
    ) -> Result<Message, StoreError> {
        message.validate()?;
        let record = MessageRecord::new(conversation, &message);

        sqlx::query(
            r#"
            INSERT INTO messages (id, namespace, conversation_id, role, content, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.namespace)
        .bind(&record.conversation_id)
        .bind(&record.role)
        .bind(&record.content)
        .bind(record.timestamp)
        .execute(self.pool_manager.pool())
        .await
        .map_err(unavailable)?;

        info!(
            "Saved message: id={}, namespace={}, content={}",
            record.id, record.namespace, record.content
        );
        self.feed.notify(&record.namespace);

        record.into_message()
    }

    #[instrument(skip(self), fields(conversation = %conversation))]
    async fn subscribe_recent(
        &self,
        conversation: &ConversationId,
        limit: usize,
    ) -> Result<Subscription, StoreError> {
        let changes = self.feed.listen();
        let initial = self.recent(conversation, limit).await?;
        info!(count = initial.len(), limit, "step: subscription opened");

        let pool = self.pool_manager.pool().clone();
        let namespace = conversation.path();
        Ok(spawn_snapshots(
            conversation.clone(),
            initial,
            changes,
            move || {
                let pool = pool.clone();
                let namespace = namespace.clone();
                async move { fetch_recent(&pool, &namespace, limit).await }
            },
        ))
    }
}
