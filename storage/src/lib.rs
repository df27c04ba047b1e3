//! Storage crate: conversation store implementations behind [`mirror_core::ConversationStore`].
//!
//! ## Modules
//!
//! - [`error`] – mapping of backend failures onto [`mirror_core::StoreError`]
//! - [`models`] – MessageRecord (row shape of the `messages` table)
//! - [`feed`] – change feed and per-subscription snapshot tasks
//! - [`sqlite_store`] – SqliteConversationStore (SQLite via sqlx)
//! - [`inmemory_store`] – InMemoryConversationStore (tests, offline demos)
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod feed;
mod inmemory_store;
mod models;
mod sqlite_pool;
mod sqlite_store;


pub use inmemory_store::InMemoryConversationStore;
pub use models::MessageRecord;
pub use sqlite_pool::SqlitePoolManager;
pub use sqlite_store::SqliteConversationStore;
