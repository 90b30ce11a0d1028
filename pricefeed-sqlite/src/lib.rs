//! pricefeed-sqlite
//!
//! Durable [`PriceStore`] and [`SymbolStore`] backed by a single SQLite file.
//!
//! Overview
//! - One connection guarded by a mutex; every query runs on Tokio's blocking
//!   pool so async callers never stall a worker thread.
//! - `price_data` is keyed on `(symbol_id, timestamp)` and every write is an
//!   upsert, so re-running a backfill never duplicates rows.
//! - Opening a database creates missing tables and applies pending
//!   migrations; opening the same file twice is a no-op.
//!
//! Quickstart
//! ```rust,ignore
//! use std::sync::Arc;
//! use pricefeed::PriceFeed;
//! use pricefeed_sqlite::SqliteStore;
//!
//! let store = Arc::new(SqliteStore::open("data/trading.db").await?);
//! let feed = PriceFeed::builder()
//!     .with_exchange(exchange)
//!     .with_store(store)
//!     .build()?;
//! ```
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::Connection;

use pricefeed_core::PriceFeedError;

mod prices;
mod schema;
mod symbols;

pub use schema::SCHEMA_VERSION;

/// SQLite implementation of the pricefeed storage traits.
///
/// Cloning is cheap and clones share the same connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and bring its schema up to date.
    ///
    /// Parent directories are created when missing.
    ///
    /// # Errors
    /// Returns `Storage` if the file cannot be opened or the schema cannot be applied.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PriceFeedError> {
        let path = path.as_ref().to_path_buf();
        let target = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, PriceFeedError> {
            if let Some(dir) = target.parent()
                && !dir.as_os_str().is_empty()
            {
                std::fs::create_dir_all(dir).map_err(|e| {
                    PriceFeedError::storage(format!("create {}: {e}", dir.display()))
                })?;
            }
            let conn = Connection::open(&target).map_err(|e| storage_err("open", &e))?;
            schema::migrate(&conn).map_err(|e| storage_err("migrate", &e))?;
            Ok(conn)
        })
        .await
        .map_err(|e| PriceFeedError::storage(format!("open: worker failed: {e}")))??;

        tracing::info!(path = %path.display(), "database initialized");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open a private in-memory database. Contents vanish when the last clone is dropped.
    ///
    /// # Errors
    /// Returns `Storage` if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, PriceFeedError> {
        let conn = Connection::open_in_memory().map_err(|e| storage_err("open", &e))?;
        schema::migrate(&conn).map_err(|e| storage_err("migrate", &e))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Database file path, or `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Schema version recorded in `system_metadata`.
    ///
    /// # Errors
    /// Returns `Storage` on query failure.
    pub async fn schema_version(&self) -> Result<Option<u32>, PriceFeedError> {
        let raw = self.metadata("schema_version").await?;
        Ok(raw.and_then(|v| v.parse().ok()))
    }

    /// Read a `system_metadata` value.
    ///
    /// # Errors
    /// Returns `Storage` on query failure.
    pub async fn metadata(&self, key: &str) -> Result<Option<String>, PriceFeedError> {
        let key = key.to_string();
        self.with_conn("metadata", move |conn| schema::get_metadata(conn, &key))
            .await
    }

    /// Write a `system_metadata` value, replacing any previous one.
    ///
    /// # Errors
    /// Returns `Storage` on write failure.
    pub async fn set_metadata(&self, key: &str, value: &str) -> Result<(), PriceFeedError> {
        let (key, value) = (key.to_string(), value.to_string());
        self.with_conn("set_metadata", move |conn| {
            schema::set_metadata(conn, &key, &value)
        })
        .await
    }

    /// Run `f` against the connection on the blocking pool.
    pub(crate) async fn with_conn<T, F>(&self, op: &'static str, f: F) -> Result<T, PriceFeedError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        })
        .await
        .map_err(|e| PriceFeedError::storage(format!("{op}: worker failed: {e}")))?
        .map_err(|e| storage_err(op, &e))
    }
}

fn storage_err(op: &str, e: &rusqlite::Error) -> PriceFeedError {
    tracing::error!(op, error = %e, "sqlite operation failed");
    PriceFeedError::storage(format!("{op}: {e}"))
}
