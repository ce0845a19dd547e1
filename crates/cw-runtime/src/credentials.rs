//! Credential storage.
//!
//! The supervisor re-reads credentials once per connection attempt, and the
//! `/update` conversation writes them. Both go through [`CredentialStore`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cw_core::Credentials;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::RuntimeResult;

/// Row key for the feed token.
pub const KEY_TOKEN: &str = "MANUAL_TOKEN";
/// Row key for the feed user.
pub const KEY_USER: &str = "MANUAL_USER";
/// Row key for the cookie string.
pub const KEY_COOKIE: &str = "MANUAL_COOKIE_STRING";

/// Load/save access to the current credential set.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current credentials, or `None` when any part is missing or empty.
    async fn load(&self) -> RuntimeResult<Option<Credentials>>;

    /// Replace the stored credentials.
    async fn save(&self, credentials: &Credentials) -> RuntimeResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite
// ─────────────────────────────────────────────────────────────────────────────

/// Credentials in a `credentials(key, value)` SQLite table.
#[derive(Clone)]
pub struct SqliteCredentialStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCredentialStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteCredentialStore {
    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub fn open(path: impl AsRef<Path>) -> RuntimeResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        ensure_schema(&conn)?;
        debug!(path = %path.display(), "Opened credential store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Database path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS credentials (
            key TEXT PRIMARY KEY,
            value TEXT
        );",
    )
}

fn read_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM credentials WHERE key = ?1",
        params![key],
        |row| row.get::<_, Option<String>>(0),
    )
    .optional()
    .map(Option::flatten)
}

fn load_blocking(conn: &Connection) -> rusqlite::Result<Option<Credentials>> {
    let token = read_value(conn, KEY_TOKEN)?;
    let user = read_value(conn, KEY_USER)?;
    let cookie = read_value(conn, KEY_COOKIE)?;
    let (Some(token), Some(user), Some(cookie)) = (token, user, cookie) else {
        return Ok(None);
    };
    let credentials = Credentials::new(token, user, cookie);
    Ok(credentials.is_complete().then_some(credentials))
}

fn save_blocking(conn: &mut Connection, credentials: &Credentials) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    for (key, value) in [
        (KEY_TOKEN, &credentials.token),
        (KEY_USER, &credentials.user),
        (KEY_COOKIE, &credentials.cookie),
    ] {
        tx.execute(
            "INSERT INTO credentials (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
    }
    tx.commit()
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn load(&self) -> RuntimeResult<Option<Credentials>> {
        let conn = Arc::clone(&self.conn);
        let loaded = tokio::task::spawn_blocking(move || load_blocking(&conn.lock())).await??;
        Ok(loaded)
    }

    async fn save(&self, credentials: &Credentials) -> RuntimeResult<()> {
        let conn = Arc::clone(&self.conn);
        let credentials = credentials.clone();
        tokio::task::spawn_blocking(move || save_blocking(&mut conn.lock(), &credentials))
            .await??;
        info!(path = %self.path.display(), "Saved credentials");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local store, for tests and one-shot runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    inner: Arc<Mutex<Option<Credentials>>>,
}

impl MemoryCredentialStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `credentials`.
    #[must_use]
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(credentials))),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> RuntimeResult<Option<Credentials>> {
        Ok(self.inner.lock().clone().filter(Credentials::is_complete))
    }

    async fn save(&self, credentials: &Credentials) -> RuntimeResult<()> {
        *self.inner.lock() = Some(credentials.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sqlite_roundtrip_and_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteCredentialStore::open(dir.path().join("nested/creds.db")).unwrap();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(&Credentials::new("t1", "u1", "a=1")).await.unwrap();
        store.save(&Credentials::new("t2", "u2", "b=2")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, Credentials::new("t2", "u2", "b=2"));

        let count: i64 = store
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM credentials", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn sqlite_reopen_sees_saved_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.db");
        SqliteCredentialStore::open(&path)
            .unwrap()
            .save(&Credentials::new("t", "u", "c=1"))
            .await
            .unwrap();
        let reopened = SqliteCredentialStore::open(&path).unwrap();
        assert!(reopened.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sqlite_partial_rows_load_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteCredentialStore::open(dir.path().join("creds.db")).unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO credentials (key, value) VALUES (?1, ?2)",
                params![KEY_TOKEN, "t"],
            )
            .unwrap();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(&Credentials::new("t", "", "c=1")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_filters_incomplete() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().await.unwrap().is_none());
        store.save(&Credentials::new("t", "u", "")).await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.save(&Credentials::new("t", "u", "c=1")).await.unwrap();
        assert!(store.load().await.unwrap().is_some());
    }
}
