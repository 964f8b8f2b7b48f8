//! Key-value secret storage backed by SQLite.
//!
//! The store is queried once at startup for the API key under
//! [`consts::API_KEY_NAME`](crate::consts::API_KEY_NAME); the
//! environment variable of the same name acts as a fallback so the
//! binary works without a `login` step.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::Mutex;

/// Persistent key-value secret store.
pub struct SecretStore {
    conn: Mutex<Connection>,
}

impl SecretStore {
    /// Open or create the secrets table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open secrets database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS secrets (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create secrets table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get a stored secret by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT value FROM secrets WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Store a secret (upsert).
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO secrets (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a secret.
    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM secrets WHERE key = ?1", [key])?;
        Ok(())
    }

    /// Resolve a secret. Priority: stored value → environment variable
    /// of the same name. Empty values count as absent.
    pub fn resolve(&self, key: &str) -> Result<Option<String>> {
        if let Some(value) = self.get(key)?
            && !value.is_empty()
        {
            return Ok(Some(value));
        }

        if let Ok(value) = std::env::var(key)
            && !value.is_empty()
        {
            return Ok(Some(value));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_store() -> SecretStore {
        SecretStore::open(":memory:").unwrap()
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let store = mem_store();
        assert!(store.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn set_and_get() {
        let store = mem_store();
        store.set("GOOGLE_API_KEY", "AIza-test").unwrap();
        assert_eq!(store.get("GOOGLE_API_KEY").unwrap().unwrap(), "AIza-test");
    }

    #[test]
    fn set_overwrites_existing() {
        let store = mem_store();
        store.set("GOOGLE_API_KEY", "old").unwrap();
        store.set("GOOGLE_API_KEY", "new").unwrap();
        assert_eq!(store.get("GOOGLE_API_KEY").unwrap().unwrap(), "new");
    }

    #[test]
    fn remove_deletes_key() {
        let store = mem_store();
        store.set("GOOGLE_API_KEY", "test").unwrap();
        store.remove("GOOGLE_API_KEY").unwrap();
        assert!(store.get("GOOGLE_API_KEY").unwrap().is_none());
    }

    #[test]
    fn remove_nonexistent_is_ok() {
        let store = mem_store();
        store.remove("nonexistent").unwrap();
    }

    #[test]
    fn resolve_prefers_stored_value() {
        let store = mem_store();
        store.set("PYTHIA_TEST_STORED_KEY", "from-store").unwrap();
        assert_eq!(
            store.resolve("PYTHIA_TEST_STORED_KEY").unwrap().unwrap(),
            "from-store"
        );
    }

    #[test]
    fn resolve_missing_everywhere_is_none() {
        let store = mem_store();
        // Key chosen so no environment could plausibly define it.
        assert!(
            store
                .resolve("PYTHIA_TEST_KEY_THAT_DOES_NOT_EXIST")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn resolve_skips_empty_stored_value() {
        let store = mem_store();
        store.set("PYTHIA_TEST_EMPTY_KEY", "").unwrap();
        assert!(store.resolve("PYTHIA_TEST_EMPTY_KEY").unwrap().is_none());
    }
}
