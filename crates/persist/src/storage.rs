use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use metrics::histogram;
use rusqlite::OptionalExtension;

/// String key/value storage. The durable analogue of a browser's local storage.
pub trait KvStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed storage. Simple, synchronous; a handful of keys.
pub struct SqliteStorage {
    db: Mutex<rusqlite::Connection>,
}

impl SqliteStorage {
    pub fn open(path: &str) -> Result<Self> {
        let started = std::time::Instant::now();
        let db = rusqlite::Connection::open(path).with_context(|| format!("opening sqlite db at {}", path))?;
        db.pragma_update(None, "journal_mode", "WAL").ok();
        db.pragma_update(None, "synchronous", "NORMAL").ok();
        db.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )
        .context("creating kv table")?;
        let me = Self { db: Mutex::new(db) };
        histogram!("persist_open_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(me)
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>> {
        self.db.lock().map_err(|_| anyhow!("sqlite connection mutex poisoned"))
    }
}

impl KvStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let db = self.conn()?;
        let value: Option<String> = db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("reading key {}", key))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let started = std::time::Instant::now();
        let db = self.conn()?;
        db.execute(
            "INSERT INTO kv(key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, crate::now_ts()),
        )
        .with_context(|| format!("writing key {}", key))?;
        histogram!("persist_put_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let db = self.conn()?;
        db.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// In-memory storage with an optional byte quota (sum of key + value lengths).
#[derive(Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self { map: Mutex::new(HashMap::new()), quota_bytes: Some(quota_bytes) }
    }

    pub fn len(&self) -> usize { self.map.lock().map(|m| m.len()).unwrap_or(0) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl KvStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.map.lock().map_err(|_| anyhow!("memory storage poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.map.lock().map_err(|_| anyhow!("memory storage poisoned"))?;
        if let Some(quota) = self.quota_bytes {
            let others: usize = map.iter().filter(|(k, _)| k.as_str() != key).map(|(k, v)| k.len() + v.len()).sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(anyhow!("storage quota exceeded: need {} bytes, quota {}", needed, quota));
            }
        }
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.map.lock().map_err(|_| anyhow!("memory storage poisoned"))?;
        map.remove(key);
        Ok(())
    }
}

pub fn default_db_path() -> String {
    if let Some(home) = std::env::var_os("HOME") {
        let mut p = std::path::PathBuf::from(home);
        p.push(".canteen");
        let _ = std::fs::create_dir_all(&p);
        p.push("canteen.db");
        return p.to_string_lossy().to_string();
    }
    // Fallback to current directory
    "canteen.db".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> String {
        let dir = std::env::temp_dir();
        let f = format!("canteen-test-{}.db", std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().as_nanos());
        dir.join(f).to_string_lossy().to_string()
    }

    #[test]
    fn sqlite_set_get_overwrite_remove() {
        let path = temp_db();
        let s = SqliteStorage::open(&path).unwrap();
        assert_eq!(s.get("k").unwrap(), None);
        s.set("k", "v1").unwrap();
        s.set("k", "v2").unwrap();
        assert_eq!(s.get("k").unwrap().as_deref(), Some("v2"));
        s.remove("k").unwrap();
        assert_eq!(s.get("k").unwrap(), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn sqlite_survives_reopen() {
        let path = temp_db();
        {
            let s = SqliteStorage::open(&path).unwrap();
            s.set("canteen:x", "hello").unwrap();
        }
        let s = SqliteStorage::open(&path).unwrap();
        assert_eq!(s.get("canteen:x").unwrap().as_deref(), Some("hello"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn memory_quota_rejects_oversized_writes() {
        let s = MemoryStorage::with_quota(10);
        s.set("a", "1234").unwrap();
        assert!(s.set("b", "123456789").is_err());
        // overwriting an existing key only counts the new value
        s.set("a", "12345678").unwrap();
        assert_eq!(s.len(), 1);
    }
}
