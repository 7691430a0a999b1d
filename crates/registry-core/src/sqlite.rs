//! Persistent [`RegistryStore`] backed by a single SQLite connection.
//!
//! The original persistent store matched `Lookup` filters by exact owner
//! equality, diverging from the in-memory store's substring match. That
//! divergence is not preserved here: both variants match by substring, so
//! callers see identical `Lookup` behavior regardless of which store
//! backs the registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use rusqlite::{params, Connection};

use crate::error::{RegistryError, Result};
use crate::model::{BufferLocation, Filter, RegItem};
use crate::store::{Callback, CallbackId, RegistryStore};

/// `rusqlite::Connection` is `!Sync`, so a single connection is shared
/// behind a `Mutex`. Callbacks live in their own `RwLock`, same as
/// [`crate::memory::InMemoryStore`], since subscriptions are never
/// persisted.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    callbacks: RwLock<Vec<(CallbackId, Filter, Callback)>>,
    next_id: AtomicU64,
}

impl SqliteStore {
    /// Opens (creating if absent) the database at `path` and ensures the
    /// `items` table exists.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "opening sqlite registry store");
        let conn = Connection::open(path).map_err(|e| RegistryError::StorageFault(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            callbacks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        })
    }

    /// In-memory SQLite database, for tests and short-lived processes
    /// that want the persistent code path without a file on disk.
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| RegistryError::StorageFault(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            callbacks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS items (
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (owner, name)
            )",
            [],
        )
        .map_err(|e| RegistryError::StorageFault(e.to_string()))?;
        Ok(())
    }

    fn all_items(conn: &Connection) -> Result<Vec<RegItem>> {
        let mut stmt = conn
            .prepare("SELECT owner, name FROM items")
            .map_err(|e| RegistryError::StorageFault(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                let owner: String = row.get(0)?;
                let name: String = row.get(1)?;
                Ok((owner, name))
            })
            .map_err(|e| RegistryError::StorageFault(e.to_string()))?;
        let mut items = Vec::new();
        for row in rows {
            let (owner, name) = row.map_err(|e| RegistryError::StorageFault(e.to_string()))?;
            items.push(RegItem::new(owner, BufferLocation::near(name)));
        }
        Ok(items)
    }

    fn evaluate_callbacks(&self, conn: &Connection) -> Result<()> {
        let items = Self::all_items(conn)?;
        let callbacks = self.callbacks.read().expect("callbacks lock poisoned");
        for (_, filter, cb) in callbacks.iter() {
            let matches: Vec<RegItem> = items.iter().filter(|r| filter.matches(r)).cloned().collect();
            cb(&matches);
        }
        Ok(())
    }
}

impl RegistryStore for SqliteStore {
    fn register(&self, ri: RegItem) -> Result<()> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO items (owner, name) VALUES (?1, ?2)",
            params![ri.owner(), ri.location().name()],
        )
        .map_err(|e| {
            tracing::warn!(owner = ri.owner(), error = %e, "register failed");
            RegistryError::StorageFault(e.to_string())
        })?;
        self.evaluate_callbacks(&conn)
    }

    fn unregister(&self, ri: RegItem) -> Result<()> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        conn.execute(
            "DELETE FROM items WHERE owner = ?1 AND name = ?2",
            params![ri.owner(), ri.location().name()],
        )
        .map_err(|e| RegistryError::StorageFault(e.to_string()))?;
        self.evaluate_callbacks(&conn)
    }

    fn lookup(&self, f: &Filter) -> Result<Vec<RegItem>> {
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        let mut stmt = conn
            .prepare("SELECT owner, name FROM items WHERE owner LIKE '%' || ?1 || '%'")
            .map_err(|e| RegistryError::StorageFault(e.to_string()))?;
        let rows = stmt
            .query_map(params![f.text()], |row| {
                let owner: String = row.get(0)?;
                let name: String = row.get(1)?;
                Ok((owner, name))
            })
            .map_err(|e| RegistryError::StorageFault(e.to_string()))?;
        let mut items = Vec::new();
        for row in rows {
            let (owner, name) = row.map_err(|e| RegistryError::StorageFault(e.to_string()))?;
            items.push(RegItem::new(owner, BufferLocation::near(name)));
        }
        Ok(items)
    }

    fn add_callback(&self, f: Filter, cb: Callback) -> Result<CallbackId> {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        {
            let mut callbacks = self.callbacks.write().expect("callbacks lock poisoned");
            callbacks.push((id, f.clone(), cb));
        }
        let conn = self.conn.lock().expect("sqlite connection poisoned");
        let items = Self::all_items(&conn)?;
        drop(conn);
        let matches: Vec<RegItem> = items.iter().filter(|r| f.matches(r)).cloned().collect();
        let callbacks = self.callbacks.read().expect("callbacks lock poisoned");
        if let Some((_, _, cb)) = callbacks.iter().find(|(cid, _, _)| *cid == id) {
            cb(&matches);
        }
        Ok(id)
    }

    fn remove_callback(&self, id: CallbackId) {
        let mut callbacks = self.callbacks.write().expect("callbacks lock poisoned");
        callbacks.retain(|(cid, _, _)| *cid != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    fn item(owner: &str, loc: &str) -> RegItem {
        RegItem::new(owner, BufferLocation::near(loc))
    }

    #[test]
    fn db_register_when_empty() {
        let reg = SqliteStore::open_in_memory().unwrap();
        reg.register(item("host_process_01", "/shared_mem_01")).unwrap();
        let result = reg.lookup(&Filter::new("host_process_01")).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn db_register_two_remove_one_and_one() {
        let reg = SqliteStore::open_in_memory().unwrap();
        reg.register(item("host_process_01", "/shared_mem_01")).unwrap();
        reg.register(item("host_process_01", "/shared_mem_02")).unwrap();
        assert_eq!(reg.lookup(&Filter::new("host_process_01")).unwrap().len(), 2);

        reg.unregister(item("host_process_01", "/shared_mem_01")).unwrap();
        let result = reg.lookup(&Filter::new("host_process_01")).unwrap();
        assert_eq!(result.len(), 1);

        reg.unregister(result[0].clone()).unwrap();
        assert_eq!(reg.lookup(&Filter::new("host_process_01")).unwrap().len(), 0);
    }

    #[test]
    fn db_register_is_idempotent() {
        let reg = SqliteStore::open_in_memory().unwrap();
        for _ in 0..3 {
            reg.register(item("p", "/shared_mem_01")).unwrap();
        }
        assert_eq!(reg.lookup(&Filter::new("p")).unwrap().len(), 1);
    }

    #[test]
    fn db_add_callback_then_register_delivers_one_item() {
        let reg = SqliteStore::open_in_memory().unwrap();
        let recv = Arc::new(StdMutex::new(-1isize));
        let recv2 = Arc::clone(&recv);
        reg.add_callback(
            Filter::new("host_process_01"),
            Box::new(move |items| *recv2.lock().unwrap() = items.len() as isize),
        )
        .unwrap();
        reg.register(item("host_process_01", "/shared_mem_01")).unwrap();
        assert_eq!(*recv.lock().unwrap(), 1);
    }

    #[test]
    fn db_register_then_add_callback_delivers_current_snapshot() {
        let reg = SqliteStore::open_in_memory().unwrap();
        reg.register(item("host_process_01", "/shared_mem_01")).unwrap();
        let recv = Arc::new(StdMutex::new(-1isize));
        let recv2 = Arc::clone(&recv);
        reg.add_callback(
            Filter::new("host_process_01"),
            Box::new(move |items| *recv2.lock().unwrap() = items.len() as isize),
        )
        .unwrap();
        assert_eq!(*recv.lock().unwrap(), 1);
    }

    #[test]
    fn db_remove_callback_stops_further_delivery() {
        let reg = SqliteStore::open_in_memory().unwrap();
        let count = Arc::new(StdMutex::new(0));
        let count2 = Arc::clone(&count);
        let id = reg
            .add_callback(
                Filter::new("p"),
                Box::new(move |_items| *count2.lock().unwrap() += 1),
            )
            .unwrap();
        reg.register(item("p", "/a")).unwrap();
        reg.remove_callback(id);
        reg.register(item("p", "/b")).unwrap();
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn lookup_matches_by_substring_not_just_exact_owner() {
        let reg = SqliteStore::open_in_memory().unwrap();
        reg.register(item("host_process_01", "/shared_mem_01")).unwrap();
        assert_eq!(reg.lookup(&Filter::new("host_process")).unwrap().len(), 1);
    }
}
