//! Two-tier preview cache.
//!
//! Entries live in a bounded in-memory map in front of a SQLite table, keyed
//! by file path and validated by modification time. The memory tier evicts in
//! insertion order (FIFO): reads never promote an entry, so a long-lived hot
//! entry still ages out once enough new keys arrive. Durable-tier I/O errors
//! always propagate to the caller; they are never downgraded to a miss.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use rusqlite::params;
use tracing::debug;

use crate::db::{get_conn, DbPool};
use crate::error::Result;

/// A cached preview for one file.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The file path; unique per tier.
    pub file_path: String,
    /// Encoded preview image (data URL).
    pub data_url: String,
    /// Modification time of the source file when the preview was generated.
    pub mtime: i64,
}

impl CacheEntry {
    /// An entry is fresh for a query iff its stored mtime equals the query's.
    pub fn is_fresh(&self, mtime: i64) -> bool {
        self.mtime == mtime
    }
}

/// Memory tier: lookup map plus an explicit insertion-order key queue.
///
/// The queue, not map iteration order, decides eviction.
struct MemoryTier {
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
}

/// Durable + in-memory preview store.
pub struct CacheStore {
    pool: DbPool,
    memory: Mutex<MemoryTier>,
    capacity: usize,
}

impl CacheStore {
    /// Create a cache store over an initialized pool.
    pub fn new(pool: DbPool, capacity: usize) -> Self {
        Self {
            pool,
            memory: Mutex::new(MemoryTier {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Look up an entry, memory tier first. On a memory miss the durable tier
    /// is consulted and, if it has the entry, the memory tier is populated
    /// before returning.
    pub fn get(&self, file_path: &str) -> Result<Option<CacheEntry>> {
        if let Some(entry) = self.get_memory(file_path) {
            return Ok(Some(entry));
        }

        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(
            "SELECT file_path, data_url, mtime FROM previews WHERE file_path = ?1",
        )?;
        let mut rows = stmt.query_map(params![file_path], |row| {
            Ok(CacheEntry {
                file_path: row.get(0)?,
                data_url: row.get(1)?,
                mtime: row.get(2)?,
            })
        })?;

        match rows.next() {
            Some(row) => {
                let entry = row?;
                self.insert_memory(entry.clone());
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Memory-tier-only lookup. Never touches the durable tier and never
    /// reorders the eviction queue.
    pub fn get_memory(&self, file_path: &str) -> Option<CacheEntry> {
        self.memory.lock().entries.get(file_path).cloned()
    }

    /// Write an entry: durable tier first, then memory tier.
    pub fn put(&self, entry: CacheEntry) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        conn.execute(
            "INSERT INTO previews (file_path, data_url, mtime) VALUES (?1, ?2, ?3)
             ON CONFLICT(file_path) DO UPDATE SET
                 data_url = excluded.data_url,
                 mtime = excluded.mtime",
            params![entry.file_path, entry.data_url, entry.mtime],
        )?;

        self.insert_memory(entry);
        Ok(())
    }

    /// Wipe both tiers. Used before a full batch regeneration so stale
    /// entries cannot short-circuit fresh work.
    pub fn clear(&self) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        conn.execute("DELETE FROM previews", [])?;

        let mut memory = self.memory.lock();
        memory.entries.clear();
        memory.order.clear();
        Ok(())
    }

    /// Number of entries currently in the memory tier.
    pub fn memory_len(&self) -> usize {
        self.memory.lock().entries.len()
    }

    fn insert_memory(&self, entry: CacheEntry) {
        let mut memory = self.memory.lock();

        if memory.entries.contains_key(&entry.file_path) {
            // Overwrite keeps the key's original queue position.
            memory.entries.insert(entry.file_path.clone(), entry);
            return;
        }

        if memory.entries.len() >= self.capacity {
            if let Some(oldest) = memory.order.pop_front() {
                debug!(path = %oldest, "evicting oldest memory-tier preview");
                memory.entries.remove(&oldest);
            }
        }

        memory.order.push_back(entry.file_path.clone());
        memory.entries.insert(entry.file_path.clone(), entry);
    }
}
