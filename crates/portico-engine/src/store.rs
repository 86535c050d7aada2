//! SQLite-backed dedup registry: admitted origin tags and per-actor
//! import counters.
//!
//! Admission state is scoped per destination registry. A row with a NULL
//! `token_index` is a reservation held by an in-flight import; reservation
//! relies on the primary key for atomic insert-if-absent, so two
//! concurrent imports of one origin tag cannot both pass.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use starknet::core::types::Felt;

use portico_core::ActorStats;

/// Store of admitted origin tags and per-actor statistics.
///
/// Shared global mutable state: every actor's imports observe and are
/// constrained by every other actor's prior admissions. Clones share the
/// same underlying database.
#[derive(Clone)]
pub struct DedupStore {
    conn: Arc<Mutex<Connection>>,
}

fn felt_to_blob(felt: Felt) -> Vec<u8> {
    felt.to_bytes_be().to_vec()
}

impl DedupStore {
    /// Create or open the database at `db_path`.
    pub fn open(db_path: &str) -> Result<Self> {
        Self::init(Connection::open(db_path)?)
    }

    /// Open an isolated in-memory store.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS admitted_origins (
                registry BLOB NOT NULL,
                origin_tag TEXT NOT NULL,
                token_index INTEGER,
                admitted_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (registry, origin_tag)
            );
            CREATE INDEX IF NOT EXISTS idx_admitted_origins_registry ON admitted_origins(registry);

            CREATE TABLE IF NOT EXISTS actor_stats (
                actor BLOB PRIMARY KEY,
                total_imported INTEGER NOT NULL DEFAULT 0,
                total_failed INTEGER NOT NULL DEFAULT 0,
                last_import_time INTEGER
            );
            ",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Whether `origin_tag` has any row for `registry`, reservations
    /// included. This is the duplicate check used during validation.
    pub fn contains(&self, registry: Felt, origin_tag: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let row: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM admitted_origins WHERE registry = ?1 AND origin_tag = ?2",
                params![felt_to_blob(registry), origin_tag],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    /// Whether `origin_tag` was fully admitted (reservation finalized).
    pub fn is_admitted(&self, registry: Felt, origin_tag: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let row: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM admitted_origins
                 WHERE registry = ?1 AND origin_tag = ?2 AND token_index IS NOT NULL",
                params![felt_to_blob(registry), origin_tag],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    /// Atomically reserve `origin_tag` for an in-flight import.
    ///
    /// Returns false when the tag already has a row, admitted or reserved.
    pub fn reserve(&self, registry: Felt, origin_tag: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO admitted_origins (registry, origin_tag) VALUES (?1, ?2)",
            params![felt_to_blob(registry), origin_tag],
        )?;
        Ok(inserted > 0)
    }

    /// Finalize a reservation after a successful mint: record the minted
    /// token index and credit the actor, in a single transaction.
    pub fn finalize(
        &self,
        registry: Felt,
        origin_tag: &str,
        token_index: u64,
        actor: Felt,
        timestamp: i64,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE admitted_origins SET token_index = ?3
             WHERE registry = ?1 AND origin_tag = ?2",
            params![felt_to_blob(registry), origin_tag, token_index],
        )?;
        tx.execute(
            "INSERT INTO actor_stats (actor, total_imported, total_failed, last_import_time)
             VALUES (?1, 1, 0, ?2)
             ON CONFLICT(actor) DO UPDATE SET
                total_imported = total_imported + 1,
                last_import_time = excluded.last_import_time",
            params![felt_to_blob(actor), timestamp],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Drop a reservation after a failed mint. Finalized admissions are
    /// never removed by this path.
    pub fn release(&self, registry: Felt, origin_tag: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM admitted_origins
             WHERE registry = ?1 AND origin_tag = ?2 AND token_index IS NULL",
            params![felt_to_blob(registry), origin_tag],
        )?;
        Ok(())
    }

    /// Charge one failed import against `actor`.
    pub fn record_failure(&self, actor: Felt) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO actor_stats (actor, total_imported, total_failed)
             VALUES (?1, 0, 1)
             ON CONFLICT(actor) DO UPDATE SET total_failed = total_failed + 1",
            params![felt_to_blob(actor)],
        )?;
        Ok(())
    }

    /// Counters for `actor`. Unknown actors read as all zeros.
    pub fn stats_for(&self, actor: Felt) -> Result<ActorStats> {
        let conn = self.conn.lock().unwrap();
        let stats = conn
            .query_row(
                "SELECT total_imported, total_failed, last_import_time
                 FROM actor_stats WHERE actor = ?1",
                params![felt_to_blob(actor)],
                |row| {
                    Ok(ActorStats {
                        total_imported: row.get(0)?,
                        total_failed: row.get(1)?,
                        last_import_time: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(stats.unwrap_or_default())
    }

    /// Token index `origin_tag` was admitted at, if it was finalized
    /// through this store.
    ///
    /// Serves as an auxiliary index over the destination registry: it is
    /// updated in the same transaction as each admission, so callers can
    /// skip the linear registry scan for tokens this engine minted.
    pub fn admitted_index(&self, registry: Felt, origin_tag: &str) -> Result<Option<u64>> {
        let conn = self.conn.lock().unwrap();
        let index: Option<u64> = conn
            .query_row(
                "SELECT token_index FROM admitted_origins
                 WHERE registry = ?1 AND origin_tag = ?2 AND token_index IS NOT NULL",
                params![felt_to_blob(registry), origin_tag],
                |row| row.get(0),
            )
            .optional()?;
        Ok(index)
    }

    /// Remove `origin_tag` from the admitted set, allowing re-import.
    ///
    /// Administrative path for mistaken admissions and for reservations
    /// orphaned by a crash mid-import.
    pub fn clear(&self, registry: Felt, origin_tag: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            "DELETE FROM admitted_origins WHERE registry = ?1 AND origin_tag = ?2",
            params![felt_to_blob(registry), origin_tag],
        )?;
        Ok(removed > 0)
    }

    /// Number of finalized admissions for `registry`.
    pub fn admitted_count(&self, registry: Felt) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM admitted_origins
             WHERE registry = ?1 AND token_index IS NOT NULL",
            params![felt_to_blob(registry)],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: Felt = Felt::from_hex_unchecked("0xa");
    const OTHER_REGISTRY: Felt = Felt::from_hex_unchecked("0xb");
    const ACTOR: Felt = Felt::from_hex_unchecked("0xc");

    #[test]
    fn reserve_is_insert_if_absent() {
        let store = DedupStore::in_memory().unwrap();
        assert!(store.reserve(REGISTRY, "0xAAA/1").unwrap());
        assert!(!store.reserve(REGISTRY, "0xAAA/1").unwrap());
    }

    #[test]
    fn reservation_blocks_but_is_not_admitted() {
        let store = DedupStore::in_memory().unwrap();
        store.reserve(REGISTRY, "0xAAA/1").unwrap();
        assert!(store.contains(REGISTRY, "0xAAA/1").unwrap());
        assert!(!store.is_admitted(REGISTRY, "0xAAA/1").unwrap());
    }

    #[test]
    fn finalize_admits_and_credits_actor() {
        let store = DedupStore::in_memory().unwrap();
        store.reserve(REGISTRY, "0xAAA/1").unwrap();
        store.finalize(REGISTRY, "0xAAA/1", 7, ACTOR, 1_700_000_000).unwrap();

        assert!(store.is_admitted(REGISTRY, "0xAAA/1").unwrap());
        assert_eq!(store.admitted_count(REGISTRY).unwrap(), 1);
        let stats = store.stats_for(ACTOR).unwrap();
        assert_eq!(stats.total_imported, 1);
        assert_eq!(stats.total_failed, 0);
        assert_eq!(stats.last_import_time, Some(1_700_000_000));
    }

    #[test]
    fn release_drops_only_reservations() {
        let store = DedupStore::in_memory().unwrap();
        store.reserve(REGISTRY, "0xAAA/1").unwrap();
        store.release(REGISTRY, "0xAAA/1").unwrap();
        assert!(!store.contains(REGISTRY, "0xAAA/1").unwrap());

        store.reserve(REGISTRY, "0xAAA/2").unwrap();
        store.finalize(REGISTRY, "0xAAA/2", 1, ACTOR, 0).unwrap();
        store.release(REGISTRY, "0xAAA/2").unwrap();
        assert!(store.is_admitted(REGISTRY, "0xAAA/2").unwrap());
    }

    #[test]
    fn admission_is_scoped_per_registry() {
        let store = DedupStore::in_memory().unwrap();
        assert!(store.reserve(REGISTRY, "0xAAA/1").unwrap());
        assert!(store.reserve(OTHER_REGISTRY, "0xAAA/1").unwrap());
    }

    #[test]
    fn failure_counter_is_monotonic() {
        let store = DedupStore::in_memory().unwrap();
        store.record_failure(ACTOR).unwrap();
        store.record_failure(ACTOR).unwrap();
        let stats = store.stats_for(ACTOR).unwrap();
        assert_eq!(stats.total_failed, 2);
        assert_eq!(stats.total_imported, 0);
        assert_eq!(stats.last_import_time, None);
    }

    #[test]
    fn admitted_index_sees_only_finalized_rows() {
        let store = DedupStore::in_memory().unwrap();
        store.reserve(REGISTRY, "0xAAA/1").unwrap();
        assert_eq!(store.admitted_index(REGISTRY, "0xAAA/1").unwrap(), None);

        store.finalize(REGISTRY, "0xAAA/1", 7, ACTOR, 0).unwrap();
        assert_eq!(store.admitted_index(REGISTRY, "0xAAA/1").unwrap(), Some(7));
        assert_eq!(store.admitted_index(OTHER_REGISTRY, "0xAAA/1").unwrap(), None);
    }

    #[test]
    fn clear_allows_reimport() {
        let store = DedupStore::in_memory().unwrap();
        store.reserve(REGISTRY, "0xAAA/1").unwrap();
        store.finalize(REGISTRY, "0xAAA/1", 1, ACTOR, 0).unwrap();

        assert!(store.clear(REGISTRY, "0xAAA/1").unwrap());
        assert!(!store.clear(REGISTRY, "0xAAA/1").unwrap());
        assert!(store.reserve(REGISTRY, "0xAAA/1").unwrap());
    }

    #[test]
    fn unknown_actor_reads_zeroed_stats() {
        let store = DedupStore::in_memory().unwrap();
        assert_eq!(store.stats_for(ACTOR).unwrap(), ActorStats::default());
    }
}
