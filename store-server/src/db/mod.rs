//! Column store - the durable system of record
//!
//! A thin column-oriented layer over redb. Each logical table maps to one
//! redb table; each row is an ordered map of `family:qualifier -> value`
//! serialized as JSON. String row keys sort lexicographically, which is
//! what gives the date-prefixed order keys their chronological scan order.
//!
//! # Tables
//!
//! | Table | Row key | Families | Purpose |
//! |-------|---------|----------|---------|
//! | `order_history` | `{yyyyMMdd}_{seq6}_{millis}` | base, addr, items | order system of record |
//! | `cart_data` | userId | items, meta | durable cart copy |
//! | `products` | productId | info | product catalog |
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns (copy-on-write
//! with atomic pointer swap), so a completed write survives process death.
//! Operations are synchronous; callers run them inline from async code the
//! same way the rest of the workspace treats redb.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use shared::AppError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(e) => AppError::Serialization(e.to_string()),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Logical tables of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Orders,
    Carts,
    Products,
}

impl TableKind {
    fn name(self) -> &'static str {
        match self {
            TableKind::Orders => "order_history",
            TableKind::Carts => "cart_data",
            TableKind::Products => "products",
        }
    }

    fn definition(self) -> TableDefinition<'static, &'static str, &'static [u8]> {
        TableDefinition::new(self.name())
    }
}

const ALL_TABLES: [TableKind; 3] = [TableKind::Orders, TableKind::Carts, TableKind::Products];

/// One row: `family:qualifier -> value`
///
/// Missing columns are the norm, not an error; readers default them so
/// rows written before a schema addition stay readable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    columns: BTreeMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    fn qualified(family: &str, qualifier: &str) -> String {
        format!("{family}:{qualifier}")
    }

    pub fn put(&mut self, family: &str, qualifier: &str, value: impl Into<String>) {
        self.columns
            .insert(Self::qualified(family, qualifier), value.into());
    }

    pub fn get(&self, family: &str, qualifier: &str) -> Option<&str> {
        self.columns
            .get(&Self::qualified(family, qualifier))
            .map(String::as_str)
    }

    /// All `(qualifier, value)` pairs within one family
    pub fn family(&self, family: &str) -> impl Iterator<Item = (&str, &str)> {
        let prefix = format!("{family}:");
        self.columns
            .range(prefix.clone()..)
            .take_while(move |(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| {
                let qualifier = k.split_once(':').map(|(_, q)| q).unwrap_or(k.as_str());
                (qualifier, v.as_str())
            })
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Column store backed by redb
#[derive(Clone)]
pub struct ColumnStore {
    db: Arc<Database>,
}

impl ColumnStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (tests, ephemeral runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            for table in ALL_TABLES {
                let _ = write_txn.open_table(table.definition())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Write a full row (replaces any existing row at the key)
    pub fn put_row(&self, table: TableKind, key: &str, row: &Row) -> StorageResult<()> {
        let value = serde_json::to_vec(row)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(table.definition())?;
            t.insert(key, value.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_row(&self, table: TableKind, key: &str) -> StorageResult<Option<Row>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table.definition())?;
        match t.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn delete_row(&self, table: TableKind, key: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(table.definition())?;
            t.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// All rows whose key starts with `prefix`, in key order
    pub fn scan_prefix(&self, table: TableKind, prefix: &str) -> StorageResult<Vec<(String, Row)>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table.definition())?;

        let mut rows = Vec::new();
        for result in t.range(prefix..)? {
            let (key, value) = result?;
            if !key.value().starts_with(prefix) {
                break;
            }
            let row: Row = serde_json::from_slice(value.value())?;
            rows.push((key.value().to_string(), row));
        }
        Ok(rows)
    }

    /// Visit every row newest-key-first; return `false` from the visitor
    /// to stop the scan early.
    pub fn for_each_reverse(
        &self,
        table: TableKind,
        mut visit: impl FnMut(&str, Row) -> bool,
    ) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table.definition())?;

        for result in t.iter()?.rev() {
            let (key, value) = result?;
            let row: Row = serde_json::from_slice(value.value())?;
            if !visit(key.value(), row) {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(marker: &str) -> Row {
        let mut row = Row::new();
        row.put("base", "order_id", marker);
        row.put("base", "status", "PENDING_PAYMENT");
        row.put("items", "item_count", "2");
        row
    }

    #[test]
    fn put_get_delete_round_trip() {
        let store = ColumnStore::open_in_memory().unwrap();
        let row = sample_row("o1");

        store.put_row(TableKind::Orders, "20260107_000001_1", &row).unwrap();
        let loaded = store.get_row(TableKind::Orders, "20260107_000001_1").unwrap().unwrap();
        assert_eq!(loaded, row);
        assert_eq!(loaded.get("base", "order_id"), Some("o1"));
        assert_eq!(loaded.get("base", "missing"), None);

        store.delete_row(TableKind::Orders, "20260107_000001_1").unwrap();
        assert!(store.get_row(TableKind::Orders, "20260107_000001_1").unwrap().is_none());
    }

    #[test]
    fn prefix_scan_is_bounded_and_ordered() {
        let store = ColumnStore::open_in_memory().unwrap();
        store.put_row(TableKind::Orders, "20260107_000002_9", &sample_row("b")).unwrap();
        store.put_row(TableKind::Orders, "20260107_000001_5", &sample_row("a")).unwrap();
        store.put_row(TableKind::Orders, "20260108_000001_1", &sample_row("c")).unwrap();

        let rows = store.scan_prefix(TableKind::Orders, "20260107").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "20260107_000001_5");
        assert_eq!(rows[1].0, "20260107_000002_9");
    }

    #[test]
    fn reverse_scan_visits_newest_first_and_can_stop() {
        let store = ColumnStore::open_in_memory().unwrap();
        for day in ["20260105", "20260106", "20260107"] {
            let key = format!("{day}_000001_1");
            store.put_row(TableKind::Orders, &key, &sample_row(day)).unwrap();
        }

        let mut seen = Vec::new();
        store
            .for_each_reverse(TableKind::Orders, |_key, row| {
                seen.push(row.get("base", "order_id").unwrap_or("").to_string());
                seen.len() < 2
            })
            .unwrap();
        assert_eq!(seen, vec!["20260107".to_string(), "20260106".to_string()]);
    }

    #[test]
    fn reopening_a_database_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.redb");
        {
            let store = ColumnStore::open(&path).unwrap();
            store.put_row(TableKind::Products, "p1", &sample_row("p1")).unwrap();
        }

        let store = ColumnStore::open(&path).unwrap();
        let row = store.get_row(TableKind::Products, "p1").unwrap().unwrap();
        assert_eq!(row.get("base", "order_id"), Some("p1"));
    }

    #[test]
    fn family_iterates_only_its_columns() {
        let mut row = Row::new();
        row.put("items", "product_p1", "{}");
        row.put("items", "product_p2", "{}");
        row.put("meta", "total_items", "2");

        let items: Vec<(&str, &str)> = row.family("items").collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0, "product_p1");

        let meta: Vec<(&str, &str)> = row.family("meta").collect();
        assert_eq!(meta.len(), 1);
    }
}
