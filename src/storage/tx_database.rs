// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded transaction database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `transactions`: tx_hash → serialized StoredTransaction
//! - `chain_tx_index`: `address|chain|!timestamp|!block|tx_hash` → tx_hash
//! - `address_tx_index`: `address|!timestamp|!block|tx_hash` → tx_hash
//!
//! Timestamps and block numbers are stored inverted and big-endian, so a
//! forward range scan yields newest first (timestamp desc, then block desc).
//! Addresses are lowercased in index keys; the stored record keeps the
//! address as it was supplied.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: tx_hash → serialized StoredTransaction (JSON bytes).
const TRANSACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("transactions");

/// Per-chain history index.
const CHAIN_TX_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("chain_tx_index");

/// Cross-chain history index.
const ADDRESS_TX_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("address_tx_index");

/// Records written per write transaction in [`TxDatabase::insert_batch`].
pub const INSERT_CHUNK_SIZE: usize = 10;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TxDbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type TxDbResult<T> = Result<T, TxDbError>;

// =============================================================================
// Records
// =============================================================================

/// A cached on-chain transfer. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredTransaction {
    /// Transaction hash (primary key)
    pub hash: String,
    /// Address whose history this row belongs to
    pub address: String,
    pub chain_id: u64,
    pub block_number: u64,
    /// Unix timestamp in seconds
    pub timestamp: u64,
    pub from: String,
    pub to: String,
    /// Amount in smallest unit
    pub amount: String,
    /// Token symbol (e.g., "ETH", "USDC")
    pub token: String,
}

/// Keyset position: only rows strictly older than `timestamp` and strictly
/// below `block_number` are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCursor {
    pub timestamp: u64,
    pub block_number: u64,
}

/// Outcome of a bulk insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: usize,
    pub duplicates: usize,
    /// Records in chunks whose write transaction failed
    pub failed: usize,
}

// =============================================================================
// Index Key Helpers
// =============================================================================

fn address_prefix(address: &str) -> Vec<u8> {
    let addr = address.to_lowercase();
    let mut prefix = Vec::with_capacity(addr.len() + 1 + 8);
    prefix.extend_from_slice(addr.as_bytes());
    prefix.push(b'|');
    prefix
}

fn chain_prefix(address: &str, chain_id: u64) -> Vec<u8> {
    let mut prefix = address_prefix(address);
    prefix.extend_from_slice(&chain_id.to_be_bytes());
    prefix
}

/// Append the ordering suffix (`!timestamp | !block | tx_hash`) to a prefix.
fn with_order_suffix(mut key: Vec<u8>, timestamp: u64, block_number: u64, hash: &str) -> Vec<u8> {
    key.extend_from_slice(&(!timestamp).to_be_bytes());
    key.extend_from_slice(&(!block_number).to_be_bytes());
    key.extend_from_slice(hash.as_bytes());
    key
}

fn chain_index_key(tx: &StoredTransaction) -> Vec<u8> {
    with_order_suffix(
        chain_prefix(&tx.address, tx.chain_id),
        tx.timestamp,
        tx.block_number,
        &tx.hash,
    )
}

fn address_index_key(tx: &StoredTransaction) -> Vec<u8> {
    with_order_suffix(
        address_prefix(&tx.address),
        tx.timestamp,
        tx.block_number,
        &tx.hash,
    )
}

/// Upper bound for a range scan: past any key starting with `prefix`.
///
/// Hashes are UTF-8 and can never start with a 0xFF byte.
fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = Vec::with_capacity(prefix.len() + 17);
    end.extend_from_slice(prefix);
    end.extend_from_slice(&[0xFF; 17]);
    end
}

// =============================================================================
// TxDatabase
// =============================================================================

/// Embedded ACID transaction database.
pub struct TxDatabase {
    db: Database,
}

impl TxDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> TxDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TRANSACTIONS)?;
            let _ = write_txn.open_table(CHAIN_TX_INDEX)?;
            let _ = write_txn.open_table(ADDRESS_TX_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Confirm the database can serve reads.
    pub fn check(&self) -> TxDbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(TRANSACTIONS)?;
        Ok(())
    }

    /// Look up a single transaction by hash.
    pub fn get_transaction(&self, hash: &str) -> TxDbResult<Option<StoredTransaction>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRANSACTIONS)?;
        match table.get(hash)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Highest block number cached for an address on a chain, 0 if none.
    pub fn latest_block(&self, address: &str, chain_id: u64) -> TxDbResult<u64> {
        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(CHAIN_TX_INDEX)?;

        let prefix = chain_prefix(address, chain_id);
        let end = prefix_end(&prefix);

        let mut latest = 0;
        for entry in idx_table.range(prefix.as_slice()..end.as_slice())? {
            let (key, _) = entry?;
            if let Some((_, block)) = decode_order(&key.value()[prefix.len()..]) {
                latest = latest.max(block);
            }
        }
        Ok(latest)
    }

    /// Offset-paginated history for an address on one chain, newest first.
    pub fn history(
        &self,
        address: &str,
        chain_id: u64,
        limit: usize,
        offset: usize,
    ) -> TxDbResult<Vec<StoredTransaction>> {
        let prefix = chain_prefix(address, chain_id);
        self.scan(CHAIN_TX_INDEX, &prefix, None, offset, limit)
    }

    /// Keyset-paginated history for an address on one chain, newest first.
    ///
    /// Without a cursor this is the first page.
    pub fn history_by_cursor(
        &self,
        address: &str,
        chain_id: u64,
        limit: usize,
        cursor: Option<HistoryCursor>,
    ) -> TxDbResult<Vec<StoredTransaction>> {
        let prefix = chain_prefix(address, chain_id);
        self.scan(CHAIN_TX_INDEX, &prefix, cursor, 0, limit)
    }

    /// Number of cached rows for an address on one chain.
    pub fn count(&self, address: &str, chain_id: u64) -> TxDbResult<u64> {
        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(CHAIN_TX_INDEX)?;

        let prefix = chain_prefix(address, chain_id);
        let end = prefix_end(&prefix);

        let mut count = 0;
        for entry in idx_table.range(prefix.as_slice()..end.as_slice())? {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    /// Newest rows for an address across every chain.
    pub fn history_all_chains(
        &self,
        address: &str,
        limit: usize,
    ) -> TxDbResult<Vec<StoredTransaction>> {
        let prefix = address_prefix(address);
        self.scan(ADDRESS_TX_INDEX, &prefix, None, 0, limit)
    }

    /// Newest rows on one chain for any of `addresses`.
    pub fn history_multi_address(
        &self,
        addresses: &[String],
        chain_id: u64,
        limit: usize,
    ) -> TxDbResult<Vec<StoredTransaction>> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for address in addresses {
            let prefix = chain_prefix(address, chain_id);
            for tx in self.scan(CHAIN_TX_INDEX, &prefix, None, 0, limit)? {
                if seen.insert(tx.hash.clone()) {
                    merged.push(tx);
                }
            }
        }

        merged.sort_by(|a, b| {
            (Reverse(a.timestamp), Reverse(a.block_number), &a.hash).cmp(&(
                Reverse(b.timestamp),
                Reverse(b.block_number),
                &b.hash,
            ))
        });
        merged.truncate(limit);
        Ok(merged)
    }

    /// Insert records, skipping hashes that are already stored.
    ///
    /// Records are committed in chunks of [`INSERT_CHUNK_SIZE`]. A chunk whose
    /// write transaction fails is logged and skipped; earlier chunks stay
    /// committed.
    pub fn insert_batch(&self, records: &[StoredTransaction]) -> InsertSummary {
        insert_chunked(records, |chunk| self.insert_chunk(chunk))
    }

    fn insert_chunk(&self, chunk: &[StoredTransaction]) -> TxDbResult<(usize, usize)> {
        let write_txn = self.db.begin_write()?;
        let counts = insert_records(&write_txn, chunk)?;
        write_txn.commit()?;
        Ok(counts)
    }

    /// Range-scan an index from `prefix`, resolving hashes to records.
    fn scan(
        &self,
        index: TableDefinition<'static, &'static [u8], &'static str>,
        prefix: &[u8],
        cursor: Option<HistoryCursor>,
        offset: usize,
        limit: usize,
    ) -> TxDbResult<Vec<StoredTransaction>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let start = match cursor {
            // Nothing is older than the epoch
            Some(c) if c.timestamp == 0 => return Ok(Vec::new()),
            Some(c) => {
                let mut start = prefix.to_vec();
                start.extend_from_slice(&(!(c.timestamp - 1)).to_be_bytes());
                start
            }
            None => prefix.to_vec(),
        };
        let end = prefix_end(prefix);

        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(index)?;
        let tx_table = read_txn.open_table(TRANSACTIONS)?;

        let mut skipped = 0;
        let mut results = Vec::with_capacity(limit.min(64));
        for entry in idx_table.range(start.as_slice()..end.as_slice())? {
            let (key, hash) = entry?;

            if let Some(c) = cursor {
                match decode_order(&key.value()[prefix.len()..]) {
                    Some((_, block)) if block < c.block_number => {}
                    _ => continue,
                }
            }

            if skipped < offset {
                skipped += 1;
                continue;
            }

            if let Some(value) = tx_table.get(hash.value())? {
                results.push(serde_json::from_slice(value.value())?);
            }

            if results.len() >= limit {
                break;
            }
        }

        Ok(results)
    }
}

/// Feed `records` to `write_chunk` in chunks of [`INSERT_CHUNK_SIZE`],
/// counting a failed chunk's records and moving on to the next.
fn insert_chunked(
    records: &[StoredTransaction],
    mut write_chunk: impl FnMut(&[StoredTransaction]) -> TxDbResult<(usize, usize)>,
) -> InsertSummary {
    let mut summary = InsertSummary::default();

    for (index, chunk) in records.chunks(INSERT_CHUNK_SIZE).enumerate() {
        match write_chunk(chunk) {
            Ok((inserted, duplicates)) => {
                summary.inserted += inserted;
                summary.duplicates += duplicates;
            }
            Err(e) => {
                tracing::warn!(
                    chunk = index,
                    records = chunk.len(),
                    error = %e,
                    "Failed to insert transaction chunk, skipping"
                );
                summary.failed += chunk.len();
            }
        }
    }

    tracing::debug!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        failed = summary.failed,
        "Transaction batch stored"
    );
    summary
}

fn insert_records(
    write_txn: &WriteTransaction,
    records: &[StoredTransaction],
) -> TxDbResult<(usize, usize)> {
    let mut tx_table = write_txn.open_table(TRANSACTIONS)?;
    let mut chain_idx = write_txn.open_table(CHAIN_TX_INDEX)?;
    let mut address_idx = write_txn.open_table(ADDRESS_TX_INDEX)?;

    let mut inserted = 0;
    let mut duplicates = 0;
    for tx in records {
        if tx_table.get(tx.hash.as_str())?.is_some() {
            duplicates += 1;
            continue;
        }

        let json = serde_json::to_vec(tx)?;
        tx_table.insert(tx.hash.as_str(), json.as_slice())?;
        chain_idx.insert(chain_index_key(tx).as_slice(), tx.hash.as_str())?;
        address_idx.insert(address_index_key(tx).as_slice(), tx.hash.as_str())?;
        inserted += 1;
    }

    Ok((inserted, duplicates))
}

/// Decode `(timestamp, block)` from the ordering suffix of an index key.
fn decode_order(suffix: &[u8]) -> Option<(u64, u64)> {
    let ts = u64::from_be_bytes(suffix.get(..8)?.try_into().ok()?);
    let block = u64::from_be_bytes(suffix.get(8..16)?.try_into().ok()?);
    Some((!ts, !block))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0x1111111111111111111111111111111111111111";
    const BOB: &str = "0x2222222222222222222222222222222222222222";
    const SEPOLIA: u64 = 11155111;
    const ARBITRUM: u64 = 421614;

    fn temp_db() -> (TxDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = TxDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn tx(hash: &str, address: &str, chain_id: u64, timestamp: u64, block: u64) -> StoredTransaction {
        StoredTransaction {
            hash: hash.to_string(),
            address: address.to_string(),
            chain_id,
            block_number: block,
            timestamp,
            from: address.to_string(),
            to: BOB.to_string(),
            amount: "1000000".to_string(),
            token: "USDC".to_string(),
        }
    }

    fn hashes(rows: &[StoredTransaction]) -> Vec<&str> {
        rows.iter().map(|r| r.hash.as_str()).collect()
    }

    #[test]
    fn insert_and_get_transaction() {
        let (db, _dir) = temp_db();
        let record = tx("0xaaa", ALICE, SEPOLIA, 1000, 10);
        let summary = db.insert_batch(std::slice::from_ref(&record));
        assert_eq!(summary.inserted, 1);

        let retrieved = db.get_transaction("0xaaa").unwrap().unwrap();
        assert_eq!(retrieved, record);
        assert!(db.get_transaction("0xmissing").unwrap().is_none());
    }

    #[test]
    fn insert_batch_is_idempotent() {
        let (db, _dir) = temp_db();
        let records = vec![
            tx("0x01", ALICE, SEPOLIA, 100, 1),
            tx("0x02", ALICE, SEPOLIA, 200, 2),
        ];

        let first = db.insert_batch(&records);
        assert_eq!(first.inserted, 2);
        assert_eq!(first.duplicates, 0);

        let second = db.insert_batch(&records);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(db.count(ALICE, SEPOLIA).unwrap(), 2);
    }

    #[test]
    fn duplicate_within_one_batch_is_skipped() {
        let (db, _dir) = temp_db();
        let mut changed = tx("0x01", ALICE, SEPOLIA, 999, 9);
        changed.amount = "5".to_string();
        let summary = db.insert_batch(&[tx("0x01", ALICE, SEPOLIA, 100, 1), changed]);
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.duplicates, 1);

        // First write wins; records are never updated
        let stored = db.get_transaction("0x01").unwrap().unwrap();
        assert_eq!(stored.timestamp, 100);
        assert_eq!(stored.amount, "1000000");
    }

    #[test]
    fn batches_larger_than_a_chunk_are_fully_written() {
        let (db, _dir) = temp_db();
        let records: Vec<_> = (0..25)
            .map(|i| tx(&format!("0x{i:04}"), ALICE, SEPOLIA, 1000 + i, 100 + i))
            .collect();

        let summary = db.insert_batch(&records);
        assert_eq!(
            summary,
            InsertSummary {
                inserted: 25,
                duplicates: 0,
                failed: 0
            }
        );
        assert_eq!(db.count(ALICE, SEPOLIA).unwrap(), 25);
    }

    #[test]
    fn failed_chunk_is_skipped_and_counted() {
        let (db, _dir) = temp_db();
        let records: Vec<_> = (0..25)
            .map(|i| tx(&format!("0x{i:04}"), ALICE, SEPOLIA, 1000 + i, 100 + i))
            .collect();

        let mut calls = 0;
        let summary = insert_chunked(&records, |chunk| {
            calls += 1;
            if calls == 2 {
                return Err(TxDbError::Io(std::io::Error::other("disk full")));
            }
            db.insert_chunk(chunk)
        });
        assert_eq!(
            summary,
            InsertSummary {
                inserted: 15,
                duplicates: 0,
                failed: 10
            }
        );

        // Chunks before and after the failure stay committed
        assert_eq!(db.count(ALICE, SEPOLIA).unwrap(), 15);
        assert!(db.get_transaction("0x0009").unwrap().is_some());
        assert!(db.get_transaction("0x0010").unwrap().is_none());
        assert!(db.get_transaction("0x0019").unwrap().is_none());
        assert!(db.get_transaction("0x0020").unwrap().is_some());

        // A retry fills the gap
        let retry = db.insert_batch(&records);
        assert_eq!(retry.inserted, 10);
        assert_eq!(retry.duplicates, 15);
        assert_eq!(db.count(ALICE, SEPOLIA).unwrap(), 25);
    }

    #[test]
    fn history_orders_by_timestamp_then_block_descending() {
        let (db, _dir) = temp_db();
        db.insert_batch(&[
            tx("0xold", ALICE, SEPOLIA, 100, 5),
            tx("0xnew_low", ALICE, SEPOLIA, 300, 7),
            tx("0xnew_high", ALICE, SEPOLIA, 300, 8),
            tx("0xmid", ALICE, SEPOLIA, 200, 6),
        ]);

        let rows = db.history(ALICE, SEPOLIA, 10, 0).unwrap();
        assert_eq!(hashes(&rows), vec!["0xnew_high", "0xnew_low", "0xmid", "0xold"]);
    }

    #[test]
    fn history_offset_pagination() {
        let (db, _dir) = temp_db();
        let records: Vec<_> = (0..5)
            .map(|i| tx(&format!("0x{i:04}"), ALICE, SEPOLIA, 1000 + i, 100 + i))
            .collect();
        db.insert_batch(&records);

        let page1 = db.history(ALICE, SEPOLIA, 2, 0).unwrap();
        assert_eq!(hashes(&page1), vec!["0x0004", "0x0003"]);

        let page2 = db.history(ALICE, SEPOLIA, 2, 2).unwrap();
        assert_eq!(hashes(&page2), vec!["0x0002", "0x0001"]);

        let page3 = db.history(ALICE, SEPOLIA, 2, 4).unwrap();
        assert_eq!(hashes(&page3), vec!["0x0000"]);

        assert!(db.history(ALICE, SEPOLIA, 2, 10).unwrap().is_empty());
    }

    #[test]
    fn address_matching_is_case_insensitive() {
        let (db, _dir) = temp_db();
        let mixed = "0xAbCdEf0123456789aBcDeF0123456789AbCdEf01";
        db.insert_batch(&[tx("0x01", mixed, SEPOLIA, 100, 1)]);

        let rows = db.history(&mixed.to_lowercase(), SEPOLIA, 10, 0).unwrap();
        assert_eq!(rows.len(), 1);
        // Record keeps the address as supplied
        assert_eq!(rows[0].address, mixed);
        assert_eq!(db.count(&mixed.to_uppercase().replace("0X", "0x"), SEPOLIA).unwrap(), 1);
    }

    #[test]
    fn history_is_scoped_to_chain_and_address() {
        let (db, _dir) = temp_db();
        db.insert_batch(&[
            tx("0x01", ALICE, SEPOLIA, 100, 1),
            tx("0x02", ALICE, ARBITRUM, 200, 2),
            tx("0x03", BOB, SEPOLIA, 300, 3),
        ]);

        assert_eq!(hashes(&db.history(ALICE, SEPOLIA, 10, 0).unwrap()), vec!["0x01"]);
        assert_eq!(hashes(&db.history(ALICE, ARBITRUM, 10, 0).unwrap()), vec!["0x02"]);
        assert_eq!(db.count(BOB, ARBITRUM).unwrap(), 0);
    }

    #[test]
    fn cursor_requires_both_timestamp_and_block_to_be_lower() {
        let (db, _dir) = temp_db();
        db.insert_batch(&[
            tx("0xa", ALICE, SEPOLIA, 100, 50),
            tx("0xb", ALICE, SEPOLIA, 90, 60),
            tx("0xc", ALICE, SEPOLIA, 80, 40),
        ]);

        let cursor = HistoryCursor {
            timestamp: 100,
            block_number: 50,
        };
        let rows = db
            .history_by_cursor(ALICE, SEPOLIA, 10, Some(cursor))
            .unwrap();
        // 0xa fails timestamp, 0xb fails block
        assert_eq!(hashes(&rows), vec!["0xc"]);
    }

    #[test]
    fn cursor_without_position_returns_first_page() {
        let (db, _dir) = temp_db();
        db.insert_batch(&[
            tx("0xa", ALICE, SEPOLIA, 100, 50),
            tx("0xb", ALICE, SEPOLIA, 90, 49),
        ]);

        let rows = db.history_by_cursor(ALICE, SEPOLIA, 1, None).unwrap();
        assert_eq!(hashes(&rows), vec!["0xa"]);

        let next = db
            .history_by_cursor(
                ALICE,
                SEPOLIA,
                1,
                Some(HistoryCursor {
                    timestamp: rows[0].timestamp,
                    block_number: rows[0].block_number,
                }),
            )
            .unwrap();
        assert_eq!(hashes(&next), vec!["0xb"]);
    }

    #[test]
    fn cursor_at_epoch_returns_nothing() {
        let (db, _dir) = temp_db();
        db.insert_batch(&[tx("0xa", ALICE, SEPOLIA, 100, 50)]);
        let rows = db
            .history_by_cursor(
                ALICE,
                SEPOLIA,
                10,
                Some(HistoryCursor {
                    timestamp: 0,
                    block_number: 100,
                }),
            )
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn latest_block_and_count() {
        let (db, _dir) = temp_db();
        assert_eq!(db.latest_block(ALICE, SEPOLIA).unwrap(), 0);
        assert_eq!(db.count(ALICE, SEPOLIA).unwrap(), 0);

        db.insert_batch(&[
            // Newest by time is not the highest block
            tx("0xa", ALICE, SEPOLIA, 300, 10),
            tx("0xb", ALICE, SEPOLIA, 200, 99),
            tx("0xc", ALICE, ARBITRUM, 100, 500),
        ]);

        assert_eq!(db.latest_block(ALICE, SEPOLIA).unwrap(), 99);
        assert_eq!(db.count(ALICE, SEPOLIA).unwrap(), 2);
    }

    #[test]
    fn history_all_chains_merges_chains() {
        let (db, _dir) = temp_db();
        db.insert_batch(&[
            tx("0x01", ALICE, SEPOLIA, 100, 1),
            tx("0x02", ALICE, ARBITRUM, 300, 2),
            tx("0x03", ALICE, SEPOLIA, 200, 3),
            tx("0x04", BOB, ARBITRUM, 400, 4),
        ]);

        let rows = db.history_all_chains(ALICE, 10).unwrap();
        assert_eq!(hashes(&rows), vec!["0x02", "0x03", "0x01"]);

        let limited = db.history_all_chains(ALICE, 2).unwrap();
        assert_eq!(hashes(&limited), vec!["0x02", "0x03"]);
    }

    #[test]
    fn history_multi_address_unions_addresses() {
        let (db, _dir) = temp_db();
        db.insert_batch(&[
            tx("0x01", ALICE, SEPOLIA, 100, 1),
            tx("0x02", BOB, SEPOLIA, 300, 2),
            tx("0x03", ALICE, SEPOLIA, 200, 3),
            tx("0x04", BOB, ARBITRUM, 400, 4),
        ]);

        let addresses = vec![ALICE.to_string(), BOB.to_uppercase().replace("0X", "0x")];
        let rows = db.history_multi_address(&addresses, SEPOLIA, 10).unwrap();
        assert_eq!(hashes(&rows), vec!["0x02", "0x03", "0x01"]);

        let limited = db.history_multi_address(&addresses, SEPOLIA, 1).unwrap();
        assert_eq!(hashes(&limited), vec!["0x02"]);

        // Quote characters are just part of the key
        let hostile = vec!["0x' OR '1'='1".to_string()];
        assert!(db.history_multi_address(&hostile, SEPOLIA, 10).unwrap().is_empty());
    }

    #[test]
    fn index_key_ordering() {
        // Newer timestamps should produce smaller composite keys (descending)
        let old = chain_index_key(&tx("0x1", ALICE, SEPOLIA, 1000, 5));
        let new = chain_index_key(&tx("0x2", ALICE, SEPOLIA, 2000, 4));
        assert!(new < old, "Newer timestamps should sort first");

        let low = chain_index_key(&tx("0x1", ALICE, SEPOLIA, 1000, 5));
        let high = chain_index_key(&tx("0x1", ALICE, SEPOLIA, 1000, 6));
        assert!(high < low, "Higher blocks should sort first within a second");

        let prefix = chain_prefix(ALICE, SEPOLIA);
        assert_eq!(decode_order(&old[prefix.len()..]), Some((1000, 5)));
        assert!(old.as_slice() < prefix_end(&prefix).as_slice());
    }
}
