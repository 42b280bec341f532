// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent cache of explorer results in a single redb file
//! (`$DATA_DIR/transactions.redb`).
//!
//! Rows are immutable and are never evicted: once an address has history
//! cached for a chain, the explorer is not consulted again for that chain.

pub mod tx_database;

pub use tx_database::{
    HistoryCursor, InsertSummary, StoredTransaction, TxDatabase, TxDbError, TxDbResult,
};
