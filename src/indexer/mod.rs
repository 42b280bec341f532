// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transaction Indexer
//!
//! Cache-or-fetch access to transaction history. Requests are served from
//! the redb cache; the explorer is consulted only when the cache has nothing
//! for the requested address and chain.
//!
//! ## Strategy
//!
//! 1. **Single chain**: query the cache with the requested pagination. Any
//!    row at all is a hit. On a miss, fetch page 1 from the explorer at the
//!    requested limit, store it, and query again.
//! 2. **All chains**: query the cross-chain index. If it cannot fill the
//!    page, fetch every configured chain concurrently, wait for all of them,
//!    and query again. A failing chain is logged and does not fail the call.
//!
//! ## Staleness
//!
//! There is no invalidation. Once an address has cached rows for a chain,
//! newer on-chain activity is not picked up for that chain.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::blockchain::{
    ChainConfig, ChainRegistry, ChainTransfer, ExplorerClient, ExplorerError, TransactionSource,
    UnsupportedChain,
};
use crate::storage::{HistoryCursor, InsertSummary, StoredTransaction, TxDatabase, TxDbError};

/// Pagination mode for single-chain history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPage {
    Offset {
        limit: usize,
        offset: usize,
    },
    Cursor {
        limit: usize,
        cursor: Option<HistoryCursor>,
    },
}

impl HistoryPage {
    pub fn limit(&self) -> usize {
        match self {
            HistoryPage::Offset { limit, .. } | HistoryPage::Cursor { limit, .. } => *limit,
        }
    }
}

/// Cache-or-fetch orchestrator over the transaction database.
pub struct TransactionIndexer<S = ExplorerClient> {
    db: Arc<TxDatabase>,
    source: Arc<S>,
    chains: Arc<ChainRegistry>,
}

impl<S: TransactionSource> TransactionIndexer<S> {
    pub fn new(db: Arc<TxDatabase>, source: Arc<S>, chains: Arc<ChainRegistry>) -> Self {
        Self { db, source, chains }
    }

    /// History for one chain, filling the cache from the explorer on a miss.
    pub async fn transactions(
        &self,
        address: &str,
        chain_id: u64,
        page: HistoryPage,
    ) -> Result<Vec<StoredTransaction>, IndexerError> {
        let chain = self.chains.ensure_supported(chain_id)?;

        let cached = self.query(address, chain_id, page)?;
        if !cached.is_empty() {
            tracing::debug!(
                chain_id,
                address = %address,
                rows = cached.len(),
                "Serving transactions from cache"
            );
            return Ok(cached);
        }

        let summary =
            fetch_and_store(self.source.as_ref(), &self.db, address, chain, page.limit()).await?;
        tracing::info!(
            chain_id,
            address = %address,
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            failed = summary.failed,
            "Cache miss filled from explorer"
        );

        Ok(self.query(address, chain_id, page)?)
    }

    /// Newest history across every configured chain.
    pub async fn transactions_all_chains(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<StoredTransaction>, IndexerError> {
        let cached = self.db.history_all_chains(address, limit)?;
        if cached.len() >= limit {
            return Ok(cached);
        }

        let per_chain = (limit / self.chains.len().max(1)).max(1);
        let mut tasks = JoinSet::new();
        for chain in self.chains.iter() {
            let source = self.source.clone();
            let db = self.db.clone();
            let chain = chain.clone();
            let address = address.to_string();
            tasks.spawn(async move {
                let result =
                    fetch_and_store(source.as_ref(), &db, &address, &chain, per_chain).await;
                (chain.chain_id, result)
            });
        }

        // Every chain gets to finish; failures only cost that chain's rows
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((chain_id, Ok(summary))) => {
                    tracing::debug!(
                        chain_id,
                        inserted = summary.inserted,
                        duplicates = summary.duplicates,
                        "Chain history fetched"
                    );
                }
                Ok((chain_id, Err(e))) => {
                    tracing::warn!(
                        chain_id,
                        address = %address,
                        error = %e,
                        "Failed to fetch transactions for chain"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Chain fetch task failed");
                }
            }
        }

        Ok(self.db.history_all_chains(address, limit)?)
    }

    /// Number of cached rows for an address on a supported chain.
    pub fn count(&self, address: &str, chain_id: u64) -> Result<u64, IndexerError> {
        self.chains.ensure_supported(chain_id)?;
        Ok(self.db.count(address, chain_id)?)
    }

    fn query(
        &self,
        address: &str,
        chain_id: u64,
        page: HistoryPage,
    ) -> Result<Vec<StoredTransaction>, TxDbError> {
        match page {
            HistoryPage::Offset { limit, offset } => {
                self.db.history(address, chain_id, limit, offset)
            }
            HistoryPage::Cursor { limit, cursor } => {
                self.db.history_by_cursor(address, chain_id, limit, cursor)
            }
        }
    }
}

/// Fetch the first explorer page for one chain and store it.
async fn fetch_and_store<S: TransactionSource>(
    source: &S,
    db: &TxDatabase,
    address: &str,
    chain: &ChainConfig,
    page_size: usize,
) -> Result<InsertSummary, IndexerError> {
    let page_size = u32::try_from(page_size).unwrap_or(u32::MAX);
    let transfers = source
        .fetch_transactions(address, chain, 1, page_size)
        .await?;

    if transfers.is_empty() {
        return Ok(InsertSummary::default());
    }

    let records: Vec<StoredTransaction> = transfers
        .into_iter()
        .map(|t| to_stored(address, chain, t))
        .collect();
    Ok(db.insert_batch(&records))
}

fn to_stored(address: &str, chain: &ChainConfig, transfer: ChainTransfer) -> StoredTransaction {
    StoredTransaction {
        hash: transfer.hash,
        address: address.to_string(),
        chain_id: chain.chain_id,
        block_number: transfer.block_number,
        timestamp: transfer.timestamp,
        from: transfer.from,
        to: transfer.to,
        amount: transfer.value,
        token: transfer
            .token_symbol
            .unwrap_or_else(|| chain.native.symbol.to_string()),
    }
}

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error(transparent)]
    UnsupportedChain(#[from] UnsupportedChain),

    #[error("Explorer error: {0}")]
    Fetch(#[from] ExplorerError),

    #[error("Database error: {0}")]
    Db(#[from] TxDbError),
}
