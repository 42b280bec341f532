// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{
    blockchain::{ChainRegistry, ExplorerClient, ExplorerError},
    config::AppConfig,
    indexer::TransactionIndexer,
    providers::{PriceFeed, PriceFeedError},
    ratelimit::{
        InMemoryRateLimitStore, RateLimitPolicy, RateLimitStore, RateLimitTier, RateLimiter,
    },
    storage::{TxDatabase, TxDbError},
};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to create data directory: {0}")]
    DataDir(#[from] std::io::Error),
    #[error("failed to open transaction database: {0}")]
    Database(#[from] TxDbError),
    #[error("failed to build explorer client: {0}")]
    Explorer(#[from] ExplorerError),
    #[error("failed to build price feed: {0}")]
    PriceFeed(#[from] PriceFeedError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub chains: Arc<ChainRegistry>,
    pub db: Arc<TxDatabase>,
    pub explorer: Arc<ExplorerClient>,
    pub prices: Arc<PriceFeed>,
    pub indexer: Arc<TransactionIndexer>,
    pub rate_limits: Arc<dyn RateLimitStore>,
    pub public_limiter: RateLimiter,
    pub protected_limiter: RateLimiter,
}

impl AppState {
    /// Wire every component together from already-built parts.
    pub fn new(
        config: AppConfig,
        chains: ChainRegistry,
        db: TxDatabase,
        explorer: ExplorerClient,
        prices: PriceFeed,
    ) -> Self {
        let chains = Arc::new(chains);
        let db = Arc::new(db);
        let explorer = Arc::new(explorer);
        let indexer = Arc::new(TransactionIndexer::new(
            db.clone(),
            explorer.clone(),
            chains.clone(),
        ));

        let rate_limits: Arc<dyn RateLimitStore> = Arc::new(InMemoryRateLimitStore::new());
        let public_limiter = RateLimiter::new(
            rate_limits.clone(),
            RateLimitPolicy {
                tier: RateLimitTier::Public,
                max_requests: config.public_max_requests,
                window: config.rate_limit_window,
            },
        );
        let protected_limiter = RateLimiter::new(
            rate_limits.clone(),
            RateLimitPolicy {
                tier: RateLimitTier::Protected,
                max_requests: config.protected_max_requests,
                window: config.rate_limit_window,
            },
        );

        Self {
            config: Arc::new(config),
            chains,
            db,
            explorer,
            prices: Arc::new(prices),
            indexer,
            rate_limits,
            public_limiter,
            protected_limiter,
        }
    }

    /// Open the database and build the upstream clients described by `config`.
    pub fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db = TxDatabase::open(&config.tx_database_path())?;
        let explorer = ExplorerClient::new(config.etherscan_api_key.clone(), config.upstream_timeout)?;
        let prices = PriceFeed::new(
            config.price_feed_mode,
            config.coingecko_api_key.clone(),
            config.upstream_timeout,
        )?;

        Ok(Self::new(
            config,
            ChainRegistry::testnets(),
            db,
            explorer,
            prices,
        ))
    }
}
