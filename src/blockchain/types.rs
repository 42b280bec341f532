// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Native asset of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAsset {
    pub symbol: &'static str,
    pub name: &'static str,
    pub decimals: u8,
}

/// ERC-20 token tracked on a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Token {
    pub symbol: &'static str,
    pub name: &'static str,
    pub decimals: u8,
    pub contract_address: &'static str,
}

/// EVM chain configuration.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Explorer API used for transfer lists (`txlist` / `tokentx`)
    pub explorer_api_url: Cow<'static, str>,
    /// Multichain explorer API used for balances (takes a `chainid` param)
    pub balance_api_url: Cow<'static, str>,
    /// Block explorer URL
    pub explorer_url: &'static str,
    pub native: NativeAsset,
    /// The stablecoin whose transfers and balance are tracked
    pub stablecoin: Erc20Token,
}

const ETHER: NativeAsset = NativeAsset {
    symbol: "ETH",
    name: "Ethereum",
    decimals: 18,
};

const ETHERSCAN_V2_API: &str = "https://api.etherscan.io/v2/api";

/// Ethereum Sepolia testnet.
pub const ETHEREUM_SEPOLIA: ChainConfig = ChainConfig {
    name: "Ethereum Sepolia",
    chain_id: 11155111,
    explorer_api_url: Cow::Borrowed("https://api-sepolia.etherscan.io/api"),
    balance_api_url: Cow::Borrowed(ETHERSCAN_V2_API),
    explorer_url: "https://sepolia.etherscan.io",
    native: ETHER,
    stablecoin: Erc20Token {
        symbol: "USDC",
        name: "USD Coin",
        decimals: 6,
        contract_address: "0xA0b86a33E6A9b644f3c4c9f6dC80b0d0D1C1Ca01",
    },
};

/// Arbitrum Sepolia testnet.
pub const ARBITRUM_SEPOLIA: ChainConfig = ChainConfig {
    name: "Arbitrum Sepolia",
    chain_id: 421614,
    explorer_api_url: Cow::Borrowed("https://api-sepolia.arbiscan.io/api"),
    balance_api_url: Cow::Borrowed(ETHERSCAN_V2_API),
    explorer_url: "https://sepolia.arbiscan.io",
    native: ETHER,
    stablecoin: Erc20Token {
        symbol: "USDC",
        name: "USD Coin",
        decimals: 6,
        contract_address: "0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d",
    },
};

/// Optimism Sepolia testnet.
pub const OPTIMISM_SEPOLIA: ChainConfig = ChainConfig {
    name: "Optimism Sepolia",
    chain_id: 11155420,
    explorer_api_url: Cow::Borrowed("https://api-sepolia-optimistic.etherscan.io/api"),
    balance_api_url: Cow::Borrowed(ETHERSCAN_V2_API),
    explorer_url: "https://sepolia-optimism.etherscan.io",
    native: ETHER,
    stablecoin: Erc20Token {
        symbol: "USDC",
        name: "USD Coin",
        decimals: 6,
        contract_address: "0x5fd84259d66Cd46123540766Be93DFE6D43130D7",
    },
};

/// Requested chain is not part of the static configuration.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unsupported chain ID: {chain_id}")]
pub struct UnsupportedChain {
    pub chain_id: u64,
    pub supported: Vec<u64>,
}

/// Process-wide set of supported chains. Read-only after start-up.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<ChainConfig>,
}

impl ChainRegistry {
    pub fn new(chains: Vec<ChainConfig>) -> Self {
        Self { chains }
    }

    /// The three Sepolia-family testnets served by default.
    pub fn testnets() -> Self {
        Self::new(vec![ETHEREUM_SEPOLIA, ARBITRUM_SEPOLIA, OPTIMISM_SEPOLIA])
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// Look up a chain, failing with the list of supported ids.
    pub fn ensure_supported(&self, chain_id: u64) -> Result<&ChainConfig, UnsupportedChain> {
        self.get(chain_id).ok_or_else(|| UnsupportedChain {
            chain_id,
            supported: self.chain_ids(),
        })
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        self.chains.iter().map(|c| c.chain_id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.iter()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::testnets()
    }
}

/// Raw balances for one address on one chain, in smallest units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBalance {
    pub native: String,
    pub token: String,
}

impl ChainBalance {
    pub fn zero() -> Self {
        Self {
            native: "0".to_string(),
            token: "0".to_string(),
        }
    }
}

/// A transfer as reported by the explorer, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTransfer {
    pub hash: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub from: String,
    pub to: String,
    /// Amount in smallest unit
    pub value: String,
    pub token_symbol: Option<String>,
    pub token_name: Option<String>,
    pub token_decimals: Option<u8>,
    pub contract_address: Option<String>,
}

/// Token balance information.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenBalance {
    /// Token symbol (e.g., "ETH", "USDC")
    pub symbol: String,
    /// Token name
    pub name: String,
    /// Balance in smallest unit (wei for native, token decimals for ERC-20)
    pub balance_raw: String,
    /// Balance formatted with decimals
    pub balance_formatted: String,
    /// Number of decimals
    pub decimals: u8,
    /// Contract address (None for native token)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    /// Balance valued in USD at the current unit price
    pub usd_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_testnets_in_order() {
        let registry = ChainRegistry::testnets();
        assert_eq!(registry.chain_ids(), vec![11155111, 421614, 11155420]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn ensure_supported_rejects_unknown_chain() {
        let registry = ChainRegistry::testnets();
        assert_eq!(
            registry.ensure_supported(421614).unwrap().name,
            "Arbitrum Sepolia"
        );

        let err = registry.ensure_supported(1).unwrap_err();
        assert_eq!(err.chain_id, 1);
        assert_eq!(err.supported, vec![11155111, 421614, 11155420]);
    }

    #[test]
    fn every_testnet_tracks_a_six_decimal_stablecoin() {
        for chain in ChainRegistry::testnets().iter() {
            assert_eq!(chain.native.symbol, "ETH");
            assert_eq!(chain.native.decimals, 18);
            assert_eq!(chain.stablecoin.decimals, 6);
            assert!(chain.stablecoin.contract_address.starts_with("0x"));
            assert_eq!(chain.stablecoin.contract_address.len(), 42);
        }
    }
}
