// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Optional bearer authentication for the `/v1/account/*` endpoints.
//!
//! ## Auth Flow
//!
//! 1. The client signs a message with its wallet
//! 2. The client sends `Authorization: Bearer base64({address, signature, message, timestamp})`
//! 3. The server:
//!    - Rejects tokens older than 5 minutes (60 s leeway for future stamps)
//!    - Checks the signature and address formats
//!    - Requires the requested address to be the token address
//!
//! Signatures are not cryptographically recovered.

pub mod error;
pub mod extractor;
pub mod token;

pub use error::AuthError;
pub use extractor::WalletAuth;
pub use token::AuthenticatedWallet;
