//! vault-sweep - builds the scavenger-hunt vault withdrawal as one Sui
//! programmable transaction, signs it and submits it atomically.
//!
//! # Architecture
//!
//! ## Transaction Building
//! - [`types`] - Object ids, digests, Move type tags and call targets
//! - [`transaction`] - Container builder, call result handles, BCS wire types
//! - [`hunt`] - The fixed create/configure/withdraw plan and its repetition count
//!
//! ## Cryptography
//! - [`crypto`] - Ed25519 keys, Sui addresses, intent signing
//! - [`keystore`] - The local `keypair.json` record
//!
//! ## Network
//! - [`rpc`] - JSON-RPC client for a Sui full node
//! - [`submit`] - Input resolution, sealing, signing and submission
//!
//! ## Configuration & Utilities
//! - [`config`] - `sweep.toml` loading and network aliases
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Transaction Building
// ============================================================================
pub mod hunt;
pub mod transaction;
pub mod types;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;
pub mod keystore;

// ============================================================================
// Network
// ============================================================================
pub mod rpc;
pub mod submit;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
