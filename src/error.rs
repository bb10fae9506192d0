//! Error types for vault-sweep

use std::fmt;

#[derive(Debug, Clone)]
pub enum SweepError {
    ConfigError(String),
    KeyError(String),
    CryptoError(String),
    InvalidIdentifier(String),
    InvalidTypeTag(String),
    InvalidRepetitions(String),
    ForeignHandle { expected: u64, found: u64 },
    UnconsumedHandles(Vec<u16>),
    ContainerLimit(String),
    InvalidTransaction(String),
    InvalidObject(String),
    InsufficientGas(String),
    RpcError { code: i64, message: String },
    NetworkError(String),
    ExecutionFailed { digest: String, reason: String },
    IoError(String),
    SerializationError(String),
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SweepError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            SweepError::KeyError(msg) => write!(f, "Key error: {}", msg),
            SweepError::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            SweepError::InvalidIdentifier(msg) => write!(f, "Invalid identifier: {}", msg),
            SweepError::InvalidTypeTag(msg) => write!(f, "Invalid type tag: {}", msg),
            SweepError::InvalidRepetitions(msg) => write!(f, "Invalid repetitions: {}", msg),
            SweepError::ForeignHandle { expected, found } => write!(
                f,
                "Handle belongs to container #{}, not container #{}",
                found, expected
            ),
            SweepError::UnconsumedHandles(indices) => write!(
                f,
                "Results of commands {:?} were never consumed",
                indices
            ),
            SweepError::ContainerLimit(msg) => write!(f, "Container limit exceeded: {}", msg),
            SweepError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {}", msg),
            SweepError::InvalidObject(msg) => write!(f, "Invalid object: {}", msg),
            SweepError::InsufficientGas(msg) => write!(f, "Insufficient gas: {}", msg),
            SweepError::RpcError { code, message } => {
                write!(f, "RPC error {}: {}", code, message)
            }
            SweepError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            SweepError::ExecutionFailed { digest, reason } => {
                write!(f, "Transaction {} failed: {}", digest, reason)
            }
            SweepError::IoError(msg) => write!(f, "IO error: {}", msg),
            SweepError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for SweepError {}

impl From<std::io::Error> for SweepError {
    fn from(err: std::io::Error) -> Self {
        SweepError::IoError(err.to_string())
    }
}

impl From<bcs::Error> for SweepError {
    fn from(err: bcs::Error) -> Self {
        SweepError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for SweepError {
    fn from(err: serde_json::Error) -> Self {
        SweepError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for SweepError {
    fn from(err: toml::de::Error) -> Self {
        SweepError::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for SweepError {
    fn from(err: reqwest::Error) -> Self {
        SweepError::NetworkError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, SweepError>;
