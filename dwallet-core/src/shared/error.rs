//! Error handling for the wallet core
//!
//! Every I/O and cryptographic failure is mapped into one of these kinds
//! at the component boundary; nothing rawer crosses into callers.

use thiserror::Error;

/// Wallet error type
#[derive(Error, Debug, Clone)]
pub enum WalletError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    // Single user-facing message for both wrong passphrase and a corrupt
    // record; the distinction is logged internally, never surfaced.
    #[error("invalid passphrase or corrupted key data")]
    InvalidPassphrase,

    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Node unreachable: {0}")]
    NodeUnreachable(String),

    #[error("Rejected by node: {0}")]
    RejectedByNode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WalletError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid key format error
    pub fn invalid_key_format(message: impl Into<String>) -> Self {
        Self::InvalidKeyFormat(message.into())
    }

    /// Create an account not found error
    pub fn account_not_found(address: impl Into<String>) -> Self {
        Self::AccountNotFound(address.into())
    }

    /// Create a duplicate account error
    pub fn duplicate_account(address: impl Into<String>) -> Self {
        Self::DuplicateAccount(address.into())
    }

    /// Create a key generation error
    pub fn key_generation(message: impl Into<String>) -> Self {
        Self::KeyGeneration(message.into())
    }

    /// Create a signing error
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing(message.into())
    }

    /// Create a node unreachable error
    pub fn node_unreachable(message: impl Into<String>) -> Self {
        Self::NodeUnreachable(message.into())
    }

    /// Create a rejected-by-node error carrying the node's reason verbatim
    pub fn rejected_by_node(reason: impl Into<String>) -> Self {
        Self::RejectedByNode(reason.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

// Standard library error conversions
impl From<std::io::Error> for WalletError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(format!("IO error: {}", err))
    }
}

impl From<hex::FromHexError> for WalletError {
    fn from(err: hex::FromHexError) -> Self {
        Self::validation(format!("Hex decoding error: {}", err))
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("JSON error: {}", err))
    }
}

// Cryptographic error conversions
impl From<secp256k1::Error> for WalletError {
    fn from(err: secp256k1::Error) -> Self {
        Self::signing(format!("Secp256k1 error: {}", err))
    }
}

impl From<argon2::Error> for WalletError {
    fn from(err: argon2::Error) -> Self {
        Self::internal(format!("Argon2 error: {}", err))
    }
}

impl From<aes_gcm::Error> for WalletError {
    fn from(err: aes_gcm::Error) -> Self {
        Self::internal(format!("AES-GCM error: {}", err))
    }
}
