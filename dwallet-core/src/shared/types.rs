use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Basic types for wallet operations
pub type Address = String;
pub type TransactionHash = String;
pub type Amount = String;
pub type Balance = String;

/// An account as surfaced to callers: the address plus metadata, never any
/// private material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

/// Registry entry: a lightweight cache of where an account's record lives.
/// Derived from the vault and rebuilt from it on every structural change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMetadata {
    pub address: Address,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl AccountMetadata {
    pub fn account(&self) -> Account {
        Account {
            address: self.address.clone(),
            created_at: self.created_at,
        }
    }
}

/// Parameters for building an unsigned transaction. `to` absent together
/// with a non-empty `payload` signals contract creation; `nonce` absent
/// means "ask the node for the pending count".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Option<Address>,
    pub value: Amount,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub nonce: Option<u64>,
    pub chain_id: u64,
    pub payload: Option<Vec<u8>>,
}

/// A fully resolved transaction awaiting a signature. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub from: Address,
    pub to: Option<Address>,
    pub value: Amount,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub nonce: u64,
    pub chain_id: u64,
    pub payload: Option<Vec<u8>>,
}

/// An unsigned transaction plus the EIP-155 signature triple bound to its
/// canonical RLP encoding. `raw` is the broadcast-ready encoding as 0x-hex;
/// `v` embeds the recovery indicator so the sender can be reconstructed
/// from the signature alone. Ephemeral: exists only long enough to be
/// broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: UnsignedTransaction,
    pub v: u64,
    pub r: String,
    pub s: String,
    pub raw: String,
    pub hash: TransactionHash,
}

// Result type for better error handling
pub type WalletResult<T> = Result<T, crate::shared::error::WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_request_roundtrip() {
        let request = TransactionRequest {
            from: "0x742d35cc6634c0532925a3b8d4c9db96c4b4d8b6".to_string(),
            to: Some("0x8d7eab03a72974f5d9f5c99b4e4e1b393dbcfcab".to_string()),
            value: "1000000000000000000".to_string(),
            gas_limit: 21000,
            gas_price: 20_000_000_000,
            nonce: None,
            chain_id: 3,
            payload: None,
        };

        let json = serde_json::to_string(&request).expect("Failed to serialize request");
        let back: TransactionRequest =
            serde_json::from_str(&json).expect("Failed to deserialize request");
        assert_eq!(back.from, request.from);
        assert_eq!(back.nonce, None);
        assert_eq!(back.chain_id, 3);
    }

    #[test]
    fn test_account_metadata_to_account_drops_path() {
        let metadata = AccountMetadata {
            address: "0x742d35cc6634c0532925a3b8d4c9db96c4b4d8b6".to_string(),
            path: PathBuf::from("/tmp/records/742d35cc.json"),
            created_at: Utc::now(),
        };

        let account = metadata.account();
        assert_eq!(account.address, metadata.address);
        // Account is the caller-facing shape; no file location leaks through.
        let json = serde_json::to_string(&account).expect("Failed to serialize account");
        assert!(!json.contains("/tmp/records"));
    }
}
