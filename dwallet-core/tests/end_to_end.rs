//! End-to-end pipeline: create an account, build an unsigned transaction,
//! sign it, verify the signature recovers the creator, and broadcast it
//! through a scripted node.

use async_trait::async_trait;
use dwallet_core::{
    recover_sender, Balance, Config, KdfCosts, NodeClient, TransactionHash, TransactionRequest,
    WalletCore, WalletError, WalletResult,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const CHAIN_ID: u64 = 1337;

/// In-memory node: sequential pending nonces, accepts any well-formed raw
/// transaction and answers with a hash derived from its length.
struct ScriptedNode {
    nonce: AtomicU64,
    broadcasts: AtomicU64,
}

impl ScriptedNode {
    fn new() -> Self {
        Self {
            nonce: AtomicU64::new(0),
            broadcasts: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl NodeClient for ScriptedNode {
    async fn get_nonce(&self, _address: &str) -> WalletResult<u64> {
        Ok(self.nonce.fetch_add(1, Ordering::SeqCst))
    }

    async fn get_balance(&self, _address: &str) -> WalletResult<Balance> {
        Ok("100000000000000000000".to_string())
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> WalletResult<TransactionHash> {
        if raw_tx.is_empty() {
            return Err(WalletError::rejected_by_node("empty transaction"));
        }
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        Ok(format!("0x{:064x}", raw_tx.len()))
    }

    async fn chain_id(&self) -> WalletResult<u64> {
        Ok(CHAIN_ID)
    }
}

fn test_config(dir: &TempDir) -> Config {
    Config {
        vault_dir: dir.path().to_path_buf(),
        node_rpc_url: "http://127.0.0.1:8545".to_string(),
        chain_id: CHAIN_ID,
        rpc_timeout: Duration::from_secs(1),
        kdf_costs: KdfCosts {
            m_cost: 1024,
            t_cost: 1,
            p_cost: 1,
        },
        bind_addr: "127.0.0.1:0".to_string(),
    }
}

#[tokio::test]
async fn test_create_build_sign_send() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let node = Arc::new(ScriptedNode::new());
    let core = WalletCore::with_node(test_config(&dir), Arc::clone(&node) as Arc<dyn NodeClient>)
        .await
        .expect("Failed to initialize core");

    // Create an account with passphrase "pw1".
    let account = core
        .create_account("pw1")
        .await
        .expect("Failed to create account");

    // Build an unsigned transfer of value 100, nonce resolved to 0.
    let request = TransactionRequest {
        from: account.address.clone(),
        to: Some("0x3535353535353535353535353535353535353535".to_string()),
        value: "100".to_string(),
        gas_limit: 21000,
        gas_price: 20_000_000_000,
        nonce: None,
        chain_id: CHAIN_ID,
        payload: None,
    };
    let unsigned = core
        .build_transaction(request)
        .await
        .expect("Failed to build transaction");
    assert_eq!(unsigned.nonce, 0);

    // Signing with the wrong passphrase must fail before any signature
    // is produced.
    let wrong = core.sign_transaction(&unsigned, "pw2").await;
    assert!(matches!(wrong, Err(WalletError::InvalidPassphrase)));
    assert_eq!(node.broadcasts.load(Ordering::SeqCst), 0);

    // Sign with the right passphrase; the signature must recover the
    // creator's address.
    let signed = core
        .sign_transaction(&unsigned, "pw1")
        .await
        .expect("Failed to sign transaction");
    let recovered = recover_sender(&signed).expect("Failed to recover sender");
    assert_eq!(recovered, account.address);

    // Broadcast yields the node's transaction identifier.
    let hash = core
        .send_transaction(&signed)
        .await
        .expect("Failed to send transaction");
    assert!(hash.starts_with("0x"));
    assert_eq!(node.broadcasts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_nonce_sequence_across_builds() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let node = Arc::new(ScriptedNode::new());
    let core = WalletCore::with_node(test_config(&dir), Arc::clone(&node) as Arc<dyn NodeClient>)
        .await
        .expect("Failed to initialize core");

    let account = core
        .create_account("pw1")
        .await
        .expect("Failed to create account");

    let mut last_nonce = None;
    for _ in 0..3 {
        let unsigned = core
            .build_transaction(TransactionRequest {
                from: account.address.clone(),
                to: Some("0x3535353535353535353535353535353535353535".to_string()),
                value: "1".to_string(),
                gas_limit: 21000,
                gas_price: 20_000_000_000,
                nonce: None,
                chain_id: CHAIN_ID,
                payload: None,
            })
            .await
            .expect("Failed to build transaction");
        if let Some(previous) = last_nonce {
            assert!(unsigned.nonce > previous, "nonces must strictly increase");
        }
        last_nonce = Some(unsigned.nonce);
    }
}

#[tokio::test]
async fn test_signed_transaction_survives_api_roundtrip() {
    // The HTTP layer moves transactions as JSON; signing then serializing
    // then broadcasting must be lossless.
    let dir = TempDir::new().expect("Failed to create temp dir");
    let node = Arc::new(ScriptedNode::new());
    let core = WalletCore::with_node(test_config(&dir), Arc::clone(&node) as Arc<dyn NodeClient>)
        .await
        .expect("Failed to initialize core");

    let account = core
        .create_account("pw1")
        .await
        .expect("Failed to create account");
    let unsigned = core
        .build_transaction(TransactionRequest {
            from: account.address.clone(),
            to: Some("0x3535353535353535353535353535353535353535".to_string()),
            value: "100".to_string(),
            gas_limit: 21000,
            gas_price: 20_000_000_000,
            nonce: Some(0),
            chain_id: CHAIN_ID,
            payload: None,
        })
        .await
        .expect("Failed to build transaction");
    let signed = core
        .sign_transaction(&unsigned, "pw1")
        .await
        .expect("Failed to sign transaction");

    let json = serde_json::to_string(&signed).expect("Failed to serialize signed transaction");
    let parsed = serde_json::from_str(&json).expect("Failed to parse signed transaction");

    let hash = core
        .send_transaction(&parsed)
        .await
        .expect("Failed to send round-tripped transaction");
    assert!(hash.starts_with("0x"));
}
