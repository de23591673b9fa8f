//! dwallet-core
//!
//! Custodial wallet core: an encrypted on-disk key vault and an
//! Ethereum-style transaction signing pipeline.
//!
//! ## Architecture
//!
//! - **Vault** (`core::vault`): one AES-256-GCM encrypted key record per
//!   account, keyed by address, Argon2id passphrase derivation, atomic
//!   file writes.
//! - **Registry** (`core::registry`): in-memory address index rebuilt from
//!   the vault; the vault stays authoritative.
//! - **Transactions** (`core::transactions`): builder, EIP-155 signer, and
//!   broadcaster.
//! - **Node** (`infrastructure::node`): the remote network node behind the
//!   `NodeClient` trait, reached over JSON-RPC with bounded timeouts.
//!
//! The [`WalletCore`] context object wires these together: constructed
//! once at startup from a [`Config`], torn down on shutdown, no hidden
//! statics. HTTP plumbing lives outside this crate and calls in through
//! `WalletCore`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dwallet_core::{Config, WalletCore};
//!
//! let core = WalletCore::init(Config::from_env()?).await?;
//! let account = core.create_account("correct horse").await?;
//! let unsigned = core.build_transaction(request).await?;
//! let signed = core.sign_transaction(&unsigned, "correct horse").await?;
//! let hash = core.send_transaction(&signed).await?;
//! ```

pub mod config;
pub mod core;
pub mod infrastructure;
pub mod shared;

use std::sync::Arc;

pub use crate::config::Config;
pub use crate::core::registry::AccountRegistry;
pub use crate::core::transactions::signer::recover_sender;
pub use crate::core::transactions::{Broadcaster, TransactionBuilder, TransactionSigner};
pub use crate::core::vault::{EncryptedKeyRecord, KdfCosts, Vault};
pub use crate::infrastructure::node::{JsonRpcNodeClient, NodeClient};
pub use crate::shared::error::WalletError;
pub use crate::shared::types::{
    Account, AccountMetadata, Address, Amount, Balance, SignedTransaction, TransactionHash,
    TransactionRequest, UnsignedTransaction, WalletResult,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// The wallet core context: every component, wired once.
pub struct WalletCore {
    config: Config,
    vault: Arc<Vault>,
    registry: Arc<AccountRegistry>,
    node: Arc<dyn NodeClient>,
    builder: TransactionBuilder,
    signer: TransactionSigner,
    broadcaster: Broadcaster,
}

impl WalletCore {
    /// Open the vault, index it, and connect the JSON-RPC node client.
    pub async fn init(config: Config) -> WalletResult<Self> {
        config.validate()?;
        let node: Arc<dyn NodeClient> = Arc::new(JsonRpcNodeClient::new(
            &config.node_rpc_url,
            config.rpc_timeout,
        )?);
        Self::with_node(config, node).await
    }

    /// Like [`WalletCore::init`] with a caller-supplied node client
    /// (tests, alternative transports).
    pub async fn with_node(config: Config, node: Arc<dyn NodeClient>) -> WalletResult<Self> {
        let vault = Arc::new(Vault::open(&config.vault_dir, config.kdf_costs)?);
        let registry = Arc::new(AccountRegistry::new(Arc::clone(&vault)));
        registry.refresh().await?;
        log::info!(
            "wallet core ready: {} accounts in {}",
            registry.accounts().await.len(),
            config.vault_dir.display()
        );

        let builder =
            TransactionBuilder::new(Arc::clone(&registry), Arc::clone(&node), config.chain_id);
        let signer = TransactionSigner::new(Arc::clone(&vault));
        let broadcaster = Broadcaster::new(Arc::clone(&node));

        Ok(Self {
            config,
            vault,
            registry,
            node,
            builder,
            signer,
            broadcaster,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generate a new account protected by the passphrase.
    pub async fn create_account(&self, passphrase: &str) -> WalletResult<Account> {
        let account = self.vault.create(passphrase).await?;
        self.registry.refresh().await?;
        Ok(account)
    }

    /// Import raw key material protected by the passphrase.
    pub async fn import_account(&self, raw_key: &str, passphrase: &str) -> WalletResult<Account> {
        let account = self.vault.import(raw_key, passphrase).await?;
        self.registry.refresh().await?;
        Ok(account)
    }

    /// Delete an account's key record.
    pub async fn delete_account(&self, address: &str) -> WalletResult<()> {
        self.vault.delete(address).await?;
        self.registry.refresh().await?;
        Ok(())
    }

    /// Account metadata by address.
    pub async fn get_account(&self, address: &str) -> WalletResult<Account> {
        Ok(self.registry.lookup(address).await?.account())
    }

    /// All accounts, ordered by creation time. Re-scans the vault so
    /// externally added records show up.
    pub async fn list_accounts(&self) -> WalletResult<Vec<Account>> {
        self.registry.refresh().await?;
        Ok(self
            .registry
            .accounts()
            .await
            .into_iter()
            .map(|metadata| metadata.account())
            .collect())
    }

    /// The account's balance in wei (decimal string), from the node.
    pub async fn get_balance(&self, address: &str) -> WalletResult<Balance> {
        let metadata = self.registry.lookup(address).await?;
        self.node.get_balance(&metadata.address).await
    }

    /// Validate and assemble an unsigned transaction.
    pub async fn build_transaction(
        &self,
        request: TransactionRequest,
    ) -> WalletResult<UnsignedTransaction> {
        self.builder.build(request).await
    }

    /// Sign an unsigned transaction with the sender's passphrase.
    pub async fn sign_transaction(
        &self,
        tx: &UnsignedTransaction,
        passphrase: &str,
    ) -> WalletResult<SignedTransaction> {
        self.signer.sign(tx, passphrase).await
    }

    /// Broadcast a signed transaction, returning the node's transaction id.
    pub async fn send_transaction(
        &self,
        signed: &SignedTransaction,
    ) -> WalletResult<TransactionHash> {
        self.broadcaster.send(signed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct MockNode;

    #[async_trait]
    impl NodeClient for MockNode {
        async fn get_nonce(&self, _address: &str) -> WalletResult<u64> {
            Ok(0)
        }

        async fn get_balance(&self, _address: &str) -> WalletResult<Balance> {
            Ok("1000000000000000000".to_string())
        }

        async fn broadcast(&self, _raw_tx: &[u8]) -> WalletResult<TransactionHash> {
            Ok("0xmock".to_string())
        }

        async fn chain_id(&self) -> WalletResult<u64> {
            Ok(3)
        }
    }

    fn test_config(dir: &TempDir) -> Config {
        Config {
            vault_dir: dir.path().to_path_buf(),
            node_rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: 3,
            rpc_timeout: std::time::Duration::from_secs(1),
            kdf_costs: KdfCosts {
                m_cost: 1024,
                t_cost: 1,
                p_cost: 1,
            },
            bind_addr: "127.0.0.1:0".to_string(),
        }
    }

    #[tokio::test]
    async fn test_context_initialization_indexes_existing_records() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        {
            let core = WalletCore::with_node(test_config(&dir), Arc::new(MockNode))
                .await
                .expect("Failed to initialize core");
            core.create_account("pw1")
                .await
                .expect("Failed to create account");
        }

        // A fresh context over the same directory must see the account.
        let core = WalletCore::with_node(test_config(&dir), Arc::new(MockNode))
            .await
            .expect("Failed to re-initialize core");
        let accounts = core.list_accounts().await.expect("Failed to list accounts");
        assert_eq!(accounts.len(), 1);
    }

    #[tokio::test]
    async fn test_create_get_delete_cycle() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let core = WalletCore::with_node(test_config(&dir), Arc::new(MockNode))
            .await
            .expect("Failed to initialize core");

        let account = core
            .create_account("pw1")
            .await
            .expect("Failed to create account");
        let fetched = core
            .get_account(&account.address)
            .await
            .expect("Failed to fetch account");
        assert_eq!(fetched.address, account.address);

        core.delete_account(&account.address)
            .await
            .expect("Failed to delete account");
        let result = core.get_account(&account.address).await;
        assert!(matches!(result, Err(WalletError::AccountNotFound(_))));
    }

    #[tokio::test]
    async fn test_balance_requires_known_account() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let core = WalletCore::with_node(test_config(&dir), Arc::new(MockNode))
            .await
            .expect("Failed to initialize core");

        let result = core
            .get_balance("0x742d35cc6634c0532925a3b8d4c9db96c4b4d8b6")
            .await;
        assert!(matches!(result, Err(WalletError::AccountNotFound(_))));

        let account = core
            .create_account("pw1")
            .await
            .expect("Failed to create account");
        let balance = core
            .get_balance(&account.address)
            .await
            .expect("Failed to fetch balance");
        assert_eq!(balance, "1000000000000000000");
    }
}
