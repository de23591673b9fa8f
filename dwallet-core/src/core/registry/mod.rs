//! Account registry
//!
//! In-memory index of vault contents, address to metadata. The registry is
//! a derived cache: the vault is authoritative, and on any miss the index
//! self-heals by re-scanning. `refresh` swaps in a fully built index, so
//! concurrent lookups see either the old or the new index, never a partial
//! one.

use crate::core::crypto::keys;
use crate::core::vault::Vault;
use crate::shared::error::WalletError;
use crate::shared::types::{AccountMetadata, Address};
use crate::shared::WalletResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct AccountRegistry {
    vault: Arc<Vault>,
    index: RwLock<HashMap<Address, AccountMetadata>>,
}

impl AccountRegistry {
    pub fn new(vault: Arc<Vault>) -> Self {
        Self {
            vault,
            index: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuild the index from the vault and replace it atomically.
    pub async fn refresh(&self) -> WalletResult<()> {
        // Build the complete replacement before taking the write lock.
        let accounts = self.vault.list()?;
        let mut index = HashMap::with_capacity(accounts.len());
        for metadata in accounts {
            index.insert(metadata.address.clone(), metadata);
        }

        let mut current = self.index.write().await;
        *current = index;
        log::debug!("registry refreshed: {} accounts", current.len());
        Ok(())
    }

    /// Look up an account by address. A miss consults the vault and
    /// refreshes before reporting `AccountNotFound`.
    pub async fn lookup(&self, address: &str) -> WalletResult<AccountMetadata> {
        let address = keys::normalize_address(address)?;

        if let Some(metadata) = self.index.read().await.get(&address) {
            return Ok(metadata.clone());
        }

        if self.vault.exists(&address) {
            log::warn!("registry missed {}; self-healing from vault", address);
            self.refresh().await?;
            if let Some(metadata) = self.index.read().await.get(&address) {
                return Ok(metadata.clone());
            }
        }

        Err(WalletError::account_not_found(address))
    }

    /// Ordered snapshot of the current index.
    pub async fn accounts(&self) -> Vec<AccountMetadata> {
        let index = self.index.read().await;
        let mut accounts: Vec<AccountMetadata> = index.values().cloned().collect();
        accounts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.address.cmp(&b.address))
        });
        accounts
    }
}
