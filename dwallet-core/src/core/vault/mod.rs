//! Encrypted key vault
//!
//! On-disk storage of one encrypted key record per account, named by
//! address, under a single directory. All mutating operations on the same
//! address are serialized through a per-address lock; operations on
//! different addresses proceed in parallel. Writes are atomic (same-dir
//! temp file, fsync, rename) so a crash mid-write cannot leave a
//! half-written record behind.

pub mod record;

pub use record::EncryptedKeyRecord;

use crate::core::crypto::{keys, KdfParams};
use crate::shared::constants::{KDF_DEFAULT_M_COST, KDF_DEFAULT_P_COST, KDF_DEFAULT_T_COST};
use crate::shared::error::WalletError;
use crate::shared::types::{Account, AccountMetadata, Address};
use crate::shared::WalletResult;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use zeroize::Zeroizing;

/// Argon2id costs applied to newly sealed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfCosts {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfCosts {
    fn default() -> Self {
        Self {
            m_cost: KDF_DEFAULT_M_COST,
            t_cost: KDF_DEFAULT_T_COST,
            p_cost: KDF_DEFAULT_P_COST,
        }
    }
}

/// The encrypted on-disk store of account key material.
pub struct Vault {
    dir: PathBuf,
    kdf_costs: KdfCosts,
    locks: Mutex<HashMap<Address, Arc<Mutex<()>>>>,
}

impl Vault {
    /// Open (creating if needed) the vault directory.
    pub fn open(dir: impl Into<PathBuf>, kdf_costs: KdfCosts) -> WalletResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| WalletError::storage(format!("Failed to create vault directory: {}", e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&dir)?.permissions();
            perms.set_mode(0o700);
            fs::set_permissions(&dir, perms)?;
        }

        Ok(Self {
            dir,
            kdf_costs,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generate a new key pair, encrypt it under the passphrase, and write
    /// a record named by the derived address.
    pub async fn create(&self, passphrase: &str) -> WalletResult<Account> {
        let key_bytes = keys::generate_private_key()?;
        self.store_new_key(&*key_bytes, passphrase).await
    }

    /// Import raw key material (0x-prefixed or bare hex of 32 bytes).
    /// Rejects malformed encodings and addresses already in the vault.
    pub async fn import(&self, raw_key: &str, passphrase: &str) -> WalletResult<Account> {
        let key_bytes = keys::decode_private_key_hex(raw_key)?;
        self.store_new_key(&*key_bytes, passphrase).await
    }

    async fn store_new_key(&self, key_bytes: &[u8], passphrase: &str) -> WalletResult<Account> {
        let address = keys::address_from_private_key(key_bytes)?;

        let guard = self.address_lock(&address).await;
        let _held = guard.lock().await;

        let path = self.record_path(&address);
        if path.exists() {
            return Err(WalletError::duplicate_account(address));
        }

        let params = KdfParams::generate(
            self.kdf_costs.m_cost,
            self.kdf_costs.t_cost,
            self.kdf_costs.p_cost,
        )?;
        let record = EncryptedKeyRecord::seal(key_bytes, passphrase, params)?;
        self.write_atomic(&path, &record.to_json()?)?;

        log::info!("stored new key record for {}", record.address);
        Ok(Account {
            address: record.address,
            created_at: record.created_at,
        })
    }

    /// Decrypt an account's private key. The result is zeroized on drop and
    /// must not outlive the operation that requested it; the vault never
    /// caches it.
    pub async fn unlock(
        &self,
        address: &str,
        passphrase: &str,
    ) -> WalletResult<Zeroizing<Vec<u8>>> {
        let (record, _) = self.read_record(address)?;
        record.unseal(passphrase)
    }

    /// Remove an account's record file. The caller must hold no unlocked
    /// key for it afterward.
    pub async fn delete(&self, address: &str) -> WalletResult<()> {
        let address = keys::normalize_address(address)?;

        let guard = self.address_lock(&address).await;
        let _held = guard.lock().await;

        let path = self.record_path(&address);
        if !path.exists() {
            return Err(WalletError::account_not_found(address));
        }
        fs::remove_file(&path)?;
        log::info!("deleted key record for {}", address);
        Ok(())
    }

    /// Scan the vault directory. Files that fail to parse as records are
    /// skipped and flagged for operator attention, never abort the listing.
    pub fn list(&self) -> WalletResult<Vec<AccountMetadata>> {
        let mut accounts = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.parse_record_file(&path) {
                Ok(record) => accounts.push(AccountMetadata {
                    address: record.address,
                    path,
                    created_at: record.created_at,
                }),
                Err(e) => {
                    log::error!(
                        "skipping unparseable key record {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
        accounts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.address.cmp(&b.address))
        });
        Ok(accounts)
    }

    /// Whether a record exists for the address.
    pub fn exists(&self, address: &str) -> bool {
        match keys::normalize_address(address) {
            Ok(address) => self.record_path(&address).exists(),
            Err(_) => false,
        }
    }

    fn read_record(&self, address: &str) -> WalletResult<(EncryptedKeyRecord, PathBuf)> {
        let address = keys::normalize_address(address)?;
        let path = self.record_path(&address);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WalletError::account_not_found(address));
            }
            Err(e) => return Err(e.into()),
        };
        match EncryptedKeyRecord::from_json(&bytes) {
            Ok(record) => Ok((record, path)),
            Err(e) => {
                log::error!(
                    "key record {} failed to parse ({}); treating as corrupt",
                    path.display(),
                    e
                );
                Err(WalletError::InvalidPassphrase)
            }
        }
    }

    fn parse_record_file(&self, path: &Path) -> WalletResult<EncryptedKeyRecord> {
        let bytes = fs::read(path)?;
        let record = EncryptedKeyRecord::from_json(&bytes)?;
        record.check_version()?;
        Ok(record)
    }

    fn record_path(&self, address: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", address.trim_start_matches("0x")))
    }

    // Write to a temp file in the same directory, fsync, rename into place.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> WalletResult<()> {
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    async fn address_lock(&self, address: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
