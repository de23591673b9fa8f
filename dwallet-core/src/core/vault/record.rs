//! On-disk encrypted key record
//!
//! One JSON record per account: format version, the account address, the
//! KDF parameters the passphrase key was derived with, and the AEAD cipher
//! output. The address field is redundant (it is always re-derivable from
//! the decrypted key) and exists so listings never need a passphrase.

use crate::core::crypto::{cipher, kdf, keys, CipherParams, KdfParams};
use crate::shared::constants::RECORD_FORMAT_VERSION;
use crate::shared::error::WalletError;
use crate::shared::types::Address;
use crate::shared::WalletResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedKeyRecord {
    pub version: u32,
    pub address: Address,
    pub kdf: KdfParams,
    pub cipher: CipherParams,
    pub created_at: DateTime<Utc>,
}

impl EncryptedKeyRecord {
    /// Encrypt raw private key bytes under a passphrase-derived key.
    /// The address is derived from the key material, never supplied.
    pub fn seal(key_bytes: &[u8], passphrase: &str, params: KdfParams) -> WalletResult<Self> {
        let address = keys::address_from_private_key(key_bytes)?;
        let derived = kdf::derive_key(passphrase, &params)?;
        let sealed = cipher::encrypt(key_bytes, &*derived)?;

        Ok(Self {
            version: RECORD_FORMAT_VERSION,
            address,
            kdf: params,
            cipher: sealed,
            created_at: Utc::now(),
        })
    }

    /// Decrypt the private key. The AEAD tag must verify before any bytes
    /// are released, and the decrypted key must re-derive the record's
    /// address; both failures collapse to `InvalidPassphrase` for callers
    /// while the distinction is logged.
    pub fn unseal(&self, passphrase: &str) -> WalletResult<Zeroizing<Vec<u8>>> {
        self.check_version()?;

        let derived = kdf::derive_key(passphrase, &self.kdf)?;
        let key_bytes = match cipher::decrypt(&self.cipher, &*derived) {
            Ok(bytes) => bytes,
            Err(WalletError::InvalidPassphrase) => {
                log::warn!(
                    "MAC verification failed for {}: wrong passphrase or corrupted record",
                    self.address
                );
                return Err(WalletError::InvalidPassphrase);
            }
            Err(e) => return Err(e),
        };

        let derived_address = keys::address_from_private_key(&key_bytes)?;
        if derived_address != self.address {
            log::error!(
                "key record for {} decrypted to key material for {}: record corrupted or relabeled",
                self.address,
                derived_address
            );
            return Err(WalletError::InvalidPassphrase);
        }

        Ok(key_bytes)
    }

    pub fn check_version(&self) -> WalletResult<()> {
        if self.version != RECORD_FORMAT_VERSION {
            return Err(WalletError::storage(format!(
                "Unsupported key record version {} (supported: {})",
                self.version, RECORD_FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> WalletResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> WalletResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
