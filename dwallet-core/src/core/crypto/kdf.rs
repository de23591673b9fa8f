//! Passphrase key derivation
//!
//! Argon2id turns a passphrase plus a per-record random salt into the
//! 32-byte record encryption key. The cost parameters travel with each
//! record, so they can be strengthened for new records while old ones stay
//! readable.

use crate::shared::constants::{
    DERIVED_KEY_SIZE, KDF_DEFAULT_M_COST, KDF_DEFAULT_P_COST, KDF_DEFAULT_T_COST, SALT_SIZE,
};
use crate::shared::error::WalletError;
use crate::shared::WalletResult;
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Argon2id parameters stored alongside every encrypted key record.
///
/// `m_cost` is the memory cost in KiB (the work factor), `p_cost` the lane
/// count (parallelization). `salt` is unique per record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdfParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
    pub salt: String,
}

impl KdfParams {
    /// Parameters for a new record: configured costs, fresh random salt.
    pub fn generate(m_cost: u32, t_cost: u32, p_cost: u32) -> WalletResult<Self> {
        let mut salt = [0u8; SALT_SIZE];
        let mut rng = OsRng;
        rng.try_fill_bytes(&mut salt)
            .map_err(|e| WalletError::key_generation(format!("Entropy source failure: {}", e)))?;
        Ok(Self {
            m_cost,
            t_cost,
            p_cost,
            salt: hex::encode(salt),
        })
    }

    pub fn generate_default() -> WalletResult<Self> {
        Self::generate(KDF_DEFAULT_M_COST, KDF_DEFAULT_T_COST, KDF_DEFAULT_P_COST)
    }
}

/// Derive the record encryption key from a passphrase and stored params.
pub fn derive_key(
    passphrase: &str,
    params: &KdfParams,
) -> WalletResult<Zeroizing<[u8; DERIVED_KEY_SIZE]>> {
    let salt = hex::decode(&params.salt)
        .map_err(|_| WalletError::storage("Malformed salt in key record"))?;

    let argon2_params = Params::new(
        params.m_cost,
        params.t_cost,
        params.p_cost,
        Some(DERIVED_KEY_SIZE),
    )
    .map_err(|e| WalletError::internal(format!("Invalid KDF parameters: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = Zeroizing::new([0u8; DERIVED_KEY_SIZE]);
    argon2
        .hash_password_into(passphrase.as_bytes(), &salt, &mut *key)
        .map_err(WalletError::from)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cheap parameters so the suite stays fast; production costs come from
    // the configuration.
    fn test_params() -> KdfParams {
        KdfParams::generate(1024, 1, 1).expect("Failed to generate KDF params")
    }

    #[test]
    fn test_same_passphrase_same_salt_same_key() {
        let params = test_params();
        let first = derive_key("correct horse", &params).expect("Failed to derive key");
        let second = derive_key("correct horse", &params).expect("Failed to derive key again");
        assert_eq!(*first, *second);
    }

    #[test]
    fn test_different_passphrase_different_key() {
        let params = test_params();
        let first = derive_key("correct horse", &params).expect("Failed to derive key");
        let second = derive_key("battery staple", &params).expect("Failed to derive key");
        assert_ne!(*first, *second);
    }

    #[test]
    fn test_fresh_salts_are_unique() {
        let a = test_params();
        let b = test_params();
        assert_ne!(a.salt, b.salt);
    }

    #[test]
    fn test_malformed_salt_is_storage_error() {
        let params = KdfParams {
            m_cost: 1024,
            t_cost: 1,
            p_cost: 1,
            salt: "zz-not-hex".to_string(),
        };
        let result = derive_key("pw", &params);
        assert!(matches!(result, Err(WalletError::Storage(_))));
    }
}
