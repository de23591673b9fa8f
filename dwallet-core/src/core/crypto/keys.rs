//! Key generation and address derivation
//!
//! Accounts are secp256k1 key pairs; the address is the last 20 bytes of
//! the Keccak-256 hash of the uncompressed public key, hex encoded with a
//! `0x` prefix. The address is always derived from key material, never
//! stored independently of it.

use crate::shared::constants::{KEY_GENERATION_MAX_ATTEMPTS, PRIVATE_KEY_SIZE};
use crate::shared::error::WalletError;
use crate::shared::types::Address;
use crate::shared::WalletResult;
use rand_core::{OsRng, RngCore};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

/// Keccak256 hash function
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Generate a new private key from the OS entropy source.
///
/// Entropy source failure maps to `KeyGeneration`; the operation fails,
/// the process does not.
pub fn generate_private_key() -> WalletResult<Zeroizing<[u8; PRIVATE_KEY_SIZE]>> {
    let mut rng = OsRng;
    for _ in 0..KEY_GENERATION_MAX_ATTEMPTS {
        let mut key_bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        rng.try_fill_bytes(&mut *key_bytes)
            .map_err(|e| WalletError::key_generation(format!("Entropy source failure: {}", e)))?;

        if SecretKey::from_byte_array(*key_bytes).is_ok() {
            return Ok(key_bytes);
        }
        // Out-of-range scalar: draw again.
    }
    Err(WalletError::key_generation(
        "Entropy source repeatedly produced invalid key material".to_string(),
    ))
}

/// Derive the account address from raw private key bytes.
///
/// Deterministic: the same key material always yields the same address,
/// independent of any passphrase it is later encrypted under.
pub fn address_from_private_key(key_bytes: &[u8]) -> WalletResult<Address> {
    let key_array: [u8; PRIVATE_KEY_SIZE] = key_bytes
        .try_into()
        .map_err(|_| WalletError::invalid_key_format("Private key must be 32 bytes"))?;
    let secret_key = SecretKey::from_byte_array(key_array)
        .map_err(|e| WalletError::invalid_key_format(format!("Invalid private key: {}", e)))?;

    let secp = Secp256k1::new();
    let public_key = PublicKey::from_secret_key(&secp, &secret_key);
    Ok(address_from_public_key(&public_key))
}

/// Derive the account address from a public key.
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let public_key_bytes = public_key.serialize_uncompressed();
    // Skip the 0x04 prefix, keep the last 20 bytes of the hash
    let hash = keccak256(&public_key_bytes[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Decode raw key material supplied by a caller (0x-prefixed or bare hex).
pub fn decode_private_key_hex(raw: &str) -> WalletResult<Zeroizing<[u8; PRIVATE_KEY_SIZE]>> {
    let clean = raw.trim().trim_start_matches("0x");
    let bytes = hex::decode(clean)
        .map_err(|_| WalletError::invalid_key_format("Private key is not valid hex"))?;
    if bytes.len() != PRIVATE_KEY_SIZE {
        return Err(WalletError::invalid_key_format(format!(
            "Private key must be {} bytes, got {}",
            PRIVATE_KEY_SIZE,
            bytes.len()
        )));
    }
    let mut key_bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
    key_bytes.copy_from_slice(&bytes);

    // Reject out-of-range scalars up front
    SecretKey::from_byte_array(*key_bytes)
        .map_err(|e| WalletError::invalid_key_format(format!("Invalid private key: {}", e)))?;
    Ok(key_bytes)
}

/// Validate an account address string
pub fn is_valid_address(address: &str) -> bool {
    if !address.starts_with("0x") {
        return false;
    }
    let clean_address = &address[2..];
    clean_address.len() == 40 && clean_address.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalize an address to its canonical lowercase form
pub fn normalize_address(address: &str) -> WalletResult<Address> {
    if !is_valid_address(address) {
        return Err(WalletError::validation(format!(
            "Invalid address: {}",
            address
        )));
    }
    Ok(address.to_ascii_lowercase())
}
