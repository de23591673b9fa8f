//! Record cipher
//!
//! AES-256-GCM over the raw private key. The GCM tag is the record MAC:
//! it must verify before any plaintext is released, so a wrong-passphrase
//! key and a tampered ciphertext fail the same way.

use crate::shared::constants::{DERIVED_KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use crate::shared::error::WalletError;
use crate::shared::WalletResult;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Cipher parameters stored in every encrypted key record: the nonce (IV),
/// the ciphertext of the private key, and the authentication tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CipherParams {
    pub nonce: String,
    pub ciphertext: String,
    pub tag: String,
}

/// Encrypt plaintext under a derived key with a fresh random nonce.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> WalletResult<CipherParams> {
    if key.len() != DERIVED_KEY_SIZE {
        return Err(WalletError::internal("AES-256-GCM requires a 32-byte key"));
    }

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    let mut rng = OsRng;
    rng.try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| WalletError::key_generation(format!("Entropy source failure: {}", e)))?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| WalletError::internal(format!("AES-GCM encryption failed: {}", e)))?;

    // Split ciphertext and tag
    let (ciphertext_part, tag) = ciphertext.split_at(ciphertext.len() - TAG_SIZE);

    Ok(CipherParams {
        nonce: hex::encode(nonce_bytes),
        ciphertext: hex::encode(ciphertext_part),
        tag: hex::encode(tag),
    })
}

/// Decrypt a record's ciphertext. Returns `InvalidPassphrase` on tag
/// mismatch; callers log the internal distinction.
pub fn decrypt(params: &CipherParams, key: &[u8]) -> WalletResult<Zeroizing<Vec<u8>>> {
    if key.len() != DERIVED_KEY_SIZE {
        return Err(WalletError::internal("AES-256-GCM requires a 32-byte key"));
    }

    let nonce_bytes = hex::decode(&params.nonce)
        .map_err(|_| WalletError::storage("Malformed nonce in key record"))?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(WalletError::storage("Malformed nonce in key record"));
    }
    let mut ciphertext_with_tag = hex::decode(&params.ciphertext)
        .map_err(|_| WalletError::storage("Malformed ciphertext in key record"))?;
    let tag = hex::decode(&params.tag)
        .map_err(|_| WalletError::storage("Malformed tag in key record"))?;
    ciphertext_with_tag.extend_from_slice(&tag);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(&nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext_with_tag.as_slice())
        .map_err(|_| WalletError::InvalidPassphrase)?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x11; 32];

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let plaintext = b"thirty-two bytes of key material";
        let sealed = encrypt(plaintext, &KEY).expect("Failed to encrypt");
        let opened = decrypt(&sealed, &KEY).expect("Failed to decrypt");
        assert_eq!(plaintext.as_slice(), opened.as_slice());
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let sealed = encrypt(b"secret", &KEY).expect("Failed to encrypt");
        let wrong_key = [0x22u8; 32];
        let result = decrypt(&sealed, &wrong_key);
        assert!(matches!(result, Err(WalletError::InvalidPassphrase)));
    }

    #[test]
    fn test_tampered_ciphertext_fails_mac() {
        let mut sealed = encrypt(b"secret", &KEY).expect("Failed to encrypt");
        let mut raw = hex::decode(&sealed.ciphertext).expect("Failed to decode ciphertext");
        raw[0] ^= 0xff;
        sealed.ciphertext = hex::encode(raw);
        let result = decrypt(&sealed, &KEY);
        assert!(matches!(result, Err(WalletError::InvalidPassphrase)));
    }

    #[test]
    fn test_tampered_tag_fails_mac() {
        let mut sealed = encrypt(b"secret", &KEY).expect("Failed to encrypt");
        let mut tag = hex::decode(&sealed.tag).expect("Failed to decode tag");
        tag[0] ^= 0xff;
        sealed.tag = hex::encode(tag);
        let result = decrypt(&sealed, &KEY);
        assert!(matches!(result, Err(WalletError::InvalidPassphrase)));
    }

    #[test]
    fn test_nonces_are_fresh() {
        let a = encrypt(b"secret", &KEY).expect("Failed to encrypt");
        let b = encrypt(b"secret", &KEY).expect("Failed to encrypt");
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }
}
