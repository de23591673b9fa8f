//! Transaction signing
//!
//! EIP-155 legacy transactions: the signing payload is the RLP list
//! `(nonce, gas_price, gas_limit, to, value, payload, chain_id, 0, 0)`,
//! hashed with Keccak-256 and signed with recoverable ECDSA. The recovery
//! indicator is folded into `v` (`rec_id + 35 + 2 * chain_id`), so the
//! sender address can be reconstructed from the signature alone.
//!
//! Signing is deterministic by policy: the RFC 6979 nonce in the
//! underlying signature scheme means re-signing the same transaction with
//! the same key yields the same signature, and a test pins this.

use crate::core::crypto::keys;
use crate::core::vault::Vault;
use crate::shared::constants::PRIVATE_KEY_SIZE;
use crate::shared::error::WalletError;
use crate::shared::types::{Address, SignedTransaction, UnsignedTransaction};
use crate::shared::WalletResult;
use ethers::types::U256;
use rlp::RlpStream;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Signs transactions against the vault. Decrypted key material lives only
/// for the duration of a `sign` call and is zeroized on drop; nothing is
/// cached between calls and nothing reaches a log.
pub struct TransactionSigner {
    vault: Arc<Vault>,
    secp: Secp256k1<secp256k1::All>,
}

impl TransactionSigner {
    pub fn new(vault: Arc<Vault>) -> Self {
        Self {
            vault,
            secp: Secp256k1::new(),
        }
    }

    /// Unlock the sender's key and produce a signed transaction.
    ///
    /// The unlocked key must re-derive the claimed sender, and the
    /// finished signature must recover it; either mismatch is an internal
    /// invariant violation surfaced as `Signing`.
    pub async fn sign(
        &self,
        tx: &UnsignedTransaction,
        passphrase: &str,
    ) -> WalletResult<SignedTransaction> {
        let key_bytes = self.vault.unlock(&tx.from, passphrase).await?;
        if key_bytes.len() != PRIVATE_KEY_SIZE {
            return Err(WalletError::signing("Unlocked key has invalid length"));
        }
        let mut key_array = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        key_array.copy_from_slice(&key_bytes);
        let secret_key = SecretKey::from_byte_array(*key_array)
            .map_err(|e| WalletError::signing(format!("Invalid private key: {}", e)))?;

        let sender =
            keys::address_from_public_key(&PublicKey::from_secret_key(&self.secp, &secret_key));
        if sender != tx.from {
            log::error!(
                "unlocked key for {} derives address {}: vault record mismatch",
                tx.from,
                sender
            );
            return Err(WalletError::signing(
                "Unlocked key does not belong to the sender",
            ));
        }

        let sighash = signing_hash(tx)?;
        let msg = Message::from_digest(sighash);
        let rec_sig: RecoverableSignature = self.secp.sign_ecdsa_recoverable(msg, &secret_key);
        let (rec_id, compact) = rec_sig.serialize_compact();
        let v = (i32::from(rec_id) as u64) + 35 + 2 * tx.chain_id;
        let r = &compact[0..32];
        let s = &compact[32..64];

        let raw = encode_raw_transaction(tx, v, r, s)?;
        let hash = format!("0x{}", hex::encode(keys::keccak256(&raw)));

        let signed = SignedTransaction {
            transaction: tx.clone(),
            v,
            r: hex::encode(r),
            s: hex::encode(s),
            raw: format!("0x{}", hex::encode(&raw)),
            hash,
        };

        let recovered = recover_sender(&signed)?;
        if recovered != tx.from {
            log::error!(
                "signature over transaction from {} recovers {}: refusing to release it",
                tx.from,
                recovered
            );
            return Err(WalletError::signing(
                "Signature failed sender recovery self-check",
            ));
        }

        Ok(signed)
    }
}

/// Reconstruct the sender address from the signature alone: the public
/// verification procedure used before any broadcast.
pub fn recover_sender(signed: &SignedTransaction) -> WalletResult<Address> {
    let tx = &signed.transaction;
    let base = 35 + 2 * tx.chain_id;
    let rec = signed
        .v
        .checked_sub(base)
        .filter(|rec| *rec <= 1)
        .ok_or_else(|| {
            WalletError::signing("Recovery indicator does not match the chain id")
        })?;

    let r = hex::decode(&signed.r)
        .map_err(|_| WalletError::signing("Malformed signature r component"))?;
    let s = hex::decode(&signed.s)
        .map_err(|_| WalletError::signing("Malformed signature s component"))?;
    if r.len() != 32 || s.len() != 32 {
        return Err(WalletError::signing("Signature components must be 32 bytes"));
    }
    let mut compact = [0u8; 64];
    compact[0..32].copy_from_slice(&r);
    compact[32..64].copy_from_slice(&s);

    let rec_id = RecoveryId::try_from(rec as i32)
        .map_err(|_| WalletError::signing("Invalid recovery indicator"))?;
    let rec_sig = RecoverableSignature::from_compact(&compact, rec_id)
        .map_err(|e| WalletError::signing(format!("Invalid signature: {}", e)))?;

    let msg = Message::from_digest(signing_hash(tx)?);
    let secp = Secp256k1::new();
    let public_key = secp
        .recover_ecdsa(msg, &rec_sig)
        .map_err(|e| WalletError::signing(format!("Signature recovery failed: {}", e)))?;
    Ok(keys::address_from_public_key(&public_key))
}

/// Keccak-256 over the canonical EIP-155 signing payload.
pub(crate) fn signing_hash(tx: &UnsignedTransaction) -> WalletResult<[u8; 32]> {
    Ok(keys::keccak256(&encode_signing_payload(tx)?))
}

fn encode_signing_payload(tx: &UnsignedTransaction) -> WalletResult<Vec<u8>> {
    let (to_bytes, value_bytes, payload) = encode_fields(tx)?;
    let mut s = RlpStream::new_list(9);
    s.append(&tx.nonce);
    s.append(&tx.gas_price);
    s.append(&tx.gas_limit);
    if to_bytes.is_empty() {
        s.append_empty_data();
    } else {
        s.append(&to_bytes.as_slice());
    }
    s.append(&value_bytes.as_slice());
    s.append(&payload.as_slice());
    s.append(&tx.chain_id);
    s.append_empty_data();
    s.append_empty_data();
    Ok(s.out().to_vec())
}

fn encode_raw_transaction(
    tx: &UnsignedTransaction,
    v: u64,
    r: &[u8],
    s: &[u8],
) -> WalletResult<Vec<u8>> {
    let (to_bytes, value_bytes, payload) = encode_fields(tx)?;
    let mut st = RlpStream::new_list(9);
    st.append(&tx.nonce);
    st.append(&tx.gas_price);
    st.append(&tx.gas_limit);
    if to_bytes.is_empty() {
        st.append_empty_data();
    } else {
        st.append(&to_bytes.as_slice());
    }
    st.append(&value_bytes.as_slice());
    st.append(&payload.as_slice());
    st.append(&v);
    // Signature components are unsigned integers: minimal encoding, no
    // leading zero bytes.
    st.append(&trim_leading_zeros(r));
    st.append(&trim_leading_zeros(s));
    Ok(st.out().to_vec())
}

fn encode_fields(tx: &UnsignedTransaction) -> WalletResult<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    let to_bytes = match &tx.to {
        Some(to) => hex::decode(to.trim_start_matches("0x"))
            .map_err(|_| WalletError::validation(format!("Invalid recipient address: {}", to)))?,
        None => Vec::new(),
    };
    let value = U256::from_dec_str(&tx.value)
        .map_err(|_| WalletError::validation(format!("Invalid value: {}", tx.value)))?;
    let value_bytes = u256_to_bytes_be(value);
    let payload = tx.payload.clone().unwrap_or_default();
    Ok((to_bytes, value_bytes, payload))
}

fn u256_to_bytes_be(val: U256) -> Vec<u8> {
    if val.is_zero() {
        return Vec::new();
    }
    let mut buf = [0u8; 32];
    val.to_big_endian(&mut buf);
    let first_non_zero = buf.iter().position(|&b| b != 0).unwrap_or(31);
    buf[first_non_zero..].to_vec()
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first_non_zero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[first_non_zero..]
}
