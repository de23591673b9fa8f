//! Transaction broadcast
//!
//! A single outbound call per send. A transaction whose delivery status is
//! unknown is never resent locally; the node's duplicate and nonce
//! rejection is the safety net against double submission.

use crate::core::crypto::keys;
use crate::core::transactions::signer;
use crate::infrastructure::node::NodeClient;
use crate::shared::error::WalletError;
use crate::shared::types::{SignedTransaction, TransactionHash};
use crate::shared::WalletResult;
use std::sync::Arc;

pub struct Broadcaster {
    node: Arc<dyn NodeClient>,
}

impl Broadcaster {
    pub fn new(node: Arc<dyn NodeClient>) -> Self {
        Self { node }
    }

    /// Submit a signed transaction and relay the node's transaction id.
    ///
    /// The signature must recover the claimed sender before any network
    /// traffic happens. Content-level rejections surface as
    /// `RejectedByNode` with the node's reason verbatim and are never
    /// retried; transport failures surface as `NodeUnreachable`. Dropping
    /// the returned future cancels the call with an unknown, not failed,
    /// outcome.
    pub async fn send(&self, signed: &SignedTransaction) -> WalletResult<TransactionHash> {
        let sender = signer::recover_sender(signed)?;
        let claimed = keys::normalize_address(&signed.transaction.from)?;
        if sender != claimed {
            log::error!(
                "refusing broadcast: signature recovers {} but transaction claims {}",
                sender,
                claimed
            );
            return Err(WalletError::signing(
                "Signature does not verify against the sender address",
            ));
        }

        let raw = hex::decode(signed.raw.trim_start_matches("0x"))
            .map_err(|_| WalletError::validation("Malformed raw transaction encoding"))?;

        let hash = self.node.broadcast(&raw).await?;
        log::info!("broadcast transaction {} from {}", hash, sender);
        Ok(hash)
    }
}
