//! Transaction pipeline
//!
//! Building an unsigned transaction from caller parameters, signing it
//! against the vault, and broadcasting the result through the node
//! collaborator.

pub mod broadcaster;
pub mod signer;

pub use broadcaster::Broadcaster;
pub use signer::TransactionSigner;

use crate::core::crypto::keys;
use crate::core::registry::AccountRegistry;
use crate::infrastructure::node::NodeClient;
use crate::shared::error::WalletError;
use crate::shared::types::{TransactionRequest, UnsignedTransaction};
use crate::shared::WalletResult;
use ethers::types::U256;
use std::sync::Arc;

/// Assembles and validates unsigned transactions.
pub struct TransactionBuilder {
    registry: Arc<AccountRegistry>,
    node: Arc<dyn NodeClient>,
    chain_id: u64,
}

impl TransactionBuilder {
    pub fn new(registry: Arc<AccountRegistry>, node: Arc<dyn NodeClient>, chain_id: u64) -> Self {
        Self {
            registry,
            node,
            chain_id,
        }
    }

    /// Validate the request and resolve it into an unsigned transaction.
    ///
    /// The sender must be a known account; the chain id must match the
    /// configured network (cross-network replay guard); contract creation
    /// is an absent recipient plus a non-empty payload. When the nonce is
    /// omitted it is fetched from the node's pending count.
    pub async fn build(&self, request: TransactionRequest) -> WalletResult<UnsignedTransaction> {
        let from = self.registry.lookup(&request.from).await?.address;

        let to = match &request.to {
            Some(to) => Some(keys::normalize_address(to)?),
            None => None,
        };
        let payload_len = request.payload.as_ref().map(|p| p.len()).unwrap_or(0);
        if to.is_none() && payload_len == 0 {
            return Err(WalletError::validation(
                "Contract creation requires a non-empty payload",
            ));
        }

        // Parse (and thereby range-check) the decimal wei value.
        U256::from_dec_str(&request.value)
            .map_err(|_| WalletError::validation(format!("Invalid value: {}", request.value)))?;

        if request.gas_limit == 0 {
            return Err(WalletError::validation("Gas limit must be non-zero"));
        }

        if request.chain_id != self.chain_id {
            return Err(WalletError::validation(format!(
                "Chain id {} does not match the configured network ({})",
                request.chain_id, self.chain_id
            )));
        }

        let nonce = match request.nonce {
            Some(nonce) => nonce,
            None => self.node.get_nonce(&from).await?,
        };

        Ok(UnsignedTransaction {
            from,
            to,
            value: request.value,
            gas_limit: request.gas_limit,
            gas_price: request.gas_price,
            nonce,
            chain_id: request.chain_id,
            payload: request.payload,
        })
    }
}
