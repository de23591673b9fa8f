//! Transaction routes

use crate::error::ApiError;
use actix_web::web::{Data, Json};
use actix_web::{post, HttpResponse};
use dwallet_core::{
    SignedTransaction, TransactionRequest, UnsignedTransaction, WalletCore, WalletError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub nonce: Option<u64>,
    pub chain_id: u64,
    /// 0x-prefixed hex of the call data or contract init code.
    pub payload: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignTransactionRequest {
    pub transaction: UnsignedTransaction,
    pub passphrase: String,
}

#[derive(Debug, Deserialize)]
pub struct SendTransactionRequest {
    pub transaction: SignedTransaction,
}

#[derive(Debug, Serialize)]
pub struct SendTransactionResponse {
    pub transaction_hash: String,
}

#[post("/transactions/create")]
pub async fn create_transaction(
    core: Data<Arc<WalletCore>>,
    req: Json<CreateTransactionRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    let payload = match req.payload {
        Some(raw) => Some(decode_payload(&raw)?),
        None => None,
    };
    let unsigned = core
        .build_transaction(TransactionRequest {
            from: req.from,
            to: req.to,
            value: req.value,
            gas_limit: req.gas_limit,
            gas_price: req.gas_price,
            nonce: req.nonce,
            chain_id: req.chain_id,
            payload,
        })
        .await?;
    Ok(HttpResponse::Ok().json(unsigned))
}

#[post("/transactions/sign")]
pub async fn sign_transaction(
    core: Data<Arc<WalletCore>>,
    req: Json<SignTransactionRequest>,
) -> Result<HttpResponse, ApiError> {
    let signed = core
        .sign_transaction(&req.transaction, &req.passphrase)
        .await?;
    Ok(HttpResponse::Ok().json(signed))
}

#[post("/transactions/send")]
pub async fn send_transaction(
    core: Data<Arc<WalletCore>>,
    req: Json<SendTransactionRequest>,
) -> Result<HttpResponse, ApiError> {
    let transaction_hash = core.send_transaction(&req.transaction).await?;
    Ok(HttpResponse::Ok().json(SendTransactionResponse { transaction_hash }))
}

fn decode_payload(raw: &str) -> Result<Vec<u8>, ApiError> {
    hex::decode(raw.trim_start_matches("0x"))
        .map_err(|_| ApiError::from(WalletError::validation("Payload is not valid hex")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload() {
        assert_eq!(
            decode_payload("0x6080").expect("Failed to decode payload"),
            vec![0x60, 0x80]
        );
        assert_eq!(
            decode_payload("6080").expect("Failed to decode bare hex"),
            vec![0x60, 0x80]
        );
        assert!(decode_payload("0xzz").is_err());
    }
}
