//! Wallet account routes

use crate::error::ApiError;
use actix_web::web::{Data, Json, Path};
use actix_web::{delete, get, post, HttpResponse};
use dwallet_core::WalletCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CreateWalletRequest {
    pub passphrase: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportWalletRequest {
    pub private_key: String,
    pub passphrase: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteWalletRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct WalletInfoResponse {
    pub address: String,
    pub created_at: String,
    pub balance: Option<String>,
}

#[post("/wallets")]
pub async fn create_wallet(
    core: Data<Arc<WalletCore>>,
    req: Json<CreateWalletRequest>,
) -> Result<HttpResponse, ApiError> {
    let account = core.create_account(&req.passphrase).await?;
    Ok(HttpResponse::Created().json(account))
}

#[post("/wallets/import")]
pub async fn import_wallet(
    core: Data<Arc<WalletCore>>,
    req: Json<ImportWalletRequest>,
) -> Result<HttpResponse, ApiError> {
    let account = core.import_account(&req.private_key, &req.passphrase).await?;
    Ok(HttpResponse::Created().json(account))
}

#[delete("/wallets")]
pub async fn delete_wallet(
    core: Data<Arc<WalletCore>>,
    req: Json<DeleteWalletRequest>,
) -> Result<HttpResponse, ApiError> {
    core.delete_account(&req.address).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/wallets")]
pub async fn list_wallets(core: Data<Arc<WalletCore>>) -> Result<HttpResponse, ApiError> {
    let accounts = core.list_accounts().await?;
    Ok(HttpResponse::Ok().json(accounts))
}

#[get("/wallets/{address}")]
pub async fn get_wallet_info(
    core: Data<Arc<WalletCore>>,
    address: Path<String>,
) -> Result<HttpResponse, ApiError> {
    let account = core.get_account(&address).await?;

    // Metadata stays available when the node is down; the balance is
    // best-effort.
    let balance = match core.get_balance(&account.address).await {
        Ok(balance) => Some(balance),
        Err(e) => {
            log::warn!("balance lookup for {} failed: {}", account.address, e);
            None
        }
    };

    Ok(HttpResponse::Ok().json(WalletInfoResponse {
        address: account.address,
        created_at: account.created_at.to_rfc3339(),
        balance,
    }))
}
