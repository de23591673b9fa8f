//! dwallet-api
//!
//! Thin HTTP layer over the wallet core: routing, request IDs, logging,
//! CORS, and error mapping. All wallet semantics live in `dwallet-core`.

mod error;
mod handlers;
mod middleware;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dwallet_core::{Config, WalletCore};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(to_io_error)?;
    let bind_addr = config.bind_addr.clone();

    let core = WalletCore::init(config).await.map_err(to_io_error)?;
    let core = Arc::new(core);
    log::info!(
        "dwallet-api listening on {} (chain id {})",
        bind_addr,
        core.config().chain_id
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(Arc::clone(&core)))
            .wrap(middleware::RequestId)
            .wrap(Cors::permissive())
            .service(handlers::health)
            .service(handlers::wallets::create_wallet)
            .service(handlers::wallets::import_wallet)
            .service(handlers::wallets::delete_wallet)
            .service(handlers::wallets::list_wallets)
            .service(handlers::wallets::get_wallet_info)
            .service(handlers::transactions::create_transaction)
            .service(handlers::transactions::sign_transaction)
            .service(handlers::transactions::send_transaction)
    })
    .bind(bind_addr)?
    .run()
    .await
}

fn to_io_error(err: dwallet_core::WalletError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}
