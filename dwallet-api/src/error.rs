//! Mapping core errors onto HTTP responses
//!
//! Every response body is `{"error": "..."}`. Internal kinds are logged
//! with full context and surfaced as an opaque 500; no file paths or
//! crypto internals cross this boundary.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use dwallet_core::WalletError;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub struct ApiError(WalletError);

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        Self(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            WalletError::Validation(_) | WalletError::InvalidKeyFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            WalletError::InvalidPassphrase => StatusCode::UNAUTHORIZED,
            WalletError::AccountNotFound(_) => StatusCode::NOT_FOUND,
            WalletError::DuplicateAccount(_) => StatusCode::CONFLICT,
            WalletError::RejectedByNode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WalletError::NodeUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            WalletError::KeyGeneration(_)
            | WalletError::Signing(_)
            | WalletError::Storage(_)
            | WalletError::Config(_)
            | WalletError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("internal error: {}", self.0);
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (WalletError::validation("bad"), StatusCode::BAD_REQUEST),
            (WalletError::InvalidPassphrase, StatusCode::UNAUTHORIZED),
            (
                WalletError::account_not_found("0xabc"),
                StatusCode::NOT_FOUND,
            ),
            (
                WalletError::duplicate_account("0xabc"),
                StatusCode::CONFLICT,
            ),
            (
                WalletError::rejected_by_node("nonce too low"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                WalletError::node_unreachable("timeout"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                WalletError::storage("disk on fire"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_internal_detail_is_opaque() {
        let err = ApiError::from(WalletError::storage("IO error: /var/lib/dwallet/ab.json"));
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The body must not leak the path; it is rebuilt from a fixed string.
        let body = actix_web::body::to_bytes(resp.into_body());
        let body = futures_util::future::FutureExt::now_or_never(body)
            .expect("Body must be ready")
            .expect("Failed to read body");
        let text = String::from_utf8(body.to_vec()).expect("Body is not UTF-8");
        assert!(text.contains("internal error"));
        assert!(!text.contains("/var/lib"));
    }
}
