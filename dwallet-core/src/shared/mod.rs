//! Shared types, constants, and error handling for the wallet core.

pub mod constants;
pub mod error;
pub mod types;

pub use error::WalletError;
pub use types::WalletResult;
