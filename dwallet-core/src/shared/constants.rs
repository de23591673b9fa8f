//! Constants for the wallet core

// Key material sizes
pub const PRIVATE_KEY_SIZE: usize = 32;
pub const PUBLIC_KEY_SIZE: usize = 65;
pub const ADDRESS_SIZE: usize = 20;

// Record cipher parameters (AES-256-GCM)
pub const DERIVED_KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;
pub const SALT_SIZE: usize = 32;

/// On-disk key record format version. Bump when the record layout or the
/// default derivation scheme changes; readers refuse versions they do not
/// know instead of misparsing them.
pub const RECORD_FORMAT_VERSION: u32 = 1;

// Argon2id defaults for newly sealed records. Existing records carry their
// own parameters and are unaffected by changes here.
pub const KDF_DEFAULT_M_COST: u32 = 65536; // KiB
pub const KDF_DEFAULT_T_COST: u32 = 3;
pub const KDF_DEFAULT_P_COST: u32 = 4;

// Node client
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;
pub const NODE_READ_RETRY_ATTEMPTS: u32 = 3;
pub const NODE_READ_RETRY_BASE_DELAY_MS: u64 = 200;

// Key generation retries the astronomically unlikely invalid-scalar draw
pub const KEY_GENERATION_MAX_ATTEMPTS: u32 = 4;
