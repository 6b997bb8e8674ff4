//! System-wide constants for the PoolBet engine.

/// Default maximum match title length in bytes.
pub const DEFAULT_MAX_TITLE_LEN: usize = 256;

/// Length of an [`Identity`](crate::Identity) in bytes.
pub const IDENTITY_LEN: usize = 20;

/// Domain separator prepended to every receipt payload before hashing.
pub const RECEIPT_DOMAIN: &[u8] = b"poolbet:receipt:v1:";

/// Domain separator for deterministic test identities.
pub const IDENTITY_LABEL_DOMAIN: &[u8] = b"poolbet:identity:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "PoolBet";
