pub mod cache;
pub mod log_redact;
pub mod logging;
pub mod wallet_cache;

pub use wallet_cache::{InMemoryWalletCache, JsonFileWalletCache, RedisWalletCache, WalletCache};
