//! Domain 模块
//!
//! 智能钱包身份与转账金额的领域模型

pub mod amount;
pub mod wallet_record;

// 重新导出常用类型
pub use amount::{NativeAmount, DEFAULT_NATIVE_DECIMALS};
pub use wallet_record::{SmartWalletAddress, TransactionId, UserKey, WalletRecord, ADDRESS_PREFIX};
