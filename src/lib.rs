//! SmartVault - 智能钱包身份解析与转账兑换编排
//!
//! 用户连接钱包后解析（必要时注册）其智能钱包地址，
//! 投资时先链上转账到智能钱包，再以交易哈希为凭证请求后端批量兑换。

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{ErrorCode, ResolutionError, TransferSwapError};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{NativeAmount, SmartWalletAddress, TransactionId, UserKey, WalletRecord},
        error::{ErrorCode, InvestmentError, ResolutionError, TransferSwapError},
        service::{
            IdentityResolver, InvestmentService, InvestmentSubmission, TransferCapability,
            TransferSwapOrchestrator, WalletApi,
        },
    };
}
