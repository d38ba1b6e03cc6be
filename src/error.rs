//! 统一错误分类
//!
//! 所有失败都以显式的错误值返回到调用方（UI 边界），不吞掉任何错误。
//! 每个错误都有稳定的 snake_case 错误码，供调用方展示或埋点使用。

use thiserror::Error;

use crate::domain::TransactionId;

/// 稳定错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoUserKey,
    LookupFailed,
    RegistrationFailed,
    CacheError,
    RecipientUnresolved,
    InvalidAmount,
    TransferRejected,
    SwapConfirmationFailed,
    InvalidSubmission,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NoUserKey => "no_user_key",
            ErrorCode::LookupFailed => "lookup_failed",
            ErrorCode::RegistrationFailed => "registration_failed",
            ErrorCode::CacheError => "cache_error",
            ErrorCode::RecipientUnresolved => "recipient_unresolved",
            ErrorCode::InvalidAmount => "invalid_amount",
            ErrorCode::TransferRejected => "transfer_rejected",
            ErrorCode::SwapConfirmationFailed => "swap_confirmation_failed",
            ErrorCode::InvalidSubmission => "invalid_submission",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 远程钱包 API 调用错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("wallet not found")]
    NotFound,

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// 本地缓存错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("corrupt cache entry: {0}")]
    Corrupt(String),

    /// 不允许把其他用户的记录写到当前用户的键下
    #[error("record belongs to {record_key}, refused to store under {cache_key}")]
    KeyMismatch {
        cache_key: String,
        record_key: String,
    },
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}

/// 智能钱包解析错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("no user key supplied")]
    NoUserKey,

    #[error("wallet lookup failed: {0}")]
    LookupFailed(#[source] ApiError),

    #[error("wallet registration failed: {source} (lookup: {lookup})")]
    RegistrationFailed {
        lookup: ApiError,
        #[source]
        source: ApiError,
    },

    #[error("wallet cache error: {0}")]
    Cache(#[from] CacheError),
}

impl ResolutionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolutionError::NoUserKey => ErrorCode::NoUserKey,
            ResolutionError::LookupFailed(_) => ErrorCode::LookupFailed,
            ResolutionError::RegistrationFailed { .. } => ErrorCode::RegistrationFailed,
            ResolutionError::Cache(_) => ErrorCode::CacheError,
        }
    }
}

/// 金额校验错误（纯本地，不会触达网络）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount is not a decimal number: {0}")]
    NotNumeric(String),

    #[error("amount must be positive")]
    NotPositive,

    #[error("amount has more than {decimals} fractional digits")]
    TooPrecise { decimals: u32 },

    #[error("amount overflows the base unit range")]
    Overflow,
}

/// 链上转账失败（外部签名/广播能力返回）
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferFailure {
    #[error("rejected by user: {0}")]
    UserRejected(String),

    #[error("failed on chain: {0}")]
    OnChain(String),

    #[error("wallet provider unavailable: {0}")]
    Provider(String),
}

/// 转账 + 批量兑换编排错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferSwapError {
    #[error("recipient unresolved: {0}")]
    RecipientUnresolved(#[source] ResolutionError),

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("transfer rejected: {0}")]
    TransferRejected(#[source] TransferFailure),

    /// 资金已经转出，必须带上交易哈希交给调用方对账
    #[error("swap confirmation failed for transaction {transaction_id}: {source}")]
    SwapConfirmationFailed {
        transaction_id: TransactionId,
        #[source]
        source: ApiError,
    },
}

impl TransferSwapError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TransferSwapError::RecipientUnresolved(_) => ErrorCode::RecipientUnresolved,
            TransferSwapError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            TransferSwapError::TransferRejected(_) => ErrorCode::TransferRejected,
            TransferSwapError::SwapConfirmationFailed { .. } => ErrorCode::SwapConfirmationFailed,
        }
    }

    /// 失败发生时链上资金是否已经转出
    pub fn funds_moved(&self) -> bool {
        matches!(self, TransferSwapError::SwapConfirmationFailed { .. })
    }

    pub fn transaction_id(&self) -> Option<&TransactionId> {
        match self {
            TransferSwapError::SwapConfirmationFailed { transaction_id, .. } => {
                Some(transaction_id)
            }
            _ => None,
        }
    }
}

/// 投资提交错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvestmentError {
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    #[error(transparent)]
    TransferSwap(#[from] TransferSwapError),
}

impl InvestmentError {
    pub fn code(&self) -> ErrorCode {
        match self {
            InvestmentError::InvalidSubmission(_) => ErrorCode::InvalidSubmission,
            InvestmentError::TransferSwap(e) => e.code(),
        }
    }

    /// 资金是否已经转出（需要对账）
    pub fn funds_moved(&self) -> bool {
        matches!(self, InvestmentError::TransferSwap(e) if e.funds_moved())
    }

    pub fn transaction_id(&self) -> Option<&TransactionId> {
        match self {
            InvestmentError::TransferSwap(e) => e.transaction_id(),
            InvestmentError::InvalidSubmission(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_snake_case() {
        assert_eq!(ErrorCode::NoUserKey.as_str(), "no_user_key");
        assert_eq!(
            ErrorCode::SwapConfirmationFailed.to_string(),
            "swap_confirmation_failed"
        );
    }

    #[test]
    fn test_only_swap_failure_reports_moved_funds() {
        let tx = TransactionId::parse("0xtx1").unwrap();
        let swap_failed = TransferSwapError::SwapConfirmationFailed {
            transaction_id: tx.clone(),
            source: ApiError::Status {
                status: 500,
                body: "boom".into(),
            },
        };
        assert!(swap_failed.funds_moved());
        assert_eq!(swap_failed.transaction_id(), Some(&tx));
        assert!(swap_failed.to_string().contains("0xtx1"));

        let rejected =
            TransferSwapError::TransferRejected(TransferFailure::UserRejected("denied".into()));
        assert!(!rejected.funds_moved());
        assert_eq!(rejected.transaction_id(), None);
        assert_eq!(rejected.code(), ErrorCode::TransferRejected);
    }

    #[test]
    fn test_investment_error_forwards_code() {
        let err: InvestmentError = TransferSwapError::InvalidAmount(AmountError::Empty).into();
        assert_eq!(err.code(), ErrorCode::InvalidAmount);
        assert!(!err.funds_moved());
        assert_eq!(err.transaction_id(), None);
    }

    #[test]
    fn test_investment_error_forwards_transaction_id() {
        let tx = TransactionId::parse("0xtx1").unwrap();
        let err: InvestmentError = TransferSwapError::SwapConfirmationFailed {
            transaction_id: tx.clone(),
            source: ApiError::NotFound,
        }
        .into();
        assert!(err.funds_moved());
        assert_eq!(err.transaction_id(), Some(&tx));

        let invalid = InvestmentError::InvalidSubmission("no basket selected".into());
        assert!(!invalid.funds_moved());
        assert_eq!(invalid.transaction_id(), None);
    }
}
