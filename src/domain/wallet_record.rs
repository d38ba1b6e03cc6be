//! 智能钱包身份模型
//!
//! 用户连接的钱包地址（UserKey）与后端托管的智能钱包地址（SmartWalletAddress）
//! 之间的一对一映射，只有一种规范形态：WalletRecord。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResolutionError;

/// 规范地址前缀
pub const ADDRESS_PREFIX: &str = "0x";

/// 用户标识（连接的钱包地址），不可为空
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserKey(String);

impl UserKey {
    pub fn parse(raw: &str) -> Result<Self, ResolutionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ResolutionError::NoUserKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserKey {
    type Error = ResolutionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserKey> for String {
    fn from(key: UserKey) -> Self {
        key.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 规范化后的智能钱包地址（总是带 0x 前缀的十六进制）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SmartWalletAddress(String);

impl SmartWalletAddress {
    /// 规范化后端返回的地址
    ///
    /// - 缺少前缀时补上 `0x`（大写 `0X` 统一为 `0x`）
    /// - 保留十六进制部分的大小写
    /// - 空地址或包含非十六进制字符时返回 None
    ///
    /// 对已规范化的地址再次调用结果不变。
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix(ADDRESS_PREFIX)
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        Some(Self(format!("{}{}", ADDRESS_PREFIX, hex)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SmartWalletAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value).ok_or_else(|| format!("not a hex address: {:?}", value))
    }
}

impl From<SmartWalletAddress> for String {
    fn from(address: SmartWalletAddress) -> Self {
        address.0
    }
}

impl fmt::Display for SmartWalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 用户与智能钱包的映射记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub user_key: UserKey,
    pub smart_wallet_address: SmartWalletAddress,
}

impl WalletRecord {
    pub fn new(user_key: UserKey, smart_wallet_address: SmartWalletAddress) -> Self {
        Self {
            user_key,
            smart_wallet_address,
        }
    }
}

/// 链上交易标识（交易哈希）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_key_requires_content() {
        assert_eq!(UserKey::parse(""), Err(ResolutionError::NoUserKey));
        assert_eq!(UserKey::parse("   "), Err(ResolutionError::NoUserKey));
        assert_eq!(UserKey::parse(" 0xABC ").unwrap().as_str(), "0xABC");
    }

    #[test]
    fn test_normalize_adds_prefix() {
        let addr = SmartWalletAddress::normalize("DEF123").unwrap();
        assert_eq!(addr.as_str(), "0xDEF123");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = SmartWalletAddress::normalize("abc123").unwrap();
        let twice = SmartWalletAddress::normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);

        let upper = SmartWalletAddress::normalize("0XAbC").unwrap();
        assert_eq!(upper.as_str(), "0xAbC");
    }

    #[test]
    fn test_normalize_rejects_unusable_addresses() {
        assert!(SmartWalletAddress::normalize("").is_none());
        assert!(SmartWalletAddress::normalize("0x").is_none());
        assert!(SmartWalletAddress::normalize("0xZZZ").is_none());
        assert!(SmartWalletAddress::normalize("not an address").is_none());
    }

    #[test]
    fn test_record_serde_validates_address() {
        let json = r#"{"userKey":"0xABC","smartWalletAddress":"DEF123"}"#;
        let record: WalletRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.smart_wallet_address.as_str(), "0xDEF123");

        let bad = r#"{"userKey":"0xABC","smartWalletAddress":"nope"}"#;
        assert!(serde_json::from_str::<WalletRecord>(bad).is_err());

        let empty_key = r#"{"userKey":"","smartWalletAddress":"0x1"}"#;
        assert!(serde_json::from_str::<WalletRecord>(empty_key).is_err());
    }
}
