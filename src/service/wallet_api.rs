//! 智能钱包后端 API 客户端
//!
//! - POST /api/register-wallet  注册智能钱包
//! - GET  /api/wallet/{user_id} 查询智能钱包
//! - POST /api/batch-swap       以链上转账为凭证执行批量兑换
//!
//! 只负责一次请求/一次响应，不做任何重试；重试由调用方决定。

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::{
    config::ApiConfig,
    domain::{NativeAmount, TransactionId, UserKey},
    error::ApiError,
};

/// 错误响应体最多保留的字符数
const MAX_ERROR_BODY_CHARS: usize = 240;

/// 注册 / 查询接口返回的钱包详情
///
/// 后端历史上用过多个字段名，这里统一收敛到 wallet_address。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WalletDetails {
    #[serde(
        default,
        rename = "walletAddress",
        alias = "wallet_address",
        alias = "smartWalletAddress",
        alias = "smart_wallet_address"
    )]
    pub wallet_address: Option<String>,
}

impl WalletDetails {
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            wallet_address: Some(address.into()),
        }
    }
}

/// 注册请求体：用户钱包地址同时作为 user_id 与申请地址
#[derive(Debug, Clone, Serialize)]
struct RegisterWalletBody<'a> {
    user_id: &'a str,
    wallet_address: &'a str,
}

/// 批量兑换请求：交易哈希是链上转账的凭证
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSwapRequest {
    pub user_id: String,
    pub amount: String,
    pub transaction_hash: String,
}

impl BatchSwapRequest {
    pub fn new(user_key: &UserKey, amount: &NativeAmount, transaction_id: &TransactionId) -> Self {
        Self {
            user_id: user_key.to_string(),
            amount: amount.to_string(),
            transaction_hash: transaction_id.to_string(),
        }
    }
}

/// 兑换确认（后端不保证结构，原样保留）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SwapConfirmation(pub serde_json::Value);

impl SwapConfirmation {
    /// 成功响应体能解析为 JSON 时原样保留，否则为 null
    pub fn from_body(body: &str) -> Self {
        Self(serde_json::from_str(body.trim()).unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
pub trait WalletApi: Send + Sync {
    /// 查询用户的智能钱包；未注册返回 ApiError::NotFound
    async fn get_wallet_details(&self, user_key: &UserKey) -> Result<WalletDetails, ApiError>;

    /// 为用户注册智能钱包
    async fn register_wallet(&self, user_key: &UserKey) -> Result<WalletDetails, ApiError>;

    /// 执行批量兑换
    async fn execute_batch_swap(
        &self,
        request: &BatchSwapRequest,
    ) -> Result<SwapConfirmation, ApiError>;
}

// ============ HTTP 实现 ============

pub struct HttpWalletApi {
    client: Client,
    base_url: Url,
}

impl HttpWalletApi {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid wallet API base url: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Wallet API base url cannot be a base: {}", config.base_url);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // new() 已校验 base url 可以作为 base
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn error_from_response(response: reqwest::Response) -> ApiError {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return ApiError::NotFound;
        }
        let body = response
            .text()
            .await
            .unwrap_or_default()
            .trim()
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>()
            .replace('\n', " ");
        ApiError::Status {
            status: status.as_u16(),
            body,
        }
    }
}

#[async_trait]
impl WalletApi for HttpWalletApi {
    async fn get_wallet_details(&self, user_key: &UserKey) -> Result<WalletDetails, ApiError> {
        let url = self.endpoint(&["api", "wallet", user_key.as_str()]);
        tracing::debug!(url = %url, "Fetching smart wallet details");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response.json::<WalletDetails>().await?)
    }

    async fn register_wallet(&self, user_key: &UserKey) -> Result<WalletDetails, ApiError> {
        let url = self.endpoint(&["api", "register-wallet"]);
        tracing::debug!(url = %url, "Registering smart wallet");

        let body = RegisterWalletBody {
            user_id: user_key.as_str(),
            wallet_address: user_key.as_str(),
        };
        let response = self.client.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response.json::<WalletDetails>().await?)
    }

    async fn execute_batch_swap(
        &self,
        request: &BatchSwapRequest,
    ) -> Result<SwapConfirmation, ApiError> {
        let url = self.endpoint(&["api", "batch-swap"]);
        tracing::debug!(url = %url, "Executing batch swap");

        let response = self.client.post(url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let text = response.text().await?;
        Ok(SwapConfirmation::from_body(&text))
    }
}
