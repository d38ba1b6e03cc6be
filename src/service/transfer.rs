//! 链上转账能力
//!
//! 签名由外部钱包完成（可能需要等待用户确认），本模块只定义调用契约，
//! 并提供一个通过钱包 JSON-RPC（eth_sendTransaction）发起转账的实现。
//! 转账请求不做任何重试，重复提交可能导致重复转账。

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{NativeAmount, SmartWalletAddress, TransactionId, UserKey},
    error::TransferFailure,
};

/// EIP-1193: User Rejected Request
const USER_REJECTED_CODE: i64 = 4001;

/// 一次原生币转账
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// 发起方（用户连接的钱包）
    pub sender: UserKey,
    /// 目标智能钱包
    pub destination: SmartWalletAddress,
    pub amount: NativeAmount,
}

#[async_trait]
pub trait TransferCapability: Send + Sync {
    /// 提交转账并返回交易哈希；用户拒绝或链上失败时返回 TransferFailure
    async fn transfer(&self, request: &TransferRequest) -> Result<TransactionId, TransferFailure>;
}

// ============ JSON-RPC 钱包实现 ============

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    params: Vec<serde_json::Value>,
    id: u64,
}

impl<'a> JsonRpcRequest<'a> {
    fn new(method: &'a str, params: Vec<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        }
    }
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// 通过钱包提供方的 JSON-RPC 端点发起转账，签名在钱包侧完成
pub struct JsonRpcTransferCapability {
    client: reqwest::Client,
    rpc_url: String,
}

impl JsonRpcTransferCapability {
    pub fn new(rpc_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create wallet RPC client")?;

        Ok(Self {
            client,
            rpc_url: rpc_url.to_string(),
        })
    }

    fn classify(error: JsonRpcError) -> TransferFailure {
        if error.code == USER_REJECTED_CODE {
            TransferFailure::UserRejected(error.message)
        } else {
            TransferFailure::OnChain(format!("{} (code {})", error.message, error.code))
        }
    }
}

#[async_trait]
impl TransferCapability for JsonRpcTransferCapability {
    async fn transfer(&self, request: &TransferRequest) -> Result<TransactionId, TransferFailure> {
        let params = vec![serde_json::json!({
            "from": request.sender.as_str(),
            "to": request.destination.as_str(),
            "value": request.amount.base_units_hex(),
        })];
        let body = JsonRpcRequest::new("eth_sendTransaction", params);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransferFailure::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferFailure::Provider(format!(
                "wallet RPC returned HTTP {}",
                status.as_u16()
            )));
        }

        let rpc: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| TransferFailure::Provider(format!("invalid RPC response: {}", e)))?;

        if let Some(error) = rpc.error {
            return Err(Self::classify(error));
        }

        rpc.result
            .as_deref()
            .and_then(TransactionId::parse)
            .ok_or_else(|| TransferFailure::Provider("RPC response missing transaction hash".into()))
    }
}
