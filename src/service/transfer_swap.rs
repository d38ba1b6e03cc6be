//! 转账 + 批量兑换编排
//!
//! 严格两阶段、顺序执行：
//! 1. 校验金额并换算为最小单位（本地，不触达网络）
//! 2. 解析智能钱包地址（每次都重新解析，不信任调用方传入的地址）
//! 3. 链上转账到智能钱包
//! 4. 以交易哈希为凭证调用批量兑换接口
//!
//! 兑换失败时没有补偿交易（不退款、不自动重试），失败结果中带上交易哈希，
//! 由调用方对账或通过 confirm_swap 重新确认。
//! 同一用户不能并发调用 transfer_and_swap，本模块不做在途锁。

use std::sync::Arc;

use serde::Serialize;

use crate::{
    domain::{NativeAmount, SmartWalletAddress, TransactionId, UserKey},
    error::TransferSwapError,
    infrastructure::log_redact::{redact_address, redact_hex_string},
    service::{
        identity_resolver::IdentityResolver,
        transfer::{TransferCapability, TransferRequest},
        wallet_api::{BatchSwapRequest, SwapConfirmation, WalletApi},
    },
};

/// 两阶段全部成功后的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSwapResult {
    pub user_key: UserKey,
    pub smart_wallet_address: SmartWalletAddress,
    pub amount: String,
    pub base_units: String,
    pub transaction_id: TransactionId,
    pub swap_confirmation: SwapConfirmation,
}

pub struct TransferSwapOrchestrator {
    resolver: Arc<IdentityResolver>,
    transfer: Arc<dyn TransferCapability>,
    api: Arc<dyn WalletApi>,
    native_decimals: u32,
}

impl TransferSwapOrchestrator {
    pub fn new(
        resolver: Arc<IdentityResolver>,
        transfer: Arc<dyn TransferCapability>,
        api: Arc<dyn WalletApi>,
        native_decimals: u32,
    ) -> Self {
        Self {
            resolver,
            transfer,
            api,
            native_decimals,
        }
    }

    pub async fn transfer_and_swap(
        &self,
        user_key: &str,
        amount: &str,
    ) -> Result<TransferSwapResult, TransferSwapError> {
        // 1. 金额校验是纯本地操作，必须先于任何网络请求（包括注册）
        let amount = NativeAmount::parse(amount, self.native_decimals)?;

        // 2. 没有确认的目标地址，资金不动
        let record = self
            .resolver
            .resolve(user_key, false)
            .await
            .map_err(TransferSwapError::RecipientUnresolved)?;

        let request = TransferRequest {
            sender: record.user_key.clone(),
            destination: record.smart_wallet_address.clone(),
            amount,
        };

        tracing::info!(
            user = %redact_address(request.sender.as_str()),
            smart_wallet = %redact_address(request.destination.as_str()),
            amount = %request.amount,
            "Submitting transfer to smart wallet"
        );

        // 3. 链上转账（可能等待用户签名）
        let transaction_id = self.transfer.transfer(&request).await.map_err(|e| {
            tracing::warn!(
                user = %redact_address(request.sender.as_str()),
                error = %e,
                "Transfer rejected"
            );
            TransferSwapError::TransferRejected(e)
        })?;

        tracing::info!(
            tx = %redact_hex_string(transaction_id.as_str(), 6),
            "Transfer submitted, confirming batch swap"
        );

        // 4-6. 兑换确认
        let swap_confirmation = self
            .request_swap(&request.sender, &request.amount, &transaction_id)
            .await?;

        Ok(TransferSwapResult {
            user_key: request.sender,
            smart_wallet_address: request.destination,
            amount: request.amount.to_string(),
            base_units: request.amount.base_units().to_string(),
            transaction_id,
            swap_confirmation,
        })
    }

    /// 对已完成的转账重新发起兑换确认，不会再次转账
    pub async fn confirm_swap(
        &self,
        user_key: &str,
        amount: &str,
        transaction_id: &TransactionId,
    ) -> Result<SwapConfirmation, TransferSwapError> {
        let user_key = UserKey::parse(user_key).map_err(TransferSwapError::RecipientUnresolved)?;
        let amount = NativeAmount::parse(amount, self.native_decimals)?;
        self.request_swap(&user_key, &amount, transaction_id).await
    }

    async fn request_swap(
        &self,
        user_key: &UserKey,
        amount: &NativeAmount,
        transaction_id: &TransactionId,
    ) -> Result<SwapConfirmation, TransferSwapError> {
        let swap = BatchSwapRequest::new(user_key, amount, transaction_id);
        match self.api.execute_batch_swap(&swap).await {
            Ok(confirmation) => {
                tracing::info!(
                    user = %redact_address(user_key.as_str()),
                    tx = %redact_hex_string(transaction_id.as_str(), 6),
                    "Batch swap confirmed"
                );
                Ok(confirmation)
            }
            Err(source) => {
                // 资金已转出，必须保留交易哈希供对账
                tracing::error!(
                    user = %redact_address(user_key.as_str()),
                    tx = %redact_hex_string(transaction_id.as_str(), 6),
                    error = %source,
                    "Batch swap confirmation failed after transfer"
                );
                Err(TransferSwapError::SwapConfirmationFailed {
                    transaction_id: transaction_id.clone(),
                    source,
                })
            }
        }
    }
}
