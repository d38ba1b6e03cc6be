//! 投资提交入口（供 UI 调用）
//!
//! UI 只使用两个操作：解析用户的智能钱包、提交已注资的投资。
//! 提交时先完成转账与兑换，成功后才返回包含篮子选择的回执。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    domain::WalletRecord,
    error::{InvestmentError, ResolutionError},
    service::{
        identity_resolver::IdentityResolver,
        transfer_swap::{TransferSwapOrchestrator, TransferSwapResult},
    },
};

/// 一次投资提交
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentSubmission {
    pub user_key: String,
    /// 用户选择的投资篮子
    pub basket: String,
    /// 原生币数量（十进制字符串）
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentReceipt {
    pub basket: String,
    pub transfer: TransferSwapResult,
}

pub struct InvestmentService {
    resolver: Arc<IdentityResolver>,
    orchestrator: Arc<TransferSwapOrchestrator>,
}

impl InvestmentService {
    pub fn new(resolver: Arc<IdentityResolver>, orchestrator: Arc<TransferSwapOrchestrator>) -> Self {
        Self {
            resolver,
            orchestrator,
        }
    }

    /// 连接钱包后调用：缓存优先解析，必要时注册
    pub async fn resolve_wallet_for_user(
        &self,
        user_key: &str,
    ) -> Result<WalletRecord, ResolutionError> {
        self.resolver.resolve(user_key, false).await
    }

    /// 提交已注资的投资
    pub async fn submit_funded_investment(
        &self,
        submission: &InvestmentSubmission,
    ) -> Result<InvestmentReceipt, InvestmentError> {
        let basket = submission.basket.trim();
        if basket.is_empty() {
            return Err(InvestmentError::InvalidSubmission(
                "no basket selected".to_string(),
            ));
        }

        let transfer = self
            .orchestrator
            .transfer_and_swap(&submission.user_key, &submission.amount)
            .await?;

        tracing::info!(
            basket = %basket,
            tx = %transfer.transaction_id,
            "Funded investment submitted"
        );

        Ok(InvestmentReceipt {
            basket: basket.to_string(),
            transfer,
        })
    }
}
