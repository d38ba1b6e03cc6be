//! 智能钱包身份解析
//!
//! 缓存优先：命中缓存直接返回，不发起任何网络请求。
//! 未命中时查询一次，查询失败再注册一次；不循环、不自动重试。
//! 只有远程调用成功后才写缓存，返回的地址一定是规范化后的地址。

use std::sync::Arc;

use crate::{
    domain::{SmartWalletAddress, UserKey, WalletRecord},
    error::{ApiError, ResolutionError},
    infrastructure::{log_redact::redact_address, wallet_cache::WalletCache},
    service::wallet_api::{WalletApi, WalletDetails},
};

/// 解析结果的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Cache,
    Lookup,
    Registration,
}

pub struct IdentityResolver {
    api: Arc<dyn WalletApi>,
    cache: Arc<dyn WalletCache>,
}

impl IdentityResolver {
    pub fn new(api: Arc<dyn WalletApi>, cache: Arc<dyn WalletCache>) -> Self {
        Self { api, cache }
    }

    /// 解析用户的智能钱包地址
    ///
    /// `force_refresh` 为 true 时跳过缓存读取（缓存地址可能已过期），
    /// 其余流程与普通解析一致。
    pub async fn resolve(
        &self,
        user_key: &str,
        force_refresh: bool,
    ) -> Result<WalletRecord, ResolutionError> {
        self.resolve_with_source(user_key, force_refresh)
            .await
            .map(|(record, _)| record)
    }

    pub async fn resolve_with_source(
        &self,
        user_key: &str,
        force_refresh: bool,
    ) -> Result<(WalletRecord, ResolutionSource), ResolutionError> {
        let user_key = UserKey::parse(user_key)?;

        if !force_refresh {
            if let Some(record) = self.read_cache(&user_key).await {
                tracing::debug!(
                    user = %redact_address(user_key.as_str()),
                    "Smart wallet resolved from cache"
                );
                return Ok((record, ResolutionSource::Cache));
            }
        }

        let lookup_error = match self.lookup(&user_key).await {
            Ok(record) => {
                self.write_cache(&record).await;
                return Ok((record, ResolutionSource::Lookup));
            }
            Err(e) => e,
        };

        tracing::info!(
            user = %redact_address(user_key.as_str()),
            reason = %lookup_error,
            "Smart wallet lookup failed, registering wallet"
        );

        match self.register(&user_key).await {
            Ok(record) => {
                tracing::info!(
                    user = %redact_address(user_key.as_str()),
                    smart_wallet = %redact_address(record.smart_wallet_address.as_str()),
                    "Smart wallet registered"
                );
                self.write_cache(&record).await;
                Ok((record, ResolutionSource::Registration))
            }
            Err(source) => {
                tracing::error!(
                    user = %redact_address(user_key.as_str()),
                    lookup = %lookup_error,
                    error = %source,
                    "Smart wallet registration failed"
                );
                Err(ResolutionError::RegistrationFailed {
                    lookup: lookup_error,
                    source,
                })
            }
        }
    }

    /// 仅读缓存，不发起网络请求
    pub async fn cached(&self, user_key: &str) -> Result<Option<WalletRecord>, ResolutionError> {
        let user_key = UserKey::parse(user_key)?;
        Ok(self.read_cache(&user_key).await)
    }

    /// 单次远程查询并刷新缓存；失败时不会注册
    pub async fn fetch_details(&self, user_key: &str) -> Result<WalletRecord, ResolutionError> {
        let user_key = UserKey::parse(user_key)?;
        let record = self
            .lookup(&user_key)
            .await
            .map_err(ResolutionError::LookupFailed)?;
        self.write_cache(&record).await;
        Ok(record)
    }

    /// 清除缓存（登出 / 断开钱包）
    pub async fn clear(&self, user_key: &str) -> Result<(), ResolutionError> {
        let user_key = UserKey::parse(user_key)?;
        self.cache.clear(&user_key).await?;
        tracing::info!(
            user = %redact_address(user_key.as_str()),
            "Smart wallet cache cleared"
        );
        Ok(())
    }

    async fn lookup(&self, user_key: &UserKey) -> Result<WalletRecord, ApiError> {
        let details = self.api.get_wallet_details(user_key).await?;
        Self::record_from(user_key, details)
    }

    async fn register(&self, user_key: &UserKey) -> Result<WalletRecord, ApiError> {
        let details = self.api.register_wallet(user_key).await?;
        Self::record_from(user_key, details)
    }

    fn record_from(user_key: &UserKey, details: WalletDetails) -> Result<WalletRecord, ApiError> {
        let raw = details
            .wallet_address
            .ok_or_else(|| ApiError::InvalidResponse("response has no wallet address".into()))?;
        let address = SmartWalletAddress::normalize(&raw).ok_or_else(|| {
            ApiError::InvalidResponse(format!("unusable wallet address: {:?}", raw))
        })?;
        Ok(WalletRecord::new(user_key.clone(), address))
    }

    /// 缓存读取失败按未命中处理
    async fn read_cache(&self, user_key: &UserKey) -> Option<WalletRecord> {
        match self.cache.get(user_key).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    user = %redact_address(user_key.as_str()),
                    error = %e,
                    "Smart wallet cache read failed, treating as miss"
                );
                None
            }
        }
    }

    /// 缓存写入失败不影响本次解析结果
    async fn write_cache(&self, record: &WalletRecord) {
        if let Err(e) = self.cache.set(&record.user_key, record).await {
            tracing::warn!(
                user = %redact_address(record.user_key.as_str()),
                error = %e,
                "Smart wallet cache write failed"
            );
        }
    }
}
