use std::sync::Arc;

use anyhow::Context;

use crate::{
    config::Config,
    infrastructure::{
        cache::RedisCtx,
        wallet_cache::{InMemoryWalletCache, JsonFileWalletCache, RedisWalletCache, WalletCache},
    },
    service::{
        identity_resolver::IdentityResolver,
        investment_service::InvestmentService,
        transfer::{JsonRpcTransferCapability, TransferCapability},
        transfer_swap::TransferSwapOrchestrator,
        wallet_api::{HttpWalletApi, WalletApi},
    },
};

/// 应用状态
/// 组装解析器、编排器与投资入口，共享同一份 API 客户端与缓存
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Arc<IdentityResolver>,
    pub orchestrator: Arc<TransferSwapOrchestrator>,
    pub investments: Arc<InvestmentService>,
}

impl AppState {
    /// 使用外部提供的协作方组装服务
    pub fn new(
        config: Arc<Config>,
        api: Arc<dyn WalletApi>,
        cache: Arc<dyn WalletCache>,
        transfer: Arc<dyn TransferCapability>,
    ) -> Self {
        let resolver = Arc::new(IdentityResolver::new(api.clone(), cache));
        let orchestrator = Arc::new(TransferSwapOrchestrator::new(
            resolver.clone(),
            transfer,
            api,
            config.chain.native_decimals,
        ));
        let investments = Arc::new(InvestmentService::new(
            resolver.clone(),
            orchestrator.clone(),
        ));

        Self {
            config,
            resolver,
            orchestrator,
            investments,
        }
    }

    /// 按配置创建 HTTP 客户端、缓存后端和钱包 RPC 转账能力
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let api: Arc<dyn WalletApi> = Arc::new(HttpWalletApi::new(&config.api)?);
        let cache = Self::build_cache(&config)?;
        let transfer: Arc<dyn TransferCapability> = Arc::new(JsonRpcTransferCapability::new(
            &config.chain.wallet_rpc_url,
            config.api.timeout(),
        )?);

        Ok(Self::new(Arc::new(config), api, cache, transfer))
    }

    fn build_cache(config: &Config) -> anyhow::Result<Arc<dyn WalletCache>> {
        match config.cache.backend.as_str() {
            "redis" => {
                let url = config
                    .cache
                    .redis_url
                    .as_deref()
                    .context("REDIS_URL must be set when CACHE_BACKEND=redis")?;
                let redis = RedisCtx::new(url).context("Failed to create Redis client")?;
                tracing::info!("Using Redis smart wallet cache");
                Ok(Arc::new(RedisWalletCache::new(
                    redis,
                    &config.cache.key_prefix,
                    config.cache.ttl(),
                )))
            }
            "file" => {
                let cache = JsonFileWalletCache::new(&config.cache.file_path, &config.cache.key_prefix);
                tracing::info!(path = %cache.path().display(), "Using file smart wallet cache");
                Ok(Arc::new(cache))
            }
            _ => {
                tracing::warn!("Using in-memory smart wallet cache, entries are lost on exit");
                Ok(Arc::new(InMemoryWalletCache::with_prefix(
                    &config.cache.key_prefix,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_with_memory_cache() {
        let mut config = Config::from_env().unwrap();
        config.api.base_url = "http://localhost:3000".into();
        config.cache.backend = "memory".into();
        config.logging.level = "info".into();
        config.logging.format = "text".into();
        config.chain.native_decimals = 18;

        let state = AppState::from_config(config).unwrap();
        assert_eq!(state.config.chain.native_decimals, 18);
    }

    #[tokio::test]
    async fn test_file_cache_is_shared_across_states() {
        use crate::domain::{SmartWalletAddress, UserKey, WalletRecord};

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_env().unwrap();
        config.api.base_url = "http://localhost:3000".into();
        config.cache.backend = "file".into();
        config.cache.file_path = dir.path().join("wallet_cache.json").display().to_string();
        config.logging.level = "info".into();
        config.logging.format = "text".into();
        config.chain.native_decimals = 18;

        // 模拟上一次运行写入的缓存
        let previous = JsonFileWalletCache::new(&config.cache.file_path, &config.cache.key_prefix);
        let alice = UserKey::parse("0xA11CE").unwrap();
        previous
            .set(
                &alice,
                &WalletRecord::new(alice.clone(), SmartWalletAddress::normalize("111").unwrap()),
            )
            .await
            .unwrap();

        let state = AppState::from_config(config).unwrap();
        let cached = state.resolver.cached("0xA11CE").await.unwrap().unwrap();
        assert_eq!(cached.smart_wallet_address.as_str(), "0x111");

        state.resolver.clear("0xA11CE").await.unwrap();
        assert_eq!(previous.get(&alice).await.unwrap(), None);
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let mut config = Config::from_env().unwrap();
        config.cache.backend = "disk".into();
        assert!(AppState::from_config(config).is_err());
    }
}
