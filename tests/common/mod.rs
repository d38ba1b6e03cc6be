//! 测试辅助模块
//! 提供记录调用的假 API / 假转账能力，以及组装好的测试服务

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use smartvault::{
    config::Config,
    domain::{SmartWalletAddress, TransactionId, UserKey, WalletRecord},
    error::{ApiError, TransferFailure},
    infrastructure::{wallet_cache::WalletCache, InMemoryWalletCache},
    service::{
        BatchSwapRequest, SwapConfirmation, TransferCapability, TransferRequest, WalletApi,
        WalletDetails,
    },
    AppState,
};

/// 记录的远程调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Lookup(String),
    Register(String),
    Swap(BatchSwapRequest),
}

/// 按预设结果应答的假钱包 API
pub struct FakeWalletApi {
    lookup: Mutex<Result<WalletDetails, ApiError>>,
    register: Mutex<Result<WalletDetails, ApiError>>,
    swap: Mutex<Result<SwapConfirmation, ApiError>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl FakeWalletApi {
    pub fn new() -> Self {
        Self {
            lookup: Mutex::new(Err(ApiError::NotFound)),
            register: Mutex::new(Err(ApiError::Transport("register not scripted".into()))),
            swap: Mutex::new(Ok(SwapConfirmation(serde_json::json!({ "status": "ok" })))),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_lookup(self, result: Result<WalletDetails, ApiError>) -> Self {
        *self.lookup.lock().unwrap() = result;
        self
    }

    pub fn with_register(self, result: Result<WalletDetails, ApiError>) -> Self {
        *self.register.lock().unwrap() = result;
        self
    }

    pub fn with_swap(self, result: Result<SwapConfirmation, ApiError>) -> Self {
        *self.swap.lock().unwrap() = result;
        self
    }

    pub fn set_swap(&self, result: Result<SwapConfirmation, ApiError>) {
        *self.swap.lock().unwrap() = result;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn network_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn swap_requests(&self) -> Vec<BatchSwapRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::Swap(req) => Some(req),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl WalletApi for FakeWalletApi {
    async fn get_wallet_details(&self, user_key: &UserKey) -> Result<WalletDetails, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(ApiCall::Lookup(user_key.to_string()));
        self.lookup.lock().unwrap().clone()
    }

    async fn register_wallet(&self, user_key: &UserKey) -> Result<WalletDetails, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(ApiCall::Register(user_key.to_string()));
        self.register.lock().unwrap().clone()
    }

    async fn execute_batch_swap(
        &self,
        request: &BatchSwapRequest,
    ) -> Result<SwapConfirmation, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(ApiCall::Swap(request.clone()));
        self.swap.lock().unwrap().clone()
    }
}

/// 记录转账请求的假转账能力
pub struct FakeTransfer {
    result: Mutex<Result<TransactionId, TransferFailure>>,
    requests: Mutex<Vec<TransferRequest>>,
}

impl FakeTransfer {
    pub fn succeeding(tx: &str) -> Self {
        Self {
            result: Mutex::new(Ok(TransactionId::parse(tx).unwrap())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(failure: TransferFailure) -> Self {
        Self {
            result: Mutex::new(Err(failure)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<TransferRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferCapability for FakeTransfer {
    async fn transfer(&self, request: &TransferRequest) -> Result<TransactionId, TransferFailure> {
        self.requests.lock().unwrap().push(request.clone());
        self.result.lock().unwrap().clone()
    }
}

/// 组装好的测试环境
pub struct Harness {
    pub api: Arc<FakeWalletApi>,
    pub cache: Arc<InMemoryWalletCache>,
    pub transfer: Arc<FakeTransfer>,
    pub state: AppState,
}

impl Harness {
    pub fn new(api: FakeWalletApi, transfer: FakeTransfer) -> Self {
        let api = Arc::new(api);
        let cache = Arc::new(InMemoryWalletCache::new());
        let transfer = Arc::new(transfer);
        let state = AppState::new(
            Arc::new(test_config()),
            api.clone(),
            cache.clone(),
            transfer.clone(),
        );

        Self {
            api,
            cache,
            transfer,
            state,
        }
    }

    /// 预置缓存记录
    pub async fn seed(&self, user: &str, address: &str) {
        let key = UserKey::parse(user).unwrap();
        let record = WalletRecord::new(key.clone(), SmartWalletAddress::normalize(address).unwrap());
        self.cache.set(&key, &record).await.unwrap();
    }

    pub async fn cached_address(&self, user: &str) -> Option<String> {
        let key = UserKey::parse(user).unwrap();
        self.cache
            .get(&key)
            .await
            .unwrap()
            .map(|r| r.smart_wallet_address.to_string())
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.api.base_url = "http://localhost:3000".into();
    config.cache.backend = "memory".into();
    config.chain.native_decimals = 18;
    config
}
