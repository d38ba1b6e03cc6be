//! 智能钱包解析集成测试
//!
//! 覆盖：缓存命中不发请求、查询失败后注册、地址规范化、强制刷新、清除缓存

mod common;

use common::{ApiCall, FakeTransfer, FakeWalletApi, Harness};
use smartvault::{
    error::{ApiError, ResolutionError},
    service::{ResolutionSource, WalletDetails},
    ErrorCode,
};

fn harness(api: FakeWalletApi) -> Harness {
    Harness::new(api, FakeTransfer::succeeding("0xunused"))
}

#[tokio::test]
async fn test_cache_hit_issues_no_network_call() {
    let h = harness(FakeWalletApi::new());
    h.seed("0xABC", "0x111").await;

    let (record, source) = h
        .state
        .resolver
        .resolve_with_source("0xABC", false)
        .await
        .unwrap();

    assert_eq!(source, ResolutionSource::Cache);
    assert_eq!(record.smart_wallet_address.as_str(), "0x111");
    assert_eq!(h.api.network_calls(), 0);
}

#[tokio::test]
async fn test_first_use_registers_and_caches_normalized_address() {
    let api = FakeWalletApi::new()
        .with_lookup(Err(ApiError::NotFound))
        .with_register(Ok(WalletDetails::with_address("DEF123")));
    let h = harness(api);

    let record = h.state.resolver.resolve("0xABC", false).await.unwrap();

    assert_eq!(record.user_key.as_str(), "0xABC");
    assert_eq!(record.smart_wallet_address.as_str(), "0xDEF123");
    assert_eq!(h.cached_address("0xABC").await.as_deref(), Some("0xDEF123"));
    assert_eq!(
        h.api.calls(),
        vec![
            ApiCall::Lookup("0xABC".into()),
            ApiCall::Register("0xABC".into())
        ]
    );

    // 第二次解析走缓存
    let again = h.state.resolver.resolve("0xABC", false).await.unwrap();
    assert_eq!(again, record);
    assert_eq!(h.api.network_calls(), 2);
}

#[tokio::test]
async fn test_transport_error_on_lookup_still_falls_back_once() {
    let api = FakeWalletApi::new()
        .with_lookup(Err(ApiError::Transport("connection reset".into())))
        .with_register(Ok(WalletDetails::with_address("0xbeef")));
    let h = harness(api);

    let record = h.state.resolver.resolve("0xABC", false).await.unwrap();
    assert_eq!(record.smart_wallet_address.as_str(), "0xbeef");
    assert_eq!(h.api.network_calls(), 2);
}

#[tokio::test]
async fn test_both_remote_calls_failing_is_registration_failed() {
    let api = FakeWalletApi::new()
        .with_lookup(Err(ApiError::NotFound))
        .with_register(Err(ApiError::Status {
            status: 500,
            body: "internal".into(),
        }));
    let h = harness(api);

    let err = h.state.resolver.resolve("0xABC", false).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::RegistrationFailed);
    assert_eq!(
        err,
        ResolutionError::RegistrationFailed {
            lookup: ApiError::NotFound,
            source: ApiError::Status {
                status: 500,
                body: "internal".into(),
            },
        }
    );
    // 恰好一次查询、一次注册，不重试
    assert_eq!(h.api.network_calls(), 2);
    assert_eq!(h.cached_address("0xABC").await, None);
}

#[tokio::test]
async fn test_missing_user_key() {
    let h = harness(FakeWalletApi::new());

    for key in ["", "  "] {
        let err = h.state.resolver.resolve(key, false).await.unwrap_err();
        assert_eq!(err, ResolutionError::NoUserKey);
        assert_eq!(err.code(), ErrorCode::NoUserKey);
    }
    assert_eq!(h.api.network_calls(), 0);
}

#[tokio::test]
async fn test_force_refresh_bypasses_stale_cache() {
    let api = FakeWalletApi::new().with_lookup(Ok(WalletDetails::with_address("222")));
    let h = harness(api);
    h.seed("0xABC", "0x111").await;

    let record = h.state.resolver.resolve("0xABC", true).await.unwrap();

    assert_eq!(record.smart_wallet_address.as_str(), "0x222");
    assert_eq!(h.cached_address("0xABC").await.as_deref(), Some("0x222"));
    assert_eq!(h.api.calls(), vec![ApiCall::Lookup("0xABC".into())]);
}

#[tokio::test]
async fn test_clear_then_resolve_goes_remote() {
    let api = FakeWalletApi::new().with_lookup(Ok(WalletDetails::with_address("0x333")));
    let h = harness(api);
    h.seed("0xABC", "0x111").await;
    h.seed("0xOTHER", "0x999").await;

    h.state.resolver.clear("0xABC").await.unwrap();
    assert_eq!(h.state.resolver.cached("0xABC").await.unwrap(), None);
    // 其他用户不受影响
    assert_eq!(h.cached_address("0xOTHER").await.as_deref(), Some("0x999"));

    let record = h.state.resolver.resolve("0xABC", false).await.unwrap();
    assert_eq!(record.smart_wallet_address.as_str(), "0x333");
    assert_eq!(h.api.network_calls(), 1);
}

#[tokio::test]
async fn test_cached_read_never_touches_network() {
    let h = harness(FakeWalletApi::new());

    assert_eq!(h.state.resolver.cached("0xABC").await.unwrap(), None);
    h.seed("0xABC", "abc").await;
    let record = h.state.resolver.cached("0xABC").await.unwrap().unwrap();
    assert_eq!(record.smart_wallet_address.as_str(), "0xabc");
    assert_eq!(h.api.network_calls(), 0);
}

#[tokio::test]
async fn test_fetch_details_refreshes_cache() {
    let api = FakeWalletApi::new().with_lookup(Ok(WalletDetails::with_address("0X444")));
    let h = harness(api);

    let record = h.state.resolver.fetch_details("0xABC").await.unwrap();
    assert_eq!(record.smart_wallet_address.as_str(), "0x444");
    assert_eq!(h.cached_address("0xABC").await.as_deref(), Some("0x444"));
}

#[tokio::test]
async fn test_investment_facade_resolves_wallet() {
    let api = FakeWalletApi::new().with_lookup(Ok(WalletDetails::with_address("555")));
    let h = harness(api);

    let record = h
        .state
        .investments
        .resolve_wallet_for_user("0xABC")
        .await
        .unwrap();
    assert_eq!(record.smart_wallet_address.as_str(), "0x555");
}
