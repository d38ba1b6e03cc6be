//! 智能钱包持久化缓存
//!
//! 每个 UserKey 一条记录，键名按用户命名空间隔离（`smartWallet_{user_key}`），
//! 不同用户之间不会互相覆盖。只有调用方显式 clear 才会删除记录。

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::{
    domain::{UserKey, WalletRecord},
    error::CacheError,
    infrastructure::cache::RedisCtx,
};

/// 缓存键前缀
pub mod cache_keys {
    pub const SMART_WALLET: &str = "smartWallet_";

    pub fn smart_wallet(prefix: &str, user_key: &str) -> String {
        format!("{}{}", prefix, user_key)
    }
}

#[async_trait]
pub trait WalletCache: Send + Sync {
    /// 读取用户的智能钱包记录
    async fn get(&self, user_key: &UserKey) -> Result<Option<WalletRecord>, CacheError>;

    /// 写入记录；record.user_key 必须与 user_key 一致
    async fn set(&self, user_key: &UserKey, record: &WalletRecord) -> Result<(), CacheError>;

    /// 删除记录（登出 / 断开钱包）
    async fn clear(&self, user_key: &UserKey) -> Result<(), CacheError>;
}

fn ensure_owner(user_key: &UserKey, record: &WalletRecord) -> Result<(), CacheError> {
    if &record.user_key != user_key {
        return Err(CacheError::KeyMismatch {
            cache_key: user_key.to_string(),
            record_key: record.user_key.to_string(),
        });
    }
    Ok(())
}

// ============ 内存实现 ============

/// 进程内缓存，用于测试和无 Redis 的单机场景
#[derive(Clone)]
pub struct InMemoryWalletCache {
    key_prefix: String,
    entries: Arc<RwLock<HashMap<String, WalletRecord>>>,
}

impl Default for InMemoryWalletCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWalletCache {
    pub fn new() -> Self {
        Self::with_prefix(cache_keys::SMART_WALLET)
    }

    pub fn with_prefix(key_prefix: &str) -> Self {
        Self {
            key_prefix: key_prefix.to_string(),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn key(&self, user_key: &UserKey) -> String {
        cache_keys::smart_wallet(&self.key_prefix, user_key.as_str())
    }
}

#[async_trait]
impl WalletCache for InMemoryWalletCache {
    async fn get(&self, user_key: &UserKey) -> Result<Option<WalletRecord>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&self.key(user_key)).cloned())
    }

    async fn set(&self, user_key: &UserKey, record: &WalletRecord) -> Result<(), CacheError> {
        ensure_owner(user_key, record)?;
        let mut entries = self.entries.write().await;
        entries.insert(self.key(user_key), record.clone());
        Ok(())
    }

    async fn clear(&self, user_key: &UserKey) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.remove(&self.key(user_key));
        Ok(())
    }
}

// ============ 文件实现 ============

/// 本地 JSON 文件缓存，进程退出后仍然保留
///
/// 整个文件是一个 `{namespaced_key: WalletRecord}` 对象。
/// 写入先落到临时文件再 rename，中途崩溃不会留下半个文件。
pub struct JsonFileWalletCache {
    path: PathBuf,
    key_prefix: String,
    // 串行化同一进程内的读-改-写
    write_lock: Mutex<()>,
}

type FileEntries = BTreeMap<String, WalletRecord>;

impl JsonFileWalletCache {
    pub fn new(path: impl Into<PathBuf>, key_prefix: &str) -> Self {
        Self {
            path: path.into(),
            key_prefix: key_prefix.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn key(&self, user_key: &UserKey) -> String {
        cache_keys::smart_wallet(&self.key_prefix, user_key.as_str())
    }

    async fn load(&self) -> Result<FileEntries, CacheError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(FileEntries::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileEntries::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, entries: &FileEntries) -> Result<(), CacheError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let serialized = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serialized).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl WalletCache for JsonFileWalletCache {
    async fn get(&self, user_key: &UserKey) -> Result<Option<WalletRecord>, CacheError> {
        let entries = self.load().await?;
        match entries.get(&self.key(user_key)) {
            Some(record) if &record.user_key != user_key => {
                tracing::warn!(
                    user_key = %user_key,
                    stored_for = %record.user_key,
                    "Ignoring smart wallet cache entry stored for another user"
                );
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    async fn set(&self, user_key: &UserKey, record: &WalletRecord) -> Result<(), CacheError> {
        ensure_owner(user_key, record)?;
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(self.key(user_key), record.clone());
        self.store(&entries).await
    }

    async fn clear(&self, user_key: &UserKey) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(&self.key(user_key)).is_some() {
            self.store(&entries).await?;
        }
        Ok(())
    }
}

// ============ Redis 实现 ============

/// Redis 持久化缓存，值为 JSON 序列化的 WalletRecord
pub struct RedisWalletCache {
    redis: RedisCtx,
    key_prefix: String,
    ttl: Option<Duration>,
}

impl RedisWalletCache {
    pub fn new(redis: RedisCtx, key_prefix: &str, ttl: Option<Duration>) -> Self {
        Self {
            redis,
            key_prefix: key_prefix.to_string(),
            ttl,
        }
    }

    fn key(&self, user_key: &UserKey) -> String {
        cache_keys::smart_wallet(&self.key_prefix, user_key.as_str())
    }
}

#[async_trait]
impl WalletCache for RedisWalletCache {
    async fn get(&self, user_key: &UserKey) -> Result<Option<WalletRecord>, CacheError> {
        let Some(raw) = self.redis.get(&self.key(user_key)).await? else {
            return Ok(None);
        };

        let record: WalletRecord = serde_json::from_str(&raw)?;
        if &record.user_key != user_key {
            tracing::warn!(
                user_key = %user_key,
                stored_for = %record.user_key,
                "Ignoring smart wallet cache entry stored for another user"
            );
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn set(&self, user_key: &UserKey, record: &WalletRecord) -> Result<(), CacheError> {
        ensure_owner(user_key, record)?;
        let serialized = serde_json::to_string(record)?;
        self.redis
            .set(&self.key(user_key), &serialized, self.ttl)
            .await?;
        Ok(())
    }

    async fn clear(&self, user_key: &UserKey) -> Result<(), CacheError> {
        self.redis.delete(&self.key(user_key)).await?;
        Ok(())
    }
}
