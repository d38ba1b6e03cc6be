//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{domain::DEFAULT_NATIVE_DECIMALS, infrastructure::wallet_cache::cache_keys};

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 远程钱包 API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// 默认的本地缓存文件
pub const DEFAULT_CACHE_FILE: &str = ".smartvault/wallet_cache.json";

/// 智能钱包缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: String, // "file", "redis" or "memory"
    #[serde(default = "default_cache_file")]
    pub file_path: String,
    #[serde(default)]
    pub redis_url: Option<String>,
    pub key_prefix: String,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

/// 链配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub native_decimals: u32,
    pub wallet_rpc_url: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("WALLET_API_BASE_URL")
                .unwrap_or_else(|_| "https://api-test-production-9439.up.railway.app".into()),
            timeout_secs: std::env::var("WALLET_API_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // 命令行每次只执行一个命令，默认用文件缓存才能跨进程保留
            backend: std::env::var("CACHE_BACKEND").unwrap_or_else(|_| "file".into()),
            file_path: default_cache_file(),
            redis_url: std::env::var("REDIS_URL").ok(),
            key_prefix: std::env::var("CACHE_KEY_PREFIX")
                .unwrap_or_else(|_| cache_keys::SMART_WALLET.into()),
            ttl_secs: std::env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

fn default_cache_file() -> String {
    std::env::var("CACHE_FILE_PATH").unwrap_or_else(|_| DEFAULT_CACHE_FILE.into())
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            native_decimals: std::env::var("CHAIN_NATIVE_DECIMALS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_NATIVE_DECIMALS),
            wallet_rpc_url: std::env::var("WALLET_RPC_URL")
                .unwrap_or_else(|_| "http://localhost:8545".into()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api: ApiConfig::default(),
            cache: CacheConfig::default(),
            chain: ChainConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                // 文件中缺省的小节回落到环境变量默认值
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            anyhow::bail!("WALLET_API_BASE_URL must start with http:// or https://");
        }

        match self.cache.backend.as_str() {
            "memory" => {}
            "file" => {
                if self.cache.file_path.trim().is_empty() {
                    anyhow::bail!("CACHE_FILE_PATH must not be empty when CACHE_BACKEND=file");
                }
            }
            "redis" => {
                if self.cache.redis_url.is_none() {
                    anyhow::bail!("REDIS_URL must be set when CACHE_BACKEND=redis");
                }
            }
            other => anyhow::bail!(
                "CACHE_BACKEND must be 'file', 'redis' or 'memory', got '{}'",
                other
            ),
        }

        if self.cache.key_prefix.is_empty() {
            anyhow::bail!("CACHE_KEY_PREFIX must not be empty");
        }

        if self.chain.native_decimals > 30 {
            anyhow::bail!("CHAIN_NATIVE_DECIMALS must be at most 30");
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}
