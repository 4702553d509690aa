//! 服务配置
//!
//! 默认值可被 `FLUID_VOLUME_*` 环境变量覆盖。

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::{DEFAULT_VOLUME_NAME, PipelineOptions};

pub const ENV_PREFIX: &str = "FLUID_VOLUME_";

/// 配置错误
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// 无效值
    #[error("无效配置 '{key}': {value} - {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

fn invalid(key: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// 输入文档所在目录
    pub resource_dir: String,
    /// 任务过期时间（秒）
    pub task_ttl_secs: u64,
    /// 过期清理间隔（秒）
    pub cleanup_interval_secs: u64,
    pub volume_name: String,
    pub parallel_steps: bool,
    pub log_level: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            resource_dir: "test/resource".into(),
            task_ttl_secs: 30 * 60,
            cleanup_interval_secs: 5 * 60,
            volume_name: DEFAULT_VOLUME_NAME.into(),
            parallel_steps: true,
            log_level: None,
        }
    }
}

impl ServiceConfig {
    /// 默认配置叠加进程环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 默认配置叠加 `lookup` 提供的变量，key 为完整变量名
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = parse_value("PORT", &port)?;
        }
        if let Some(dir) = get("RESOURCE_DIR") {
            config.resource_dir = dir;
        }
        if let Some(ttl) = get("TASK_TTL_SECS") {
            config.task_ttl_secs = parse_value("TASK_TTL_SECS", &ttl)?;
        }
        if let Some(interval) = get("CLEANUP_INTERVAL_SECS") {
            config.cleanup_interval_secs = parse_value("CLEANUP_INTERVAL_SECS", &interval)?;
        }
        if let Some(name) = get("VOLUME_NAME") {
            config.volume_name = name;
        }
        if let Some(parallel) = get("PARALLEL_STEPS") {
            config.parallel_steps = parse_value("PARALLEL_STEPS", &parallel)?;
        }
        if let Some(level) = get("LOG_LEVEL") {
            config.log_level = Some(level);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_resource_dir(mut self, dir: impl Into<String>) -> Self {
        self.resource_dir = dir.into();
        self
    }

    pub fn with_parallel_steps(mut self, parallel: bool) -> Self {
        self.parallel_steps = parallel;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(invalid("PORT", self.port, "端口不能为 0"));
        }
        if self.task_ttl_secs == 0 {
            return Err(invalid("TASK_TTL_SECS", self.task_ttl_secs, "必须为正数"));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(invalid(
                "CLEANUP_INTERVAL_SECS",
                self.cleanup_interval_secs,
                "必须为正数",
            ));
        }
        if self.volume_name.trim().is_empty() {
            return Err(invalid("VOLUME_NAME", &self.volume_name, "不能为空"));
        }
        Ok(())
    }

    pub fn task_ttl(&self) -> Duration {
        Duration::from_secs(self.task_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            volume_name: self.volume_name.clone(),
            parallel: self.parallel_steps,
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(&format!("{}{}", ENV_PREFIX, key), raw, "无法解析"))
}
