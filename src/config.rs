use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 指定配置文件路径的环境变量
pub const CONFIG_ENV: &str = "DENSITY_CUBE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("无法读取配置文件 {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件格式错误 {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 服务配置，所有字段都有默认值，配置文件中只需写需要覆盖的部分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// 未指定时每个 chunk 包含的元素数量（Float64 个数）
    pub default_chunk_size: usize,
    /// 单个网格允许的最大格点数，超出的创建请求直接拒绝
    pub max_cube_len: usize,
    /// 网格在存储中的存活时间（秒）
    pub cube_ttl_secs: u64,
    /// 后台清理任务的执行间隔（秒）
    pub cleanup_interval_secs: u64,
    /// tracing 过滤规则，RUST_LOG 优先
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            default_chunk_size: 1_000_000,
            // 512³ 个 Float64，约 1 GiB
            max_cube_len: 512 * 512 * 512,
            cube_ttl_secs: 30 * 60,
            cleanup_interval_secs: 5 * 60,
            log_filter: "info,density_cube=debug".to_string(),
        }
    }
}

impl ServiceConfig {
    /// 从环境变量指定的文件加载配置，未设置时使用默认值
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn cube_ttl(&self) -> Duration {
        Duration::from_secs(self.cube_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        // interval 为 0 时 tokio 会 panic
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: ServiceConfig = serde_json::from_str(r#"{ "port": 9090 }"#).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.cube_ttl(), Duration::from_secs(1800));
        assert_eq!(config.max_cube_len, 134_217_728);
    }

    #[test]
    fn zero_cleanup_interval_is_clamped() {
        let config = ServiceConfig {
            cleanup_interval_secs: 0,
            ..ServiceConfig::default()
        };
        assert_eq!(config.cleanup_interval(), Duration::from_secs(1));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ServiceConfig::from_file(Path::new("/nonexistent/density-cube.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("density-cube-{}.json", std::process::id()));
        std::fs::write(&path, "{ port: ").unwrap();
        let err = ServiceConfig::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
