//! 注册表配置
//!
//! 依次合并内置默认值、可选的配置文件以及 `COMPONENT` 前缀的环境变量，
//! 例如 `COMPONENT__LOGGING__LEVEL=debug`。

use component_registry::{RegistryOptions, DEFAULT_BASE_NAME};
use infrastructure_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, error};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "COMPONENT";

/// 环境变量层级分隔符
pub const ENV_SEPARATOR: &str = "__";

/// 注册表配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// 通用基础组件名称
    pub base_component: String,
    /// 是否在用户模块之前注册内置核心模块
    pub seed_base: bool,
    /// 日志配置
    pub logging: LoggingSettings,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            base_component: DEFAULT_BASE_NAME.to_string(),
            seed_base: true,
            logging: LoggingSettings::default(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub enabled: bool,
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            json: false,
        }
    }
}

impl RegistrySettings {
    /// 从可选配置文件和进程环境变量加载配置
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        Self::load_from(path, None)
    }

    /// 从可选配置文件和给定的环境变量集合加载配置
    ///
    /// `env` 为 `None` 时读取进程环境变量。
    pub fn load_from(path: Option<&Path>, env: Option<config::Map<String, String>>) -> ConfigResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            debug!("加载配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env),
        );

        let settings: Self = builder
            .build()
            .and_then(|loaded| loaded.try_deserialize())
            .map_err(|e| {
                error!("配置解析失败: {}", e);
                ConfigError::ParseError {
                    source: Box::new(e),
                }
            })?;

        settings.validate()?;
        debug!("配置加载完成: {:?}", settings);
        Ok(settings)
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_component.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "base_component 不能为空".to_string(),
            });
        }
        if self.base_component.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError {
                message: format!("base_component 不能包含空白字符: {:?}", self.base_component),
            });
        }
        self.log_level()?;
        Ok(())
    }

    /// 解析日志级别
    pub fn log_level(&self) -> ConfigResult<tracing::Level> {
        tracing::Level::from_str(self.logging.level.trim()).map_err(|_| ConfigError::ValidationError {
            message: format!("无效的日志级别: {}", self.logging.level),
        })
    }

    /// 转换为注册表选项
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            base_name: self.base_component.clone(),
        }
    }
}
