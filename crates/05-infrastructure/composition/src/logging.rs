//! 日志初始化

use crate::settings::RegistrySettings;
use infrastructure_common::ConfigResult;
use tracing::{debug, info};

/// 日志配置
///
/// 默认配置用于常规启动；排查组件解析顺序时使用 [`verbose`](Self::verbose)，
/// 它额外输出线程和源码位置。
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: tracing::Level,
    /// 输出事件所在模块路径
    pub show_target: bool,
    pub show_thread_ids: bool,
    pub show_file: bool,
    pub show_line_number: bool,
    /// 输出 JSON 行，便于日志采集
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::at_level(tracing::Level::INFO)
    }
}

impl LoggingConfig {
    /// 指定级别的常规配置
    pub fn at_level(level: tracing::Level) -> Self {
        Self {
            level,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }

    /// 诊断用配置，带线程和源码位置
    pub fn verbose(level: tracing::Level) -> Self {
        Self {
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            ..Self::at_level(level)
        }
    }

    /// 根据注册表配置生成日志配置
    pub fn from_settings(settings: &RegistrySettings) -> ConfigResult<Self> {
        Ok(Self {
            json_format: settings.logging.json,
            ..Self::at_level(settings.log_level()?)
        })
    }

    /// 初始化全局日志订阅者
    ///
    /// 已经初始化过时返回 `false`，不视为错误。
    pub fn init(&self) -> bool {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.level)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        let result = if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        };

        match result {
            Ok(()) => {
                info!("日志系统初始化完成，级别: {}", self.level);
                true
            }
            Err(e) => {
                debug!("日志系统已初始化，跳过: {}", e);
                false
            }
        }
    }
}
