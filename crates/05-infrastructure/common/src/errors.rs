//! 错误类型定义

use std::time::Duration;
use thiserror::Error;

/// 组件构建错误类型
///
/// 均发生在模块加载阶段，表示模块集合配置错误，应当中止启动。
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("组件已存在: {name}，请改用 inherit 扩展该组件或使用不同的 name")]
    DuplicateDeclaration { name: String },

    #[error("组件 {name} 继承了不存在的组件 {parent}")]
    UnknownParent { name: String, parent: String },

    #[error("无法确定组件名称: 未指定 name，且 inherit 不是唯一目标 {inherit:?}")]
    MissingIdentity { inherit: Vec<String> },

    #[error("组件 {name} 的继承层次无法线性化: {detail}")]
    InconsistentHierarchy { name: String, detail: String },

    #[error("组件 {name} 构建完成钩子执行失败: {source}")]
    CompletionHookFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("注册表已封存，无法再注册组件 {name}")]
    RegistrySealed { name: String },
}

/// 组件查找错误类型
///
/// 由调用方决定组件缺失是否可以接受。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("未找到组件: 作用域 '{scope}'，用途 {purpose:?}，目标类型 {target_type:?}")]
    NoComponent {
        scope: String,
        purpose: Option<String>,
        target_type: Option<String>,
    },

    #[error(
        "找到多个组件: 作用域 '{scope}'，用途 {purpose:?}，目标类型 {target_type:?}，候选: {found:?}"
    )]
    SeveralComponents {
        scope: String,
        purpose: Option<String>,
        target_type: Option<String>,
        found: Vec<String>,
    },

    #[error("不存在名为 '{name}' 的组件")]
    UnknownName { name: String },

    #[error("注册表尚未封存，无法查找组件")]
    RegistryNotSealed,
}

/// 可重试任务错误
///
/// 组件内部操作暂时无法完成（例如无法获取咨询锁）时返回，
/// 由上层任务调度决定何时重试。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RetryableJobError {
    /// 错误信息
    pub message: String,
    /// 建议的重试间隔
    pub retry_after: Option<Duration>,
    /// 是否不计入重试次数
    pub ignore_retry: bool,
}

impl RetryableJobError {
    /// 创建新的可重试错误
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retry_after: None,
            ignore_retry: false,
        }
    }

    /// 设置重试间隔
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// 设置为不计入重试次数
    pub fn ignoring_retry(mut self) -> Self {
        self.ignore_retry = true;
        self
    }
}

/// 组件方法调用错误类型
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("组件 {component} 未定义方法 {method}")]
    MethodNotFound { component: String, method: String },

    #[error("组件 {component} 的方法 {method} 没有可调用的上级实现")]
    NoSuperMethod { component: String, method: String },

    #[error("方法 {method} 参数无效: {message}")]
    InvalidArguments { method: String, message: String },

    #[error("组件 {component} 执行 {method} 失败: {message}")]
    Failed {
        component: String,
        method: String,
        message: String,
    },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Retryable(#[from] RetryableJobError),
}

impl ComponentError {
    /// 创建参数无效错误
    pub fn invalid_arguments(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            method: method.into(),
            message: message.into(),
        }
    }

    /// 是否为可重试错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

/// 模块加载错误类型
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("模块已加载: {module}")]
    DuplicateModule { module: String },

    #[error("模块 {module} 依赖的模块 {dependency} 尚未加载")]
    MissingDependency { module: String, dependency: String },

    #[error("模块 {module} 注册组件失败: {source}")]
    Build {
        module: String,
        #[source]
        source: BuildError,
    },

    #[error("封存注册表失败: {0}")]
    Seal(#[source] BuildError),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("模块加载错误: {source}")]
    LoadError {
        #[from]
        source: LoadError,
    },

    #[error("组件构建错误: {source}")]
    BuildError {
        #[from]
        source: BuildError,
    },

    #[error("组件查找错误: {source}")]
    LookupError {
        #[from]
        source: LookupError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type BuildResult<T> = Result<T, BuildError>;
pub type LookupResult<T> = Result<T, LookupError>;
pub type ComponentResult<T> = Result<T, ComponentError>;
pub type LoadResult<T> = Result<T, LoadError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
