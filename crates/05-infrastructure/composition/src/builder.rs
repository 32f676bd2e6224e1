//! 注册表构建器

use crate::loader::{LoadReport, ModuleLoader};
use crate::logging::LoggingConfig;
use crate::module::{core_module, AddonModule};
use crate::settings::RegistrySettings;
use component_registry::{ComponentRegistry, RegistrySnapshot, WorkContext};
use infrastructure_common::{InfrastructureError, InfrastructureResult, Scope};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 注册表构建器
///
/// 组合配置、日志、核心模块和用户模块，生成已封存的注册表。
pub struct RegistryBuilder {
    settings: RegistrySettings,
    modules: Vec<Box<dyn AddonModule>>,
    logging: Option<LoggingConfig>,
    registry: Option<Arc<ComponentRegistry>>,
}

impl RegistryBuilder {
    /// 使用默认配置创建构建器
    pub fn new() -> Self {
        Self::with_settings(RegistrySettings::default())
    }

    /// 使用指定配置创建构建器
    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self {
            settings,
            modules: Vec::new(),
            logging: None,
            registry: None,
        }
    }

    /// 从配置文件和环境变量加载配置
    pub fn from_config_file<P: AsRef<Path>>(path: Option<P>) -> InfrastructureResult<Self> {
        let settings = RegistrySettings::load(path.as_ref().map(AsRef::as_ref))?;
        Ok(Self::with_settings(settings))
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// 添加模块，按添加顺序加载
    pub fn add_module<M: AddonModule + 'static>(mut self, module: M) -> Self {
        debug!("添加模块: {}", module.name());
        self.modules.push(Box::new(module));
        self
    }

    /// 显式配置日志，优先于配置文件中的日志设置
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// 向已有的注册表加载模块，例如全局注册表
    pub fn with_registry(mut self, registry: Arc<ComponentRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 构建并封存注册表
    pub fn build(self) -> InfrastructureResult<ComposedRegistry> {
        self.settings.validate()?;

        let logging = match self.logging {
            Some(config) => Some(config),
            None if self.settings.logging.enabled => Some(LoggingConfig::from_settings(&self.settings)?),
            None => None,
        };
        if let Some(config) = logging {
            config.init();
        }

        info!("开始构建组件注册表，基础组件: {}", self.settings.base_component);

        let registry = match self.registry {
            Some(registry) => {
                if registry.base_name() != self.settings.base_component {
                    return Err(InfrastructureError::BootstrapFailed {
                        message: format!(
                            "注册表的基础组件 {} 与配置 {} 不一致",
                            registry.base_name(),
                            self.settings.base_component
                        ),
                    });
                }
                registry
            }
            None => Arc::new(ComponentRegistry::with_options(self.settings.registry_options())),
        };

        let mut loader = ModuleLoader::new(registry.clone());
        if self.settings.seed_base {
            loader.load(&core_module(&self.settings.base_component))?;
        }
        loader.load_all(&self.modules)?;
        let (snapshot, report) = loader.finish()?;

        info!("组件注册表构建完成，共 {} 个组件", snapshot.len());
        Ok(ComposedRegistry {
            registry,
            snapshot,
            report,
            settings: self.settings,
        })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 已封存的注册表及其加载信息
#[derive(Debug, Clone)]
pub struct ComposedRegistry {
    registry: Arc<ComponentRegistry>,
    snapshot: Arc<RegistrySnapshot>,
    report: LoadReport,
    settings: RegistrySettings,
}

impl ComposedRegistry {
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn snapshot(&self) -> &Arc<RegistrySnapshot> {
        &self.snapshot
    }

    /// 加载报告
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// 创建绑定到本注册表的工作上下文
    pub fn work_context(&self, scope: Arc<dyn Scope>, target_type: impl Into<String>) -> WorkContext {
        WorkContext::new(self.registry.clone(), scope, target_type)
    }
}
