//! 模块加载器
//!
//! 严格按给定顺序注册模块，注册表本身不负责发现或排序模块。

use crate::module::AddonModule;
use chrono::{DateTime, Utc};
use component_registry::{ComponentRegistry, RegistrySnapshot};
use infrastructure_common::{LoadError, LoadResult};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

/// 单个模块的加载记录
#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    /// 模块名称
    pub name: String,
    /// 模块声明的组件，按注册顺序
    pub components: Vec<String>,
    /// 加载时间
    pub loaded_at: DateTime<Utc>,
}

/// 加载报告
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// 开始加载时间
    pub started_at: DateTime<Utc>,
    /// 封存时间
    pub sealed_at: Option<DateTime<Utc>>,
    /// 已加载模块，按加载顺序
    pub modules: Vec<ModuleReport>,
    /// 封存后的组件总数
    pub component_count: usize,
}

impl LoadReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            sealed_at: None,
            modules: Vec::new(),
            component_count: 0,
        }
    }

    /// 按名称获取模块记录
    pub fn module(&self, name: &str) -> Option<&ModuleReport> {
        self.modules.iter().find(|module| module.name == name)
    }

    /// 已加载模块名称
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|module| module.name.as_str()).collect()
    }

    /// 从开始加载到封存的耗时
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.sealed_at.map(|sealed_at| sealed_at - self.started_at)
    }
}

/// 模块加载器
#[derive(Debug)]
pub struct ModuleLoader {
    registry: Arc<ComponentRegistry>,
    loaded: HashSet<String>,
    report: LoadReport,
}

impl ModuleLoader {
    /// 创建绑定到注册表的加载器
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self {
            registry,
            loaded: HashSet::new(),
            report: LoadReport::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// 模块是否已加载
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }

    /// 加载单个模块
    ///
    /// 模块的每份声明都会标记所属模块。任何声明注册失败都会中止加载。
    pub fn load(&mut self, module: &dyn AddonModule) -> LoadResult<&ModuleReport> {
        let name = module.name().to_string();
        if self.loaded.contains(&name) {
            return Err(LoadError::DuplicateModule { module: name });
        }
        if let Some(dependency) = module
            .depends()
            .into_iter()
            .find(|dependency| !self.loaded.contains(dependency))
        {
            return Err(LoadError::MissingDependency {
                module: name,
                dependency,
            });
        }

        debug!("加载模块: {}", name);
        let mut components = Vec::new();
        for declaration in module.components() {
            let descriptor = self
                .registry
                .register(declaration.module(name.as_str()))
                .map_err(|source| {
                    error!("模块 {} 注册组件失败: {}", name, source);
                    LoadError::Build {
                        module: name.clone(),
                        source,
                    }
                })?;
            if !components.iter().any(|component| component == descriptor.name()) {
                components.push(descriptor.name().to_string());
            }
        }

        info!("模块 {} 加载完成，声明组件: {:?}", name, components);
        self.loaded.insert(name.clone());
        self.report.modules.push(ModuleReport {
            name,
            components,
            loaded_at: Utc::now(),
        });
        let index = self.report.modules.len() - 1;
        Ok(&self.report.modules[index])
    }

    /// 按顺序加载多个模块
    pub fn load_all<I, M>(&mut self, modules: I) -> LoadResult<()>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<dyn AddonModule>,
    {
        for module in modules {
            self.load(module.as_ref())?;
        }
        Ok(())
    }

    /// 封存注册表并返回加载报告
    pub fn finish(mut self) -> LoadResult<(Arc<RegistrySnapshot>, LoadReport)> {
        let snapshot = self.registry.seal().map_err(LoadError::Seal)?;
        self.report.sealed_at = Some(Utc::now());
        self.report.component_count = snapshot.len();
        info!(
            "模块加载结束: {} 个模块，{} 个组件",
            self.report.modules.len(),
            snapshot.len()
        );
        Ok((snapshot, self.report))
    }
}
