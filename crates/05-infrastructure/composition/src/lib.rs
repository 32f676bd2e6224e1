//! # 组件注册表组合层
//!
//! 负责把扩展模块组合成一个可用的组件注册表。
//!
//! ## 主要功能
//!
//! - **扩展模块**: [`AddonModule`] 与声明式的 [`StaticModule`]
//! - **模块加载**: 按顺序注册模块并检查依赖，生成加载报告
//! - **配置**: 默认值、配置文件与环境变量分层合并
//! - **日志**: 基于 `tracing-subscriber` 的日志初始化
//!
//! ## 基本使用
//!
//! ```rust
//! use component_registry::ComponentDeclaration;
//! use infrastructure_composition::{RegistryBuilder, StaticModule};
//! use infrastructure_common::memory::{LockTable, MemoryEnvironment, MemoryScope};
//! use std::sync::Arc;
//!
//! let sales = StaticModule::new("sales")
//!     .depends_on("component")
//!     .component(
//!         ComponentDeclaration::new()
//!             .name("order.importer")
//!             .purpose("import")
//!             .applies_to("order"),
//!     );
//!
//! let composed = RegistryBuilder::new().add_module(sales).build()?;
//!
//! let env = Arc::new(MemoryEnvironment::new(Arc::new(LockTable::new())));
//! let work = composed.work_context(Arc::new(MemoryScope::new("main", env)), "order");
//! let importer = work.component(Some("import"), None)?;
//! assert_eq!(importer.name(), "order.importer");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod loader;
pub mod logging;
pub mod module;
pub mod settings;

pub use builder::{ComposedRegistry, RegistryBuilder};
pub use loader::{LoadReport, ModuleLoader, ModuleReport};
pub use logging::LoggingConfig;
pub use module::{core_module, AddonModule, StaticModule, CORE_MODULE_NAME};
pub use settings::{LoggingSettings, RegistrySettings, ENV_PREFIX, ENV_SEPARATOR};

pub use infrastructure_common::InfrastructureError;

#[cfg(test)]
mod tests;
