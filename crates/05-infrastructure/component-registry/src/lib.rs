//! # 组件注册表
//!
//! 多个独立模块为同一组件贡献声明，注册表按模块加载顺序把它们合并为一个描述符，
//! 并按作用域、用途和目标类型查找组件。
//!
//! ## 生命周期
//!
//! 1. 加载阶段：模块加载器按依赖顺序调用 [`ComponentRegistry::register`]
//! 2. 封存：[`ComponentRegistry::seal`] 解析所有组件并生成只读快照
//! 3. 查找阶段：任意线程通过 [`WorkContext`] 查找组件并调用方法
//!
//! ## 示例
//!
//! ```rust
//! use component_registry::{ComponentDeclaration, ComponentRegistry, WorkContext};
//! use infrastructure_common::memory::{LockTable, MemoryEnvironment, MemoryScope};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ComponentRegistry::new());
//! registry.register(ComponentDeclaration::new().name("base").abstract_component())?;
//! registry.register(
//!     ComponentDeclaration::new()
//!         .name("greeter")
//!         .method("greet", |_| Ok(json!("hello"))),
//! )?;
//! registry.register(
//!     ComponentDeclaration::extend("greeter")
//!         .method("greet", |call| {
//!             let greeting = call.call_super(json!({}))?;
//!             Ok(json!(format!("{} world", greeting.as_str().unwrap_or_default())))
//!         }),
//! )?;
//! registry.seal()?;
//!
//! let env = Arc::new(MemoryEnvironment::new(Arc::new(LockTable::new())));
//! let scope = Arc::new(MemoryScope::new("main", env));
//! let work = WorkContext::new(registry, scope, "order");
//! let greeter = work.component_by_name("greeter")?;
//! assert_eq!(greeter.call("greet", json!({}))?, json!("hello world"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod component;
pub mod context;
pub mod declaration;
pub mod descriptor;
pub mod global;
pub mod lookup;
pub mod registry;

pub use component::{Component, Invocation};
pub use context::WorkContext;
pub use declaration::{CompletionHook, ComponentDeclaration, MethodFn, NameList};
pub use descriptor::{BuildCompletion, Contribution, ContributionId, MroEntry, ResolvedDescriptor};
pub use global::global_registry;
pub use lookup::LookupQuery;
pub use registry::{ComponentRegistry, RegistryOptions, RegistrySnapshot, DEFAULT_BASE_NAME};

pub use infrastructure_common::{
    Attributes, BuildError, ComponentError, Environment, LookupError, ModelRef, RegistryPhase,
    RetryableJobError, Scope,
};
